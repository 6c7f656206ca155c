//! TOTP (Time-based One-Time Password) engine
//!
//! Implements RFC 6238 code derivation and window-tolerant verification on
//! top of the RFC 4226 dynamic truncation rule.

use crate::config::TotpConfig;
use crate::error::{MfaError, Result};
use crate::random::RandomSource;
use chrono::{DateTime, Utc};
use data_encoding::BASE32_NOPAD;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha512};
use std::fmt;
use std::sync::Arc;

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;
type HmacSha512 = Hmac<Sha512>;

/// Keyed-hash functions the engine can derive codes with.
///
/// SHA-1 is the RFC 6238 default and what authenticator apps expect; the
/// SHA-2 variants are the extensions the RFC allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotpAlgorithm {
    Sha1,
    Sha256,
    Sha512,
}

impl TotpAlgorithm {
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "sha1" | "sha-1" | "hmacsha1" => Ok(Self::Sha1),
            "sha256" | "sha-256" | "hmacsha256" => Ok(Self::Sha256),
            "sha512" | "sha-512" | "hmacsha512" => Ok(Self::Sha512),
            _ => Err(MfaError::UnknownAlgorithm(name.to_string())),
        }
    }
}

impl fmt::Display for TotpAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha1 => write!(f, "SHA1"),
            Self::Sha256 => write!(f, "SHA256"),
            Self::Sha512 => write!(f, "SHA512"),
        }
    }
}

/// TOTP secret and code engine.
///
/// Holds the resolved derivation parameters and the random source secrets are
/// drawn from. All parameters are validated at construction; a misconfigured
/// engine never serves a request.
pub struct TotpEngine {
    algorithm: TotpAlgorithm,
    digits: u32,
    modulus: u32,
    step_seconds: u64,
    window: u32,
    secret_len: usize,
    rng: Arc<dyn RandomSource>,
}

impl TotpEngine {
    /// Build an engine from configuration, failing fast on invalid values.
    pub fn new(config: &TotpConfig, rng: Arc<dyn RandomSource>) -> Result<Self> {
        let algorithm = TotpAlgorithm::parse(&config.algorithm)?;

        if config.digits < 1 || config.digits > 9 {
            return Err(MfaError::InvalidParameter(format!(
                "totp digits must be between 1 and 9, got {}",
                config.digits
            )));
        }
        if config.step_seconds == 0 {
            return Err(MfaError::InvalidParameter(
                "totp step_seconds must be at least 1".to_string(),
            ));
        }
        if config.window == 0 || config.window % 2 == 0 {
            return Err(MfaError::InvalidParameter(format!(
                "totp window must be odd and at least 1, got {}",
                config.window
            )));
        }
        if config.secret_bits < 80 || config.secret_bits % 8 != 0 {
            return Err(MfaError::InvalidParameter(format!(
                "totp secret_bits must be a multiple of 8 and at least 80, got {}",
                config.secret_bits
            )));
        }

        Ok(Self {
            algorithm,
            digits: config.digits,
            modulus: 10u32.pow(config.digits),
            step_seconds: config.step_seconds,
            window: config.window,
            secret_len: (config.secret_bits / 8) as usize,
            rng,
        })
    }

    /// Generate a fresh shared secret, Base32-encoded (RFC 4648, no padding)
    /// for storage and authenticator-app provisioning.
    pub fn generate_secret(&self) -> Result<String> {
        let key = self.rng.next_bytes(self.secret_len)?;
        Ok(BASE32_NOPAD.encode(&key))
    }

    /// Derive the code for a decoded key at the given time-step counter.
    ///
    /// RFC 6238: the counter is hashed as an 8-byte big-endian value, the
    /// digest is dynamically truncated (RFC 4226 §5.3) and reduced modulo
    /// 10^digits. Pure function of key, counter and parameters.
    pub fn compute_code(&self, key: &[u8], counter: u64) -> Result<u32> {
        let message = counter.to_be_bytes();

        let digest = match self.algorithm {
            TotpAlgorithm::Sha1 => digest_with(
                HmacSha1::new_from_slice(key).map_err(|_| MfaError::InvalidKey)?,
                &message,
            ),
            TotpAlgorithm::Sha256 => digest_with(
                HmacSha256::new_from_slice(key).map_err(|_| MfaError::InvalidKey)?,
                &message,
            ),
            TotpAlgorithm::Sha512 => digest_with(
                HmacSha512::new_from_slice(key).map_err(|_| MfaError::InvalidKey)?,
                &message,
            ),
        };

        // Dynamic truncation: the low nibble of the last digest byte selects
        // a 4-byte big-endian slice; the sign bit is masked off.
        let offset = (digest[digest.len() - 1] & 0x0f) as usize;
        let truncated = u32::from_be_bytes([
            digest[offset] & 0x7f,
            digest[offset + 1],
            digest[offset + 2],
            digest[offset + 3],
        ]);

        Ok(truncated % self.modulus)
    }

    /// Code for a Base32-encoded secret at the given instant.
    pub fn code_at(&self, secret: &str, at: DateTime<Utc>) -> Result<u32> {
        let key = self.decode_secret(secret)?;
        let counter = self.counter_at(at);
        if counter < 0 {
            return Err(MfaError::InvalidParameter(
                "totp instant predates the epoch".to_string(),
            ));
        }
        self.compute_code(&key, counter as u64)
    }

    /// Verify a submitted code against a secret at the current time.
    pub fn verify(&self, secret: &str, code: &str) -> Result<bool> {
        self.verify_at(secret, code, Utc::now())
    }

    /// Verify a submitted code against a secret at a specific instant.
    ///
    /// Checks every step in the configured window around the instant's time
    /// counter. An empty or non-numeric submission is a mismatch, not an
    /// error; a missing or undecodable secret is rejected before any code is
    /// derived.
    pub fn verify_at(&self, secret: &str, code: &str, at: DateTime<Utc>) -> Result<bool> {
        let key = self.decode_secret(secret)?;

        let code = code.trim();
        if code.is_empty() {
            return Ok(false);
        }
        let submitted: u32 = match code.parse() {
            Ok(value) => value,
            Err(_) => return Ok(false),
        };
        if submitted >= self.modulus {
            return Ok(false);
        }

        let counter = self.counter_at(at);
        let back = ((self.window - 1) / 2) as i64;
        let forward = (self.window / 2) as i64;

        for i in -back..=forward {
            let step = counter + i;
            if step < 0 {
                continue;
            }
            if self.compute_code(&key, step as u64)? == submitted {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Zero-padded display form of a derived code.
    pub fn format_code(&self, code: u32) -> String {
        format!("{:0width$}", code, width = self.digits as usize)
    }

    fn counter_at(&self, at: DateTime<Utc>) -> i64 {
        at.timestamp().div_euclid(self.step_seconds as i64)
    }

    fn decode_secret(&self, secret: &str) -> Result<Vec<u8>> {
        if secret.is_empty() {
            return Err(MfaError::InvalidSecret);
        }
        BASE32_NOPAD
            .decode(secret.as_bytes())
            .map_err(|_| MfaError::InvalidSecret)
    }
}

fn digest_with<M: Mac>(mut mac: M, message: &[u8]) -> Vec<u8> {
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}
