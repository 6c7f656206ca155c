use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub rng: RngConfig,
    pub totp: TotpConfig,
    pub email_otp: EmailOtpConfig,
    pub logging: LoggingConfig,
}

/// Secure random source selection.
///
/// Leaving both fields unset selects the platform default generator. Named
/// algorithms and providers are resolved against a closed set at construction
/// and rejected if unknown.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RngConfig {
    pub algorithm: Option<String>,
    pub provider: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TotpConfig {
    /// HMAC hash function: "sha1" (RFC 6238 default), "sha256" or "sha512".
    pub algorithm: String,
    /// Number of digits in a code. The code modulus is 10^digits.
    pub digits: u32,
    /// Time step duration in seconds.
    pub step_seconds: u64,
    /// Total number of adjacent time steps checked during verification.
    /// Must be odd; 3 checks the current step and one step either side.
    pub window: u32,
    /// Secret size in bits. Encoded as Base32 for storage and display.
    pub secret_bits: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmailOtpConfig {
    /// Number of characters in a mailed code.
    pub length: usize,
    /// Alphabet the code is drawn from.
    pub charset: String,
    /// Seconds from creation until a code expires. Fixed at creation,
    /// never extended.
    pub ttl_seconds: i64,
    pub subject: String,
    /// Message body template. `{{email.otp}}` is replaced with the code,
    /// `{{email.address}}` with the recipient identity.
    pub body: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::error::MfaError::Config(e.to_string()))?;

        toml::from_str(&content).map_err(|e| crate::error::MfaError::Config(e.to_string()))
    }

    pub fn default() -> Self {
        Self {
            rng: RngConfig {
                algorithm: None,
                provider: None,
            },
            totp: TotpConfig::default(),
            email_otp: EmailOtpConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

impl Default for TotpConfig {
    fn default() -> Self {
        Self {
            algorithm: "sha1".to_string(),
            digits: 6,
            step_seconds: 30,
            window: 3,
            secret_bits: 80,
        }
    }
}

impl Default for EmailOtpConfig {
    fn default() -> Self {
        Self {
            length: 6,
            charset: "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789".to_string(),
            ttl_seconds: 300,
            subject: "Your one-time passcode".to_string(),
            body: "Hello {{email.address}},\n\nYour one-time passcode is {{email.otp}}. \
                   It expires in a few minutes and can be used once.\n"
                .to_string(),
        }
    }
}
