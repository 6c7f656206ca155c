//! Self-reseeding cryptographic random source.
//!
//! Every secret and mailed code in this crate is drawn through
//! [`RandomSource`]. The concrete [`SecureRandom`] wraps a CSPRNG selected by
//! name at construction and rebuilds it after a fixed number of operations so
//! a long-lived process never serves bytes from a stale generator state.

use crate::config::RngConfig;
use crate::error::{MfaError, Result};
use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use tracing::debug;

/// Operations served before the underlying generator is rebuilt.
const MAX_OPERATIONS: u32 = 1_000_000;

/// Source of cryptographically secure random bytes.
///
/// The seam components depend on; tests inject deterministic fakes here.
pub trait RandomSource: Send + Sync {
    /// Fill `buf` with random bytes.
    fn fill_bytes(&self, buf: &mut [u8]) -> Result<()>;

    /// Draw `n` random bytes.
    fn next_bytes(&self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.fill_bytes(&mut buf)?;
        Ok(buf)
    }
}

/// Generator algorithms resolvable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RngAlgorithm {
    /// Userspace ChaCha12 CSPRNG seeded from the provider. The platform
    /// default when no algorithm is configured.
    ChaCha12,
    /// The operating system generator, no userspace state.
    Os,
}

impl RngAlgorithm {
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "chacha12" | "std" => Ok(Self::ChaCha12),
            "os" | "system" => Ok(Self::Os),
            _ => Err(MfaError::UnknownAlgorithm(name.to_string())),
        }
    }
}

/// Seed source for userspace generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RngProvider {
    /// OS entropy via getrandom. The only supported provider.
    OsEntropy,
}

impl RngProvider {
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "os" | "getrandom" => Ok(Self::OsEntropy),
            _ => Err(MfaError::UnknownProvider(name.to_string())),
        }
    }
}

enum Generator {
    Std(StdRng),
    Os(OsRng),
}

impl Generator {
    fn build(algorithm: RngAlgorithm, provider: Option<RngProvider>) -> Result<Self> {
        match algorithm {
            RngAlgorithm::ChaCha12 => {
                let rng = match provider.unwrap_or(RngProvider::OsEntropy) {
                    RngProvider::OsEntropy => StdRng::from_rng(OsRng)
                        .map_err(|e| MfaError::AlgorithmUnavailable(e.to_string()))?,
                };
                Ok(Self::Std(rng))
            }
            RngAlgorithm::Os => Ok(Self::Os(OsRng)),
        }
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        match self {
            Self::Std(rng) => rng
                .try_fill_bytes(buf)
                .map_err(|e| MfaError::AlgorithmUnavailable(e.to_string())),
            Self::Os(rng) => rng
                .try_fill_bytes(buf)
                .map_err(|e| MfaError::AlgorithmUnavailable(e.to_string())),
        }
    }
}

/// Self-reseeding secure random source.
///
/// An atomic counter tracks operations served since the last (re)build. Once
/// it passes [`MAX_OPERATIONS`] the generator is rebuilt with the same
/// algorithm and provider inside the mutex, with a check-again so exactly one
/// of the callers racing past the cap performs the rebuild; the rest proceed
/// against the fresh generator.
pub struct SecureRandom {
    algorithm: RngAlgorithm,
    provider: Option<RngProvider>,
    cap: u32,
    ops: AtomicU32,
    inner: Mutex<Generator>,
}

impl SecureRandom {
    /// Build a source from optional algorithm and provider names.
    ///
    /// Both `None` selects the platform default generator. Unknown names are
    /// rejected at construction, before any request is served.
    pub fn new(algorithm: Option<&str>, provider: Option<&str>) -> Result<Self> {
        let algorithm = match algorithm {
            Some(name) => RngAlgorithm::parse(name)?,
            None => RngAlgorithm::ChaCha12,
        };
        let provider = provider.map(RngProvider::parse).transpose()?;

        Ok(Self {
            algorithm,
            provider,
            cap: MAX_OPERATIONS,
            ops: AtomicU32::new(0),
            inner: Mutex::new(Generator::build(algorithm, provider)?),
        })
    }

    pub fn from_config(config: &RngConfig) -> Result<Self> {
        Self::new(config.algorithm.as_deref(), config.provider.as_deref())
    }

    #[cfg(test)]
    fn with_operation_cap(cap: u32) -> Self {
        Self {
            algorithm: RngAlgorithm::ChaCha12,
            provider: None,
            cap,
            ops: AtomicU32::new(0),
            inner: Mutex::new(Generator::build(RngAlgorithm::ChaCha12, None).unwrap()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Generator> {
        // The rebuild assigns a whole value; a poisoned guard never holds a
        // torn generator.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl RandomSource for SecureRandom {
    fn fill_bytes(&self, buf: &mut [u8]) -> Result<()> {
        let served = self.ops.fetch_add(1, Ordering::AcqRel) + 1;
        let mut rng = self.lock();
        if served > self.cap && self.ops.load(Ordering::Acquire) > self.cap {
            debug!(algorithm = ?self.algorithm, "reseeding secure random source");
            *rng = Generator::build(self.algorithm, self.provider)?;
            self.ops.store(0, Ordering::Release);
        }
        rng.fill(buf)
    }
}
