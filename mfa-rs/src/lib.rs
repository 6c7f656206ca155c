//! mfa-rs: Multi-factor authentication core
//!
//! Issues and verifies short-lived one-time codes for a two-factor login
//! flow: TOTP (RFC 6238) codes bound to a per-account secret, and mailed
//! codes with an explicit active/used/expired/revoked lifecycle.
//!
//! # Features
//!
//! - **TOTP**: RFC 6238 secret generation, code derivation and
//!   window-tolerant verification (SHA-1/SHA-256/SHA-512)
//! - **Email OTP**: code generation, persistence and lifecycle validation
//! - **Secure randomness**: self-reseeding CSPRNG behind a trait seam
//! - **Pluggable collaborators**: persistence and delivery are traits your
//!   application implements
//!
//! # Example
//!
//! ```no_run
//! use mfa_rs::config::Config;
//! use mfa_rs::otp::{EmailOtpManager, MemoryOtpStore};
//! use mfa_rs::random::SecureRandom;
//! use mfa_rs::totp::TotpEngine;
//! use std::sync::Arc;
//!
//! # struct NoopNotifier;
//! # #[async_trait::async_trait]
//! # impl mfa_rs::notify::Notifier for NoopNotifier {
//! #     async fn send(&self, _: &str, _: &str, _: &str) -> mfa_rs::Result<()> { Ok(()) }
//! # }
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let rng = Arc::new(SecureRandom::from_config(&config.rng)?);
//!
//!     let totp = TotpEngine::new(&config.totp, rng.clone())?;
//!     let secret = totp.generate_secret()?;
//!     assert!(!totp.verify(&secret, "000000")?);
//!
//!     let otp = EmailOtpManager::new(
//!         config.email_otp,
//!         rng,
//!         Arc::new(MemoryOtpStore::new()),
//!         Arc::new(NoopNotifier),
//!     )?;
//!     otp.send_code("user@example.com").await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration management
//! - [`error`]: Error types and handling
//! - [`random`]: Self-reseeding secure random source
//! - [`totp`]: RFC 6238 TOTP engine
//! - [`otp`]: Email OTP lifecycle
//! - [`notify`]: Outbound delivery seam

pub mod config;
pub mod error;
pub mod notify;
pub mod otp;
pub mod random;
pub mod totp;

// Re-export commonly used types
pub use config::Config;
pub use error::{MfaError, Result};
