use thiserror::Error;

/// Crate-wide error type.
///
/// Per-request rejections (`InvalidOtp`, `ExpiredOtp`, `UsedOtp`,
/// `RevokedOtp`, `DeliveryFailed`) are recoverable and surfaced verbatim to
/// the caller. Everything else is a construction-time or environment failure.
///
/// Display strings never contain secret or code material; diagnostics carry
/// only configuration names and cause descriptions.
#[derive(Error, Debug)]
pub enum MfaError {
    #[error("unknown random generator algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("unknown random generator provider: {0}")]
    UnknownProvider(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("generator unavailable: {0}")]
    AlgorithmUnavailable(String),

    #[error("invalid HMAC key material")]
    InvalidKey,

    #[error("invalid TOTP secret")]
    InvalidSecret,

    #[error("invalid OTP")]
    InvalidOtp,

    #[error("expired OTP")]
    ExpiredOtp,

    #[error("OTP already used")]
    UsedOtp,

    #[error("OTP revoked")]
    RevokedOtp,

    #[error("delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, MfaError>;
