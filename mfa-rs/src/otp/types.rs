//! Email OTP records and lifecycle states

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a mailed one-time code.
///
/// A record starts `Active` and moves to exactly one terminal state:
/// `Used`, `Expired` or `Revoked`. Terminal states never change again.
/// Expiry is usually derived from the wall clock at validation time rather
/// than written back, so an `Active` stored status can still be logically
/// expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OtpStatus {
    Active,
    Used,
    Expired,
    Revoked,
}

impl OtpStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OtpStatus::Active)
    }
}

impl std::fmt::Display for OtpStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OtpStatus::Active => write!(f, "active"),
            OtpStatus::Used => write!(f, "used"),
            OtpStatus::Expired => write!(f, "expired"),
            OtpStatus::Revoked => write!(f, "revoked"),
        }
    }
}

/// A persisted one-time code bound to an identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpRecord {
    /// Unique ID
    pub id: Uuid,
    /// Identity the code was issued for (email address)
    pub identity: String,
    /// The code value
    pub code: String,
    /// Lifecycle state
    pub status: OtpStatus,
    /// When the code was created
    pub created_at: DateTime<Utc>,
    /// Absolute expiry instant, fixed at creation
    pub expires_at: DateTime<Utc>,
}

impl OtpRecord {
    /// Create an active record expiring `ttl_seconds` from now.
    pub fn new(identity: &str, code: &str, ttl_seconds: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            identity: identity.to_string(),
            code: code.to_string(),
            status: OtpStatus::Active,
            created_at: now,
            expires_at: now + Duration::seconds(ttl_seconds),
        }
    }

    /// Whether the record is expired at `at`, regardless of stored status.
    pub fn is_expired(&self, at: DateTime<Utc>) -> bool {
        at > self.expires_at
    }
}
