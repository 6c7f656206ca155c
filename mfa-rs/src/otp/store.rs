//! OTP record persistence seam.

use crate::error::Result;
use crate::otp::types::{OtpRecord, OtpStatus};
use async_trait::async_trait;

/// Trait for persisting OTP records.
///
/// Implement this for your database layer. The core never deletes records;
/// retention is the implementor's concern. Implementations must keep status
/// transitions monotonic (only `Active` records change state) and serialize
/// conflicting updates to the same code so a code cannot be credited twice.
///
/// # Example
///
/// ```rust,ignore
/// use mfa_rs::otp::{OtpStore, OtpRecord, OtpStatus};
/// use async_trait::async_trait;
///
/// struct SqlOtpStore {
///     pool: sqlx::SqlitePool,
/// }
///
/// #[async_trait]
/// impl OtpStore for SqlOtpStore {
///     async fn save(&self, record: OtpRecord) -> Result<()> {
///         // INSERT INTO otp_codes ...
///         Ok(())
///     }
///
///     // ... implement other methods
/// }
/// ```
#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Persist a newly created record.
    async fn save(&self, record: OtpRecord) -> Result<()>;

    /// Look up a record by its code value.
    async fn find_by_code(&self, code: &str) -> Result<Option<OtpRecord>>;

    /// Transition the active records of an identity to a new status.
    async fn update_status(&self, identity: &str, status: OtpStatus) -> Result<()>;
}
