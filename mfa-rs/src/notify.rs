//! Out-of-band code delivery seam.

use crate::error::Result;
use async_trait::async_trait;

/// Trait for delivering a rendered one-time code message to a user.
///
/// Implement this over your outbound channel (SMTP submission, an email API,
/// SMS). The core hands over a fully rendered subject and body and treats any
/// failure as a delivery failure. It never retries; retry policy belongs to
/// the implementor or the caller.
///
/// # Example
///
/// ```rust,ignore
/// use mfa_rs::notify::Notifier;
/// use async_trait::async_trait;
///
/// struct SmtpNotifier {
///     client: SmtpClient,
/// }
///
/// #[async_trait]
/// impl Notifier for SmtpNotifier {
///     async fn send(&self, identity: &str, subject: &str, body: &str) -> Result<()> {
///         self.client.submit(identity, subject, body).await
///     }
/// }
/// ```
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a message to the given identity.
    async fn send(&self, identity: &str, subject: &str, body: &str) -> Result<()>;
}
