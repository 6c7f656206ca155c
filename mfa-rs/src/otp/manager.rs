//! Email OTP manager - generation, delivery and lifecycle validation

use crate::config::EmailOtpConfig;
use crate::error::{MfaError, Result};
use crate::notify::Notifier;
use crate::otp::store::OtpStore;
use crate::otp::types::{OtpRecord, OtpStatus};
use crate::random::RandomSource;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Template placeholder replaced with the generated code.
pub const OTP_PLACEHOLDER: &str = "{{email.otp}}";
/// Template placeholder replaced with the recipient identity.
pub const ADDRESS_PLACEHOLDER: &str = "{{email.address}}";

/// Issues and validates mailed one-time codes.
///
/// Generation draws from the shared [`RandomSource`], persists a record
/// through the [`OtpStore`] and hands the rendered message to the
/// [`Notifier`]. Validation is a read-only check against the store; the
/// status transition is a separate, explicit call
/// ([`mark_used`](Self::mark_used) / [`revoke`](Self::revoke)).
pub struct EmailOtpManager {
    config: EmailOtpConfig,
    charset: Vec<char>,
    rng: Arc<dyn RandomSource>,
    store: Arc<dyn OtpStore>,
    notifier: Arc<dyn Notifier>,
}

impl EmailOtpManager {
    /// Build a manager, failing fast on invalid configuration.
    pub fn new(
        config: EmailOtpConfig,
        rng: Arc<dyn RandomSource>,
        store: Arc<dyn OtpStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        if config.length == 0 {
            return Err(MfaError::InvalidParameter(
                "email_otp length must be at least 1".to_string(),
            ));
        }
        if config.charset.is_empty() {
            return Err(MfaError::InvalidParameter(
                "email_otp charset must not be empty".to_string(),
            ));
        }
        if config.ttl_seconds <= 0 {
            return Err(MfaError::InvalidParameter(
                "email_otp ttl_seconds must be positive".to_string(),
            ));
        }

        let charset = config.charset.chars().collect();
        Ok(Self {
            config,
            charset,
            rng,
            store,
            notifier,
        })
    }

    /// Generate a random code of `length` characters drawn from `charset`.
    ///
    /// One random byte is drawn per character and mapped over the full
    /// alphabet, so every charset symbol is reachable.
    pub fn generate_code(&self, length: usize, charset: &[char]) -> Result<String> {
        if length == 0 || charset.is_empty() {
            return Err(MfaError::InvalidParameter(
                "code length and charset must be non-empty".to_string(),
            ));
        }
        let bytes = self.rng.next_bytes(length)?;
        Ok(bytes
            .iter()
            .map(|b| charset[*b as usize % charset.len()])
            .collect())
    }

    /// Generate, persist and deliver a new code for `identity`.
    ///
    /// Creates one active record per call. Prior active codes for the same
    /// identity are not invalidated here; callers wanting a single live code
    /// revoke before reissuing.
    pub async fn send_code(&self, identity: &str) -> Result<()> {
        let code = self.generate_code(self.config.length, &self.charset)?;
        let record = OtpRecord::new(identity, &code, self.config.ttl_seconds);
        self.store.save(record).await?;

        let subject = render(&self.config.subject, identity, &code);
        let body = render(&self.config.body, identity, &code);

        info!("sending one-time code to {}", identity);
        self.notifier
            .send(identity, &subject, &body)
            .await
            .map_err(|e| match e {
                MfaError::DeliveryFailed(_) => e,
                other => MfaError::DeliveryFailed(other.to_string()),
            })
    }

    /// Check a submitted code against its stored record.
    ///
    /// Read-only: a success does not consume the code. Callers transition it
    /// with [`mark_used`](Self::mark_used) once the login step it gates has
    /// completed. Checks run in a fixed order so each rejection is distinct:
    /// existence, expiry, used, revoked.
    pub async fn validate(&self, code: &str) -> Result<()> {
        let record = match self.store.find_by_code(code).await? {
            Some(record) => record,
            None => {
                debug!("one-time code lookup miss");
                return Err(MfaError::InvalidOtp);
            }
        };

        // Expiry is wall-clock-derived; the stored status may still read
        // active for a code that timed out.
        if record.is_expired(Utc::now()) {
            warn!("rejected one-time code for {}: expired", record.identity);
            return Err(MfaError::ExpiredOtp);
        }
        match record.status {
            OtpStatus::Used => {
                warn!("rejected one-time code for {}: already used", record.identity);
                Err(MfaError::UsedOtp)
            }
            OtpStatus::Revoked => {
                warn!("rejected one-time code for {}: revoked", record.identity);
                Err(MfaError::RevokedOtp)
            }
            OtpStatus::Expired => Err(MfaError::ExpiredOtp),
            OtpStatus::Active => Ok(()),
        }
    }

    /// Transition the identity's active codes to used.
    pub async fn mark_used(&self, identity: &str) -> Result<()> {
        debug!("marking one-time codes used for {}", identity);
        self.store.update_status(identity, OtpStatus::Used).await
    }

    /// Transition the identity's active codes to revoked.
    pub async fn revoke(&self, identity: &str) -> Result<()> {
        info!("revoking one-time codes for {}", identity);
        self.store.update_status(identity, OtpStatus::Revoked).await
    }
}

fn render(template: &str, identity: &str, code: &str) -> String {
    template
        .replace(OTP_PLACEHOLDER, code)
        .replace(ADDRESS_PLACEHOLDER, identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::MockNotifier;
    use crate::otp::memory::MemoryOtpStore;

    /// Random source that replays a fixed byte sequence.
    struct FixedRandom {
        bytes: Vec<u8>,
    }

    impl RandomSource for FixedRandom {
        fn fill_bytes(&self, buf: &mut [u8]) -> Result<()> {
            for (i, slot) in buf.iter_mut().enumerate() {
                *slot = self.bytes[i % self.bytes.len()];
            }
            Ok(())
        }
    }

    fn manager_with(
        config: EmailOtpConfig,
        rng: Arc<dyn RandomSource>,
        notifier: MockNotifier,
    ) -> (EmailOtpManager, Arc<MemoryOtpStore>) {
        let store = Arc::new(MemoryOtpStore::new());
        let manager = EmailOtpManager::new(
            config,
            rng,
            Arc::clone(&store) as Arc<dyn OtpStore>,
            Arc::new(notifier),
        )
        .unwrap();
        (manager, store)
    }

    #[test]
    fn test_charset_mapping_reaches_every_symbol() {
        let charset: Vec<char> = "ABC".chars().collect();
        let (manager, _) = manager_with(
            EmailOtpConfig::default(),
            Arc::new(FixedRandom {
                bytes: vec![0, 1, 2, 3],
            }),
            MockNotifier::new(),
        );

        // Bytes 0,1,2 map to A,B,C; the last symbol is reachable.
        let code = manager.generate_code(4, &charset).unwrap();
        assert_eq!(code, "ABCA");
    }

    #[test]
    fn test_generate_code_rejects_degenerate_input() {
        let (manager, _) = manager_with(
            EmailOtpConfig::default(),
            Arc::new(FixedRandom { bytes: vec![0] }),
            MockNotifier::new(),
        );
        assert!(manager.generate_code(0, &['A']).is_err());
        assert!(manager.generate_code(4, &[]).is_err());
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let store: Arc<dyn OtpStore> = Arc::new(MemoryOtpStore::new());
        let rng: Arc<dyn RandomSource> = Arc::new(FixedRandom { bytes: vec![0] });

        let bad = [
            EmailOtpConfig {
                length: 0,
                ..EmailOtpConfig::default()
            },
            EmailOtpConfig {
                charset: String::new(),
                ..EmailOtpConfig::default()
            },
            EmailOtpConfig {
                ttl_seconds: 0,
                ..EmailOtpConfig::default()
            },
        ];
        for config in bad {
            assert!(matches!(
                EmailOtpManager::new(
                    config,
                    Arc::clone(&rng),
                    Arc::clone(&store),
                    Arc::new(MockNotifier::new()),
                ),
                Err(MfaError::InvalidParameter(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_send_code_persists_and_renders() {
        let config = EmailOtpConfig {
            length: 4,
            charset: "ABC".to_string(),
            subject: "Code for {{email.address}}".to_string(),
            body: "Hi {{email.address}}, your code is {{email.otp}}.".to_string(),
            ..EmailOtpConfig::default()
        };

        let sent: Arc<std::sync::Mutex<Vec<(String, String, String)>>> = Arc::default();
        let mut notifier = MockNotifier::new();
        let captured = Arc::clone(&sent);
        notifier.expect_send().times(1).returning(move |i, s, b| {
            captured
                .lock()
                .unwrap()
                .push((i.to_string(), s.to_string(), b.to_string()));
            Ok(())
        });

        let (manager, store) = manager_with(
            config,
            Arc::new(FixedRandom {
                bytes: vec![0, 1, 2, 3],
            }),
            notifier,
        );

        manager.send_code("user@example.com").await.unwrap();

        let sent = sent.lock().unwrap();
        assert_eq!(sent[0].0, "user@example.com");
        assert_eq!(sent[0].1, "Code for user@example.com");
        assert_eq!(sent[0].2, "Hi user@example.com, your code is ABCA.");
        drop(sent);

        let record = store.find_by_code("ABCA").await.unwrap().unwrap();
        assert_eq!(record.identity, "user@example.com");
        assert_eq!(record.status, OtpStatus::Active);
    }

    #[tokio::test]
    async fn test_notifier_failure_surfaces_as_delivery_failed() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_send()
            .times(1)
            .returning(|_, _, _| Err(MfaError::Storage("smtp down".to_string())));

        let (manager, store) = manager_with(
            EmailOtpConfig::default(),
            Arc::new(FixedRandom {
                bytes: vec![7, 11, 13, 17, 19, 23],
            }),
            notifier,
        );

        let err = manager.send_code("user@example.com").await.unwrap_err();
        assert!(matches!(err, MfaError::DeliveryFailed(_)));
        // The record was persisted before the delivery attempt.
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_validate_unknown_code() {
        let (manager, _) = manager_with(
            EmailOtpConfig::default(),
            Arc::new(FixedRandom { bytes: vec![0] }),
            MockNotifier::new(),
        );
        assert!(matches!(
            manager.validate("NOSUCH").await,
            Err(MfaError::InvalidOtp)
        ));
    }

    #[tokio::test]
    async fn test_validate_is_read_only() {
        let mut notifier = MockNotifier::new();
        notifier.expect_send().returning(|_, _, _| Ok(()));

        let config = EmailOtpConfig {
            length: 6,
            charset: "ABC".to_string(),
            ..EmailOtpConfig::default()
        };
        let (manager, store) = manager_with(
            config,
            Arc::new(FixedRandom {
                bytes: vec![0, 1, 2, 0, 1, 2],
            }),
            notifier,
        );
        manager.send_code("user@example.com").await.unwrap();

        // Two validations both succeed until the caller marks the code used.
        manager.validate("ABCABC").await.unwrap();
        manager.validate("ABCABC").await.unwrap();

        manager.mark_used("user@example.com").await.unwrap();
        assert!(matches!(
            manager.validate("ABCABC").await,
            Err(MfaError::UsedOtp)
        ));
        let record = store.find_by_code("ABCABC").await.unwrap().unwrap();
        assert_eq!(record.status, OtpStatus::Used);
    }

    #[tokio::test]
    async fn test_validate_expired_wins_over_stored_active() {
        let (manager, store) = manager_with(
            EmailOtpConfig::default(),
            Arc::new(FixedRandom { bytes: vec![0] }),
            MockNotifier::new(),
        );

        // Already past its expiry, status still reads active in storage.
        let mut record = OtpRecord::new("user@example.com", "STALE1", 300);
        record.expires_at = record.created_at - chrono::Duration::seconds(1);
        store.save(record).await.unwrap();

        assert!(matches!(
            manager.validate("STALE1").await,
            Err(MfaError::ExpiredOtp)
        ));
        let stored = store.find_by_code("STALE1").await.unwrap().unwrap();
        assert_eq!(stored.status, OtpStatus::Active);
    }

    #[tokio::test]
    async fn test_validate_revoked() {
        let mut notifier = MockNotifier::new();
        notifier.expect_send().returning(|_, _, _| Ok(()));

        let config = EmailOtpConfig {
            length: 6,
            charset: "XY".to_string(),
            ..EmailOtpConfig::default()
        };
        let (manager, _) = manager_with(
            config,
            Arc::new(FixedRandom {
                bytes: vec![0, 1, 0, 1, 0, 1],
            }),
            notifier,
        );
        manager.send_code("user@example.com").await.unwrap();

        manager.revoke("user@example.com").await.unwrap();
        assert!(matches!(
            manager.validate("XYXYXY").await,
            Err(MfaError::RevokedOtp)
        ));
    }

    #[test]
    fn test_render_placeholders() {
        let rendered = render(
            "To {{email.address}}: code {{email.otp}} ({{email.otp}})",
            "a@b.c",
            "123456",
        );
        assert_eq!(rendered, "To a@b.c: code 123456 (123456)");
    }
}
