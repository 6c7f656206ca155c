//! In-process OTP record store.

use crate::error::Result;
use crate::otp::store::OtpStore;
use crate::otp::types::{OtpRecord, OtpStatus};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Reference [`OtpStore`] backed by process memory.
///
/// Useful for tests and single-node embedding. The write lock serializes
/// status updates, so two concurrent validations of the same code cannot
/// both observe it active and then both mark it used.
#[derive(Default)]
pub struct MemoryOtpStore {
    /// Map of code -> record. History accumulates; nothing is deleted.
    records: RwLock<HashMap<String, OtpRecord>>,
}

impl MemoryOtpStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held, terminal ones included.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl OtpStore for MemoryOtpStore {
    async fn save(&self, record: OtpRecord) -> Result<()> {
        self.records
            .write()
            .await
            .insert(record.code.clone(), record);
        Ok(())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<OtpRecord>> {
        Ok(self.records.read().await.get(code).cloned())
    }

    async fn update_status(&self, identity: &str, status: OtpStatus) -> Result<()> {
        let mut records = self.records.write().await;
        for record in records.values_mut() {
            // Terminal states are final; only active records transition.
            if record.identity == identity && record.status == OtpStatus::Active {
                record.status = status;
            }
        }
        Ok(())
    }
}
