use crate::domain::payment::{Grant, PaymentId, PaymentRecord, PaymentStatus, RecordId};
use crate::domain::ports::{PaymentStore, RecordFilter};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for payment records.
///
/// Uses `Arc<RwLock<HashMap<RecordId, PaymentRecord>>>`. Status updates run
/// entirely under the write lock, so a conditional update is observed
/// atomically by every concurrent caller.
#[derive(Default, Clone)]
pub struct InMemoryPaymentStore {
    records: Arc<RwLock<HashMap<RecordId, PaymentRecord>>>,
}

impl InMemoryPaymentStore {
    /// Creates a new, empty in-memory payment store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn insert(&self, record: PaymentRecord) -> Result<()> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(PaymentError::StoreError(format!(
                "record {} already exists",
                record.id
            )));
        }
        records.insert(record.id.clone(), record);
        Ok(())
    }

    async fn append_grants(&self, record_id: &RecordId, grants: Vec<Grant>) -> Result<()> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(record_id)
            .ok_or_else(|| PaymentError::StoreError(format!("record {} not found", record_id)))?;
        record.append_grants(grants)
    }

    async fn get(&self, record_id: &RecordId) -> Result<Option<PaymentRecord>> {
        let records = self.records.read().await;
        Ok(records.get(record_id).cloned())
    }

    async fn find(&self, filter: &RecordFilter) -> Result<Vec<PaymentRecord>> {
        let records = self.records.read().await;
        Ok(records.values().filter_map(|r| filter.project(r)).collect())
    }

    async fn update_payment_status(
        &self,
        record_id: &RecordId,
        payment_id: &PaymentId,
        status: PaymentStatus,
        expected: Option<PaymentStatus>,
    ) -> Result<u64> {
        let mut records = self.records.write().await;
        let Some(payment) = records
            .get_mut(record_id)
            .and_then(|r| r.payment_mut(payment_id))
        else {
            return Ok(0);
        };

        if expected.is_some_and(|e| e != payment.status) {
            return Ok(0);
        }
        payment.status = status;
        Ok(1)
    }
}
