use crate::domain::payment::{Grant, PaymentId, PaymentRecord, PaymentStatus, RecordId};
use crate::domain::ports::{PaymentStore, RecordFilter};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for storing payment record documents.
pub const CF_RECORDS: &str = "payment_records";

/// A persistent store implementation using RocksDB.
///
/// Each `PaymentRecord` is stored as one JSON document keyed by its record id.
/// RocksDB has no native compare-and-swap, so every read-modify-write of a
/// document runs under `write_guard`; RocksDB's own file lock keeps a second
/// process from opening the same path.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_guard: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the "payment_records" column family exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_records = ColumnFamilyDescriptor::new(CF_RECORDS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_records])?;

        Ok(Self {
            db: Arc::new(db),
            write_guard: Arc::new(Mutex::new(())),
        })
    }

    fn records_cf(&self) -> Result<&rocksdb::ColumnFamily> {
        self.db.cf_handle(CF_RECORDS).ok_or_else(|| {
            PaymentError::InternalError(Box::new(std::io::Error::other(
                "Payment records column family not found",
            )))
        })
    }

    fn read(&self, record_id: &RecordId) -> Result<Option<PaymentRecord>> {
        let cf = self.records_cf()?;
        match self.db.get_cf(cf, record_id.0.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write(&self, record: &PaymentRecord) -> Result<()> {
        let cf = self.records_cf()?;
        let value = serde_json::to_vec(record)?;
        self.db.put_cf(cf, record.id.0.as_bytes(), value)?;
        Ok(())
    }
}

#[async_trait]
impl PaymentStore for RocksDBStore {
    async fn insert(&self, record: PaymentRecord) -> Result<()> {
        let _guard = self.write_guard.lock().await;
        if self.read(&record.id)?.is_some() {
            return Err(PaymentError::StoreError(format!(
                "record {} already exists",
                record.id
            )));
        }
        self.write(&record)
    }

    async fn append_grants(&self, record_id: &RecordId, grants: Vec<Grant>) -> Result<()> {
        let _guard = self.write_guard.lock().await;
        let mut record = self
            .read(record_id)?
            .ok_or_else(|| PaymentError::StoreError(format!("record {} not found", record_id)))?;
        record.append_grants(grants)?;
        self.write(&record)
    }

    async fn get(&self, record_id: &RecordId) -> Result<Option<PaymentRecord>> {
        self.read(record_id)
    }

    async fn find(&self, filter: &RecordFilter) -> Result<Vec<PaymentRecord>> {
        let cf = self.records_cf()?;
        let mut records = Vec::new();
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_key, value) = item?;
            let record: PaymentRecord = serde_json::from_slice(&value)?;
            if let Some(projected) = filter.project(&record) {
                records.push(projected);
            }
        }
        Ok(records)
    }

    async fn update_payment_status(
        &self,
        record_id: &RecordId,
        payment_id: &PaymentId,
        status: PaymentStatus,
        expected: Option<PaymentStatus>,
    ) -> Result<u64> {
        let _guard = self.write_guard.lock().await;
        let Some(mut record) = self.read(record_id)? else {
            return Ok(0);
        };
        let Some(payment) = record.payment_mut(payment_id) else {
            return Ok(0);
        };
        if expected.is_some_and(|e| e != payment.status) {
            return Ok(0);
        }
        payment.status = status;
        self.write(&record)?;
        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::{OwnerIdentifiers, Payment};
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn record() -> PaymentRecord {
        PaymentRecord {
            id: RecordId::new("rec-1"),
            business_identifier: OwnerIdentifiers {
                sbi: "111".to_string(),
                frn: "222".to_string(),
                claim_id: "333".to_string(),
            },
            grants: vec![Grant {
                source_system: "FPTT".to_string(),
                payment_request_number: 1,
                correlation_id: "corr".to_string(),
                invoice_number: "INV".to_string(),
                original_invoice_number: "OINV".to_string(),
                agreement_number: "AGR".to_string(),
                total_amount: dec!(10.00),
                currency: "GBP".to_string(),
                marketing_year: Some(2026),
                recovery_date: None,
                original_settlement_date: None,
                remittance_description: None,
                payments: vec![Payment {
                    id: PaymentId::new("p1"),
                    due_date: "2026-06-05".to_string(),
                    currency: None,
                    recovery_date: None,
                    original_settlement_date: None,
                    invoice_lines: vec![],
                    status: PaymentStatus::Pending,
                }],
            }],
        }
    }

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).expect("Failed to open RocksDB");
        assert!(store.db.cf_handle(CF_RECORDS).is_some());
    }

    #[tokio::test]
    async fn test_rocksdb_record_round_trip() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        store.insert(record()).await.unwrap();
        let retrieved = store.get(&RecordId::new("rec-1")).await.unwrap().unwrap();
        assert_eq!(retrieved, record());

        let due = store
            .find(&RecordFilter::default().with_payment("2026-06-05", PaymentStatus::Pending))
            .await
            .unwrap();
        assert_eq!(due.len(), 1);
    }

    #[tokio::test]
    async fn test_rocksdb_conditional_update_persists() {
        let dir = tempdir().unwrap();
        let rec = RecordId::new("rec-1");
        let pay = PaymentId::new("p1");
        {
            let store = RocksDBStore::open(dir.path()).unwrap();
            store.insert(record()).await.unwrap();
            let first = store
                .update_payment_status(&rec, &pay, PaymentStatus::Locked, Some(PaymentStatus::Pending))
                .await
                .unwrap();
            let second = store
                .update_payment_status(&rec, &pay, PaymentStatus::Locked, Some(PaymentStatus::Pending))
                .await
                .unwrap();
            assert_eq!((first, second), (1, 0));
        }

        let reopened = RocksDBStore::open(dir.path()).unwrap();
        let stored = reopened.get(&rec).await.unwrap().unwrap();
        assert_eq!(stored.payment(&pay).unwrap().status, PaymentStatus::Locked);
    }
}
