mod common;

use common::{DUE, grant, payment, record, status_of};
use grant_payments::application::status::try_transition;
use grant_payments::domain::payment::{PaymentId, PaymentStatus, RecordId};
use grant_payments::domain::ports::PaymentStoreHandle;
use grant_payments::infrastructure::in_memory::InMemoryPaymentStore;
use std::sync::Arc;

async fn contend(store: PaymentStoreHandle, contenders: usize) -> usize {
    store
        .insert(record("rec-1", "111", vec![grant("FPTT", "INV-1", vec![payment("p1", DUE)])]))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..contenders {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            try_transition(
                store.as_ref(),
                &RecordId::new("rec-1"),
                &PaymentId::new("p1"),
                PaymentStatus::Locked,
                PaymentStatus::Pending,
            )
            .await
            .unwrap()
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    winners
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_in_memory_single_lock_winner() {
    let store: PaymentStoreHandle = Arc::new(InMemoryPaymentStore::new());
    let winners = contend(Arc::clone(&store), 64).await;

    assert_eq!(winners, 1);
    assert_eq!(status_of(store.as_ref(), "rec-1", "p1").await, PaymentStatus::Locked);
}

#[tokio::test]
async fn test_lock_on_missing_payment_is_not_acquired() {
    let store: PaymentStoreHandle = Arc::new(InMemoryPaymentStore::new());
    store
        .insert(record("rec-1", "111", vec![grant("FPTT", "INV-1", vec![payment("p1", DUE)])]))
        .await
        .unwrap();

    let acquired = try_transition(
        store.as_ref(),
        &RecordId::new("rec-1"),
        &PaymentId::new("missing"),
        PaymentStatus::Locked,
        PaymentStatus::Pending,
    )
    .await
    .unwrap();
    assert!(!acquired);

    let acquired = try_transition(
        store.as_ref(),
        &RecordId::new("rec-404"),
        &PaymentId::new("p1"),
        PaymentStatus::Locked,
        PaymentStatus::Pending,
    )
    .await
    .unwrap();
    assert!(!acquired);
}

#[cfg(feature = "storage-rocksdb")]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_rocksdb_single_lock_winner() {
    use grant_payments::infrastructure::rocksdb::RocksDBStore;

    let dir = tempfile::tempdir().unwrap();
    let store: PaymentStoreHandle = Arc::new(RocksDBStore::open(dir.path()).unwrap());
    let winners = contend(Arc::clone(&store), 64).await;

    assert_eq!(winners, 1);
    assert_eq!(status_of(store.as_ref(), "rec-1", "p1").await, PaymentStatus::Locked);
}
