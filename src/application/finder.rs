use crate::domain::payment::{PaymentRecord, PaymentStatus};
use crate::domain::ports::{PaymentStore, RecordFilter};
use crate::error::Result;
use chrono::NaiveDate;

/// Records holding at least one payment due on `date` in `status`, with
/// every other payment projected away.
pub async fn find_due_payments(
    store: &dyn PaymentStore,
    date: NaiveDate,
    status: PaymentStatus,
) -> Result<Vec<PaymentRecord>> {
    let filter = RecordFilter::default().with_payment(date.format("%Y-%m-%d").to_string(), status);
    store.find(&filter).await
}

pub async fn find_by_sbi(store: &dyn PaymentStore, sbi: &str) -> Result<Vec<PaymentRecord>> {
    store.find(&RecordFilter::by_sbi(sbi)).await
}

pub async fn find_by_sbi_and_fund_code(
    store: &dyn PaymentStore,
    sbi: &str,
    fund_code: &str,
) -> Result<Vec<PaymentRecord>> {
    store
        .find(&RecordFilter::by_sbi(sbi).with_fund_code(fund_code))
        .await
}
