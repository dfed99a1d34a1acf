use super::gateway::{DispatchOutcome, GatewayRequest};
use super::payment::{Grant, PaymentId, PaymentRecord, PaymentStatus, RecordId};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Nested-element predicate: a payment due on `due_date` in `status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentMatch {
    pub due_date: String,
    pub status: PaymentStatus,
}

/// Query accepted by [`PaymentStore::find`].
///
/// Every populated field must match. When `payment` is set the returned
/// records are projected down to the matching payments only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub sbi: Option<String>,
    pub frn: Option<String>,
    pub claim_id: Option<String>,
    pub fund_code: Option<String>,
    pub payment: Option<PaymentMatch>,
}

impl RecordFilter {
    pub fn by_sbi(sbi: impl Into<String>) -> Self {
        Self {
            sbi: Some(sbi.into()),
            ..Self::default()
        }
    }

    pub fn with_fund_code(mut self, fund_code: impl Into<String>) -> Self {
        self.fund_code = Some(fund_code.into());
        self
    }

    pub fn with_payment(mut self, due_date: impl Into<String>, status: PaymentStatus) -> Self {
        self.payment = Some(PaymentMatch {
            due_date: due_date.into(),
            status,
        });
        self
    }

    pub fn matches(&self, record: &PaymentRecord) -> bool {
        let owner = &record.business_identifier;
        let field_eq = |want: &Option<String>, have: &str| want.as_deref().is_none_or(|w| w == have);

        if !field_eq(&self.sbi, &owner.sbi)
            || !field_eq(&self.frn, &owner.frn)
            || !field_eq(&self.claim_id, &owner.claim_id)
        {
            return false;
        }

        if let Some(code) = &self.fund_code {
            let has_fund = record
                .payments()
                .flat_map(|p| p.invoice_lines.iter())
                .any(|l| l.fund_code.as_deref() == Some(code.as_str()));
            if !has_fund {
                return false;
            }
        }

        match &self.payment {
            Some(m) => record
                .payments()
                .any(|p| p.due_date == m.due_date && p.status == m.status),
            None => true,
        }
    }

    /// Returns the record as it should appear in a query result, or `None`
    /// when it does not match. Stored data is never modified.
    pub fn project(&self, record: &PaymentRecord) -> Option<PaymentRecord> {
        if !self.matches(record) {
            return None;
        }
        let mut projected = record.clone();
        if let Some(m) = &self.payment {
            projected.retain_payments(|p| p.due_date == m.due_date && p.status == m.status);
        }
        Some(projected)
    }
}

/// Document store holding payment records.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Inserts a new record. Fails if the id is already taken.
    async fn insert(&self, record: PaymentRecord) -> Result<()>;

    /// Appends grants to an existing record.
    async fn append_grants(&self, record_id: &RecordId, grants: Vec<Grant>) -> Result<()>;

    async fn get(&self, record_id: &RecordId) -> Result<Option<PaymentRecord>>;

    async fn find(&self, filter: &RecordFilter) -> Result<Vec<PaymentRecord>>;

    /// Sets the status of one nested payment in a single indivisible step.
    ///
    /// When `expected` is given the write only happens if the payment's
    /// current status equals it. Returns the number of payments modified
    /// (0 or 1).
    async fn update_payment_status(
        &self,
        record_id: &RecordId,
        payment_id: &PaymentId,
        status: PaymentStatus,
        expected: Option<PaymentStatus>,
    ) -> Result<u64>;
}

/// Outbound settlement gateway.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Fails when dispatching cannot work at all (e.g. missing credentials).
    fn check_configuration(&self) -> Result<()>;

    async fn dispatch(&self, request: &GatewayRequest) -> Result<DispatchOutcome>;
}

pub type PaymentStoreHandle = Arc<dyn PaymentStore>;
pub type GatewayHandle = Arc<dyn Gateway>;
