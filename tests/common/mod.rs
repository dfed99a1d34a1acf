#![allow(dead_code)]

use async_trait::async_trait;
use grant_payments::domain::gateway::{DispatchOutcome, GatewayRequest};
use grant_payments::domain::payment::{
    Grant, InvoiceLine, OwnerIdentifiers, Payment, PaymentId, PaymentRecord, PaymentStatus,
    RecordId,
};
use grant_payments::domain::ports::{Gateway, PaymentStore, RecordFilter};
use grant_payments::error::{PaymentError, Result};
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

pub const DUE: &str = "2026-06-05";

pub fn payment(id: &str, due_date: &str) -> Payment {
    Payment {
        id: PaymentId::new(id),
        due_date: due_date.to_string(),
        currency: None,
        recovery_date: None,
        original_settlement_date: None,
        invoice_lines: vec![InvoiceLine {
            scheme_code: "SFI23".to_string(),
            account_code: None,
            fund_code: None,
            description: "G00 - Gross value of claim".to_string(),
            amount: dec!(250.00),
        }],
        status: PaymentStatus::Pending,
    }
}

pub fn grant(source_system: &str, invoice_number: &str, payments: Vec<Payment>) -> Grant {
    Grant {
        source_system: source_system.to_string(),
        payment_request_number: 1,
        correlation_id: format!("corr-{invoice_number}"),
        invoice_number: invoice_number.to_string(),
        original_invoice_number: format!("O{invoice_number}"),
        agreement_number: "AGR-1".to_string(),
        total_amount: dec!(250.00),
        currency: "GBP".to_string(),
        marketing_year: Some(2026),
        recovery_date: None,
        original_settlement_date: None,
        remittance_description: None,
        payments,
    }
}

pub fn record(id: &str, sbi: &str, grants: Vec<Grant>) -> PaymentRecord {
    PaymentRecord {
        id: RecordId::new(id),
        business_identifier: OwnerIdentifiers {
            sbi: sbi.to_string(),
            frn: format!("frn-{sbi}"),
            claim_id: format!("claim-{sbi}"),
        },
        grants,
    }
}

pub async fn status_of(store: &dyn PaymentStore, record_id: &str, payment_id: &str) -> PaymentStatus {
    store
        .get(&RecordId::new(record_id))
        .await
        .unwrap()
        .unwrap()
        .payment(&PaymentId::new(payment_id))
        .unwrap()
        .status
}

/// Gateway double that records dispatches per invoice number.
#[derive(Default)]
pub struct RecordingGateway {
    dispatched: Mutex<HashMap<String, usize>>,
    failing_invoices: HashSet<String>,
    delay: Option<Duration>,
    misconfigured: bool,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, invoice_number: &str) -> Self {
        self.failing_invoices.insert(invoice_number.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn misconfigured(mut self) -> Self {
        self.misconfigured = true;
        self
    }

    pub fn dispatch_count(&self, invoice_number: &str) -> usize {
        self.dispatched
            .lock()
            .unwrap()
            .get(invoice_number)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_dispatches(&self) -> usize {
        self.dispatched.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl Gateway for RecordingGateway {
    fn check_configuration(&self) -> Result<()> {
        if self.misconfigured {
            return Err(PaymentError::Configuration(
                "Payment Hub key name or key is not set".to_string(),
            ));
        }
        Ok(())
    }

    async fn dispatch(&self, request: &GatewayRequest) -> Result<DispatchOutcome> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        *self
            .dispatched
            .lock()
            .unwrap()
            .entry(request.invoice_number.clone())
            .or_default() += 1;

        if self.failing_invoices.contains(&request.invoice_number) {
            return Err(PaymentError::DispatchFailed("500 Internal Server Error".to_string()));
        }
        Ok(DispatchOutcome::sent(request.clone(), 201))
    }
}

/// Store whose queries always fail.
pub struct UnavailableStore;

#[async_trait]
impl PaymentStore for UnavailableStore {
    async fn insert(&self, _record: PaymentRecord) -> Result<()> {
        Err(unavailable())
    }

    async fn append_grants(&self, _record_id: &RecordId, _grants: Vec<Grant>) -> Result<()> {
        Err(unavailable())
    }

    async fn get(&self, _record_id: &RecordId) -> Result<Option<PaymentRecord>> {
        Err(unavailable())
    }

    async fn find(&self, _filter: &RecordFilter) -> Result<Vec<PaymentRecord>> {
        Err(unavailable())
    }

    async fn update_payment_status(
        &self,
        _record_id: &RecordId,
        _payment_id: &PaymentId,
        _status: PaymentStatus,
        _expected: Option<PaymentStatus>,
    ) -> Result<u64> {
        Err(unavailable())
    }
}

fn unavailable() -> PaymentError {
    PaymentError::StoreError("connection refused".to_string())
}
