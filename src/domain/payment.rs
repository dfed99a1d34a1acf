use crate::error::PaymentError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Identifier of a persisted payment record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

/// Identifier of a payment, unique only within its owning record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(pub String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl PaymentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of a single payment.
///
/// Transitions only move forward: `Pending -> Locked -> {Submitted | Failed}`.
/// `Cancelled` is set outside this service and never touched by it.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Locked,
    Cancelled,
    Submitted,
    Failed,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Locked => "locked",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Submitted => "submitted",
            PaymentStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// The account identity owning a payment record.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OwnerIdentifiers {
    pub sbi: String,
    pub frn: String,
    pub claim_id: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLine {
    pub scheme_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fund_code: Option<String>,
    pub description: String,
    pub amount: Decimal,
}

/// A single scheduled payment. Dates are kept as the raw `YYYY-MM-DD`
/// strings they were persisted with and only validated on transform.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// Assigned on ingestion when the inbound message carries none.
    #[serde(default = "PaymentId::generate")]
    pub id: PaymentId,
    pub due_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_settlement_date: Option<String>,
    #[serde(default)]
    pub invoice_lines: Vec<InvoiceLine>,
    #[serde(default)]
    pub status: PaymentStatus,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Grant {
    pub source_system: String,
    pub payment_request_number: u32,
    pub correlation_id: String,
    pub invoice_number: String,
    pub original_invoice_number: String,
    pub agreement_number: String,
    pub total_amount: Decimal,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marketing_year: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_settlement_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remittance_description: Option<String>,
    #[serde(default)]
    pub payments: Vec<Payment>,
}

/// A persisted document: one owner, many grants, each with nested payments.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: RecordId,
    pub business_identifier: OwnerIdentifiers,
    #[serde(default)]
    pub grants: Vec<Grant>,
}

impl PaymentRecord {
    pub fn payments(&self) -> impl Iterator<Item = &Payment> {
        self.grants.iter().flat_map(|g| g.payments.iter())
    }

    pub fn payment(&self, payment_id: &PaymentId) -> Option<&Payment> {
        self.payments().find(|p| &p.id == payment_id)
    }

    pub fn payment_mut(&mut self, payment_id: &PaymentId) -> Option<&mut Payment> {
        self.grants
            .iter_mut()
            .flat_map(|g| g.payments.iter_mut())
            .find(|p| &p.id == payment_id)
    }

    /// Appends grants, rejecting any payment id already present in the record.
    pub fn append_grants(&mut self, grants: Vec<Grant>) -> Result<(), PaymentError> {
        let mut seen: HashSet<&PaymentId> = self.payments().map(|p| &p.id).collect();
        for payment in grants.iter().flat_map(|g| g.payments.iter()) {
            if !seen.insert(&payment.id) {
                return Err(PaymentError::ValidationError(format!(
                    "payment id {} is not unique within record {}",
                    payment.id, self.id
                )));
            }
        }
        self.grants.extend(grants);
        Ok(())
    }

    /// Drops every nested payment not matching `keep`. Grants left without
    /// payments stay in place with an empty list.
    pub fn retain_payments<F>(&mut self, mut keep: F)
    where
        F: FnMut(&Payment) -> bool,
    {
        for grant in &mut self.grants {
            grant.payments.retain(&mut keep);
        }
    }

    /// Splits the record into independent per-payment work items. Owner and
    /// grant context are shared between the items of the same record.
    pub fn into_due_items(self) -> Vec<DueItem> {
        let owner = Arc::new(self.business_identifier);
        let mut items = Vec::new();
        for mut grant in self.grants {
            let payments = std::mem::take(&mut grant.payments);
            let grant = Arc::new(grant);
            for payment in payments {
                items.push(DueItem {
                    record_id: self.id.clone(),
                    owner: Arc::clone(&owner),
                    grant: Arc::clone(&grant),
                    payment,
                });
            }
        }
        items
    }
}

/// One payment ready to be pushed through the processing pipeline.
///
/// `grant` is the owning grant with its payment list emptied.
#[derive(Debug, Clone)]
pub struct DueItem {
    pub record_id: RecordId,
    pub owner: Arc<OwnerIdentifiers>,
    pub grant: Arc<Grant>,
    pub payment: Payment,
}
