//! Inbound `create_payment` messages.
//!
//! Each message body is a JSON payment record. A record for an owner that
//! already exists is extended with the message's grants; otherwise a new
//! record is created. The handler only reports success or failure per
//! message; redelivery is the queue client's business.

use crate::domain::payment::{Grant, OwnerIdentifiers, PaymentRecord, PaymentStatus, RecordId};
use crate::domain::ports::{PaymentStoreHandle, RecordFilter};
use crate::error::{PaymentError, Result};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InboundRecord {
    #[serde(default)]
    id: Option<RecordId>,
    business_identifier: OwnerIdentifiers,
    #[serde(default)]
    grants: Vec<Grant>,
}

/// A raw message as delivered by the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub id: String,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestAction {
    Created,
    Extended,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestOutcome {
    pub record_id: RecordId,
    pub action: IngestAction,
    pub payments: usize,
}

/// Pass/fail verdict for one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageReport {
    pub message_id: String,
    pub passed: bool,
    /// `false` for messages that can never succeed and should not be redelivered.
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<IngestOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Errors caused by the message itself rather than by the environment.
pub fn is_permanent(err: &PaymentError) -> bool {
    matches!(
        err,
        PaymentError::MalformedMessage(_) | PaymentError::ValidationError(_)
    )
}

/// New payments enter as `pending`, or `cancelled` when withdrawn upstream.
/// Every other status is reached only through a run.
fn check_initial_statuses(grants: &[Grant]) -> Result<()> {
    let invalid = grants
        .iter()
        .flat_map(|g| g.payments.iter())
        .find(|p| !matches!(p.status, PaymentStatus::Pending | PaymentStatus::Cancelled));
    match invalid {
        Some(payment) => Err(PaymentError::ValidationError(format!(
            "payment {} cannot be created with status {}",
            payment.id, payment.status
        ))),
        None => Ok(()),
    }
}

pub struct IngestHandler {
    store: PaymentStoreHandle,
}

impl IngestHandler {
    pub fn new(store: PaymentStoreHandle) -> Self {
        Self { store }
    }

    pub async fn handle(&self, message_id: &str, body: &str) -> Result<IngestOutcome> {
        if body.trim().is_empty() {
            return Err(PaymentError::MalformedMessage(
                "message missing body".to_string(),
            ));
        }
        let inbound: InboundRecord = serde_json::from_str(body)
            .map_err(|e| PaymentError::MalformedMessage(format!("invalid message format: {e}")))?;

        let owner = inbound.business_identifier;
        info!(message_id, sbi = %owner.sbi, "Received create_payment message");
        check_initial_statuses(&inbound.grants)?;

        let payments = inbound.grants.iter().map(|g| g.payments.len()).sum();
        let filter = RecordFilter {
            sbi: Some(owner.sbi.clone()),
            frn: Some(owner.frn.clone()),
            claim_id: Some(owner.claim_id.clone()),
            ..RecordFilter::default()
        };

        if let Some(existing) = self.store.find(&filter).await?.into_iter().next() {
            self.store.append_grants(&existing.id, inbound.grants).await?;
            return Ok(IngestOutcome {
                record_id: existing.id,
                action: IngestAction::Extended,
                payments,
            });
        }

        let record_id = inbound.id.unwrap_or_else(RecordId::generate);
        if self.store.get(&record_id).await?.is_some() {
            return Err(PaymentError::ValidationError(format!(
                "record id {record_id} already belongs to another owner"
            )));
        }

        let mut record = PaymentRecord {
            id: record_id.clone(),
            business_identifier: owner,
            grants: Vec::new(),
        };
        record.append_grants(inbound.grants)?;
        self.store.insert(record).await?;

        Ok(IngestOutcome {
            record_id,
            action: IngestAction::Created,
            payments,
        })
    }

    /// Handles messages one after another, never stopping on a failure.
    pub async fn ingest_batch<I>(&self, messages: I) -> Vec<MessageReport>
    where
        I: IntoIterator<Item = InboundMessage>,
    {
        let mut reports = Vec::new();
        for message in messages {
            let report = match self.handle(&message.id, &message.body).await {
                Ok(outcome) => {
                    info!(
                        message_id = %message.id,
                        record_id = %outcome.record_id,
                        payments = outcome.payments,
                        "Stored payment record"
                    );
                    MessageReport {
                        message_id: message.id,
                        passed: true,
                        retryable: false,
                        outcome: Some(outcome),
                        error: None,
                    }
                }
                Err(e) => {
                    let retryable = !is_permanent(&e);
                    if retryable {
                        error!(message_id = %message.id, error = %e, "Failed to handle message");
                    } else {
                        warn!(message_id = %message.id, error = %e, "Rejected message");
                    }
                    MessageReport {
                        message_id: message.id,
                        passed: false,
                        retryable,
                        outcome: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            reports.push(report);
        }
        reports
    }
}
