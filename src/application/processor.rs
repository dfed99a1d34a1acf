use super::finder::find_due_payments;
use super::status::{set_status, try_transition};
use super::transform::TransformerRegistry;
use crate::domain::gateway::{DispatchOutcome, DispatchStatus};
use crate::domain::payment::{DueItem, PaymentId, PaymentRecord, PaymentStatus, RecordId};
use crate::domain::ports::{GatewayHandle, PaymentStoreHandle};
use crate::error::{PaymentError, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Outcome of one payment within a run. `result` is `None` when the payment
/// was skipped (claimed elsewhere) or failed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemReport {
    pub record_id: RecordId,
    pub payment_id: PaymentId,
    pub result: Option<DispatchOutcome>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub date: NaiveDate,
    pub items: Vec<ItemReport>,
}

impl RunReport {
    /// Per-item results, positionally aligned with the processed items.
    pub fn results(&self) -> Vec<Option<DispatchOutcome>> {
        self.items.iter().map(|i| i.result.clone()).collect()
    }
}

/// Runs the daily settlement of due payments.
///
/// A run fetches every pending payment due on the run date and pushes each
/// one through its own task: lock, transform, dispatch, record. Items never
/// see each other's failures, and the `pending -> locked` claim guarantees a
/// payment is dispatched at most once even when runs overlap.
pub struct DailyPaymentProcessor {
    pipeline: ItemPipeline,
    concurrency: Option<usize>,
}

impl DailyPaymentProcessor {
    pub fn new(
        store: PaymentStoreHandle,
        gateway: GatewayHandle,
        transformers: Arc<TransformerRegistry>,
    ) -> Self {
        Self {
            pipeline: ItemPipeline {
                store,
                gateway,
                transformers,
            },
            concurrency: None,
        }
    }

    /// Caps the number of item pipelines running at once.
    pub fn with_concurrency(mut self, limit: Option<usize>) -> Self {
        self.concurrency = limit;
        self
    }

    /// Processes payments due on `date` (today when `None`).
    ///
    /// Fails only for run-wide problems: gateway misconfiguration or a failed
    /// store query. Per-payment failures end up as `None` results.
    pub async fn process(&self, date: Option<NaiveDate>) -> Result<RunReport> {
        let date = date.unwrap_or_else(|| chrono::Local::now().date_naive());
        info!(%date, "Processing daily payments");

        self.pipeline.gateway.check_configuration().inspect_err(|e| {
            error!(%date, error = %e, "Payment hub is not configured, aborting run");
        })?;

        let mut records = find_due_payments(
            self.pipeline.store.as_ref(),
            date,
            PaymentStatus::Pending,
        )
        .await
        .inspect_err(|e| {
            error!(%date, error = %e, "Failed to query grant payments");
        })?;
        info!(%date, count = records.len(), "Found payment record(s) matching due date");

        records.sort_by(|a, b| a.id.cmp(&b.id));
        let items: Vec<DueItem> = records
            .into_iter()
            .flat_map(PaymentRecord::into_due_items)
            .collect();

        let results = self.run_all(&items).await;

        let items = items
            .into_iter()
            .zip(results)
            .map(|(item, result)| ItemReport {
                record_id: item.record_id,
                payment_id: item.payment.id,
                result,
            })
            .collect();
        Ok(RunReport { date, items })
    }

    async fn run_all(&self, items: &[DueItem]) -> Vec<Option<DispatchOutcome>> {
        let limiter = self.concurrency.map(|n| Arc::new(Semaphore::new(n.max(1))));
        let mut tasks = JoinSet::new();

        for (index, item) in items.iter().cloned().enumerate() {
            let pipeline = self.pipeline.clone();
            let limiter = limiter.clone();
            tasks.spawn(async move {
                let _permit = match limiter {
                    Some(limiter) => limiter.acquire_owned().await.ok(),
                    None => None,
                };
                (index, pipeline.run(item).await)
            });
        }

        let mut results = vec![None; items.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => results[index] = outcome,
                Err(e) => error!(error = %e, "Payment pipeline task did not complete"),
            }
        }
        results
    }
}

#[derive(Clone)]
struct ItemPipeline {
    store: PaymentStoreHandle,
    gateway: GatewayHandle,
    transformers: Arc<TransformerRegistry>,
}

impl ItemPipeline {
    async fn run(&self, item: DueItem) -> Option<DispatchOutcome> {
        let DueItem {
            record_id,
            owner,
            grant,
            payment,
        } = item;
        let payment_id = &payment.id;
        let store = self.store.as_ref();

        match try_transition(store, &record_id, payment_id, PaymentStatus::Locked, PaymentStatus::Pending)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                info!(%record_id, %payment_id, "Payment already claimed by another run, skipping");
                return None;
            }
            Err(e) => {
                error!(%record_id, %payment_id, error = %e, "Failed to lock payment");
                return None;
            }
        }

        let request = match self.transformers.transform(&owner, &grant, &payment) {
            Ok(request) => request,
            Err(e @ PaymentError::UnsupportedSourceSystem(_)) => {
                error!(%record_id, %payment_id, error = %e, "No transformer for payment source system");
                self.mark_failed(&record_id, payment_id).await;
                return None;
            }
            Err(e) => {
                error!(%record_id, %payment_id, error = %e, "Failed to transform payment");
                self.mark_failed(&record_id, payment_id).await;
                return None;
            }
        };

        match self.gateway.dispatch(&request).await {
            Ok(outcome) => {
                if outcome.status == DispatchStatus::Warning {
                    warn!(%record_id, %payment_id, "Payment hub disabled, marking payment submitted without sending");
                }
                // The hub already has the payment; a failed write leaves it
                // locked so it is never picked up again.
                if let Err(e) =
                    set_status(store, &record_id, payment_id, PaymentStatus::Submitted).await
                {
                    error!(
                        %record_id,
                        %payment_id,
                        error = %e,
                        "Payment dispatched but not recorded as submitted, left locked"
                    );
                }
                Some(outcome)
            }
            Err(e) => {
                error!(%record_id, %payment_id, error = %e, "PaymentHub request failed");
                self.mark_failed(&record_id, payment_id).await;
                None
            }
        }
    }

    async fn mark_failed(&self, record_id: &RecordId, payment_id: &PaymentId) {
        // Errors are logged by set_status; the item is already a failure.
        let _ = set_status(self.store.as_ref(), record_id, payment_id, PaymentStatus::Failed).await;
    }
}
