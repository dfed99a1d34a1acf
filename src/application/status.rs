//! Payment status transitions.
//!
//! Every move out of `pending` goes through [`try_transition`], a single
//! conditional store write. Among concurrent callers expecting the same
//! status at most one observes `true`; that caller owns the payment and is
//! the only one allowed to call [`set_status`] for it afterwards.

use crate::domain::payment::{PaymentId, PaymentStatus, RecordId};
use crate::domain::ports::PaymentStore;
use crate::error::Result;
use tracing::{error, info};

/// Moves a payment from `expected` to `status`. Returns `false` when the
/// payment was no longer in `expected`, which is not an error.
pub async fn try_transition(
    store: &dyn PaymentStore,
    record_id: &RecordId,
    payment_id: &PaymentId,
    status: PaymentStatus,
    expected: PaymentStatus,
) -> Result<bool> {
    let modified = store
        .update_payment_status(record_id, payment_id, status, Some(expected))
        .await
        .inspect_err(|e| {
            error!(%record_id, %payment_id, %status, error = %e, "Failed to update payment status");
        })?;

    if modified > 0 {
        info!(%record_id, %payment_id, from = %expected, to = %status, "Updated payment status");
    }
    Ok(modified > 0)
}

/// Unconditionally records a terminal status for a payment held by the caller.
pub async fn set_status(
    store: &dyn PaymentStore,
    record_id: &RecordId,
    payment_id: &PaymentId,
    status: PaymentStatus,
) -> Result<()> {
    store
        .update_payment_status(record_id, payment_id, status, None)
        .await
        .inspect_err(|e| {
            error!(%record_id, %payment_id, %status, error = %e, "Failed to update payment status");
        })?;

    info!(%record_id, %payment_id, %status, "Updated payment status");
    Ok(())
}
