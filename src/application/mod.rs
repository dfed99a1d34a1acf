//! Application layer containing the payment processing pipeline.
//!
//! `DailyPaymentProcessor` is the entry point for a settlement run. It uses
//! the finder, status and transform modules and fans the due payments out
//! over `tokio` tasks. `IngestHandler` feeds new records into the store.

pub mod finder;
pub mod ingest;
pub mod processor;
pub mod status;
pub mod transform;
