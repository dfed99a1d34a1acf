//! Adapters for the domain ports: payment record stores and the Payment Hub.

pub mod in_memory;
pub mod payment_hub;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod token_cache;
