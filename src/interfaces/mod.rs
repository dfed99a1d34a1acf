//! Outer adapters: reading inbound messages and writing run reports.

pub mod csv;
pub mod jsonl;
