//! Domain model: payment records, the gateway wire format, and the ports
//! the application layer talks through.

pub mod gateway;
pub mod payment;
pub mod ports;
