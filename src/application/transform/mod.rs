//! Conversion of stored payments into Payment Hub requests.
//!
//! Each source system registers its own [`PaymentTransformer`]. Lookups for
//! a source system without a transformer fail with
//! [`PaymentError::UnsupportedSourceSystem`]; there is no fallback transform.

pub mod fptt;

use crate::domain::gateway::GatewayRequest;
use crate::domain::payment::{Grant, OwnerIdentifiers, Payment};
use crate::error::{PaymentError, Result};
use chrono::NaiveDate;
use std::collections::HashMap;

pub const DEBT_TYPE_MAX_LENGTH: usize = 3;
pub const REMITTANCE_DESCRIPTION_MAX_LENGTH: usize = 60;

pub trait PaymentTransformer: Send + Sync {
    /// The `sourceSystem` tag this transformer handles.
    fn source_system(&self) -> &'static str;

    fn transform(
        &self,
        owner: &OwnerIdentifiers,
        grant: &Grant,
        payment: &Payment,
    ) -> Result<GatewayRequest>;
}

#[derive(Default)]
pub struct TransformerRegistry {
    transformers: HashMap<&'static str, Box<dyn PaymentTransformer>>,
}

impl TransformerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in transformer.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(fptt::FpttTransformer));
        registry
    }

    pub fn register(&mut self, transformer: Box<dyn PaymentTransformer>) {
        self.transformers
            .insert(transformer.source_system(), transformer);
    }

    pub fn get(&self, source_system: &str) -> Result<&dyn PaymentTransformer> {
        self.transformers
            .get(source_system)
            .map(|t| t.as_ref())
            .ok_or_else(|| PaymentError::UnsupportedSourceSystem(source_system.to_string()))
    }

    pub fn transform(
        &self,
        owner: &OwnerIdentifiers,
        grant: &Grant,
        payment: &Payment,
    ) -> Result<GatewayRequest> {
        self.get(&grant.source_system)?
            .transform(owner, grant, payment)
    }
}

pub fn validate_debt_type(debt_type: &str) -> Result<&str> {
    validate_max_length(debt_type, DEBT_TYPE_MAX_LENGTH)
}

pub fn validate_remittance_description(description: &str) -> Result<&str> {
    validate_max_length(description, REMITTANCE_DESCRIPTION_MAX_LENGTH)
}

fn validate_max_length(value: &str, max: usize) -> Result<&str> {
    if value.chars().count() > max {
        return Err(PaymentError::ValidationError(format!(
            "value of {value} must be no more than {max} characters"
        )));
    }
    Ok(value)
}

/// Reformats a `YYYY-MM-DD` date as `DD/MM/YYYY`. A missing date becomes an
/// empty string.
pub fn format_payment_date(date: Option<&str>) -> Result<String> {
    let Some(date) = date else {
        return Ok(String::new());
    };

    let bytes = date.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !well_formed {
        return Err(PaymentError::InvalidDate(format!(
            "must be in YYYY-MM-DD format, got '{date}'"
        )));
    }

    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| PaymentError::InvalidDate(format!("'{date}' is not a calendar date")))?;

    Ok(format!("{}/{}/{}", &date[8..10], &date[5..7], &date[0..4]))
}
