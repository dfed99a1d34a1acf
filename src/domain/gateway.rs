use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Canonical payment instruction accepted by the Payment Hub.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GatewayRequest {
    pub source_system: String,
    pub ledger: String,
    pub delivery_body: String,
    pub invoice_number: String,
    pub frn: String,
    pub sbi: String,
    pub fes_code: String,
    pub marketing_year: u16,
    pub payment_request_number: u32,
    pub agreement_number: String,
    pub contract_number: String,
    pub currency: String,
    pub due_date: String,
    pub value: Decimal,
    pub annual_value: Decimal,
    pub remittance_description: String,
    pub debt_type: String,
    pub recovery_date: String,
    pub original_invoice_number: String,
    pub original_settlement_date: String,
    pub invoice_lines: Vec<GatewayInvoiceLine>,
    pub correlation_id: String,
    pub schedule: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GatewayInvoiceLine {
    pub scheme_code: String,
    pub account_code: String,
    pub fund_code: String,
    pub agreement_number: String,
    pub description: String,
    pub value: Decimal,
    pub delivery_body: String,
    pub marketing_year: u16,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum DispatchStatus {
    /// The hub accepted the request.
    Success,
    /// Dispatch is disabled; nothing left the process.
    Warning,
}

/// Result of handing one request to the gateway.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOutcome {
    pub status: DispatchStatus,
    pub message: String,
    pub body: GatewayRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_status: Option<u16>,
}

impl DispatchOutcome {
    pub fn sent(body: GatewayRequest, response_status: u16) -> Self {
        Self {
            status: DispatchStatus::Success,
            message: "Payload sent to payment hub successfully".to_string(),
            body,
            response_status: Some(response_status),
        }
    }

    pub fn disabled(body: GatewayRequest) -> Self {
        Self {
            status: DispatchStatus::Warning,
            message: "Payment Hub feature flag is disabled. Payload that would have been sent"
                .to_string(),
            body,
            response_status: None,
        }
    }
}
