use super::{PaymentTransformer, format_payment_date, validate_debt_type, validate_remittance_description};
use crate::domain::gateway::{GatewayInvoiceLine, GatewayRequest};
use crate::domain::payment::{Grant, OwnerIdentifiers, Payment};
use crate::error::Result;
use chrono::Datelike;

pub const SOURCE_SYSTEM: &str = "FPTT";
const LEDGER: &str = "AP";
const DELIVERY_BODY: &str = "RP00";
const FES_CODE: &str = "FALS_FPTT";
const SCHEDULE: &str = "T4";
const DEBT_TYPE: &str = "";
const DEFAULT_CURRENCY: &str = "GBP";
const DEFAULT_ACCOUNT_CODE: &str = "SOS710";
const DEFAULT_FUND_CODE: &str = "DRD10";
const DEFAULT_REMITTANCE_DESCRIPTION: &str = "Farm Payments Technical Test Payment";

/// Farm Payments Technical Test payments.
pub struct FpttTransformer;

impl PaymentTransformer for FpttTransformer {
    fn source_system(&self) -> &'static str {
        SOURCE_SYSTEM
    }

    fn transform(
        &self,
        owner: &OwnerIdentifiers,
        grant: &Grant,
        payment: &Payment,
    ) -> Result<GatewayRequest> {
        let marketing_year = grant
            .marketing_year
            .unwrap_or_else(|| chrono::Local::now().year() as u16);
        let remittance_description = validate_remittance_description(
            grant
                .remittance_description
                .as_deref()
                .unwrap_or(DEFAULT_REMITTANCE_DESCRIPTION),
        )?;
        let recovery_date = payment.recovery_date.as_ref().or(grant.recovery_date.as_ref());
        let original_settlement_date = payment
            .original_settlement_date
            .as_ref()
            .or(grant.original_settlement_date.as_ref());

        let invoice_lines = payment
            .invoice_lines
            .iter()
            .map(|line| GatewayInvoiceLine {
                scheme_code: line.scheme_code.clone(),
                account_code: line
                    .account_code
                    .clone()
                    .unwrap_or_else(|| DEFAULT_ACCOUNT_CODE.to_string()),
                fund_code: line
                    .fund_code
                    .clone()
                    .unwrap_or_else(|| DEFAULT_FUND_CODE.to_string()),
                agreement_number: grant.agreement_number.clone(),
                description: line.description.clone(),
                value: line.amount,
                delivery_body: DELIVERY_BODY.to_string(),
                marketing_year,
            })
            .collect();

        Ok(GatewayRequest {
            source_system: SOURCE_SYSTEM.to_string(),
            ledger: LEDGER.to_string(),
            delivery_body: DELIVERY_BODY.to_string(),
            invoice_number: grant.invoice_number.clone(),
            frn: owner.frn.clone(),
            sbi: owner.sbi.clone(),
            fes_code: FES_CODE.to_string(),
            marketing_year,
            payment_request_number: grant.payment_request_number,
            agreement_number: grant.agreement_number.clone(),
            contract_number: owner.claim_id.clone(),
            currency: payment
                .currency
                .clone()
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            due_date: format_payment_date(Some(&payment.due_date))?,
            value: grant.total_amount,
            annual_value: grant.total_amount,
            remittance_description: remittance_description.to_string(),
            debt_type: validate_debt_type(DEBT_TYPE)?.to_string(),
            recovery_date: format_payment_date(recovery_date.map(String::as_str))?,
            original_invoice_number: grant.original_invoice_number.clone(),
            original_settlement_date: format_payment_date(
                original_settlement_date.map(String::as_str),
            )?,
            invoice_lines,
            correlation_id: grant.correlation_id.clone(),
            schedule: SCHEDULE.to_string(),
        })
    }
}
