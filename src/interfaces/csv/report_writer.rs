use crate::application::processor::RunReport;
use crate::domain::gateway::DispatchStatus;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct ReportRow<'a> {
    date: String,
    record_id: &'a str,
    payment_id: &'a str,
    outcome: &'static str,
    invoice_number: &'a str,
    response_status: Option<u16>,
}

/// Writes one CSV row per processed payment.
///
/// `outcome` is `success` or `warning` for dispatched items and `none` for
/// items that were skipped or failed.
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_report(&mut self, report: &RunReport) -> Result<()> {
        let date = report.date.format("%Y-%m-%d").to_string();
        for item in &report.items {
            let (outcome, invoice_number, response_status) = match &item.result {
                Some(result) => (
                    match result.status {
                        DispatchStatus::Success => "success",
                        DispatchStatus::Warning => "warning",
                    },
                    result.body.invoice_number.as_str(),
                    result.response_status,
                ),
                None => ("none", "", None),
            };
            self.writer.serialize(ReportRow {
                date: date.clone(),
                record_id: &item.record_id.0,
                payment_id: &item.payment_id.0,
                outcome,
                invoice_number,
                response_status,
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
