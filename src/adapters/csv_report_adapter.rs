//! CSV export of the projected price table.

use crate::domain::error::PricecastError;
use crate::domain::forecast::ForecastOutcome;
use crate::domain::summary::round_price;
use crate::ports::report_port::ReportPort;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
struct ReportRow {
    date: String,
    price: f64,
    kind: String,
}

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, outcome: &ForecastOutcome, output_path: &Path) -> Result<(), PricecastError> {
        let mut writer = csv::Writer::from_path(output_path)?;
        for record in &outcome.records {
            writer.serialize(ReportRow {
                date: record.date.format("%Y-%m-%d").to_string(),
                price: round_price(record.price),
                kind: record.kind.to_string(),
            })?;
        }
        writer.flush()?;
        tracing::info!(
            path = %output_path.display(),
            rows = outcome.records.len(),
            "wrote forecast report"
        );
        Ok(())
    }
}
