//! Report export port trait.

use crate::domain::error::PricecastError;
use crate::domain::forecast::ForecastOutcome;
use std::path::Path;

/// Port for persisting the projected price table of a forecast run.
pub trait ReportPort {
    fn write(&self, outcome: &ForecastOutcome, output_path: &Path) -> Result<(), PricecastError>;
}
