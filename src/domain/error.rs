//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for pricecast.
#[derive(Debug, thiserror::Error)]
pub enum PricecastError {
    #[error("invalid date range: end date {end} must be after start date {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("symbol must not be empty")]
    EmptySymbol,

    #[error("data provider error for {symbol}: {reason}")]
    Provider { symbol: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("insufficient data for {symbol}: have {rows} complete rows, need {minimum}")]
    InsufficientData {
        symbol: String,
        rows: usize,
        minimum: usize,
    },

    #[error("model error: {reason}")]
    Model { reason: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&PricecastError> for std::process::ExitCode {
    fn from(err: &PricecastError) -> Self {
        let code: u8 = match err {
            PricecastError::Io(_) | PricecastError::Csv(_) => 1,
            PricecastError::InvalidRange { .. }
            | PricecastError::EmptySymbol
            | PricecastError::ConfigParse { .. }
            | PricecastError::ConfigMissing { .. }
            | PricecastError::ConfigInvalid { .. } => 2,
            PricecastError::Provider { .. } => 3,
            PricecastError::InsufficientData { .. } => 5,
            PricecastError::Model { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
