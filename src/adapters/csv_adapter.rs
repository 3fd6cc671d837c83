//! CSV file data adapter.
//!
//! Reads one `<SYMBOL>.csv` per symbol from a base directory with the header
//! `date,open,high,low,close,volume`. Empty price cells are read as NaN so
//! the domain can drop them like any other incomplete bar.

use crate::domain::error::PricecastError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

fn provider_error(symbol: &str, reason: String) -> PricecastError {
    PricecastError::Provider {
        symbol: symbol.to_string(),
        reason,
    }
}

fn field<'r>(
    record: &'r csv::StringRecord,
    index: usize,
    name: &str,
    symbol: &str,
) -> Result<&'r str, PricecastError> {
    record
        .get(index)
        .map(str::trim)
        .ok_or_else(|| provider_error(symbol, format!("missing {} column", name)))
}

fn parse_price(raw: &str, name: &str, symbol: &str) -> Result<f64, PricecastError> {
    if raw.is_empty() {
        return Ok(f64::NAN);
    }
    raw.parse()
        .map_err(|e| provider_error(symbol, format!("invalid {} value {:?}: {}", name, raw, e)))
}

fn parse_volume(raw: &str, symbol: &str) -> Result<i64, PricecastError> {
    if raw.is_empty() {
        return Ok(0);
    }
    // Some exports write volume as a float ("12345.0").
    raw.parse::<i64>()
        .or_else(|_| raw.parse::<f64>().map(|v| v as i64))
        .map_err(|e| provider_error(symbol, format!("invalid volume value {:?}: {}", raw, e)))
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, PricecastError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| {
            provider_error(symbol, format!("failed to read {}: {}", path.display(), e))
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record =
                result.map_err(|e| provider_error(symbol, format!("CSV parse error: {}", e)))?;

            let date_str = field(&record, 0, "date", symbol)?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                provider_error(symbol, format!("invalid date {:?}: {}", date_str, e))
            })?;

            if date < start_date || date > end_date {
                continue;
            }

            bars.push(OhlcvBar {
                date,
                open: parse_price(field(&record, 1, "open", symbol)?, "open", symbol)?,
                high: parse_price(field(&record, 2, "high", symbol)?, "high", symbol)?,
                low: parse_price(field(&record, 3, "low", symbol)?, "low", symbol)?,
                close: parse_price(field(&record, 4, "close", symbol)?, "close", symbol)?,
                volume: parse_volume(field(&record, 5, "volume", symbol)?, symbol)?,
            });
        }

        bars.sort_by_key(|b| b.date);
        tracing::debug!(symbol, %start_date, %end_date, bars = bars.len(), "read csv bars");
        Ok(bars)
    }
}
