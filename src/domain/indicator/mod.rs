//! Technical indicators over daily closes.
//!
//! Every indicator returns an `IndicatorSeries` aligned one-to-one with the
//! input bars. Points inside an indicator's warmup carry `valid: false`.

pub mod ema;
pub mod macd;
pub mod roc;
pub mod rsi;
pub mod sma;
pub mod stddev;

pub use ema::calculate_ema;
pub use macd::calculate_macd_line;
pub use roc::calculate_pct_change;
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;
pub use stddev::calculate_stddev;

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: f64,
}

impl IndicatorPoint {
    pub fn invalid(date: NaiveDate) -> Self {
        Self {
            date,
            valid: false,
            value: 0.0,
        }
    }

    pub fn valid(date: NaiveDate, value: f64) -> Self {
        Self {
            date,
            valid: true,
            value,
        }
    }

    /// `Some(value)` once past warmup.
    pub fn get(&self) -> Option<f64> {
        self.valid.then_some(self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Stddev(usize),
    PctChange,
    MacdLine { fast: usize, slow: usize },
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn empty(indicator_type: IndicatorType) -> Self {
        Self {
            indicator_type,
            values: Vec::new(),
        }
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).and_then(IndicatorPoint::get)
    }

    /// Index of the first valid point, if any.
    pub fn first_valid(&self) -> Option<usize> {
        self.values.iter().position(|p| p.valid)
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Stddev(period) => write!(f, "STDDEV({})", period),
            IndicatorType::PctChange => write!(f, "PCT_CHANGE"),
            IndicatorType::MacdLine { fast, slow } => write!(f, "MACD({},{})", fast, slow),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_type_display() {
        assert_eq!(IndicatorType::Sma(5).to_string(), "SMA(5)");
        assert_eq!(IndicatorType::Rsi(14).to_string(), "RSI(14)");
        assert_eq!(
            IndicatorType::MacdLine { fast: 12, slow: 26 }.to_string(),
            "MACD(12,26)"
        );
        assert_eq!(IndicatorType::PctChange.to_string(), "PCT_CHANGE");
    }

    #[test]
    fn point_get_respects_validity() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(IndicatorPoint::invalid(date).get(), None);
        assert_eq!(IndicatorPoint::valid(date, 3.5).get(), Some(3.5));
    }

    #[test]
    fn series_first_valid() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let series = IndicatorSeries {
            indicator_type: IndicatorType::Sma(2),
            values: vec![IndicatorPoint::invalid(date), IndicatorPoint::valid(date, 1.0)],
        };
        assert_eq!(series.first_valid(), Some(1));
        assert_eq!(series.get(0), None);
        assert_eq!(series.get(1), Some(1.0));
        assert_eq!(series.get(7), None);
    }
}
