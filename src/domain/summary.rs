//! Reduces a projection to reference/final prices, the percentage move and a
//! BUY/SELL/HOLD label.

use crate::domain::projection::{ProjectionRecord, RecordKind};
use chrono::{Datelike, Weekday};
use std::fmt;

pub const DEFAULT_THRESHOLD_PCT: f64 = 0.5;

/// Rounds half away from zero to two decimals.
pub fn round_price(price: f64) -> f64 {
    (price * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    Buy,
    Sell,
    Hold,
}

impl Recommendation {
    /// Strictly above `threshold_pct` buys, strictly below its negation
    /// sells; anything in between, bounds included, holds.
    pub fn from_move(percent_move: f64, threshold_pct: f64) -> Self {
        if percent_move > threshold_pct {
            Recommendation::Buy
        } else if percent_move < -threshold_pct {
            Recommendation::Sell
        } else {
            Recommendation::Hold
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::Buy => write!(f, "BUY"),
            Recommendation::Sell => write!(f, "SELL"),
            Recommendation::Hold => write!(f, "HOLD"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// Close of the last actual Friday, else the first record's price.
    pub reference_price: f64,
    /// Last predicted price, else the last record's price.
    pub final_price: f64,
    pub difference: f64,
    pub percent_move: f64,
    pub recommendation: Recommendation,
}

impl Summary {
    /// `None` for an empty projection. Prices are rounded to two decimals
    /// before the move is computed, as they are reported.
    pub fn from_records(records: &[ProjectionRecord], threshold_pct: f64) -> Option<Self> {
        let first = records.first()?;
        let last = records.last()?;

        let reference_price = records
            .iter()
            .rev()
            .find(|r| r.kind == RecordKind::Actual && r.date.weekday() == Weekday::Fri)
            .map_or(first.price, |r| r.price);
        let reference_price = round_price(reference_price);
        let final_price = records
            .iter()
            .rev()
            .find(|r| r.kind == RecordKind::Predicted)
            .map_or(last.price, |r| r.price);
        let final_price = round_price(final_price);

        let difference = final_price - reference_price;
        let percent_move = if reference_price == 0.0 {
            0.0
        } else {
            difference / reference_price * 100.0
        };

        Some(Self {
            reference_price,
            final_price,
            difference,
            percent_move,
            recommendation: Recommendation::from_move(percent_move, threshold_pct),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn rec(date: &str, price: f64, kind: RecordKind) -> ProjectionRecord {
        ProjectionRecord {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            price,
            kind,
        }
    }

    #[test]
    fn recommendation_boundaries() {
        assert_eq!(Recommendation::from_move(0.5, 0.5), Recommendation::Hold);
        assert_eq!(Recommendation::from_move(-0.5, 0.5), Recommendation::Hold);
        assert_eq!(Recommendation::from_move(0.50001, 0.5), Recommendation::Buy);
        assert_eq!(Recommendation::from_move(-0.50001, 0.5), Recommendation::Sell);
        assert_eq!(Recommendation::from_move(0.0, 0.5), Recommendation::Hold);
    }

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(round_price(101.234), 101.23);
        assert_eq!(round_price(101.235_1), 101.24);
        assert_eq!(round_price(100.0), 100.0);
    }

    #[test]
    fn move_uses_rounded_prices() {
        // 100.504 alone would be a +0.504% move; rounded it sits on the bound
        let records = vec![
            rec("2025-06-20", 100.0, RecordKind::Actual),
            rec("2025-06-23", 100.504, RecordKind::Predicted),
        ];
        let summary = Summary::from_records(&records, DEFAULT_THRESHOLD_PCT).unwrap();
        assert_eq!(summary.final_price, 100.5);
        assert_relative_eq!(summary.difference, 0.5);
        assert_relative_eq!(summary.percent_move, 0.5);
        assert_eq!(summary.recommendation, Recommendation::Hold);

        let records = vec![
            rec("2025-06-20", 100.0, RecordKind::Actual),
            rec("2025-06-23", 99.496, RecordKind::Predicted),
        ];
        let summary = Summary::from_records(&records, DEFAULT_THRESHOLD_PCT).unwrap();
        assert_eq!(summary.final_price, 99.5);
        assert_eq!(summary.recommendation, Recommendation::Hold);
    }

    #[test]
    fn recommendation_display() {
        assert_eq!(Recommendation::Buy.to_string(), "BUY");
        assert_eq!(Recommendation::Sell.to_string(), "SELL");
        assert_eq!(Recommendation::Hold.to_string(), "HOLD");
    }

    #[test]
    fn reference_is_last_actual_friday() {
        // 2025-06-13 and 2025-06-20 are Fridays
        let records = vec![
            rec("2025-06-13", 100.0, RecordKind::Actual),
            rec("2025-06-16", 101.0, RecordKind::Actual),
            rec("2025-06-20", 102.0, RecordKind::Actual),
            rec("2025-06-23", 104.0, RecordKind::Predicted),
        ];
        let summary = Summary::from_records(&records, DEFAULT_THRESHOLD_PCT).unwrap();
        assert_relative_eq!(summary.reference_price, 102.0);
        assert_relative_eq!(summary.final_price, 104.0);
        assert_relative_eq!(summary.difference, 2.0);
        assert_relative_eq!(summary.percent_move, 2.0 / 102.0 * 100.0);
        assert_eq!(summary.recommendation, Recommendation::Buy);
    }

    #[test]
    fn predicted_friday_is_not_a_reference() {
        let records = vec![
            rec("2025-06-18", 100.0, RecordKind::Actual),
            rec("2025-06-20", 90.0, RecordKind::Predicted),
        ];
        let summary = Summary::from_records(&records, DEFAULT_THRESHOLD_PCT).unwrap();
        assert_relative_eq!(summary.reference_price, 100.0);
        assert_relative_eq!(summary.final_price, 90.0);
        assert_eq!(summary.recommendation, Recommendation::Sell);
    }

    #[test]
    fn all_actual_falls_back_to_last_record() {
        let records = vec![
            rec("2025-06-16", 100.0, RecordKind::Actual),
            rec("2025-06-17", 100.2, RecordKind::Actual),
        ];
        let summary = Summary::from_records(&records, DEFAULT_THRESHOLD_PCT).unwrap();
        assert_relative_eq!(summary.reference_price, 100.0);
        assert_relative_eq!(summary.final_price, 100.2);
        assert_eq!(summary.recommendation, Recommendation::Hold);
    }

    #[test]
    fn zero_reference_does_not_divide() {
        let records = vec![rec("2025-06-16", 0.0, RecordKind::Actual)];
        let summary = Summary::from_records(&records, DEFAULT_THRESHOLD_PCT).unwrap();
        assert_eq!(summary.percent_move, 0.0);
        assert_eq!(summary.recommendation, Recommendation::Hold);
    }

    #[test]
    fn empty_records_have_no_summary() {
        assert!(Summary::from_records(&[], DEFAULT_THRESHOLD_PCT).is_none());
    }
}
