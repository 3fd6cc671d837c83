//! Daily OHLCV bar as returned by a data provider.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl OhlcvBar {
    /// A bar is usable when every price field is a finite number.
    pub fn is_complete(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Drop incomplete bars and return the rest sorted by date, one bar per
/// date. The first complete bar seen for a date wins.
pub fn clean_bars(mut bars: Vec<OhlcvBar>) -> Vec<OhlcvBar> {
    bars.retain(OhlcvBar::is_complete);
    bars.sort_by_key(|b| b.date);
    bars.dedup_by_key(|b| b.date);
    bars
}
