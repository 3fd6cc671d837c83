//! Data access port trait.

use crate::domain::error::PricecastError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Daily bars for `symbol` with `start_date <= date <= end_date`, sorted
    /// by date. An empty vec means nothing traded in the range.
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, PricecastError>;
}
