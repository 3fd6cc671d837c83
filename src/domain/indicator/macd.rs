//! MACD line: EMA(fast) - EMA(slow).
//!
//! Default parameters: fast=12, slow=26.
//! Warmup: max(fast, slow) - 1 points, until both EMAs are valid.

use crate::domain::indicator::{calculate_ema, IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;

pub fn calculate_macd_line(bars: &[OhlcvBar], fast: usize, slow: usize) -> IndicatorSeries {
    let indicator_type = IndicatorType::MacdLine { fast, slow };
    if bars.is_empty() || fast == 0 || slow == 0 {
        return IndicatorSeries::empty(indicator_type);
    }

    let ema_fast = calculate_ema(bars, fast);
    let ema_slow = calculate_ema(bars, slow);

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| match (ema_fast.get(i), ema_slow.get(i)) {
            (Some(f), Some(s)) => IndicatorPoint::valid(bar.date, f - s),
            _ => IndicatorPoint::invalid(bar.date),
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}
