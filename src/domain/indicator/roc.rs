//! One-day fractional price change: (C[i] - C[i-1]) / C[i-1].
//! The first point is invalid, as is any point whose previous close is zero.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_pct_change(bars: &[OhlcvBar]) -> IndicatorSeries {
    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 || bars[i - 1].close == 0.0 {
                return IndicatorPoint::invalid(bar.date);
            }
            let prev = bars[i - 1].close;
            IndicatorPoint::valid(bar.date, (bar.close - prev) / prev)
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::PctChange,
        values,
    }
}
