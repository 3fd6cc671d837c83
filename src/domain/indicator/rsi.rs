//! RSI (Relative Strength Index) with exponential smoothing.
//!
//! - Changes: diff of consecutive closes; the first bar counts as no change
//! - Gains/losses are smoothed with alpha = 1/n, seeded at the first bar
//! - avg = alpha * current + (1 - alpha) * prev_avg
//!
//! RSI = 100 - (100 / (1 + avg_gain / avg_loss)); avg_loss == 0 gives 100.
//! The first n-1 points are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

pub fn calculate_rsi(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.is_empty() {
        return IndicatorSeries {
            indicator_type: IndicatorType::Rsi(period),
            values: bars.iter().map(|b| IndicatorPoint::invalid(b.date)).collect(),
        };
    }

    let alpha = 1.0 / period as f64;
    let mut values = Vec::with_capacity(bars.len());
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    let mut prev_close = bars[0].close;

    for (i, bar) in bars.iter().enumerate() {
        let change = bar.close - prev_close;
        prev_close = bar.close;

        avg_gain = alpha * change.max(0.0) + (1.0 - alpha) * avg_gain;
        avg_loss = alpha * (-change).max(0.0) + (1.0 - alpha) * avg_loss;

        if i + 1 < period {
            values.push(IndicatorPoint::invalid(bar.date));
        } else {
            values.push(IndicatorPoint::valid(bar.date, rsi_value(avg_gain, avg_loss)));
        }
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}
