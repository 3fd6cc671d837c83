//! Rolling sample standard deviation.
//!
//! STDDEV(n)[i] = sqrt(sum((C[i-j] - SMA(n)[i])^2 for j in 0..n) / (n - 1))
//! Warmup: first (n-1) points are invalid. Periods below 2 produce no
//! valid points since the sample variance is undefined.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_stddev(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    if period < 2 {
        return IndicatorSeries {
            indicator_type: IndicatorType::Stddev(period),
            values: bars.iter().map(|b| IndicatorPoint::invalid(b.date)).collect(),
        };
    }

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i + 1 < period {
                return IndicatorPoint::invalid(bar.date);
            }
            let window = &bars[i + 1 - period..=i];
            let mean = window.iter().map(|b| b.close).sum::<f64>() / period as f64;
            let variance = window
                .iter()
                .map(|b| (b.close - mean).powi(2))
                .sum::<f64>()
                / (period - 1) as f64;
            IndicatorPoint::valid(bar.date, variance.sqrt())
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Stddev(period),
        values,
    }
}
