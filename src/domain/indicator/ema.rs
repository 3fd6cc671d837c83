//! Exponential Moving Average.
//!
//! k = 2/(n+1), seeded with the first close, then
//! EMA[i] = C[i]*k + EMA[i-1]*(1-k). The first (n-1) points are invalid
//! but still feed the recursion.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_ema(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.is_empty() {
        return IndicatorSeries::empty(IndicatorType::Ema(period));
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut values = Vec::with_capacity(bars.len());
    let mut ema = bars[0].close;

    for (i, bar) in bars.iter().enumerate() {
        if i > 0 {
            ema = bar.close * k + ema * (1.0 - k);
        }
        if i + 1 < period {
            values.push(IndicatorPoint::invalid(bar.date));
        } else {
            values.push(IndicatorPoint::valid(bar.date, ema));
        }
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(period),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_bars;
    use approx::assert_relative_eq;

    #[test]
    fn ema_warmup() {
        let series = calculate_ema(&make_bars(&[10.0, 20.0, 30.0, 40.0, 50.0]), 3);
        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2..].iter().all(|p| p.valid));
    }

    #[test]
    fn ema_seed_is_first_close() {
        // 10, then 15, then 22.5 with k = 0.5
        let series = calculate_ema(&make_bars(&[10.0, 20.0, 30.0]), 3);
        assert_relative_eq!(series.get(2).unwrap(), 22.5);
    }

    #[test]
    fn ema_recursive_calculation() {
        let series = calculate_ema(&make_bars(&[10.0, 20.0, 30.0, 40.0, 50.0]), 3);
        let k = 0.5;
        let ema_3 = 40.0 * k + 22.5 * (1.0 - k);
        let ema_4 = 50.0 * k + ema_3 * (1.0 - k);
        assert_relative_eq!(series.get(3).unwrap(), ema_3);
        assert_relative_eq!(series.get(4).unwrap(), ema_4);
    }

    #[test]
    fn ema_period_1_tracks_close() {
        let series = calculate_ema(&make_bars(&[10.0, 20.0, 30.0]), 1);
        assert_eq!(series.get(0), Some(10.0));
        assert_eq!(series.get(2), Some(30.0));
    }

    #[test]
    fn ema_equal_prices() {
        let series = calculate_ema(&make_bars(&[100.0; 6]), 3);
        for i in 2..6 {
            assert_relative_eq!(series.get(i).unwrap(), 100.0);
        }
    }

    #[test]
    fn ema_empty_and_zero_period() {
        assert!(calculate_ema(&[], 3).values.is_empty());
        assert!(calculate_ema(&make_bars(&[1.0, 2.0]), 0).values.is_empty());
    }
}
