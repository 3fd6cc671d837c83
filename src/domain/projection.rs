//! Forward projection over the requested business days.
//!
//! A single [`RollingState`] is carried from day to day. Days at or before
//! `today` take the provider's close when one exists and are skipped
//! otherwise; days after `today` are synthesised by the model from the
//! current state. Derived indicators are not recomputed along the way: after
//! each step they are reset to their training-set means, and the moving
//! average is blended toward the predicted price.

use crate::domain::calendar::business_days;
use crate::domain::error::PricecastError;
use crate::domain::features::{FeatureMeans, FeatureVector, TrainingSample};
use crate::ports::data_port::DataPort;
use crate::ports::model_port::PriceModel;
use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Actual,
    Predicted,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Actual => write!(f, "actual"),
            RecordKind::Predicted => write!(f, "predicted"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionRecord {
    pub date: NaiveDate,
    pub price: f64,
    pub kind: RecordKind,
}

/// The per-run feature snapshot advanced once per processed day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollingState(FeatureVector);

impl RollingState {
    pub fn new(features: FeatureVector) -> Self {
        Self(features)
    }

    /// Start from the last training sample.
    pub fn from_sample(sample: &TrainingSample) -> Self {
        Self(sample.features)
    }

    pub fn features(&self) -> &FeatureVector {
        &self.0
    }

    pub fn day_index(&self) -> i64 {
        self.0.day_index
    }

    /// Observed close: take price and volume from the bar, reset the derived
    /// indicators to their historical means.
    fn observe(&mut self, close: f64, volume: f64, means: &FeatureMeans) {
        let s = &mut self.0;
        s.price = close;
        s.volume = volume;
        s.ret = means.ret;
        s.moving_average_5 = means.moving_average_5;
        s.volatility_5 = means.volatility_5;
        s.rsi_14 = means.rsi_14;
        s.macd = means.macd;
    }

    /// Model input for the next day: the current state one index ahead.
    fn next_input(&self) -> FeatureVector {
        FeatureVector {
            day_index: self.0.day_index + 1,
            ..self.0
        }
    }

    fn apply_prediction(&mut self, predicted: f64, means: &FeatureMeans) {
        let s = &mut self.0;
        s.price = predicted;
        s.moving_average_5 = (s.moving_average_5 * 4.0 + predicted) / 5.0;
        s.volatility_5 = means.volatility_5;
        s.rsi_14 = means.rsi_14;
        s.macd = means.macd;
        s.volume = means.volume;
    }

    fn advance(&mut self) {
        self.0.day_index += 1;
    }
}

/// How one business day was resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DayOutcome {
    Actual { close: f64, volume: f64 },
    Skipped,
    Predicted { price: f64 },
}

#[derive(Debug, Clone)]
pub struct Projection {
    pub records: Vec<ProjectionRecord>,
    /// State after the last processed day.
    pub final_state: RollingState,
    /// `day_index` of the state after each emitted record.
    pub day_indices: Vec<i64>,
}

impl Projection {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub struct Projector<'a> {
    data_port: &'a dyn DataPort,
    model: &'a dyn PriceModel,
    means: FeatureMeans,
    symbol: &'a str,
    today: NaiveDate,
}

impl<'a> Projector<'a> {
    pub fn new(
        data_port: &'a dyn DataPort,
        model: &'a dyn PriceModel,
        means: FeatureMeans,
        symbol: &'a str,
        today: NaiveDate,
    ) -> Self {
        Self {
            data_port,
            model,
            means,
            symbol,
            today,
        }
    }

    /// Provider lookup for a single day. Errors count as "no data".
    fn acquire(&self, date: NaiveDate) -> Option<(f64, f64)> {
        match self.data_port.fetch_ohlcv(self.symbol, date, date) {
            Ok(bars) => bars
                .into_iter()
                .find(|b| b.date == date && b.close.is_finite())
                .map(|b| (b.close, b.volume as f64)),
            Err(e) => {
                tracing::warn!(symbol = self.symbol, %date, error = %e, "daily lookup failed, treating as no data");
                None
            }
        }
    }

    pub fn step(&self, state: &mut RollingState, date: NaiveDate) -> Result<DayOutcome, PricecastError> {
        let outcome = if date <= self.today {
            match self.acquire(date) {
                Some((close, volume)) => {
                    state.observe(close, volume, &self.means);
                    DayOutcome::Actual { close, volume }
                }
                None => return Ok(DayOutcome::Skipped),
            }
        } else {
            let price = self.model.predict(&state.next_input())?;
            state.apply_prediction(price, &self.means);
            DayOutcome::Predicted { price }
        };
        state.advance();
        Ok(outcome)
    }

    pub fn run(
        &self,
        initial: RollingState,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Projection, PricecastError> {
        let mut state = initial;
        let mut records = Vec::new();
        let mut day_indices = Vec::new();

        for date in business_days(start, end) {
            let record = match self.step(&mut state, date)? {
                DayOutcome::Actual { close, .. } => ProjectionRecord {
                    date,
                    price: close,
                    kind: RecordKind::Actual,
                },
                DayOutcome::Predicted { price } => ProjectionRecord {
                    date,
                    price,
                    kind: RecordKind::Predicted,
                },
                DayOutcome::Skipped => {
                    tracing::debug!(%date, "no data for past business day, skipped");
                    continue;
                }
            };
            tracing::debug!(%date, price = record.price, kind = %record.kind, day_index = state.day_index(), "projected day");
            records.push(record);
            day_indices.push(state.day_index());
        }

        Ok(Projection {
            records,
            final_state: state,
            day_indices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::features::TrainingSet;
    use crate::domain::ohlcv::OhlcvBar;
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    struct MapPort {
        bars: HashMap<NaiveDate, OhlcvBar>,
        fail: bool,
    }

    impl DataPort for MapPort {
        fn fetch_ohlcv(
            &self,
            symbol: &str,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<Vec<OhlcvBar>, PricecastError> {
            if self.fail {
                return Err(PricecastError::Provider {
                    symbol: symbol.into(),
                    reason: "offline".into(),
                });
            }
            Ok(self
                .bars
                .values()
                .filter(|b| b.date >= start && b.date <= end)
                .cloned()
                .collect())
        }
    }

    /// Predicts the input price plus one.
    struct PlusOne;

    impl PriceModel for PlusOne {
        fn fit(&mut self, _training: &TrainingSet) -> Result<(), PricecastError> {
            Ok(())
        }

        fn predict(&self, features: &FeatureVector) -> Result<f64, PricecastError> {
            Ok(features.price + 1.0)
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn bar(date: NaiveDate, close: f64, volume: i64) -> OhlcvBar {
        OhlcvBar {
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume,
        }
    }

    fn port(bars: Vec<OhlcvBar>) -> MapPort {
        MapPort {
            bars: bars.into_iter().map(|b| (b.date, b)).collect(),
            fail: false,
        }
    }

    fn means() -> FeatureMeans {
        FeatureMeans {
            ret: 0.002,
            moving_average_5: 90.0,
            volatility_5: 1.5,
            rsi_14: 60.0,
            macd: 0.3,
            volume: 5_000.0,
        }
    }

    fn initial() -> RollingState {
        RollingState::new(FeatureVector {
            price: 100.0,
            day_index: 28,
            ret: 0.01,
            moving_average_5: 99.0,
            volatility_5: 2.0,
            rsi_14: 70.0,
            macd: 0.5,
            volume: 1_000.0,
        })
    }

    #[test]
    fn actual_day_resets_indicators_to_means() {
        let port = port(vec![bar(d(2025, 6, 16), 105.0, 7_000)]);
        let projector = Projector::new(&port, &PlusOne, means(), "TEST", d(2025, 6, 20));
        let mut state = initial();

        let outcome = projector.step(&mut state, d(2025, 6, 16)).unwrap();

        assert_eq!(outcome, DayOutcome::Actual { close: 105.0, volume: 7_000.0 });
        let f = state.features();
        assert_relative_eq!(f.price, 105.0);
        assert_relative_eq!(f.volume, 7_000.0);
        assert_relative_eq!(f.ret, 0.002);
        assert_relative_eq!(f.moving_average_5, 90.0);
        assert_relative_eq!(f.volatility_5, 1.5);
        assert_relative_eq!(f.rsi_14, 60.0);
        assert_relative_eq!(f.macd, 0.3);
        assert_eq!(f.day_index, 29);
    }

    #[test]
    fn missing_past_day_leaves_state_untouched() {
        let port = port(vec![]);
        let projector = Projector::new(&port, &PlusOne, means(), "TEST", d(2025, 6, 20));
        let mut state = initial();

        let outcome = projector.step(&mut state, d(2025, 6, 16)).unwrap();

        assert_eq!(outcome, DayOutcome::Skipped);
        assert_eq!(state, initial());
    }

    #[test]
    fn provider_error_on_past_day_counts_as_no_data() {
        let port = MapPort {
            bars: HashMap::new(),
            fail: true,
        };
        let projector = Projector::new(&port, &PlusOne, means(), "TEST", d(2025, 6, 20));
        let projection = projector.run(initial(), d(2025, 6, 16), d(2025, 6, 18)).unwrap();
        assert!(projection.is_empty());
    }

    #[test]
    fn future_day_blends_moving_average_and_resets_rest() {
        let port = port(vec![]);
        let projector = Projector::new(&port, &PlusOne, means(), "TEST", d(2025, 6, 13));
        let mut state = initial();

        let outcome = projector.step(&mut state, d(2025, 6, 16)).unwrap();

        assert_eq!(outcome, DayOutcome::Predicted { price: 101.0 });
        let f = state.features();
        assert_relative_eq!(f.price, 101.0);
        assert_relative_eq!(f.moving_average_5, (99.0 * 4.0 + 101.0) / 5.0);
        assert_relative_eq!(f.volatility_5, 1.5);
        assert_relative_eq!(f.rsi_14, 60.0);
        assert_relative_eq!(f.macd, 0.3);
        assert_relative_eq!(f.volume, 5_000.0);
        // return is carried unchanged on predicted days
        assert_relative_eq!(f.ret, 0.01);
        assert_eq!(f.day_index, 29);
    }

    #[test]
    fn future_day_ignores_provider_data() {
        let port = port(vec![bar(d(2025, 6, 16), 500.0, 1)]);
        let projector = Projector::new(&port, &PlusOne, means(), "TEST", d(2025, 6, 13));
        let projection = projector.run(initial(), d(2025, 6, 16), d(2025, 6, 16)).unwrap();
        assert_eq!(projection.records.len(), 1);
        assert_eq!(projection.records[0].kind, RecordKind::Predicted);
        assert_relative_eq!(projection.records[0].price, 101.0);
    }

    #[test]
    fn predictions_chain_through_state() {
        let port = port(vec![bar(d(2025, 6, 16), 105.0, 7_000)]);
        // today = Monday; Tuesday and Wednesday are in the future
        let projector = Projector::new(&port, &PlusOne, means(), "TEST", d(2025, 6, 16));
        let projection = projector.run(initial(), d(2025, 6, 16), d(2025, 6, 18)).unwrap();

        let kinds: Vec<_> = projection.records.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![RecordKind::Actual, RecordKind::Predicted, RecordKind::Predicted]
        );
        assert_relative_eq!(projection.records[0].price, 105.0);
        assert_relative_eq!(projection.records[1].price, 106.0);
        assert_relative_eq!(projection.records[2].price, 107.0);
        assert_eq!(projection.day_indices, vec![29, 30, 31]);
    }

    #[test]
    fn skipped_days_do_not_advance_index() {
        // Mon has data, Tue missing, Wed has data; all in the past
        let port = port(vec![
            bar(d(2025, 6, 16), 101.0, 10),
            bar(d(2025, 6, 18), 103.0, 10),
        ]);
        let projector = Projector::new(&port, &PlusOne, means(), "TEST", d(2025, 6, 30));
        let projection = projector.run(initial(), d(2025, 6, 16), d(2025, 6, 18)).unwrap();

        assert_eq!(projection.records.len(), 2);
        assert_eq!(projection.day_indices, vec![29, 30]);
        assert_eq!(projection.final_state.day_index(), 30);
    }

    #[test]
    fn weekends_are_never_emitted() {
        let port = port(vec![]);
        let projector = Projector::new(&port, &PlusOne, means(), "TEST", d(2025, 6, 1));
        // Fri 13th .. Tue 17th
        let projection = projector.run(initial(), d(2025, 6, 13), d(2025, 6, 17)).unwrap();
        let dates: Vec<_> = projection.records.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![d(2025, 6, 13), d(2025, 6, 16), d(2025, 6, 17)]);
    }

    #[test]
    fn model_error_aborts_projection() {
        struct Broken;
        impl PriceModel for Broken {
            fn fit(&mut self, _t: &TrainingSet) -> Result<(), PricecastError> {
                Ok(())
            }
            fn predict(&self, _f: &FeatureVector) -> Result<f64, PricecastError> {
                Err(PricecastError::Model {
                    reason: "not fitted".into(),
                })
            }
        }
        let port = port(vec![]);
        let projector = Projector::new(&port, &Broken, means(), "TEST", d(2025, 6, 1));
        assert!(projector.run(initial(), d(2025, 6, 16), d(2025, 6, 17)).is_err());
    }
}
