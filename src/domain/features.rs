//! Feature engineering: one feature row per historical bar, and the
//! training set distilled from the complete rows.
//!
//! Feature order when flattened for a model is fixed by [`FEATURE_NAMES`].

use crate::domain::indicator::{
    calculate_macd_line, calculate_pct_change, calculate_rsi, calculate_sma, calculate_stddev,
};
use crate::domain::indicator::macd::{DEFAULT_FAST, DEFAULT_SLOW};
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub const MA_PERIOD: usize = 5;
pub const VOLATILITY_PERIOD: usize = 5;
pub const RSI_PERIOD: usize = 14;
pub const FEATURE_COUNT: usize = 8;

pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "price",
    "day_index",
    "return",
    "moving_average_5",
    "volatility_5",
    "rsi_14",
    "macd",
    "volume",
];

/// A fully-defined model input for one trading day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub price: f64,
    pub day_index: i64,
    pub ret: f64,
    pub moving_average_5: f64,
    pub volatility_5: f64,
    pub rsi_14: f64,
    pub macd: f64,
    pub volume: f64,
}

impl FeatureVector {
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.price,
            self.day_index as f64,
            self.ret,
            self.moving_average_5,
            self.volatility_5,
            self.rsi_14,
            self.macd,
            self.volume,
        ]
    }
}

/// Features for one bar; derived values are `None` during their warmup.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub price: f64,
    pub day_index: i64,
    pub ret: Option<f64>,
    pub moving_average_5: Option<f64>,
    pub volatility_5: Option<f64>,
    pub rsi_14: Option<f64>,
    pub macd: Option<f64>,
    pub volume: f64,
    pub target: Option<f64>,
}

impl FeatureRow {
    /// The model input, if every feature is defined.
    pub fn vector(&self) -> Option<FeatureVector> {
        Some(FeatureVector {
            price: self.price,
            day_index: self.day_index,
            ret: self.ret?,
            moving_average_5: self.moving_average_5?,
            volatility_5: self.volatility_5?,
            rsi_14: self.rsi_14?,
            macd: self.macd?,
            volume: self.volume,
        })
    }
}

/// Derive one row per bar. Bars must be in chronological order.
pub fn build_feature_rows(bars: &[OhlcvBar]) -> Vec<FeatureRow> {
    let ret = calculate_pct_change(bars);
    let ma = calculate_sma(bars, MA_PERIOD);
    let vol = calculate_stddev(bars, VOLATILITY_PERIOD);
    let rsi = calculate_rsi(bars, RSI_PERIOD);
    let macd = calculate_macd_line(bars, DEFAULT_FAST, DEFAULT_SLOW);

    bars.iter()
        .enumerate()
        .map(|(i, bar)| FeatureRow {
            date: bar.date,
            price: bar.close,
            day_index: i as i64,
            ret: ret.get(i),
            moving_average_5: ma.get(i),
            volatility_5: vol.get(i),
            rsi_14: rsi.get(i),
            macd: macd.get(i),
            volume: bar.volume as f64,
            target: bars.get(i + 1).map(|next| next.close),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSample {
    pub date: NaiveDate,
    pub features: FeatureVector,
    pub target: f64,
}

/// Per-feature means over a training set, used to reset rolling state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FeatureMeans {
    pub ret: f64,
    pub moving_average_5: f64,
    pub volatility_5: f64,
    pub rsi_14: f64,
    pub macd: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    pub samples: Vec<TrainingSample>,
}

impl TrainingSet {
    /// Keep only rows with every feature and a target defined.
    pub fn from_rows(rows: &[FeatureRow]) -> Self {
        let samples = rows
            .iter()
            .filter_map(|row| {
                Some(TrainingSample {
                    date: row.date,
                    features: row.vector()?,
                    target: row.target?,
                })
            })
            .collect();
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last(&self) -> Option<&TrainingSample> {
        self.samples.last()
    }

    pub fn feature_matrix(&self) -> Vec<[f64; FEATURE_COUNT]> {
        self.samples.iter().map(|s| s.features.to_array()).collect()
    }

    pub fn targets(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.target).collect()
    }

    pub fn means(&self) -> FeatureMeans {
        if self.samples.is_empty() {
            return FeatureMeans::default();
        }
        let n = self.samples.len() as f64;
        let mean = |f: fn(&FeatureVector) -> f64| {
            self.samples.iter().map(|s| f(&s.features)).sum::<f64>() / n
        };
        FeatureMeans {
            ret: mean(|v| v.ret),
            moving_average_5: mean(|v| v.moving_average_5),
            volatility_5: mean(|v| v.volatility_5),
            rsi_14: mean(|v| v.rsi_14),
            macd: mean(|v| v.macd),
            volume: mean(|v| v.volume),
        }
    }
}
