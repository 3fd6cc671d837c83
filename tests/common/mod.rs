#![allow(dead_code)]

use chrono::{Datelike, NaiveDate, Weekday};
use pricecast::domain::error::PricecastError;
use pricecast::domain::features::{FeatureVector, TrainingSet};
pub use pricecast::domain::ohlcv::OhlcvBar;
use pricecast::ports::data_port::DataPort;
use pricecast::ports::model_port::PriceModel;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

/// In-memory provider. Fetches are filtered to the requested range and every
/// call is recorded.
pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
    /// Single-day lookups for these dates fail.
    pub failing_days: HashSet<NaiveDate>,
    pub calls: RefCell<Vec<(String, NaiveDate, NaiveDate)>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            failing_days: HashSet::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data
            .entry(symbol.to_string())
            .or_default()
            .extend(bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    pub fn with_failing_day(mut self, date: NaiveDate) -> Self {
        self.failing_days.insert(date);
        self
    }

    /// Dates of the single-day lookups made so far.
    pub fn daily_lookups(&self) -> Vec<NaiveDate> {
        self.calls
            .borrow()
            .iter()
            .filter(|(_, s, e)| s == e)
            .map(|(_, s, _)| *s)
            .collect()
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, PricecastError> {
        self.calls
            .borrow_mut()
            .push((symbol.to_string(), start_date, end_date));

        if let Some(reason) = self.errors.get(symbol) {
            return Err(PricecastError::Provider {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            });
        }
        if start_date == end_date && self.failing_days.contains(&start_date) {
            return Err(PricecastError::Provider {
                symbol: symbol.to_string(),
                reason: "timeout".into(),
            });
        }

        let mut bars: Vec<OhlcvBar> = self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

/// Predicts the input price plus a fixed step.
pub struct StepModel {
    pub step: f64,
    pub fitted_rows: Option<usize>,
}

impl StepModel {
    pub fn new(step: f64) -> Self {
        Self {
            step,
            fitted_rows: None,
        }
    }
}

impl PriceModel for StepModel {
    fn fit(&mut self, training: &TrainingSet) -> Result<(), PricecastError> {
        self.fitted_rows = Some(training.len());
        Ok(())
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64, PricecastError> {
        Ok(features.price + self.step)
    }
}

/// Fails on fit.
pub struct BrokenModel;

impl PriceModel for BrokenModel {
    fn fit(&mut self, _training: &TrainingSet) -> Result<(), PricecastError> {
        Err(PricecastError::Model {
            reason: "solver diverged".into(),
        })
    }

    fn predict(&self, _features: &FeatureVector) -> Result<f64, PricecastError> {
        Err(PricecastError::Model {
            reason: "not fitted".into(),
        })
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date: &str, close: f64) -> OhlcvBar {
    OhlcvBar {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1000,
    }
}

/// `count` weekday bars ending on the last business day strictly before
/// `before`, with closes from `price(i)`.
pub fn business_bars_before(
    before: NaiveDate,
    count: usize,
    price: impl Fn(usize) -> f64,
) -> Vec<OhlcvBar> {
    let mut dates = Vec::with_capacity(count);
    let mut day = before;
    while dates.len() < count {
        day = day.pred_opt().unwrap();
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(day);
        }
    }
    dates.reverse();
    dates
        .into_iter()
        .enumerate()
        .map(|(i, d)| {
            let close = price(i);
            OhlcvBar {
                date: d,
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000 + i as i64,
            }
        })
        .collect()
}

/// Sample INI with CSV data and a small forest.
pub const SAMPLE_INI: &str = r#"
[data]
source = csv
data_dir = ./data

[forecast]
lookback_days = 120
history_days = 40
min_training_rows = 10
threshold_pct = 1.0

[model]
n_estimators = 25
seed = 7
max_depth = 6
min_samples_split = 4
min_samples_leaf = 2
max_features = 3

[report]
output = forecast.csv
"#;
