//! One forecast run: fetch history, engineer features, fit the model,
//! project the requested range and summarise it.
//!
//! Fatal problems come back as `PricecastError`; conditions the caller should
//! hear about but that do not stop the run are collected as
//! [`ForecastWarning`]s on the outcome.

use crate::domain::calendar::{days_before, previous_day};
use crate::domain::error::PricecastError;
use crate::domain::features::{build_feature_rows, FeatureMeans, FeatureRow, TrainingSet};
use crate::domain::ohlcv::{clean_bars, OhlcvBar};
use crate::domain::projection::{ProjectionRecord, Projector, RollingState};
use crate::domain::summary::{Summary, DEFAULT_THRESHOLD_PCT};
use crate::ports::data_port::DataPort;
use crate::ports::model_port::PriceModel;
use chrono::NaiveDate;

pub const DEFAULT_LOOKBACK_DAYS: u32 = 90;
pub const DEFAULT_HISTORY_DAYS: usize = 30;
pub const DEFAULT_MIN_TRAINING_ROWS: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRequest {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Days after this date are predicted rather than looked up.
    pub today: NaiveDate,
}

impl ForecastRequest {
    /// Normalises the symbol and rejects ranges where `end <= start`.
    pub fn new(
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        today: NaiveDate,
    ) -> Result<Self, PricecastError> {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(PricecastError::EmptySymbol);
        }
        if start >= end {
            return Err(PricecastError::InvalidRange { start, end });
        }
        Ok(Self {
            symbol,
            start,
            end,
            today,
        })
    }

    /// Inclusive window of history fetched before `start`.
    pub fn history_window(&self, lookback_days: u32) -> (NaiveDate, NaiveDate) {
        (days_before(self.start, lookback_days), previous_day(self.start))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSettings {
    pub lookback_days: u32,
    pub history_days: usize,
    pub min_training_rows: usize,
    pub threshold_pct: f64,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            history_days: DEFAULT_HISTORY_DAYS,
            min_training_rows: DEFAULT_MIN_TRAINING_ROWS,
            threshold_pct: DEFAULT_THRESHOLD_PCT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ForecastWarning {
    #[error("only {bars} valid historical days available (want {required}); accuracy may be limited")]
    InsufficientHistory { bars: usize, required: usize },

    #[error("only {rows} complete training rows after indicator warmup (want {minimum}); accuracy may be limited")]
    SparseTrainingSet { rows: usize, minimum: usize },

    #[error("no business day in range had data or could be predicted")]
    EmptyProjection,
}

/// Engineered history for one symbol.
#[derive(Debug, Clone)]
pub struct History {
    pub bars: Vec<OhlcvBar>,
    pub rows: Vec<FeatureRow>,
    pub training: TrainingSet,
    pub warnings: Vec<ForecastWarning>,
}

impl History {
    pub fn means(&self) -> FeatureMeans {
        self.training.means()
    }
}

/// Fetch the lookback window, keep the most recent `history_days` valid bars
/// and build the training set.
pub fn load_history(
    data_port: &dyn DataPort,
    request: &ForecastRequest,
    settings: &ForecastSettings,
) -> Result<History, PricecastError> {
    let (from, to) = request.history_window(settings.lookback_days);
    tracing::info!(symbol = %request.symbol, %from, %to, "fetching history");

    let fetched = data_port
        .fetch_ohlcv(&request.symbol, from, to)
        .map_err(|e| match e {
            err @ PricecastError::Provider { .. } => err,
            other => PricecastError::Provider {
                symbol: request.symbol.clone(),
                reason: other.to_string(),
            },
        })?;

    let mut bars = clean_bars(fetched);
    let mut warnings = Vec::new();

    if bars.len() < settings.history_days {
        warnings.push(ForecastWarning::InsufficientHistory {
            bars: bars.len(),
            required: settings.history_days,
        });
    }
    if bars.len() > settings.history_days {
        bars.drain(..bars.len() - settings.history_days);
    }

    let rows = build_feature_rows(&bars);
    let training = TrainingSet::from_rows(&rows);

    if training.is_empty() {
        return Err(PricecastError::InsufficientData {
            symbol: request.symbol.clone(),
            rows: 0,
            minimum: 1,
        });
    }
    if training.len() < settings.min_training_rows {
        warnings.push(ForecastWarning::SparseTrainingSet {
            rows: training.len(),
            minimum: settings.min_training_rows,
        });
    }

    for w in &warnings {
        tracing::warn!(symbol = %request.symbol, "{w}");
    }
    tracing::info!(
        symbol = %request.symbol,
        bars = bars.len(),
        training_rows = training.len(),
        "history prepared"
    );

    Ok(History {
        bars,
        rows,
        training,
        warnings,
    })
}

#[derive(Debug, Clone)]
pub struct ForecastOutcome {
    pub symbol: String,
    pub records: Vec<ProjectionRecord>,
    /// `None` when the projection is empty.
    pub summary: Option<Summary>,
    pub warnings: Vec<ForecastWarning>,
    pub training_rows: usize,
}

impl ForecastOutcome {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub fn run_forecast(
    data_port: &dyn DataPort,
    model: &mut dyn PriceModel,
    request: &ForecastRequest,
    settings: &ForecastSettings,
) -> Result<ForecastOutcome, PricecastError> {
    let history = load_history(data_port, request, settings)?;
    let mut warnings = history.warnings.clone();

    tracing::info!(rows = history.training.len(), "fitting model");
    model.fit(&history.training)?;

    let initial = history
        .training
        .last()
        .map(RollingState::from_sample)
        .ok_or_else(|| PricecastError::InsufficientData {
            symbol: request.symbol.clone(),
            rows: 0,
            minimum: 1,
        })?;

    let projector = Projector::new(
        data_port,
        &*model,
        history.means(),
        &request.symbol,
        request.today,
    );
    let projection = projector.run(initial, request.start, request.end)?;

    let summary = Summary::from_records(&projection.records, settings.threshold_pct);
    if summary.is_none() {
        tracing::warn!(symbol = %request.symbol, "{}", ForecastWarning::EmptyProjection);
        warnings.push(ForecastWarning::EmptyProjection);
    }

    Ok(ForecastOutcome {
        symbol: request.symbol.clone(),
        records: projection.records,
        summary,
        warnings,
        training_rows: history.training.len(),
    })
}
