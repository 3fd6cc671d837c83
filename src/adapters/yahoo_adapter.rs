//! Yahoo Finance chart API data adapter.
//!
//! Uses the public `v8/finance/chart` endpoint with a daily interval.
//! Timestamps are shifted by the exchange's `gmtoffset` before being cut to a
//! calendar date, so a bar lands on its local trading day.

use crate::domain::error::PricecastError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::{DateTime, NaiveDate};
use serde_json::Value;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

pub struct YahooAdapter {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooAdapter {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn chart_url(&self, symbol: &str, start_date: NaiveDate, end_date: NaiveDate) -> String {
        // period2 is exclusive, so ask for the midnight after end_date.
        let period1 = day_start_timestamp(start_date);
        let period2 = day_start_timestamp(end_date.succ_opt().unwrap_or(end_date));
        format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d",
            self.base_url, symbol, period1, period2
        )
    }
}

impl Default for YahooAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn day_start_timestamp(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or(0)
}

fn provider_error(symbol: &str, reason: impl Into<String>) -> PricecastError {
    PricecastError::Provider {
        symbol: symbol.to_string(),
        reason: reason.into(),
    }
}

/// Parse a chart API response body into bars within `[start_date, end_date]`.
///
/// Prices are split and dividend adjusted: when `indicators.adjclose` carries
/// a value for a row, it becomes the close and open/high/low are scaled by the
/// same ratio. Rows with a null close are dropped. A `chart.error` object, or a response
/// without a result, is a provider error. A result with no timestamps means
/// nothing traded and yields an empty vec.
pub fn parse_chart_response(
    symbol: &str,
    json: &Value,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<Vec<OhlcvBar>, PricecastError> {
    let chart = &json["chart"];
    if let Some(err) = chart.get("error").filter(|e| !e.is_null()) {
        let description = err["description"]
            .as_str()
            .or_else(|| err["code"].as_str())
            .unwrap_or("unknown error");
        return Err(provider_error(symbol, format!("Yahoo Finance error: {}", description)));
    }

    let result = chart["result"]
        .get(0)
        .ok_or_else(|| provider_error(symbol, "no chart result in response"))?;

    let Some(timestamps) = result["timestamp"].as_array() else {
        return Ok(Vec::new());
    };
    let gmt_offset = result["meta"]["gmtoffset"].as_i64().unwrap_or(0);

    let quote = &result["indicators"]["quote"][0];
    let column = |name: &str, i: usize| quote[name].get(i).and_then(Value::as_f64);
    let adj_close = &result["indicators"]["adjclose"][0]["adjclose"];

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        let Some(ts) = ts.as_i64() else { continue };
        let Some(date) = DateTime::from_timestamp(ts + gmt_offset, 0).map(|dt| dt.date_naive())
        else {
            continue;
        };
        if date < start_date || date > end_date {
            continue;
        }
        let Some(raw_close) = column("close", i) else {
            continue;
        };
        let (close, ratio) = match adj_close.get(i).and_then(Value::as_f64) {
            Some(adj) if raw_close != 0.0 => (adj, adj / raw_close),
            _ => (raw_close, 1.0),
        };
        let adjusted = |name: &str| column(name, i).map_or(f64::NAN, |v| v * ratio);

        bars.push(OhlcvBar {
            date,
            open: adjusted("open"),
            high: adjusted("high"),
            low: adjusted("low"),
            close,
            volume: column("volume", i).map_or(0, |v| v as i64),
        });
    }

    bars.sort_by_key(|b| b.date);
    bars.dedup_by_key(|b| b.date);
    Ok(bars)
}

impl DataPort for YahooAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, PricecastError> {
        let url = self.chart_url(symbol, start_date, end_date);
        tracing::debug!(symbol, %url, "requesting chart");

        let response = self
            .client
            .get(&url)
            .header("User-Agent", "Mozilla/5.0")
            .send()
            .map_err(|e| provider_error(symbol, format!("request failed: {}", e)))?;

        let status = response.status();
        let json: Value = response
            .json()
            .map_err(|e| provider_error(symbol, format!("invalid response ({}): {}", status, e)))?;

        // Yahoo reports unknown symbols as 404 with a chart.error body.
        if !status.is_success() && json["chart"]["error"].is_null() {
            return Err(provider_error(symbol, format!("Yahoo Finance error: {}", status)));
        }

        parse_chart_response(symbol, &json, start_date, end_date)
    }
}
