//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod features;
pub mod forest;
pub mod calendar;
pub mod projection;
pub mod summary;
pub mod forecast;
pub mod config_validation;
pub mod error;
