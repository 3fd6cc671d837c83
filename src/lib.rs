//! pricecast: short-horizon stock price forecasting.
//!
//! Hexagonal architecture: feature engineering, the random forest and the
//! projection loop live in [`domain`], port traits in [`ports`], concrete
//! data, config and report implementations in [`adapters`], and the
//! command-line front end in [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
