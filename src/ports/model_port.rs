//! Price model port trait.

use crate::domain::error::PricecastError;
use crate::domain::features::{FeatureVector, TrainingSet};

/// A regression model mapping one day's features to the next day's price.
///
/// Implementations are trained once per run, before any prediction.
pub trait PriceModel {
    fn fit(&mut self, training: &TrainingSet) -> Result<(), PricecastError>;

    fn predict(&self, features: &FeatureVector) -> Result<f64, PricecastError>;
}
