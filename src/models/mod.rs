//! Scoring rules and the engine that combines them

pub mod aggregator;
pub mod anomaly;
pub mod explain;
pub mod inference;
pub mod supervised;

pub use aggregator::ScoreAggregator;
pub use explain::{FeatureContribution, TopFeatures};
pub use inference::{PredictionResult, RiskScorer};
