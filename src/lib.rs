//! Fraud Risk Scorer Library
//!
//! Deterministic, rule-based transaction risk scoring: a supervised-style
//! probability and an anomaly flag are fused into a risk score, turned into
//! a fraud decision and explained by a ranked list of contributing features.

pub mod clock;
pub mod config;
pub mod consumer;
pub mod error;
pub mod feature_extractor;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod producer;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::AppConfig;
pub use error::ValidationError;
pub use feature_extractor::{DerivedFeatures, FeatureExtractor};
pub use models::inference::{PredictionResult, RiskScorer};
pub use pipeline::{Pipeline, PipelineSummary};
pub use types::{
    alert::FraudAlert, response::ScoredTransaction, transaction::TransactionInput,
    transaction::TransactionRecord,
};
