//! Risk scoring engine
//!
//! Runs the five scoring steps in order: derived features, supervised
//! probability, anomaly flag, fusion, explanation. Scoring is pure; the
//! only ambient input is the injected [`Clock`], consulted when a
//! transaction arrives without a timestamp.

use crate::clock::{Clock, SystemClock};
use crate::error::ValidationError;
use crate::feature_extractor::FeatureExtractor;
use crate::models::aggregator::ScoreAggregator;
use crate::models::anomaly;
use crate::models::explain::{self, TopFeatures};
use crate::models::supervised::supervised_probability;
use crate::types::transaction::{TransactionInput, TransactionRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Result of scoring a single transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Fused risk score (0.0 - 1.0)
    pub risk_score: f64,
    /// 1 when `risk_score > 0.5`
    #[serde(alias = "is_fraud")]
    pub fraud_label: u8,
    /// Rule-based supervised probability (0.10 - 0.98)
    pub supervised_prob: f64,
    pub anomaly_flag: u8,
    /// Up to five contributions, strongest first
    pub shap_top_features: TopFeatures,
}

impl PredictionResult {
    pub fn is_fraud(&self) -> bool {
        self.fraud_label == 1
    }
}

/// Deterministic rule-based risk scorer
#[derive(Clone)]
pub struct RiskScorer {
    extractor: FeatureExtractor,
    aggregator: ScoreAggregator,
    clock: Arc<dyn Clock>,
}

impl RiskScorer {
    /// Create a scorer that defaults missing timestamps from the wall clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a scorer with an injected clock
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            extractor: FeatureExtractor::new(),
            aggregator: ScoreAggregator::default(),
            clock,
        }
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Validate a wire transaction and score it.
    ///
    /// Validation completes before any scoring step runs.
    pub fn score_input(&self, input: TransactionInput) -> Result<PredictionResult, ValidationError> {
        let record = input.into_record(self.clock.as_ref())?;
        Ok(self.score_valid(&record))
    }

    /// Score a transaction record, rejecting records that break its invariants
    pub fn score(&self, tx: &TransactionRecord) -> Result<PredictionResult, ValidationError> {
        tx.validate()?;
        Ok(self.score_valid(tx))
    }

    fn score_valid(&self, tx: &TransactionRecord) -> PredictionResult {
        let features = self.extractor.extract(tx);

        let supervised_prob = supervised_probability(&features);
        let trigger = anomaly::detect(&features);
        let anomaly_flag = u8::from(trigger.is_some());

        let risk_score = self.aggregator.fuse(supervised_prob, anomaly_flag);
        let fraud_label = self.aggregator.label(risk_score);

        let shap_top_features = explain::explain(&features);

        debug!(
            transaction_id = %tx.transaction_id,
            features = ?features.to_vector(),
            supervised_prob,
            anomaly_trigger = ?trigger,
            risk_score,
            fraud_label,
            "Transaction scored"
        );

        PredictionResult {
            risk_score,
            fraud_label,
            supervised_prob,
            anomaly_flag,
            shap_top_features,
        }
    }
}

impl Default for RiskScorer {
    fn default() -> Self {
        Self::new()
    }
}
