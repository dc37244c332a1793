//! Response record returned to callers for each scored transaction

use crate::models::inference::PredictionResult;
use crate::types::alert::{FraudAlert, RiskLevel, RiskLevelThresholds};
use crate::types::transaction::TransactionRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Prediction plus the presentation fields callers display alongside it.
///
/// Serialized only; there is no reader for this shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredTransaction {
    pub transaction_id: String,

    #[serde(flatten)]
    pub prediction: PredictionResult,

    /// Same value as `fraud_label`, kept for older clients
    pub is_fraud: u8,

    pub risk_level: RiskLevel,

    /// Validation plus scoring wall time
    pub latency_ms: f64,
}

impl ScoredTransaction {
    pub fn new(
        tx: &TransactionRecord,
        prediction: PredictionResult,
        thresholds: &RiskLevelThresholds,
        latency: Duration,
    ) -> Self {
        Self {
            transaction_id: tx.transaction_id.clone(),
            is_fraud: prediction.fraud_label,
            risk_level: RiskLevel::from_score(prediction.risk_score, thresholds),
            latency_ms: latency.as_secs_f64() * 1000.0,
            prediction,
        }
    }

    /// Alert for this transaction when it was labelled fraud
    pub fn to_alert(&self, tx: &TransactionRecord, created_at: DateTime<Utc>) -> Option<FraudAlert> {
        if !self.prediction.is_fraud() {
            return None;
        }

        let alert = FraudAlert::new(
            self.transaction_id.clone(),
            self.prediction.risk_score,
            self.risk_level,
            created_at,
        )
        .with_transaction_details(tx.user_id.clone(), tx.amount)
        .with_triggered_features(self.prediction.shap_top_features.names());

        Some(alert)
    }
}
