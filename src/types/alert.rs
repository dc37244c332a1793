//! Fraud alert data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Risk level classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Determine risk level from score and thresholds
    pub fn from_score(score: f64, thresholds: &RiskLevelThresholds) -> Self {
        if score >= thresholds.critical {
            RiskLevel::Critical
        } else if score >= thresholds.high {
            RiskLevel::High
        } else if score >= thresholds.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configurable risk level thresholds.
///
/// Each value is the lowest score of its band; anything below `medium` is
/// [`RiskLevel::Low`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskLevelThresholds {
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for RiskLevelThresholds {
    fn default() -> Self {
        Self {
            medium: 0.5,
            high: 0.7,
            critical: 0.9,
        }
    }
}

/// Alert raised for every transaction labelled fraud
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudAlert {
    /// Unique alert identifier
    pub alert_id: String,

    pub transaction_id: String,

    pub user_id: String,

    /// Transaction amount in currency units
    pub amount: f64,

    /// Fused risk score (0.0 - 1.0)
    pub risk_score: f64,

    pub risk_level: RiskLevel,

    /// Explanation features, strongest first
    pub triggered_features: Vec<String>,

    /// Alert generation timestamp
    pub timestamp: DateTime<Utc>,
}

impl FraudAlert {
    /// Create a new fraud alert
    pub fn new(
        transaction_id: String,
        risk_score: f64,
        risk_level: RiskLevel,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            alert_id: uuid::Uuid::new_v4().to_string(),
            transaction_id,
            user_id: String::new(),
            amount: 0.0,
            risk_score,
            risk_level,
            triggered_features: Vec::new(),
            timestamp,
        }
    }

    /// Add transaction details to the alert
    pub fn with_transaction_details(mut self, user_id: String, amount: f64) -> Self {
        self.user_id = user_id;
        self.amount = amount;
        self
    }

    /// Add triggered features to the alert
    pub fn with_triggered_features(mut self, features: Vec<String>) -> Self {
        self.triggered_features = features;
        self
    }
}
