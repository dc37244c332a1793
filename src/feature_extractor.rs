//! Feature extraction for risk scoring.
//!
//! Turns a validated transaction into the derived features every rule in
//! [`crate::models`] reads. The amount is rescaled so that typical
//! transactions land between 0 and 3.

use crate::types::transaction::TransactionRecord;
use serde::Serialize;

/// Divisor applied to the raw amount
pub const AMOUNT_SCALE: f64 = 10_000.0;

/// Feature names in vector order
pub const FEATURE_NAMES: [&str; 6] = [
    "amount",
    "hour",
    "weekday",
    "tx_count_24h",
    "is_new_payee",
    "device_changed",
];

/// Derived features of a single transaction
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedFeatures {
    /// `amount / 10000`
    pub amount_normalized: f64,
    pub hour: u8,
    pub weekday: u8,
    pub tx_count_24h: u32,
    pub is_new_payee: bool,
    pub device_changed: bool,
}

impl DerivedFeatures {
    /// Late-night window used by the supervised rules and the explanation
    pub fn is_night(&self) -> bool {
        self.hour < 6 || self.hour > 22
    }

    /// Wider night window used by the new-payee anomaly trigger
    pub fn is_extended_night(&self) -> bool {
        self.hour < 7 || self.hour > 21
    }

    /// Features as a numeric vector, ordered like [`FEATURE_NAMES`]
    pub fn to_vector(&self) -> [f64; 6] {
        [
            self.amount_normalized,
            f64::from(self.hour),
            f64::from(self.weekday),
            f64::from(self.tx_count_24h),
            f64::from(u8::from(self.is_new_payee)),
            f64::from(u8::from(self.device_changed)),
        ]
    }
}

/// Feature extractor that transforms transactions into derived features.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Create a new feature extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extract derived features from a transaction.
    pub fn extract(&self, tx: &TransactionRecord) -> DerivedFeatures {
        DerivedFeatures {
            amount_normalized: tx.amount / AMOUNT_SCALE,
            hour: tx.hour,
            weekday: tx.weekday,
            tx_count_24h: tx.tx_count_24h,
            is_new_payee: tx.is_new_payee,
            device_changed: tx.device_changed,
        }
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        FEATURE_NAMES.len()
    }

    /// Get feature names in vector order.
    pub fn feature_names(&self) -> &'static [&'static str] {
        &FEATURE_NAMES
    }
}
