//! Heuristic anomaly triggers
//!
//! Three disjoint feature combinations stand in for an isolation forest.
//! Any single match flags the transaction; matches do not accumulate.

use crate::feature_extractor::DerivedFeatures;
use serde::Serialize;
use std::fmt;

/// Feature combination that flagged a transaction as anomalous
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyTrigger {
    /// Amount above 4 (normalized) outside 06:00-22:59
    LargeAmountAtNight,
    /// More than 15 transactions in 24h from a changed device
    BurstOnChangedDevice,
    /// Amount above 3 to a new payee outside 07:00-21:59
    NewPayeeLargeAmountOffHours,
}

impl AnomalyTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LargeAmountAtNight => "large_amount_at_night",
            Self::BurstOnChangedDevice => "burst_on_changed_device",
            Self::NewPayeeLargeAmountOffHours => "new_payee_large_amount_off_hours",
        }
    }
}

impl fmt::Display for AnomalyTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First trigger that matches, if any
pub fn detect(f: &DerivedFeatures) -> Option<AnomalyTrigger> {
    if f.amount_normalized > 4.0 && f.is_night() {
        Some(AnomalyTrigger::LargeAmountAtNight)
    } else if f.tx_count_24h > 15 && f.device_changed {
        Some(AnomalyTrigger::BurstOnChangedDevice)
    } else if f.is_new_payee && f.amount_normalized > 3.0 && f.is_extended_night() {
        Some(AnomalyTrigger::NewPayeeLargeAmountOffHours)
    } else {
        None
    }
}

/// Anomaly flag (0 or 1)
pub fn anomaly_flag(f: &DerivedFeatures) -> u8 {
    u8::from(detect(f).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features() -> DerivedFeatures {
        DerivedFeatures {
            amount_normalized: 1.0,
            hour: 12,
            weekday: 4,
            tx_count_24h: 2,
            is_new_payee: false,
            device_changed: false,
        }
    }

    #[test]
    fn test_no_anomaly() {
        assert_eq!(detect(&features()), None);
        assert_eq!(anomaly_flag(&features()), 0);
    }

    #[test]
    fn test_large_amount_at_night() {
        let f = DerivedFeatures {
            amount_normalized: 4.5,
            hour: 23,
            ..features()
        };
        assert_eq!(detect(&f), Some(AnomalyTrigger::LargeAmountAtNight));

        // Daytime large amounts are not anomalous on their own
        let day = DerivedFeatures { hour: 13, ..f };
        assert_eq!(detect(&day), None);

        let at_four = DerivedFeatures {
            amount_normalized: 4.0,
            ..f
        };
        assert_eq!(detect(&at_four), None);
    }

    #[test]
    fn test_burst_on_changed_device() {
        let f = DerivedFeatures {
            tx_count_24h: 16,
            device_changed: true,
            ..features()
        };
        assert_eq!(detect(&f), Some(AnomalyTrigger::BurstOnChangedDevice));

        let fifteen = DerivedFeatures {
            tx_count_24h: 15,
            ..f
        };
        assert_eq!(anomaly_flag(&fifteen), 0);
    }

    #[test]
    fn test_new_payee_uses_wider_night_window() {
        // 06:00 is daytime for the plain night rule but off-hours here
        let f = DerivedFeatures {
            amount_normalized: 3.5,
            hour: 6,
            is_new_payee: true,
            ..features()
        };
        assert_eq!(detect(&f), Some(AnomalyTrigger::NewPayeeLargeAmountOffHours));

        let morning = DerivedFeatures { hour: 7, ..f };
        assert_eq!(detect(&morning), None);
    }

    #[test]
    fn test_multiple_matches_set_single_flag() {
        let f = DerivedFeatures {
            amount_normalized: 6.0,
            hour: 2,
            tx_count_24h: 25,
            is_new_payee: true,
            device_changed: true,
            ..features()
        };
        assert_eq!(detect(&f), Some(AnomalyTrigger::LargeAmountAtNight));
        assert_eq!(anomaly_flag(&f), 1);
    }
}
