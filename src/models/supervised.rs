//! Rule-based stand-in for a supervised classifier

use crate::feature_extractor::DerivedFeatures;

/// Prior probability before any rule fires
pub const BASE_PROBABILITY: f64 = 0.10;

/// Ceiling on the probability; the rules never claim certainty
pub const PROBABILITY_CAP: f64 = 0.98;

/// Additive increments, one per rule
const HIGH_AMOUNT: f64 = 0.25;
const VERY_HIGH_AMOUNT: f64 = 0.15;
const NIGHT: f64 = 0.15;
const NEW_PAYEE: f64 = 0.20;
const DEVICE_CHANGED: f64 = 0.25;
const HIGH_VELOCITY: f64 = 0.10;
const VERY_HIGH_VELOCITY: f64 = 0.15;

/// Supervised-style fraud probability built by additive risk accumulation.
///
/// Both amount tiers (and both velocity tiers) fire together once the
/// upper threshold is crossed. All comparisons are strict.
pub fn supervised_probability(f: &DerivedFeatures) -> f64 {
    let mut prob = BASE_PROBABILITY;

    if f.amount_normalized > 3.0 {
        prob += HIGH_AMOUNT;
    }
    if f.amount_normalized > 5.0 {
        prob += VERY_HIGH_AMOUNT;
    }
    if f.is_night() {
        prob += NIGHT;
    }
    if f.is_new_payee {
        prob += NEW_PAYEE;
    }
    if f.device_changed {
        prob += DEVICE_CHANGED;
    }
    if f.tx_count_24h > 10 {
        prob += HIGH_VELOCITY;
    }
    if f.tx_count_24h > 20 {
        prob += VERY_HIGH_VELOCITY;
    }

    prob.min(PROBABILITY_CAP)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features() -> DerivedFeatures {
        DerivedFeatures {
            amount_normalized: 0.5,
            hour: 14,
            weekday: 2,
            tx_count_24h: 5,
            is_new_payee: false,
            device_changed: false,
        }
    }

    #[test]
    fn test_base_probability() {
        assert_eq!(supervised_probability(&features()), BASE_PROBABILITY);
    }

    #[test]
    fn test_amount_threshold_is_strict() {
        let at_three = DerivedFeatures {
            amount_normalized: 3.0,
            ..features()
        };
        assert_eq!(supervised_probability(&at_three), BASE_PROBABILITY);

        let above_three = DerivedFeatures {
            amount_normalized: 3.0001,
            ..features()
        };
        assert!((supervised_probability(&above_three) - 0.35).abs() < 1e-12);
    }

    #[test]
    fn test_amount_tiers_stack() {
        let f = DerivedFeatures {
            amount_normalized: 5.5,
            ..features()
        };
        assert!((supervised_probability(&f) - 0.50).abs() < 1e-12);
    }

    #[test]
    fn test_velocity_tiers() {
        let eleven = DerivedFeatures {
            tx_count_24h: 11,
            ..features()
        };
        assert!((supervised_probability(&eleven) - 0.20).abs() < 1e-12);

        let twenty = DerivedFeatures {
            tx_count_24h: 20,
            ..features()
        };
        assert!((supervised_probability(&twenty) - 0.20).abs() < 1e-12);

        let twenty_one = DerivedFeatures {
            tx_count_24h: 21,
            ..features()
        };
        assert!((supervised_probability(&twenty_one) - 0.35).abs() < 1e-12);
    }

    #[test]
    fn test_behavioral_flags() {
        let f = DerivedFeatures {
            hour: 23,
            is_new_payee: true,
            device_changed: true,
            ..features()
        };
        // 0.10 + 0.15 + 0.20 + 0.25
        assert!((supervised_probability(&f) - 0.70).abs() < 1e-12);
    }

    #[test]
    fn test_probability_is_capped() {
        let f = DerivedFeatures {
            amount_normalized: 6.0,
            hour: 2,
            tx_count_24h: 25,
            is_new_payee: true,
            device_changed: true,
            ..features()
        };
        assert_eq!(supervised_probability(&f), PROBABILITY_CAP);
    }
}
