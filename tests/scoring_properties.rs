use chrono::{TimeZone, Utc};
use fraud_risk_scorer::models::aggregator::ScoreAggregator;
use fraud_risk_scorer::{FixedClock, RiskScorer, TransactionInput, TransactionRecord, ValidationError};
use proptest::prelude::*;
use std::sync::Arc;

fn scorer() -> RiskScorer {
    let clock = FixedClock(Utc.with_ymd_and_hms(2025, 6, 11, 14, 0, 0).unwrap());
    RiskScorer::with_clock(Arc::new(clock))
}

fn input(amount: f64, hour: i64, tx_count: i64, new_payee: i64, changed: i64) -> TransactionInput {
    TransactionInput {
        amount: Some(amount),
        user_id: Some("user_1".into()),
        merchant_id: Some("merchant_1".into()),
        device_id: Some("device_1".into()),
        hour: Some(hour),
        weekday: Some(3),
        is_new_payee: Some(new_payee),
        device_changed: Some(changed),
        tx_count_24h: Some(tx_count),
        ..Default::default()
    }
}

prop_compose! {
    fn valid_record()(
        amount in 0.01f64..200_000.0,
        hour in 0u8..24,
        weekday in 0u8..7,
        tx_count_24h in 0u32..100,
        is_new_payee in any::<bool>(),
        device_changed in any::<bool>(),
    ) -> TransactionRecord {
        let mut tx = TransactionRecord::new(
            "tx_prop",
            amount,
            Utc.with_ymd_and_hms(2025, 6, 11, 14, 0, 0).unwrap(),
        );
        tx.hour = hour;
        tx.weekday = weekday;
        tx.tx_count_24h = tx_count_24h;
        tx.is_new_payee = is_new_payee;
        tx.device_changed = device_changed;
        tx
    }
}

proptest! {
    #[test]
    fn scores_stay_in_bounds(tx in valid_record()) {
        let result = scorer().score(&tx).unwrap();

        prop_assert!((0.0..=1.0).contains(&result.risk_score));
        prop_assert!(result.supervised_prob >= 0.10 - 1e-12);
        prop_assert!(result.supervised_prob <= 0.98);
        prop_assert!(result.anomaly_flag <= 1);
    }

    #[test]
    fn label_matches_strict_threshold(tx in valid_record()) {
        let result = scorer().score(&tx).unwrap();
        prop_assert_eq!(result.fraud_label == 1, result.risk_score > 0.5);
    }

    #[test]
    fn explanation_is_ranked_and_bounded(tx in valid_record()) {
        let result = scorer().score(&tx).unwrap();
        let values: Vec<f64> = result.shap_top_features.iter().map(|c| c.value.abs()).collect();

        prop_assert!(values.len() <= 5);
        for pair in values.windows(2) {
            prop_assert!(pair[0] >= pair[1]);
        }
    }

    #[test]
    fn scoring_is_idempotent(tx in valid_record()) {
        let scorer = scorer();
        let first = scorer.score(&tx).unwrap();
        let second = scorer.score(&tx).unwrap();

        prop_assert_eq!(first.risk_score.to_bits(), second.risk_score.to_bits());
        prop_assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn non_positive_amounts_are_rejected(amount in -1_000_000.0f64..=0.0) {
        let err = scorer().score_input(input(amount, 12, 0, 0, 0)).unwrap_err();
        let is_amount_range_error = matches!(err, ValidationError::OutOfRange { field: "amount", .. });
        prop_assert!(is_amount_range_error);
    }

    #[test]
    fn out_of_range_hours_are_rejected(hour in prop_oneof![-100i64..0, 24i64..100]) {
        let err = scorer().score_input(input(100.0, hour, 0, 0, 0)).unwrap_err();
        prop_assert_eq!(err.field(), Some("hour"));
    }
}

#[test]
fn scenario_a_low_risk() {
    let result = scorer().score_input(input(5000.0, 14, 5, 0, 0)).unwrap();

    assert!((result.supervised_prob - 0.10).abs() < 1e-12);
    assert_eq!(result.anomaly_flag, 0);
    assert!((result.risk_score - 0.07).abs() < 1e-12);
    assert_eq!(result.fraud_label, 0);
    assert!(result.shap_top_features.is_empty());
}

#[test]
fn scenario_b_high_risk() {
    let result = scorer().score_input(input(60_000.0, 2, 25, 1, 1)).unwrap();

    assert_eq!(result.supervised_prob, 0.98);
    assert_eq!(result.anomaly_flag, 1);
    assert!((result.risk_score - 0.986).abs() < 1e-12);
    assert_eq!(result.fraud_label, 1);
}

#[test]
fn scenario_c_amount_boundary_is_strict() {
    let at_boundary = scorer().score_input(input(30_000.0, 14, 0, 0, 0)).unwrap();
    assert!((at_boundary.supervised_prob - 0.10).abs() < 1e-12);

    let above = scorer().score_input(input(30_001.0, 14, 0, 0, 0)).unwrap();
    assert!((above.supervised_prob - 0.35).abs() < 1e-12);
}

#[test]
fn risk_score_at_threshold_is_not_fraud() {
    assert_eq!(ScoreAggregator::default().label(0.5), 0);
}

#[test]
fn missing_identifier_is_rejected_before_scoring() {
    let tx = TransactionInput {
        user_id: None,
        ..input(60_000.0, 2, 25, 1, 1)
    };
    assert_eq!(
        scorer().score_input(tx),
        Err(ValidationError::MissingField("user_id"))
    );
}

#[test]
fn json_round_trip_through_public_api() {
    let payload = br#"{"amount": 45000, "user_id": "u", "merchant_id": "m",
        "device_id": "d", "timestamp": "2025-06-11T23:30:00Z",
        "is_new_payee": 1, "tx_count_24h": 12}"#;
    let input = TransactionInput::from_json(payload).unwrap();
    let result = scorer().score_input(input).unwrap();

    // 0.10 + 0.25 (amount) + 0.15 (23:00) + 0.20 (new payee) + 0.10 (velocity)
    assert!((result.supervised_prob - 0.80).abs() < 1e-12);
    assert_eq!(result.anomaly_flag, 1);
    assert_eq!(
        result.shap_top_features.names(),
        vec!["amount", "is_new_payee", "hour", "tx_count_24h"]
    );
}
