//! Score fusion for the supervised and anomaly sub-scores

/// Weight of the supervised probability in the fused score
pub const SUPERVISED_WEIGHT: f64 = 0.7;

/// Fused scores strictly above this are labelled fraud
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Fuses the supervised probability and the anomaly flag into one risk score.
#[derive(Debug, Clone, Copy)]
pub struct ScoreAggregator {
    /// Weight of the supervised probability; the anomaly flag gets the rest
    alpha: f64,
    threshold: f64,
}

impl ScoreAggregator {
    /// Weighted linear fusion.
    ///
    /// `alpha * supervised_prob + (1 - alpha) * anomaly_flag`, clamped to [0, 1].
    pub fn fuse(&self, supervised_prob: f64, anomaly_flag: u8) -> f64 {
        let anomaly = f64::from(anomaly_flag);
        (self.alpha * supervised_prob + (1.0 - self.alpha) * anomaly).clamp(0.0, 1.0)
    }

    /// Binary fraud decision. A score exactly at the threshold is not fraud.
    pub fn label(&self, risk_score: f64) -> u8 {
        u8::from(risk_score > self.threshold)
    }

    /// Supervised weight
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Decision threshold
    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl Default for ScoreAggregator {
    fn default() -> Self {
        Self {
            alpha: SUPERVISED_WEIGHT,
            threshold: DECISION_THRESHOLD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::supervised::BASE_PROBABILITY;

    #[test]
    fn test_weighted_fusion() {
        let aggregator = ScoreAggregator::default();

        assert!((aggregator.fuse(0.10, 0) - 0.07).abs() < 1e-12);
        assert!((aggregator.fuse(0.98, 1) - 0.986).abs() < 1e-12);
        assert!((aggregator.fuse(0.0, 1) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_threshold_is_strict() {
        let aggregator = ScoreAggregator::default();

        assert_eq!(aggregator.label(0.5), 0);
        assert_eq!(aggregator.label(0.500_000_1), 1);
        assert_eq!(aggregator.label(0.499_999_9), 0);
    }

    #[test]
    fn test_anomaly_alone_cannot_flag() {
        let aggregator = ScoreAggregator::default();

        let risk = aggregator.fuse(BASE_PROBABILITY, 1);
        assert!(risk < DECISION_THRESHOLD);
        assert_eq!(aggregator.label(risk), 0);
    }

    #[test]
    fn test_fused_score_bounds() {
        let aggregator = ScoreAggregator::default();
        assert!((aggregator.fuse(1.0, 1) - 1.0).abs() < 1e-12);
        assert!(aggregator.fuse(1.0, 1) <= 1.0);
        assert_eq!(aggregator.fuse(0.0, 0), 0.0);
    }
}
