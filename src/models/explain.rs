//! Ranked explanation of the factors behind a score
//!
//! Each candidate uses the same trigger as the scoring rules but its own
//! magnitude formula, so contributions are not a decomposition of the
//! risk score. They exist for display.

use crate::feature_extractor::DerivedFeatures;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Upper bound on returned contributions
pub const MAX_TOP_FEATURES: usize = 5;

const AMOUNT_WEIGHT: f64 = 0.15;
const NIGHT_CONTRIBUTION: f64 = 0.12;
const NEW_PAYEE_CONTRIBUTION: f64 = 0.18;
const DEVICE_CHANGED_CONTRIBUTION: f64 = 0.22;
const VELOCITY_WEIGHT: f64 = 0.08;

/// A feature name paired with its signed contribution
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureContribution {
    pub feature: String,
    pub value: f64,
}

/// Contributions ordered by descending absolute value.
///
/// Serializes as a JSON object whose key order is the rank order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopFeatures(Vec<FeatureContribution>);

impl TopFeatures {
    /// Rank contributions and keep the strongest [`MAX_TOP_FEATURES`].
    ///
    /// The sort is stable, so ties keep their candidate order.
    pub fn ranked(mut contributions: Vec<FeatureContribution>) -> Self {
        contributions.sort_by(|a, b| b.value.abs().total_cmp(&a.value.abs()));
        contributions.truncate(MAX_TOP_FEATURES);
        Self(contributions)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeatureContribution> {
        self.0.iter()
    }

    /// Contribution of a feature, if it made the ranking
    pub fn get(&self, feature: &str) -> Option<f64> {
        self.0
            .iter()
            .find(|c| c.feature == feature)
            .map(|c| c.value)
    }

    /// Feature names in rank order
    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|c| c.feature.clone()).collect()
    }
}

impl Serialize for TopFeatures {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for c in &self.0 {
            map.serialize_entry(&c.feature, &c.value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TopFeatures {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TopFeaturesVisitor;

        impl<'de> Visitor<'de> for TopFeaturesVisitor {
            type Value = TopFeatures;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of feature name to contribution")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut contributions = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((feature, value)) = access.next_entry::<String, f64>()? {
                    contributions.push(FeatureContribution { feature, value });
                }
                // Document order is the rank order
                Ok(TopFeatures(contributions))
            }
        }

        deserializer.deserialize_map(TopFeaturesVisitor)
    }
}

/// Candidate contributions for every trigger that fires, unranked
pub fn candidate_contributions(f: &DerivedFeatures) -> Vec<FeatureContribution> {
    let mut candidates = Vec::with_capacity(MAX_TOP_FEATURES);
    let mut push = |feature: &str, value: f64| {
        candidates.push(FeatureContribution {
            feature: feature.to_string(),
            value,
        })
    };

    if f.amount_normalized > 2.0 {
        push("amount", AMOUNT_WEIGHT * f.amount_normalized);
    }
    if f.is_night() {
        push("hour", NIGHT_CONTRIBUTION);
    }
    if f.is_new_payee {
        push("is_new_payee", NEW_PAYEE_CONTRIBUTION);
    }
    if f.device_changed {
        push("device_changed", DEVICE_CHANGED_CONTRIBUTION);
    }
    if f.tx_count_24h > 10 {
        push(
            "tx_count_24h",
            VELOCITY_WEIGHT * (f64::from(f.tx_count_24h) / 10.0),
        );
    }

    candidates
}

/// Top contributions for a transaction
pub fn explain(f: &DerivedFeatures) -> TopFeatures {
    TopFeatures::ranked(candidate_contributions(f))
}
