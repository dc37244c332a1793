//! Transaction data structures for risk scoring
//!
//! [`TransactionInput`] is the shape callers send over the wire: every field
//! is optional so that a missing field surfaces as a [`ValidationError`]
//! rather than an opaque decoding failure. [`TransactionRecord`] is the
//! validated, canonical schema the scorer works on.

use crate::clock::Clock;
use crate::error::ValidationError;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Naive timestamp layouts accepted besides RFC 3339 (interpreted as UTC)
const NAIVE_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Transaction as received from a caller, before validation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionInput {
    /// Caller-supplied identifier; generated from the clock when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,

    /// Amount in currency units
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,

    /// Hour of day; derived from the timestamp when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour: Option<i64>,

    /// Day of week, Monday = 0; derived from the timestamp when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekday: Option<i64>,

    #[serde(
        default,
        deserialize_with = "flag_or_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_new_payee: Option<i64>,

    #[serde(
        default,
        deserialize_with = "flag_or_int",
        skip_serializing_if = "Option::is_none"
    )]
    pub device_changed: Option<i64>,

    /// Transactions by the same user in the trailing 24 hours
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_count_24h: Option<i64>,

    /// ISO-8601 timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagValue {
    Int(i64),
    Bool(bool),
}

/// Flags arrive either as 0/1 or as JSON booleans.
fn flag_or_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<FlagValue>::deserialize(deserializer)?.map(|v| match v {
        FlagValue::Int(i) => i,
        FlagValue::Bool(b) => i64::from(b),
    }))
}

impl TransactionInput {
    /// Decode a JSON payload
    pub fn from_json(payload: &[u8]) -> Result<Self, ValidationError> {
        Ok(serde_json::from_slice(payload)?)
    }

    /// Validate and apply defaults, producing the canonical record.
    ///
    /// `clock` supplies the timestamp (and the id) when the caller sent none.
    pub fn into_record(self, clock: &dyn Clock) -> Result<TransactionRecord, ValidationError> {
        let amount = self.amount.ok_or(ValidationError::MissingField("amount"))?;
        let user_id = required_id(self.user_id, "user_id")?;
        let merchant_id = required_id(self.merchant_id, "merchant_id")?;
        let device_id = required_id(self.device_id, "device_id")?;

        let now = clock.now();
        let local = match self.timestamp.as_deref() {
            Some(raw) => parse_timestamp(raw)?,
            None => now.into(),
        };

        let hour = match self.hour {
            Some(h) => checked_range(h, "hour", 0, 23, "0..=23")?,
            None => local.hour() as u8,
        };
        let weekday = match self.weekday {
            Some(d) => checked_range(d, "weekday", 0, 6, "0..=6")?,
            None => local.weekday().num_days_from_monday() as u8,
        };

        let is_new_payee = flag(self.is_new_payee, "is_new_payee")?;
        let device_changed = flag(self.device_changed, "device_changed")?;

        let tx_count_24h = match self.tx_count_24h {
            Some(n) => u32::try_from(n)
                .map_err(|_| ValidationError::out_of_range("tx_count_24h", n, "non-negative"))?,
            None => 0,
        };

        let transaction_id = self
            .transaction_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| format!("TXN_{}", now.timestamp_millis()));

        let record = TransactionRecord {
            transaction_id,
            amount,
            user_id,
            merchant_id,
            device_id,
            hour,
            weekday,
            is_new_payee,
            device_changed,
            tx_count_24h,
            timestamp: local.with_timezone(&Utc),
        };
        record.validate()?;
        Ok(record)
    }
}

fn required_id(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    match value {
        Some(id) if !id.trim().is_empty() => Ok(id),
        _ => Err(ValidationError::MissingField(field)),
    }
}

fn checked_range(
    value: i64,
    field: &'static str,
    min: i64,
    max: i64,
    expected: &'static str,
) -> Result<u8, ValidationError> {
    if (min..=max).contains(&value) {
        Ok(value as u8)
    } else {
        Err(ValidationError::out_of_range(field, value, expected))
    }
}

fn flag(value: Option<i64>, field: &'static str) -> Result<bool, ValidationError> {
    match value.unwrap_or(0) {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(ValidationError::out_of_range(field, other, "0 or 1")),
    }
}

/// Parse an ISO-8601 timestamp, keeping the offset it was written in.
///
/// Timestamps without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>, ValidationError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt);
    }

    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| DateTime::<FixedOffset>::from(naive.and_utc()))
        .ok_or_else(|| ValidationError::InvalidTimestamp(raw.to_string()))
}

/// Validated transaction, the canonical feature schema of the scorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction_id: String,
    /// Amount in currency units, strictly positive
    pub amount: f64,
    pub user_id: String,
    pub merchant_id: String,
    pub device_id: String,
    /// Hour of day (0-23)
    pub hour: u8,
    /// Day of week (0-6, Monday = 0)
    pub weekday: u8,
    pub is_new_payee: bool,
    pub device_changed: bool,
    pub tx_count_24h: u32,
    pub timestamp: DateTime<Utc>,
}

impl TransactionRecord {
    /// Create a daytime, low-activity record with placeholder identifiers
    pub fn new(transaction_id: impl Into<String>, amount: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            amount,
            user_id: "user_0001".to_string(),
            merchant_id: "merchant_0001".to_string(),
            device_id: "device_0001".to_string(),
            hour: timestamp.hour() as u8,
            weekday: timestamp.weekday().num_days_from_monday() as u8,
            is_new_payee: false,
            device_changed: false,
            tx_count_24h: 0,
            timestamp,
        }
    }

    /// Check the invariants the type system does not enforce
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(ValidationError::out_of_range("amount", self.amount, "> 0"));
        }
        for (field, value) in [
            ("user_id", &self.user_id),
            ("merchant_id", &self.merchant_id),
            ("device_id", &self.device_id),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField(field));
            }
        }
        if self.hour > 23 {
            return Err(ValidationError::out_of_range("hour", self.hour, "0..=23"));
        }
        if self.weekday > 6 {
            return Err(ValidationError::out_of_range("weekday", self.weekday, "0..=6"));
        }
        Ok(())
    }
}
