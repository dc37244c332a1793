//! Type definitions for the risk scorer

pub mod alert;
pub mod response;
pub mod transaction;

pub use alert::{FraudAlert, RiskLevel, RiskLevelThresholds};
pub use response::ScoredTransaction;
pub use transaction::{TransactionInput, TransactionRecord};
