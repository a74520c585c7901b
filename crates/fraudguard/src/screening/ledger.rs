use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::domain::ChargeContext;
use super::evaluation::Decision;

/// Append-only audit record for one assessed charge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeRecord {
    pub context: ChargeContext,
    pub score: Decimal,
    pub triggered_rule_ids: Vec<String>,
    pub decision: Decision,
    pub explanation: String,
    pub recorded_at: DateTime<Utc>,
}

/// Storage abstraction so the service module can be exercised in isolation.
pub trait TransactionLedger: Send + Sync {
    fn append(&self, record: ChargeRecord) -> Result<(), LedgerError>;
    fn recent(&self, limit: usize) -> Result<Vec<ChargeRecord>, LedgerError>;
}

/// Error enumeration for ledger failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}
