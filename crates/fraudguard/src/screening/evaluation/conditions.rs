use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::super::domain::ChargeContext;

/// Declarative predicate shapes interpreted by a fixed evaluator. Conditions
/// are configuration data, never executable code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum Condition {
    AmountOver { limit: Decimal },
    AmountAtLeast { limit: Decimal },
    AmountUnder { limit: Decimal },
    AmountAtMost { limit: Decimal },
    EmailEquals { address: String },
    EmailPrefix { prefix: String },
    EmailSuffix { suffix: String },
    CurrencyEquals { code: String },
    CurrencyOutside { allowed: Vec<String> },
    SourceWithin { channels: Vec<String> },
    SourceOutside { channels: Vec<String> },
}

/// Structural problems found while evaluating a condition. Load-time
/// validation rejects these, so hitting one at request time means the rule
/// fails open and does not trigger.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EvaluationError {
    #[error("membership condition has an empty set")]
    EmptyMembershipSet,
}

impl Condition {
    pub(crate) fn matches(&self, context: &ChargeContext) -> Result<bool, EvaluationError> {
        match self {
            Condition::AmountOver { limit } => Ok(context.amount > *limit),
            Condition::AmountAtLeast { limit } => Ok(context.amount >= *limit),
            Condition::AmountUnder { limit } => Ok(context.amount < *limit),
            Condition::AmountAtMost { limit } => Ok(context.amount <= *limit),
            Condition::EmailEquals { address } => Ok(context.email == *address),
            Condition::EmailPrefix { prefix } => Ok(context.email.starts_with(prefix)),
            Condition::EmailSuffix { suffix } => Ok(context.email.ends_with(suffix)),
            Condition::CurrencyEquals { code } => Ok(context.currency == *code),
            Condition::CurrencyOutside { allowed } => {
                if allowed.is_empty() {
                    return Err(EvaluationError::EmptyMembershipSet);
                }
                Ok(!allowed.iter().any(|code| *code == context.currency))
            }
            Condition::SourceWithin { channels } => {
                if channels.is_empty() {
                    return Err(EvaluationError::EmptyMembershipSet);
                }
                Ok(channels.iter().any(|name| name == context.source.label()))
            }
            Condition::SourceOutside { channels } => {
                if channels.is_empty() {
                    return Err(EvaluationError::EmptyMembershipSet);
                }
                Ok(!channels.iter().any(|name| name == context.source.label()))
            }
        }
    }
}
