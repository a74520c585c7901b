//! Charge fraud screening: rule configuration, condition evaluation, score
//! aggregation, decision policy, and the cached explanation layer.

pub mod domain;
pub(crate) mod evaluation;
pub mod explanation;
pub mod ledger;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{ChargeContext, ChargeSubmission, ChargeValidationError, PaymentChannel};
pub use evaluation::{
    decide, Condition, ConfigurationError, Decision, EvaluationError, FraudRule, RuleConfig,
    RuleSet, RuleSetConfig, ScoreResult, ScoringEngine, DECLINE_THRESHOLD,
};
pub use explanation::{
    AnthropicExplainer, CacheClearReport, CacheKey, CacheStats, ExplanationCache,
    ExplanationModel, LlmConfig, ModelError,
};
pub use ledger::{ChargeRecord, LedgerError, TransactionLedger};
pub use router::screening_router;
pub use service::{ChargeAssessment, ChargeScreeningService, ScreeningError};
