use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use super::domain::{ChargeContext, ChargeSubmission, ChargeValidationError};
use super::evaluation::{Decision, RuleSet, ScoringEngine};
use super::explanation::{CacheClearReport, CacheStats, ExplanationCache, ExplanationModel};
use super::ledger::{ChargeRecord, LedgerError, TransactionLedger};

/// Service composing the scoring engine, explanation cache, and ledger.
pub struct ChargeScreeningService<L, M> {
    engine: ScoringEngine,
    cache: ExplanationCache<M>,
    ledger: Arc<L>,
}

impl<L, M> ChargeScreeningService<L, M>
where
    L: TransactionLedger + 'static,
    M: ExplanationModel + 'static,
{
    pub fn new(ruleset: RuleSet, model: M, ledger: Arc<L>) -> Self {
        Self {
            engine: ScoringEngine::new(ruleset),
            cache: ExplanationCache::new(model),
            ledger,
        }
    }

    /// Validate and assess a raw charge submission.
    pub async fn assess(
        &self,
        submission: ChargeSubmission,
    ) -> Result<ChargeAssessment, ScreeningError> {
        let context = submission.into_context()?;
        self.assess_context(context).await
    }

    /// Score an already-validated charge, attach its explanation, and append
    /// the outcome to the ledger. The decision never depends on model
    /// availability; an adapter failure only degrades the explanation text.
    pub async fn assess_context(
        &self,
        context: ChargeContext,
    ) -> Result<ChargeAssessment, ScreeningError> {
        let result = self.engine.score(&context);
        let labels = self.engine.ruleset().labels_for(&result.triggered_rule_ids);
        let explanation = self.cache.explanation(&result, &labels).await;

        self.ledger.append(ChargeRecord {
            context,
            score: result.score,
            triggered_rule_ids: result.triggered_rule_ids.clone(),
            decision: result.decision,
            explanation: explanation.clone(),
            recorded_at: Utc::now(),
        })?;

        info!(score = %result.score, decision = result.decision.label(), "charge assessed");

        Ok(ChargeAssessment {
            score: result.score,
            triggered_rule_ids: result.triggered_rule_ids,
            decision: result.decision,
            explanation,
        })
    }

    /// Most recent ledger entries, newest first.
    pub fn recent_charges(&self, limit: usize) -> Result<Vec<ChargeRecord>, ScreeningError> {
        Ok(self.ledger.recent(limit)?)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) -> CacheClearReport {
        self.cache.clear()
    }
}

/// Payload the controller layer serializes into its response bodies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChargeAssessment {
    pub score: Decimal,
    pub triggered_rule_ids: Vec<String>,
    pub decision: Decision,
    pub explanation: String,
}

/// Error raised by the screening service.
#[derive(Debug, Error)]
pub enum ScreeningError {
    #[error(transparent)]
    Validation(#[from] ChargeValidationError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
