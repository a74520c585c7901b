mod conditions;
mod config;
mod policy;

pub use conditions::{Condition, EvaluationError};
pub use config::{ConfigurationError, FraudRule, RuleConfig, RuleSet, RuleSetConfig};
pub use policy::{decide, Decision, DECLINE_THRESHOLD};

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::ChargeContext;

/// Stateless engine applying a validated ruleset to charge contexts.
pub struct ScoringEngine {
    ruleset: RuleSet,
}

impl ScoringEngine {
    pub fn new(ruleset: RuleSet) -> Self {
        Self { ruleset }
    }

    pub fn ruleset(&self) -> &RuleSet {
        &self.ruleset
    }

    /// Evaluate every rule independently, apply the exclusion pass, sum the
    /// surviving weights, and clamp to [0, 1]. Purely computational and
    /// deterministic: identical inputs always yield identical results.
    pub fn score(&self, context: &ChargeContext) -> ScoreResult {
        let mut triggered: Vec<&FraudRule> = Vec::new();
        for rule in self.ruleset.rules() {
            match rule.condition.matches(context) {
                Ok(true) => triggered.push(rule),
                Ok(false) => {}
                Err(err) => {
                    // Fail open: a missing fraud signal is safer than a
                    // broken payment endpoint.
                    warn!(rule = %rule.id, %err, "condition not evaluable, rule treated as non-triggering");
                }
            }
        }

        let raw_ids: HashSet<&str> = triggered.iter().map(|rule| rule.id.as_str()).collect();
        let surviving: Vec<&FraudRule> = triggered
            .into_iter()
            .filter(|rule| {
                self.ruleset
                    .winner_of(&rule.id)
                    .map_or(true, |winner| !raw_ids.contains(winner))
            })
            .collect();

        let raw_sum: Decimal = surviving.iter().map(|rule| rule.weight).sum();
        let score = raw_sum.clamp(Decimal::ZERO, Decimal::ONE);

        ScoreResult {
            score,
            triggered_rule_ids: surviving.iter().map(|rule| rule.id.clone()).collect(),
            decision: decide(score),
        }
    }
}

/// Screening outcome for one charge: aggregate score in [0, 1], surviving
/// triggered rules in ruleset order, and the threshold decision. Produced
/// fresh per charge, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: Decimal,
    pub triggered_rule_ids: Vec<String>,
    pub decision: Decision,
}
