use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::super::domain::PaymentChannel;
use super::conditions::Condition;

/// One rule record as it appears in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub id: String,
    pub label: String,
    pub condition: Condition,
    pub weight: Decimal,
}

/// Ordered rule records plus the exclusion table (`loser -> winner`).
/// Insertion order matters only for the triggered-rules report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSetConfig {
    pub rules: Vec<RuleConfig>,
    #[serde(default)]
    pub exclusions: HashMap<String, String>,
}

impl RuleSetConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigurationError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigurationError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// The built-in heuristics used when no rule file is configured.
    pub fn default_rules() -> Self {
        let rules = vec![
            RuleConfig {
                id: "high_amount".to_string(),
                label: "High charge amount".to_string(),
                condition: Condition::AmountOver { limit: dec!(5000) },
                weight: dec!(0.3),
            },
            RuleConfig {
                id: "very_high_amount".to_string(),
                label: "Very high charge amount".to_string(),
                condition: Condition::AmountOver { limit: dec!(10000) },
                weight: dec!(0.5),
            },
            RuleConfig {
                id: "non_standard_currency".to_string(),
                label: "Non-standard currency".to_string(),
                condition: Condition::CurrencyOutside {
                    allowed: vec!["USD".to_string(), "EUR".to_string(), "GBP".to_string()],
                },
                weight: dec!(0.2),
            },
            RuleConfig {
                id: "suspicious_email".to_string(),
                label: "Disposable email domain".to_string(),
                condition: Condition::EmailSuffix {
                    suffix: "@temp.com".to_string(),
                },
                weight: dec!(0.1),
            },
            RuleConfig {
                id: "non_standard_source".to_string(),
                label: "Unrecognized payment channel".to_string(),
                condition: Condition::SourceOutside {
                    channels: vec![
                        "stripe".to_string(),
                        "paypal".to_string(),
                        "bank_transfer".to_string(),
                    ],
                },
                weight: dec!(0.3),
            },
        ];

        let mut exclusions = HashMap::new();
        exclusions.insert("high_amount".to_string(), "very_high_amount".to_string());

        Self { rules, exclusions }
    }

    /// Validate every record and produce the immutable runtime `RuleSet`.
    /// Malformed entries fail startup, never a request.
    pub fn build(self) -> Result<RuleSet, ConfigurationError> {
        if self.rules.is_empty() {
            return Err(ConfigurationError::EmptyRuleSet);
        }

        let mut seen = HashSet::new();
        for rule in &self.rules {
            if !seen.insert(rule.id.as_str()) {
                return Err(ConfigurationError::DuplicateRuleId(rule.id.clone()));
            }
            if rule.id.trim().is_empty() {
                return Err(ConfigurationError::BlankRuleId);
            }
            // Cache fingerprints join ids with '+' and '|'; ids containing
            // either could collide into one fingerprint.
            if rule.id.chars().any(|c| c == '+' || c == '|') {
                return Err(ConfigurationError::ReservedRuleIdCharacter(rule.id.clone()));
            }
            if rule.weight < Decimal::ZERO || rule.weight > Decimal::ONE {
                return Err(ConfigurationError::WeightOutOfRange {
                    id: rule.id.clone(),
                    weight: rule.weight,
                });
            }
            validate_condition(&rule.id, &rule.condition)?;
        }

        for (loser, winner) in &self.exclusions {
            if loser == winner {
                return Err(ConfigurationError::SelfExclusion(loser.clone()));
            }
            for id in [loser, winner] {
                if !seen.contains(id.as_str()) {
                    return Err(ConfigurationError::UnknownExclusionRule(id.clone()));
                }
            }
        }

        let rules = self
            .rules
            .into_iter()
            .map(|rule| FraudRule {
                id: rule.id,
                label: rule.label,
                condition: rule.condition,
                weight: rule.weight,
            })
            .collect();

        Ok(RuleSet {
            rules,
            exclusions: self.exclusions,
        })
    }
}

fn validate_condition(id: &str, condition: &Condition) -> Result<(), ConfigurationError> {
    match condition {
        Condition::AmountOver { limit }
        | Condition::AmountAtLeast { limit }
        | Condition::AmountUnder { limit }
        | Condition::AmountAtMost { limit } => {
            if *limit <= Decimal::ZERO {
                return Err(ConfigurationError::NonPositiveAmountThreshold {
                    id: id.to_string(),
                    limit: *limit,
                });
            }
        }
        Condition::EmailEquals { address: text }
        | Condition::EmailPrefix { prefix: text }
        | Condition::EmailSuffix { suffix: text } => {
            if text.is_empty() {
                return Err(ConfigurationError::EmptyTextMatcher { id: id.to_string() });
            }
        }
        Condition::CurrencyEquals { code } => {
            validate_currency_code(id, code)?;
        }
        Condition::CurrencyOutside { allowed } => {
            if allowed.is_empty() {
                return Err(ConfigurationError::EmptyMembershipSet { id: id.to_string() });
            }
            for code in allowed {
                validate_currency_code(id, code)?;
            }
        }
        Condition::SourceWithin { channels } | Condition::SourceOutside { channels } => {
            if channels.is_empty() {
                return Err(ConfigurationError::EmptyMembershipSet { id: id.to_string() });
            }
            for channel in channels {
                if !PaymentChannel::is_known_label(channel) {
                    return Err(ConfigurationError::UnknownChannel {
                        id: id.to_string(),
                        channel: channel.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}

fn validate_currency_code(id: &str, code: &str) -> Result<(), ConfigurationError> {
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(ConfigurationError::MalformedCurrencyCode {
            id: id.to_string(),
            code: code.to_string(),
        });
    }
    Ok(())
}

/// A validated rule: named predicate plus the weight it contributes when its
/// condition holds.
#[derive(Debug, Clone, PartialEq)]
pub struct FraudRule {
    pub id: String,
    pub label: String,
    pub condition: Condition,
    pub weight: Decimal,
}

/// Immutable, validated rule collection for the process lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    rules: Vec<FraudRule>,
    exclusions: HashMap<String, String>,
}

impl RuleSet {
    #[cfg(test)]
    pub(crate) fn from_parts(rules: Vec<FraudRule>, exclusions: HashMap<String, String>) -> Self {
        Self { rules, exclusions }
    }

    pub fn rules(&self) -> &[FraudRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub(crate) fn winner_of(&self, loser: &str) -> Option<&str> {
        self.exclusions.get(loser).map(String::as_str)
    }

    /// Human-readable labels for a triggered-rule report, in report order.
    pub fn labels_for(&self, ids: &[String]) -> Vec<String> {
        ids.iter()
            .filter_map(|id| {
                self.rules
                    .iter()
                    .find(|rule| rule.id == *id)
                    .map(|rule| rule.label.clone())
            })
            .collect()
    }
}

/// Fatal startup-time rule configuration problems.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("failed to read rule file '{path}'")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("rule file '{path}' is not valid JSON")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("ruleset contains no rules")]
    EmptyRuleSet,
    #[error("rule id must not be blank")]
    BlankRuleId,
    #[error("rule id '{0}' contains a reserved character ('+' or '|')")]
    ReservedRuleIdCharacter(String),
    #[error("duplicate rule id '{0}'")]
    DuplicateRuleId(String),
    #[error("rule '{id}' has weight {weight}, expected a value in [0, 1]")]
    WeightOutOfRange { id: String, weight: Decimal },
    #[error("rule '{id}' has a non-positive amount threshold {limit}")]
    NonPositiveAmountThreshold { id: String, limit: Decimal },
    #[error("rule '{id}' has an empty text matcher")]
    EmptyTextMatcher { id: String },
    #[error("rule '{id}' has an empty membership set")]
    EmptyMembershipSet { id: String },
    #[error("rule '{id}' references currency code '{code}', expected three uppercase letters")]
    MalformedCurrencyCode { id: String, code: String },
    #[error("rule '{id}' references unknown payment channel '{channel}'")]
    UnknownChannel { id: String, channel: String },
    #[error("exclusion references unknown rule '{0}'")]
    UnknownExclusionRule(String),
    #[error("rule '{0}' cannot exclude itself")]
    SelfExclusion(String),
}
