//! Deduplicating cache in front of the explanation model.
//!
//! Keys are coarse by design: charges sharing a triggered-rule set and
//! decision share one explanation regardless of amount or email specifics.
//! Entries are immutable once written and live until an explicit clear.

mod model;

pub use model::{AnthropicExplainer, ExplanationModel, LlmConfig, ModelError};

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use super::evaluation::{Decision, ScoreResult};

const FALLBACK_ACCEPTED: &str =
    "The charge was accepted: the fraud signals we evaluated did not raise enough combined risk to block it.";
const FALLBACK_DECLINED: &str =
    "The charge was declined: the combined fraud signals placed it above our risk threshold.";

/// Deterministic fingerprint of a risk profile. Triggered ids are sorted so
/// the key is independent of ruleset configuration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(triggered_rule_ids: &[String], decision: Decision) -> Self {
        let mut ids: Vec<&str> = triggered_rule_ids.iter().map(String::as_str).collect();
        ids.sort_unstable();
        Self(format!("{}|{}", ids.join("+"), decision.label()))
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    explanation: String,
    created_at: DateTime<Utc>,
}

/// Cache introspection snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub status: &'static str,
}

/// Accounting returned by an explicit clear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheClearReport {
    pub previous_size: usize,
    pub current_size: usize,
}

struct CacheState {
    entries: HashMap<CacheKey, CacheEntry>,
    claims: HashMap<CacheKey, Arc<tokio::sync::Mutex<()>>>,
}

/// Explanation store owned by the screening service. All entry/claim state
/// sits behind one mutex that is never held across an await point; the
/// external call happens under a per-key claim so concurrent misses for the
/// same key collapse into a single model invocation.
pub struct ExplanationCache<M> {
    model: M,
    state: Mutex<CacheState>,
}

impl<M: ExplanationModel> ExplanationCache<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                claims: HashMap::new(),
            }),
        }
    }

    /// Return the cached explanation for the result's risk profile, calling
    /// the model on a miss. Model failures yield a deterministic fallback
    /// that is never cached, so a later call retries the key.
    pub async fn explanation(&self, result: &ScoreResult, triggered_labels: &[String]) -> String {
        let key = CacheKey::new(&result.triggered_rule_ids, result.decision);

        let claim = {
            let mut state = self.state.lock().expect("cache mutex poisoned");
            if let Some(entry) = state.entries.get(&key) {
                return entry.explanation.clone();
            }
            state
                .claims
                .entry(key.clone())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };

        let _leader = claim.lock().await;

        // A concurrent leader may have populated the entry while we waited.
        {
            let state = self.state.lock().expect("cache mutex poisoned");
            if let Some(entry) = state.entries.get(&key) {
                return entry.explanation.clone();
            }
        }

        let prompt = build_prompt(result, triggered_labels);
        match self.model.explain(&prompt).await {
            Ok(text) => {
                let entry = CacheEntry {
                    explanation: text.clone(),
                    created_at: Utc::now(),
                };
                let mut state = self.state.lock().expect("cache mutex poisoned");
                debug!(created_at = %entry.created_at, size = state.entries.len() + 1, "explanation cached");
                state.entries.insert(key.clone(), entry);
                state.claims.remove(&key);
                text
            }
            Err(err) => {
                warn!(%err, "explanation model call failed, using fallback");
                let mut state = self.state.lock().expect("cache mutex poisoned");
                state.claims.remove(&key);
                fallback_explanation(result.decision).to_string()
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock().expect("cache mutex poisoned");
        CacheStats {
            size: state.entries.len(),
            status: "operational",
        }
    }

    /// Atomically empty the store, reporting the size immediately before.
    pub fn clear(&self) -> CacheClearReport {
        let mut state = self.state.lock().expect("cache mutex poisoned");
        let previous_size = state.entries.len();
        state.entries.clear();
        CacheClearReport {
            previous_size,
            current_size: state.entries.len(),
        }
    }
}

/// Deterministic explanation used when the model is unavailable.
pub fn fallback_explanation(decision: Decision) -> &'static str {
    match decision {
        Decision::Accepted => FALLBACK_ACCEPTED,
        Decision::Declined => FALLBACK_DECLINED,
    }
}

/// Assemble the model input from the triggered rule labels, score, and
/// decision. Part of the core: the prompt fixes explanation semantics for
/// every charge sharing a cache key.
pub fn build_prompt(result: &ScoreResult, triggered_labels: &[String]) -> String {
    let mut prompt = String::new();
    prompt.push_str(
        "You are a payment risk analyst. In two or three sentences, explain this \
         fraud screening outcome to the merchant without naming internal systems.\n\n",
    );
    prompt.push_str(&format!("Decision: {}\n", result.decision.label()));
    prompt.push_str(&format!(
        "Risk score: {} (scale 0 to 1, declined at 0.5 or above)\n",
        result.score
    ));
    if triggered_labels.is_empty() {
        prompt.push_str("No fraud signals triggered.\n");
    } else {
        prompt.push_str("Triggered signals:\n");
        for label in triggered_labels {
            prompt.push_str(&format!("- {label}\n"));
        }
    }
    prompt
}
