use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::screening::domain::{ChargeContext, ChargeSubmission, PaymentChannel};
use crate::screening::evaluation::{RuleSet, RuleSetConfig, ScoringEngine};
use crate::screening::explanation::{ExplanationModel, ModelError};
use crate::screening::ledger::{ChargeRecord, LedgerError, TransactionLedger};
use crate::screening::service::ChargeScreeningService;

pub(super) fn default_ruleset() -> RuleSet {
    RuleSetConfig::default_rules()
        .build()
        .expect("built-in rules are valid")
}

pub(super) fn scoring_engine() -> ScoringEngine {
    ScoringEngine::new(default_ruleset())
}

pub(super) fn usd_charge(amount: Decimal) -> ChargeContext {
    ChargeContext {
        amount,
        currency: "USD".to_string(),
        source: PaymentChannel::Stripe,
        email: "a@b.com".to_string(),
    }
}

/// Worst case for the default rules: every rule fires and the raw weight sum
/// exceeds 1.
pub(super) fn risky_charge() -> ChargeContext {
    ChargeContext {
        amount: dec!(12000),
        currency: "XYZ".to_string(),
        source: PaymentChannel::Other,
        email: "a@temp.com".to_string(),
    }
}

pub(super) fn usd_submission(amount: Decimal) -> ChargeSubmission {
    ChargeSubmission {
        amount,
        currency: "USD".to_string(),
        source: PaymentChannel::Stripe,
        email: "a@b.com".to_string(),
    }
}

pub(super) fn risky_submission() -> ChargeSubmission {
    ChargeSubmission {
        amount: dec!(12000),
        currency: "XYZ".to_string(),
        source: PaymentChannel::Other,
        email: "a@temp.com".to_string(),
    }
}

#[derive(Default)]
pub(super) struct MemoryLedger {
    records: Mutex<Vec<ChargeRecord>>,
}

impl MemoryLedger {
    pub(super) fn records(&self) -> Vec<ChargeRecord> {
        self.records.lock().expect("ledger mutex poisoned").clone()
    }
}

impl TransactionLedger for MemoryLedger {
    fn append(&self, record: ChargeRecord) -> Result<(), LedgerError> {
        self.records
            .lock()
            .expect("ledger mutex poisoned")
            .push(record);
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<ChargeRecord>, LedgerError> {
        let guard = self.records.lock().expect("ledger mutex poisoned");
        Ok(guard.iter().rev().take(limit).cloned().collect())
    }
}

pub(super) struct UnavailableLedger;

impl TransactionLedger for UnavailableLedger {
    fn append(&self, _record: ChargeRecord) -> Result<(), LedgerError> {
        Err(LedgerError::Unavailable("ledger offline".to_string()))
    }

    fn recent(&self, _limit: usize) -> Result<Vec<ChargeRecord>, LedgerError> {
        Err(LedgerError::Unavailable("ledger offline".to_string()))
    }
}

/// Model returning a fixed reply while counting invocations.
pub(super) struct ScriptedModel {
    reply: String,
    calls: AtomicUsize,
}

impl ScriptedModel {
    pub(super) fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExplanationModel for ScriptedModel {
    async fn explain(&self, _prompt: &str) -> Result<String, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

/// Model that always fails, for the fallback path.
#[derive(Default)]
pub(super) struct FailingModel {
    calls: AtomicUsize,
}

impl FailingModel {
    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExplanationModel for FailingModel {
    async fn explain(&self, _prompt: &str) -> Result<String, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ModelError::Transport("connection refused".to_string()))
    }
}

/// Model failing its first call and succeeding afterwards, for verifying
/// that failures are not memoized.
#[derive(Default)]
pub(super) struct FlakyModel {
    calls: AtomicUsize,
}

impl FlakyModel {
    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExplanationModel for FlakyModel {
    async fn explain(&self, _prompt: &str) -> Result<String, ModelError> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst);
        if attempt == 0 {
            Err(ModelError::Timeout)
        } else {
            Ok("recovered explanation".to_string())
        }
    }
}

/// Model that yields to the scheduler before replying, so concurrent misses
/// actually overlap.
pub(super) struct SlowModel {
    calls: AtomicUsize,
}

impl SlowModel {
    pub(super) fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExplanationModel for SlowModel {
    async fn explain(&self, _prompt: &str) -> Result<String, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        Ok("slow explanation".to_string())
    }
}

pub(super) fn build_service<M: ExplanationModel + 'static>(
    model: M,
) -> (
    ChargeScreeningService<MemoryLedger, M>,
    Arc<MemoryLedger>,
) {
    let ledger = Arc::new(MemoryLedger::default());
    let service = ChargeScreeningService::new(default_ruleset(), model, ledger.clone());
    (service, ledger)
}
