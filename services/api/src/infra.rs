use async_trait::async_trait;
use fraudguard::screening::{
    ChargeRecord, ExplanationModel, LedgerError, ModelError, TransactionLedger,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local charge ledger. Entries live for the process lifetime; a
/// durable store would implement the same trait.
#[derive(Default, Clone)]
pub(crate) struct InMemoryLedger {
    records: Arc<Mutex<Vec<ChargeRecord>>>,
}

impl TransactionLedger for InMemoryLedger {
    fn append(&self, record: ChargeRecord) -> Result<(), LedgerError> {
        let mut guard = self.records.lock().expect("ledger mutex poisoned");
        guard.push(record);
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<ChargeRecord>, LedgerError> {
        let guard = self.records.lock().expect("ledger mutex poisoned");
        Ok(guard.iter().rev().take(limit).cloned().collect())
    }
}

/// Deterministic explainer used when no API key is configured. Screening
/// decisions never depend on the model, so running without one only makes
/// the explanation text generic.
#[derive(Default, Clone)]
pub(crate) struct OfflineExplainer;

#[async_trait]
impl ExplanationModel for OfflineExplainer {
    async fn explain(&self, prompt: &str) -> Result<String, ModelError> {
        let verdict = if prompt.contains("Decision: declined") {
            "was declined because its combined fraud signals crossed the risk threshold"
        } else {
            "was accepted because its fraud signals stayed below the risk threshold"
        };
        Ok(format!(
            "Offline summary: this charge {verdict}. Configure an API key for a model-written explanation."
        ))
    }
}
