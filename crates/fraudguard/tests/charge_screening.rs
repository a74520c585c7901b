//! End-to-end exercise of the screening crate through its public surface.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;

use fraudguard::screening::{
    screening_router, ChargeRecord, ChargeScreeningService, ChargeSubmission, Decision,
    ExplanationModel, LedgerError, ModelError, PaymentChannel, RuleSetConfig, TransactionLedger,
};

#[derive(Default)]
struct RecordingLedger {
    records: Mutex<Vec<ChargeRecord>>,
}

impl TransactionLedger for RecordingLedger {
    fn append(&self, record: ChargeRecord) -> Result<(), LedgerError> {
        self.records.lock().expect("ledger mutex").push(record);
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<ChargeRecord>, LedgerError> {
        let guard = self.records.lock().expect("ledger mutex");
        Ok(guard.iter().rev().take(limit).cloned().collect())
    }
}

#[derive(Default)]
struct CountingModel {
    calls: AtomicUsize,
}

#[async_trait]
impl ExplanationModel for CountingModel {
    async fn explain(&self, prompt: &str) -> Result<String, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let decision = if prompt.contains("Decision: declined") {
            "blocked"
        } else {
            "allowed"
        };
        Ok(format!("This charge was {decision} by the risk review."))
    }
}

fn screening_service(
    model: Arc<CountingModel>,
) -> (
    Arc<ChargeScreeningService<RecordingLedger, Arc<CountingModel>>>,
    Arc<RecordingLedger>,
) {
    let ruleset = RuleSetConfig::default_rules()
        .build()
        .expect("built-in rules are valid");
    let ledger = Arc::new(RecordingLedger::default());
    let service = Arc::new(ChargeScreeningService::new(ruleset, model, ledger.clone()));
    (service, ledger)
}

fn submission(amount: Decimal, currency: &str, email: &str) -> ChargeSubmission {
    ChargeSubmission {
        amount,
        currency: currency.to_string(),
        source: PaymentChannel::Stripe,
        email: email.to_string(),
    }
}

#[tokio::test]
async fn moderate_overage_is_accepted_at_point_three() {
    let model = Arc::new(CountingModel::default());
    let (service, ledger) = screening_service(model);

    let assessment = service
        .assess(submission(dec!(6000), "USD", "a@b.com"))
        .await
        .expect("charge assessed");

    assert_eq!(assessment.score, dec!(0.3));
    assert_eq!(assessment.decision, Decision::Accepted);
    assert_eq!(assessment.triggered_rule_ids, vec!["high_amount".to_string()]);
    assert_eq!(ledger.recent(10).expect("ledger reads").len(), 1);
}

#[tokio::test]
async fn extreme_amount_is_declined_under_the_superseding_rule() {
    let model = Arc::new(CountingModel::default());
    let (service, _ledger) = screening_service(model);

    let assessment = service
        .assess(submission(dec!(12000), "USD", "a@b.com"))
        .await
        .expect("charge assessed");

    assert_eq!(assessment.score, dec!(0.5));
    assert_eq!(assessment.decision, Decision::Declined);
    assert_eq!(
        assessment.triggered_rule_ids,
        vec!["very_high_amount".to_string()]
    );
}

#[tokio::test]
async fn repeated_risk_profiles_reuse_the_explanation() {
    let model = Arc::new(CountingModel::default());
    let (service, _ledger) = screening_service(model.clone());

    let first = service
        .assess(submission(dec!(6000), "USD", "a@b.com"))
        .await
        .expect("first charge");
    let second = service
        .assess(submission(dec!(8500), "USD", "c@d.com"))
        .await
        .expect("second charge");

    assert_eq!(first.explanation, second.explanation);
    assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    assert_eq!(service.cache_stats().size, 1);
}

#[tokio::test]
async fn http_surface_maps_decisions_to_statuses() {
    let model = Arc::new(CountingModel::default());
    let (service, _ledger) = screening_service(model);
    let router = screening_router(service);

    let accepted = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/charges")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "amount": 100,
                        "currency": "USD",
                        "source": "stripe",
                        "email": "a@b.com",
                    })
                    .to_string(),
                ))
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    assert_eq!(accepted.status(), StatusCode::OK);

    let declined = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/charges")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "amount": 20000,
                        "currency": "ZZZ",
                        "source": "carrier-pigeon",
                        "email": "a@temp.com",
                    })
                    .to_string(),
                ))
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(declined.status(), StatusCode::PAYMENT_REQUIRED);
    let bytes = to_bytes(declined.into_body(), usize::MAX)
        .await
        .expect("body reads");
    let body: Value = serde_json::from_slice(&bytes).expect("body is json");
    assert_eq!(body["decision"], "declined");
    assert_eq!(body["score"], json!(1.0));
}

#[tokio::test]
async fn clearing_the_cache_forces_fresh_explanations() {
    let model = Arc::new(CountingModel::default());
    let (service, _ledger) = screening_service(model.clone());

    service
        .assess(submission(dec!(6000), "USD", "a@b.com"))
        .await
        .expect("first charge");
    let report = service.clear_cache();
    assert_eq!(report.previous_size, 1);
    assert_eq!(report.current_size, 0);

    service
        .assess(submission(dec!(6000), "USD", "a@b.com"))
        .await
        .expect("second charge");
    assert_eq!(model.calls.load(Ordering::SeqCst), 2);
}
