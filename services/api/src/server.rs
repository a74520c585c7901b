use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryLedger, OfflineExplainer};
use crate::routes::with_screening_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use fraudguard::config::{AppConfig, RulesConfig};
use fraudguard::error::AppError;
use fraudguard::screening::{
    AnthropicExplainer, ChargeScreeningService, ExplanationModel, LlmConfig, RuleSet,
    RuleSetConfig,
};
use fraudguard::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let ruleset = load_ruleset(&config.rules)?;
    info!(rules = ruleset.len(), "fraud ruleset loaded");

    match config.llm.api_key.clone() {
        Some(api_key) => {
            let mut llm_config = LlmConfig::new(api_key).with_timeout(config.llm.timeout);
            if let Some(model) = config.llm.model.clone() {
                llm_config = llm_config.with_model(model);
            }
            let explainer = AnthropicExplainer::new(llm_config)?;
            serve(config, ruleset, explainer).await
        }
        None => {
            warn!("no API key configured, explanations fall back to offline summaries");
            serve(config, ruleset, OfflineExplainer).await
        }
    }
}

pub(crate) fn load_ruleset(rules: &RulesConfig) -> Result<RuleSet, AppError> {
    let config = match &rules.path {
        Some(path) => RuleSetConfig::from_path(path)?,
        None => RuleSetConfig::default_rules(),
    };
    Ok(config.build()?)
}

async fn serve<M>(config: AppConfig, ruleset: RuleSet, model: M) -> Result<(), AppError>
where
    M: ExplanationModel + 'static,
{
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let ledger = Arc::new(InMemoryLedger::default());
    let service = Arc::new(ChargeScreeningService::new(ruleset, model, ledger));

    let app = with_screening_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "charge screening service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
