use crate::cli::ServeArgs;
use crate::infra::{cors_layer, load_store, AppState};
use crate::routes::{api_router, with_service_routes};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use talent_desk::config::AppConfig;
use talent_desk::error::AppError;
use talent_desk::telemetry;
use tower_http::trace::TraceLayer;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(fixtures) = args.fixtures.take() {
        config.store.fixtures = Some(fixtures);
    }

    telemetry::init(&config.telemetry, config.environment)?;

    let store = Arc::new(load_store(config.store.fixtures.as_deref())?);

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let app = with_service_routes(api_router(store, config.reporting))
        .layer(Extension(app_state))
        .layer(prometheus_layer)
        .layer(cors_layer(&config.server.cors))
        .layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        store = %config.store.url,
        lookback_months = config.reporting.lookback_months,
        "talent desk api ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
