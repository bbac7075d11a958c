use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use talent_desk::config::ReportingConfig;
use talent_desk::reporting::{reporting_router, ReportAggregator};
use talent_desk::tenancy::{tenancy_router, TenancyServices, TenantStore};

/// Tenancy and reporting routes over one shared store.
pub(crate) fn api_router<S>(store: Arc<S>, reporting: ReportingConfig) -> Router
where
    S: TenantStore + 'static,
{
    let services = Arc::new(TenancyServices::new(Arc::clone(&store)));
    let aggregator = Arc::new(ReportAggregator::new(store, reporting));
    tenancy_router(services).merge(reporting_router(aggregator))
}

pub(crate) fn with_service_routes(router: Router) -> Router {
    router
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use talent_desk::tenancy::{MemoryStore, ACTOR_ROLE_HEADER};
    use tower::ServiceExt;

    fn app(ready: bool) -> Router {
        let handle = PrometheusBuilder::new().build_recorder().handle();
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(handle),
        };
        let store = Arc::new(MemoryStore::new());
        with_service_routes(api_router(store, ReportingConfig::default()))
            .layer(Extension(state))
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(ACTOR_ROLE_HEADER, "ADMIN")
            .body(Body::empty())
            .expect("request")
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    #[tokio::test]
    async fn health_is_always_ok() {
        let response = app(false)
            .oneshot(get_request("/health"))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn readiness_tracks_the_startup_flag() {
        let pending = app(false)
            .oneshot(get_request("/ready"))
            .await
            .expect("router responds");
        assert_eq!(pending.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_body(pending).await["status"], "initializing");

        let ready = app(true)
            .oneshot(get_request("/ready"))
            .await
            .expect("router responds");
        assert_eq!(ready.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_are_plain_text() {
        let response = app(true)
            .oneshot(get_request("/metrics"))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4"
        );
    }

    #[tokio::test]
    async fn tenancy_and_reporting_share_one_store() {
        let app = app(true);
        let created = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/plans")
                    .header(ACTOR_ROLE_HEADER, "ADMIN")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({
                            "name": "Starter",
                            "type": "BASIC",
                            "maxUsers": 3,
                            "maxCandidates": 10,
                            "maxVacancies": 2,
                            "price": "49.90"
                        })
                        .to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("router responds");
        assert_eq!(created.status(), StatusCode::CREATED);

        let dashboard = app
            .oneshot(get_request("/api/v1/reports/dashboard?today=2026-02-28"))
            .await
            .expect("router responds");
        assert_eq!(dashboard.status(), StatusCode::OK);
        let body = json_body(dashboard).await;
        assert_eq!(body["totals"]["companies"], 0);
        assert_eq!(body["evolution"]["candidates"].as_array().map(Vec::len), Some(5));
    }
}
