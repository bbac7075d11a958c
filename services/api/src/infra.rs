use axum::http::HeaderValue;
use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use talent_desk::config::CorsPolicy;
use talent_desk::error::AppError;
use talent_desk::tenancy::MemoryStore;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Empty store, or one seeded from a JSON snapshot.
pub(crate) fn load_store(fixtures: Option<&Path>) -> Result<MemoryStore, AppError> {
    match fixtures {
        Some(path) => {
            let store = MemoryStore::from_fixture_file(path)?;
            info!(path = %path.display(), "tenant store seeded from fixtures");
            Ok(store)
        }
        None => Ok(MemoryStore::new()),
    }
}

pub(crate) fn cors_layer(policy: &CorsPolicy) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match policy {
        CorsPolicy::AnyOrigin => layer.allow_origin(Any),
        CorsPolicy::Origins(origins) => {
            let allowed = origins
                .iter()
                .filter_map(|origin| match origin.parse::<HeaderValue>() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!(%origin, "skipping CORS origin that is not a valid header value");
                        None
                    }
                })
                .collect::<Vec<_>>();
            layer.allow_origin(allowed)
        }
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_reports_the_raw_value() {
        assert_eq!(
            parse_date(" 2026-02-28 "),
            Ok(NaiveDate::from_ymd_opt(2026, 2, 28).expect("valid"))
        );
        let err = parse_date("yesterday").expect_err("not a date");
        assert!(err.contains("'yesterday'"));
    }

    #[test]
    fn missing_fixture_file_is_reported_with_its_path() {
        let err = load_store(Some(Path::new("does/not/exist.json"))).expect_err("missing file");
        assert!(err.to_string().contains("does/not/exist.json"));
    }
}
