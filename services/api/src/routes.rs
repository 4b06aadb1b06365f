use crate::infra::{AppState, BoardService};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use chrono::Utc;
use jobboard::board::board_router;
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;

pub(crate) fn with_board_routes(service: Arc<BoardService>) -> axum::Router {
    board_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck(Extension(state): Extension<AppState>) -> Json<serde_json::Value> {
    let now = Utc::now();
    Json(json!({
        "status": "ok",
        "timestamp": now.to_rfc3339(),
        "uptime_seconds": state.uptime_seconds(now),
    }))
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
    use crate::infra::in_memory_service;
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn state(ready: bool) -> AppState {
        let recorder = PrometheusBuilder::new().build_recorder();
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(recorder.handle()),
            started_at: Utc::now(),
        }
    }

    async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).expect("request builds"))
            .await
            .expect("route executes");
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        (status, serde_json::from_slice(&body).expect("json payload"))
    }

    #[tokio::test]
    async fn health_reports_timestamp_and_uptime() {
        let app = with_board_routes(in_memory_service()).layer(Extension(state(true)));
        let (status, payload) = get(app, "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["status"], "ok");
        assert!(payload["timestamp"].is_string());
        assert!(payload["uptime_seconds"].as_i64().is_some_and(|secs| secs >= 0));
    }

    #[tokio::test]
    async fn readiness_tracks_flag() {
        let initializing = with_board_routes(in_memory_service()).layer(Extension(state(false)));
        let (status, payload) = get(initializing, "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload["status"], "initializing");

        let ready = with_board_routes(in_memory_service()).layer(Extension(state(true)));
        let (status, _) = get(ready, "/ready").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn board_routes_are_mounted() {
        let app = with_board_routes(in_memory_service()).layer(Extension(state(true)));
        let (status, payload) = get(app, "/api/v1/vacancies").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["total"], 0);
    }
}
