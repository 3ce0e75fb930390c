//! HTTP server implementation for the Canvas gateway API

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

use super::handlers;
use crate::canvas::CanvasClient;
use crate::core::error::{Error, Result};

/// Shared state handed to every request handler
pub struct AppState {
    /// Upstream Canvas client, shared across requests
    pub canvas: CanvasClient,
    /// Ceiling on handling a single client request. Has to cover the
    /// multi-request fan-out of the aggregation endpoint.
    pub request_timeout: Duration,
    /// Whether `GET /metrics` is served
    pub metrics_enabled: bool,
}

/// Creates the main application router with all routes and middleware
pub fn create_app(state: Arc<AppState>) -> Router {
    // CORS configuration: the gateway serves browser clients from any
    // origin, so everything is open and credentials stay disabled.
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_origin(Any);

    // Build the complete router with all routes
    let mut router = Router::new()
        // Root route
        .route("/", get(handlers::root_handler))

        // Course routes
        .route("/courses", get(handlers::get_courses))
        .route("/courses/:course_id", get(handlers::get_course))

        // Assignment routes
        .route("/courses/:course_id/assignments", get(handlers::get_assignments))
        .route(
            "/courses/:course_id/assignments/:assignment_id",
            get(handlers::get_assignment),
        )
        .route("/missing_assignments", get(handlers::get_missing_assignments))

        // Module routes
        .route("/courses/:course_id/modules", get(handlers::get_modules))
        .route(
            "/courses/:course_id/modules/:module_id/items",
            get(handlers::get_module_items),
        )

        // Course content routes
        .route("/courses/:course_id/files", get(handlers::get_course_files))
        .route("/courses/:course_id/announcements", get(handlers::get_announcements))
        .route("/courses/:course_id/grades", get(handlers::get_grades))

        // Study guide route
        .route("/generate_study_guide", post(handlers::generate_study_guide))

        // System routes
        .route("/health", get(handlers::health_check));

    if state.metrics_enabled {
        router = router.route("/metrics", get(handlers::metrics_handler));
    }

    router
        // Apply middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(state.request_timeout))
                .layer(cors),
        )
        // Add the Canvas client as shared state
        .with_state(state)
}

/// Start the HTTP server and run until a shutdown signal arrives
pub async fn start_server(addr: SocketAddr, state: Arc<AppState>) -> Result<()> {
    info!("Starting Canvas gateway server on {}", addr);

    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::internal(format!("Failed to bind {}: {}", addr, e)))?;

    info!("Server listening on http://{}", addr);
    info!("Health check available at http://{}/health", addr);
    info!("Metrics available at http://{}/metrics", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::internal(format!("Server error: {}", e)))?;

    Ok(())
}

/// Resolve when the process receives Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::CanvasConfig;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    fn test_app() -> Router {
        test_app_with(CanvasConfig::default())
    }

    fn test_app_with(canvas_config: CanvasConfig) -> Router {
        // Mirrors startup: metrics register before the router serves
        crate::system::metrics::init_registry();
        let canvas = CanvasClient::new(&canvas_config).unwrap();
        create_app(Arc::new(AppState {
            canvas,
            request_timeout: Duration::from_secs(30),
            metrics_enabled: true,
        }))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_root_describes_service() {
        let response = test_app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["service"], "Canvas API Gateway");
        assert_eq!(body["status"], "operational");
    }

    #[tokio::test]
    async fn test_health_reports_healthy() {
        let response = test_app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert!(body["uptime_secs"].is_u64());
    }

    #[tokio::test]
    async fn test_metrics_exposes_prometheus_text() {
        let response = test_app()
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("cg_http_requests_total"));
    }

    #[tokio::test]
    async fn test_upstream_failure_is_reported_in_band() {
        // Nothing listens on port 1, so the upstream connect fails fast
        let app = test_app_with(CanvasConfig {
            retry_attempts: 1,
            ..CanvasConfig::default()
        });

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/courses?institute_url=http://127.0.0.1:1&token=t")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["data"], Value::Null);
        assert!(!body["error"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_credentials_rejected_with_422() {
        let response = test_app()
            .oneshot(Request::builder().uri("/courses").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["data"], Value::Null);
        assert!(body["error"].as_str().unwrap().contains("Invalid query parameters"));
    }

    #[tokio::test]
    async fn test_non_numeric_course_id_rejected_with_422() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/courses/math?institute_url=https://x.test&token=t")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_study_guide_requires_json_body() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/generate_study_guide?institute_url=https://x.test&token=t")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Malformed JSON");
    }

    #[tokio::test]
    async fn test_study_guide_returns_mock_guide() {
        let payload = serde_json::json!({"course_id": 55}).to_string();
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/generate_study_guide?institute_url=https://x.test&token=t")
                    .header("content-type", "application/json")
                    .body(Body::from(payload))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["title"], "Study Guide for Course 55");
        assert_eq!(body["data"]["sections"].as_array().unwrap().len(), 3);
        assert_eq!(body["error"], Value::Null);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = test_app()
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_metrics_route_can_be_disabled() {
        let canvas = CanvasClient::new(&CanvasConfig::default()).unwrap();
        let app = create_app(Arc::new(AppState {
            canvas,
            request_timeout: Duration::from_secs(30),
            metrics_enabled: false,
        }));

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
