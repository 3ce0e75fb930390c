//! HTTP request handlers for the Canvas gateway API
//!
//! Every Canvas-backed endpoint shares one shape: authenticate with the
//! caller's `institute_url` and `token` query parameters, proxy to Canvas,
//! and wrap the result in [`CanvasResponse`]. Upstream failures come back
//! as HTTP 200 with `success: false` so clients can always decode the
//! same envelope; only malformed requests get a non-200 status.

use crate::api::server::AppState;
use crate::canvas::{aggregator, study_guide};
use crate::canvas::types::StudyGuideRequest;
use crate::core::error::CanvasError;
use crate::system::metrics::{collect_metrics, Metrics};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, Query, State,
    },
    http::{request::Parts, StatusCode},
    response::Json,
    Json as JsonExtractor,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

// Response types

/// Standard response wrapper for all Canvas-backed endpoints.
///
/// All three fields serialize on every response; `data` is `null` on
/// failure and `error` is `null` on success.
#[derive(Debug, Serialize)]
pub struct CanvasResponse {
    /// Whether the upstream operation succeeded
    pub success: bool,
    /// Upstream payload (null on failure)
    pub data: Value,
    /// Upstream error description (null on success)
    pub error: Option<String>,
}

impl CanvasResponse {
    /// Create a successful response carrying upstream data
    pub fn success(data: Value) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    /// Create a failure response describing what went wrong upstream
    pub fn failure(error: String) -> Self {
        Self {
            success: false,
            data: Value::Null,
            error: Some(error),
        }
    }
}

/// Error response for requests the gateway rejects before reaching Canvas.
///
/// Mirrors the [`CanvasResponse`] envelope so clients decode one shape
/// no matter where a request failed.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Whether the operation was successful (always false)
    pub success: bool,
    /// Always null; present to keep the envelope shape
    pub data: Value,
    /// What was wrong with the request
    pub error: String,
}

impl ErrorResponse {
    /// Build the 422 rejection for a malformed request
    pub fn unprocessable(error: String) -> (StatusCode, Json<ErrorResponse>) {
        Metrics::global().http.rejected.inc();
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                success: false,
                data: Value::Null,
                error,
            }),
        )
    }
}

/// Rejection type shared by all gateway extractors
pub type Rejection = (StatusCode, Json<ErrorResponse>);

// Request parameter types

/// Canvas credentials every proxied endpoint requires
#[derive(Debug, Deserialize)]
pub struct CanvasAuth {
    /// Base URL of the Canvas institution, e.g. `https://school.instructure.com`
    pub institute_url: String,
    /// Canvas API token for the calling user
    pub token: String,
}

/// Query parameters for the course list endpoint
#[derive(Debug, Deserialize)]
pub struct CoursesQuery {
    /// Canvas credentials
    #[serde(flatten)]
    pub auth: CanvasAuth,
    /// Enrollment state filter, defaulting to active courses
    #[serde(default = "default_enrollment_state")]
    pub enrollment_state: String,
}

fn default_enrollment_state() -> String {
    "active".to_string()
}

/// Query parameters for the assignment list endpoint
#[derive(Debug, Deserialize)]
pub struct AssignmentsQuery {
    /// Canvas credentials
    #[serde(flatten)]
    pub auth: CanvasAuth,
    /// Comma-separated extra fields to include, forwarded to Canvas as
    /// repeated `include` parameters
    pub include: Option<String>,
}

// Custom extractors
//
// axum's default rejections are plain-text 400s; Canvas gateway clients
// expect a JSON body and a 422 for anything malformed, so each extractor
// wraps its axum counterpart and rewrites the rejection.

/// Query extractor that rejects with a JSON 422
pub struct GatewayQuery<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for GatewayQuery<T>
where
    T: serde::de::DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Rejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(GatewayQuery(value)),
            Err(rejection) => {
                let error = match &rejection {
                    QueryRejection::FailedToDeserializeQueryString(e) => {
                        format!("Invalid query parameters: {}", e.body_text())
                    }
                    _ => "Invalid query parameters".to_string(),
                };
                Err(ErrorResponse::unprocessable(error))
            }
        }
    }
}

/// Path extractor that rejects with a JSON 422
pub struct GatewayPath<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for GatewayPath<T>
where
    T: serde::de::DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = Rejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(GatewayPath(value)),
            Err(rejection) => {
                let error = match &rejection {
                    PathRejection::FailedToDeserializePathParams(e) => {
                        format!("Invalid path parameters: {}", e.body_text())
                    }
                    _ => "Invalid path parameters".to_string(),
                };
                Err(ErrorResponse::unprocessable(error))
            }
        }
    }
}

/// JSON body extractor that rejects with a JSON 422
pub struct GatewayJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for GatewayJson<T>
where
    T: serde::de::DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Rejection;

    async fn from_request(
        req: axum::extract::Request,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        match JsonExtractor::<T>::from_request(req, state).await {
            Ok(JsonExtractor(value)) => Ok(GatewayJson(value)),
            Err(rejection) => {
                let error = match &rejection {
                    JsonRejection::JsonDataError(e) => {
                        format!("Invalid request body: {}", e.body_text())
                    }
                    JsonRejection::JsonSyntaxError(_) => "Malformed JSON".to_string(),
                    JsonRejection::MissingJsonContentType(_) => {
                        "Missing or invalid Content-Type header. Expected 'application/json'"
                            .to_string()
                    }
                    _ => "Invalid JSON request".to_string(),
                };
                Err(ErrorResponse::unprocessable(error))
            }
        }
    }
}

/// Proxy one upstream result into the standard envelope.
///
/// Client-caused upstream failures (bad token, unknown course) are routine
/// and logged quietly; everything else is worth an operator's attention.
fn envelope(result: Result<Value, CanvasError>, endpoint: &str) -> Json<CanvasResponse> {
    match result {
        Ok(data) => Json(CanvasResponse::success(data)),
        Err(e) => {
            if e.is_client_error() {
                debug!("Canvas rejected request for '{}': {}", endpoint, e);
            } else {
                warn!("Canvas request for '{}' failed: {}", endpoint, e);
            }
            Json(CanvasResponse::failure(e.to_string()))
        }
    }
}

// Courses endpoints

/// Get all courses for the authenticated user
pub async fn get_courses(
    State(state): State<Arc<AppState>>,
    GatewayQuery(params): GatewayQuery<CoursesQuery>,
) -> Json<CanvasResponse> {
    Metrics::global().http.requests.inc();
    let query = [("enrollment_state".to_string(), params.enrollment_state)];
    let result = state
        .canvas
        .get(&params.auth.institute_url, &params.auth.token, "courses", &query)
        .await;
    envelope(result, "courses")
}

/// Get details for a specific course
pub async fn get_course(
    State(state): State<Arc<AppState>>,
    GatewayPath(course_id): GatewayPath<i64>,
    GatewayQuery(auth): GatewayQuery<CanvasAuth>,
) -> Json<CanvasResponse> {
    Metrics::global().http.requests.inc();
    let endpoint = format!("courses/{}", course_id);
    let result = state
        .canvas
        .get(&auth.institute_url, &auth.token, &endpoint, &[])
        .await;
    envelope(result, &endpoint)
}

// Assignments endpoints

/// Get all assignments for a course
pub async fn get_assignments(
    State(state): State<Arc<AppState>>,
    GatewayPath(course_id): GatewayPath<i64>,
    GatewayQuery(params): GatewayQuery<AssignmentsQuery>,
) -> Json<CanvasResponse> {
    Metrics::global().http.requests.inc();
    let endpoint = format!("courses/{}/assignments", course_id);

    let query: Vec<(String, String)> = params
        .include
        .as_deref()
        .map(include_params)
        .unwrap_or_default();

    let result = state
        .canvas
        .get(&params.auth.institute_url, &params.auth.token, &endpoint, &query)
        .await;
    envelope(result, &endpoint)
}

/// Get details for a specific assignment
pub async fn get_assignment(
    State(state): State<Arc<AppState>>,
    GatewayPath((course_id, assignment_id)): GatewayPath<(i64, i64)>,
    GatewayQuery(auth): GatewayQuery<CanvasAuth>,
) -> Json<CanvasResponse> {
    Metrics::global().http.requests.inc();
    let endpoint = format!("courses/{}/assignments/{}", course_id, assignment_id);
    let result = state
        .canvas
        .get(&auth.institute_url, &auth.token, &endpoint, &[])
        .await;
    envelope(result, &endpoint)
}

/// Expand a comma-separated `include` value into repeated query pairs
fn include_params(include: &str) -> Vec<(String, String)> {
    include
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| ("include".to_string(), s.to_string()))
        .collect()
}

// Missing assignments endpoint

/// Get all missing assignments across all active courses
pub async fn get_missing_assignments(
    State(state): State<Arc<AppState>>,
    GatewayQuery(auth): GatewayQuery<CanvasAuth>,
) -> Json<CanvasResponse> {
    Metrics::global().http.requests.inc();
    match aggregator::collect_missing_assignments(&state.canvas, &auth.institute_url, &auth.token)
        .await
    {
        Ok(missing) => Json(CanvasResponse::success(json!(missing))),
        Err(e) => {
            warn!("Missing-assignments aggregation failed: {}", e);
            Json(CanvasResponse::failure(e.to_string()))
        }
    }
}

// Modules endpoints

/// Get all modules for a course
pub async fn get_modules(
    State(state): State<Arc<AppState>>,
    GatewayPath(course_id): GatewayPath<i64>,
    GatewayQuery(auth): GatewayQuery<CanvasAuth>,
) -> Json<CanvasResponse> {
    Metrics::global().http.requests.inc();
    let endpoint = format!("courses/{}/modules", course_id);
    let result = state
        .canvas
        .get(&auth.institute_url, &auth.token, &endpoint, &[])
        .await;
    envelope(result, &endpoint)
}

/// Get all items in a module
pub async fn get_module_items(
    State(state): State<Arc<AppState>>,
    GatewayPath((course_id, module_id)): GatewayPath<(i64, i64)>,
    GatewayQuery(auth): GatewayQuery<CanvasAuth>,
) -> Json<CanvasResponse> {
    Metrics::global().http.requests.inc();
    let endpoint = format!("courses/{}/modules/{}/items", course_id, module_id);
    let result = state
        .canvas
        .get(&auth.institute_url, &auth.token, &endpoint, &[])
        .await;
    envelope(result, &endpoint)
}

// Files endpoints

/// Get all files for a course
pub async fn get_course_files(
    State(state): State<Arc<AppState>>,
    GatewayPath(course_id): GatewayPath<i64>,
    GatewayQuery(auth): GatewayQuery<CanvasAuth>,
) -> Json<CanvasResponse> {
    Metrics::global().http.requests.inc();
    let endpoint = format!("courses/{}/files", course_id);
    let result = state
        .canvas
        .get(&auth.institute_url, &auth.token, &endpoint, &[])
        .await;
    envelope(result, &endpoint)
}

// Announcements endpoint

/// Get announcements for a course
pub async fn get_announcements(
    State(state): State<Arc<AppState>>,
    GatewayPath(course_id): GatewayPath<i64>,
    GatewayQuery(auth): GatewayQuery<CanvasAuth>,
) -> Json<CanvasResponse> {
    Metrics::global().http.requests.inc();
    let endpoint = format!("courses/{}/announcements", course_id);
    let result = state
        .canvas
        .get(&auth.institute_url, &auth.token, &endpoint, &[])
        .await;
    envelope(result, &endpoint)
}

// Grades endpoint

/// Get grades for a course
pub async fn get_grades(
    State(state): State<Arc<AppState>>,
    GatewayPath(course_id): GatewayPath<i64>,
    GatewayQuery(auth): GatewayQuery<CanvasAuth>,
) -> Json<CanvasResponse> {
    Metrics::global().http.requests.inc();
    let endpoint = format!("courses/{}/grades", course_id);
    let result = state
        .canvas
        .get(&auth.institute_url, &auth.token, &endpoint, &[])
        .await;
    envelope(result, &endpoint)
}

// Study guide endpoint

/// Generate a study guide based on course content
pub async fn generate_study_guide(
    GatewayQuery(_auth): GatewayQuery<CanvasAuth>,
    GatewayJson(request): GatewayJson<StudyGuideRequest>,
) -> Json<CanvasResponse> {
    Metrics::global().http.requests.inc();
    let guide = study_guide::build_study_guide(&request);
    Json(CanvasResponse::success(json!(guide)))
}

// System handlers

/// Root endpoint describing the service
pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "service": "Canvas API Gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "operational",
        "endpoints": {
            "courses": "/courses",
            "missing_assignments": "/missing_assignments",
            "study_guide": "/generate_study_guide",
            "health": "/health",
            "metrics": "/metrics"
        }
    }))
}

/// Health check endpoint
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "uptime_secs": crate::system::uptime_secs(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Prometheus metrics endpoint
pub async fn metrics_handler() -> String {
    collect_metrics()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_serializes_all_fields() {
        let value = serde_json::to_value(CanvasResponse::success(json!([1, 2]))).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["data"], json!([1, 2]));
        assert_eq!(value["error"], Value::Null);
    }

    #[test]
    fn test_failure_envelope_nulls_data() {
        let value =
            serde_json::to_value(CanvasResponse::failure("Canvas timed out".to_string())).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["data"], Value::Null);
        assert_eq!(value["error"], "Canvas timed out");
    }

    #[test]
    fn test_unprocessable_rejection_is_envelope_shaped() {
        let (status, Json(body)) = ErrorResponse::unprocessable("bad input".to_string());
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let value = serde_json::to_value(body).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["data"], Value::Null);
        assert_eq!(value["error"], "bad input");
    }

    #[test]
    fn test_include_params_splits_and_trims() {
        assert_eq!(
            include_params("submission, score"),
            vec![
                ("include".to_string(), "submission".to_string()),
                ("include".to_string(), "score".to_string()),
            ]
        );
        assert!(include_params("").is_empty());
        assert!(include_params(" , ").is_empty());
    }

    #[test]
    fn test_courses_query_defaults_enrollment_state() {
        let params: CoursesQuery = serde_urlencoded::from_str(
            "institute_url=https://school.instructure.com&token=abc",
        )
        .unwrap();
        assert_eq!(params.enrollment_state, "active");
        assert_eq!(params.auth.token, "abc");
    }

    #[test]
    fn test_courses_query_requires_credentials() {
        let result: Result<CoursesQuery, _> =
            serde_urlencoded::from_str("enrollment_state=active");
        assert!(result.is_err());
    }
}
