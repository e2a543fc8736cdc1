//! HTTP surface
//!
//! - `GET /UserACLs?username=..&domain=..&idneeded=..&aclneeded=..`
//! - `GET /health`

use crate::aggregate::CONTENT_TYPE;
use crate::error::{AuthorityError, ErrorClass};
use crate::query::{AclQuery, QueryError};
use crate::service::AclService;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::{error, warn, Level};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AclService>,
    /// Cancelled when the server begins shutting down
    pub shutdown: CancellationToken,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(service: Arc<AclService>, shutdown: CancellationToken) -> Self {
        Self {
            service,
            shutdown,
            start_time: Instant::now(),
        }
    }
}

#[derive(Debug)]
enum AppError {
    BadRequest(QueryError),
    Resolve(AuthorityError),
}

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        AppError::BadRequest(err)
    }
}

impl From<AuthorityError> for AppError {
    fn from(err: AuthorityError) -> Self {
        AppError::Resolve(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::BadRequest(err) => (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
            // Failure details stay in the log; callers only see the status
            AppError::Resolve(err) => match err.classify() {
                ErrorClass::Forbidden => {
                    warn!("Refusing ACL request: {}", err);
                    StatusCode::FORBIDDEN.into_response()
                }
                ErrorClass::InternalError => {
                    error!("ACL request failed: {}", err);
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
                ErrorClass::NoResponse => StatusCode::SERVICE_UNAVAILABLE.into_response(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    uptime_seconds: u64,
}

/// GET /UserACLs
async fn user_acls(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let query = AclQuery::from_params(&params)?;
    let buffer = state.service.resolve(&query, &state.shutdown).await?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, CONTENT_TYPE)],
        buffer.into_body(),
    )
        .into_response())
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: crate::VERSION.to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

pub fn build_router(state: AppState) -> Router {
    let trace = TraceLayer::new_for_http().on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/UserACLs", get(user_acls))
        .route("/health", get(health))
        .layer(ServiceBuilder::new().layer(trace))
        .with_state(state)
}
