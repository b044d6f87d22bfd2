mod stores;

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use storefinder_core::EventCounters;
use storefinder_directory::DirectoryClient;
use storefinder_lookup::{LookupError, StoreFinder};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::middleware::{request_id, RequestId, REQUEST_ID_HEADER};

#[derive(Clone)]
pub struct AppState {
    pub finder: Arc<StoreFinder<DirectoryClient>>,
    pub events: Arc<EventCounters>,
    /// Used when a request carries no `x-marketplace-id`.
    pub default_marketplace_id: Arc<str>,
}

/// Success envelope: `{"data": ..., "meta": {...}}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: Meta,
}

#[derive(Debug, Serialize)]
pub struct Meta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Error envelope: `{"error": {"code", "message"}, "meta": {...}}`.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorDetail,
    pub meta: Meta,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Missing or unknown request parameter.
    BadRequest,
    /// Search query rejected by the normalizer.
    ValidationError,
    /// The store directory failed or returned unusable data.
    DependencyError,
}

impl ErrorCode {
    fn status(self) -> StatusCode {
        match self {
            Self::BadRequest | Self::ValidationError => StatusCode::BAD_REQUEST,
            Self::DependencyError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthData {
    status: &'static str,
    cached_brands: usize,
    cache_ttl_secs: u64,
    events: BTreeMap<&'static str, u64>,
}

impl Meta {
    fn for_request(req_id: &RequestId) -> Self {
        Self {
            request_id: req_id.0.clone(),
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn json(req_id: &RequestId, data: T) -> Json<Self> {
        Json(Self {
            data,
            meta: Meta::for_request(req_id),
        })
    }
}

impl ApiError {
    pub fn new(req_id: &RequestId, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code,
                message: message.into(),
            },
            meta: Meta::for_request(req_id),
        }
    }

    /// Client faults become 400s; directory failures become a 500 without
    /// leaking the downstream detail.
    pub(super) fn from_lookup(req_id: &RequestId, err: &LookupError) -> Self {
        match err {
            LookupError::InvalidQuery(e) => {
                Self::new(req_id, ErrorCode::ValidationError, e.to_string())
            }
            LookupError::InvalidBrand(_) | LookupError::InvalidMarketplace(_) => {
                Self::new(req_id, ErrorCode::BadRequest, err.to_string())
            }
            LookupError::Dependency(e) => {
                tracing::error!(
                    request_id = %req_id.0,
                    error = %e,
                    "store directory call failed"
                );
                Self::new(req_id, ErrorCode::DependencyError, "store directory unavailable")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.error.code.status(), Json(self)).into_response()
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
            HeaderName::from_static(stores::MARKETPLACE_HEADER),
            HeaderName::from_static(stores::CUSTOMER_ID_HEADER),
            HeaderName::from_static(stores::SESSION_ID_HEADER),
        ])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/stores/nearby", get(stores::list_nearby_stores))
        .route("/api/v1/stores/search", get(stores::search_stores))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<HealthData>> {
    ApiResponse::json(
        &req_id,
        HealthData {
            status: "ok",
            cached_brands: state.finder.cache().len(),
            cache_ttl_secs: state.finder.cache().ttl().as_secs(),
            events: state.events.snapshot().into_iter().collect(),
        },
    )
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
