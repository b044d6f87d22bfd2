use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Extension, Json,
};
use serde::Deserialize;
use storefinder_core::StoreRecord;
use storefinder_directory::GeoContext;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ErrorCode};

pub(super) const MARKETPLACE_HEADER: &str = "x-marketplace-id";
pub(super) const CUSTOMER_ID_HEADER: &str = "x-customer-id";
pub(super) const SESSION_ID_HEADER: &str = "x-session-id";
const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";
/// Set by some proxies when they rewrite `x-forwarded-for`.
const ORIGINAL_FORWARDED_FOR_HEADER: &str = "original-x-forwarded-for";

#[derive(Debug, Deserialize)]
pub(super) struct NearbyParams {
    pub brand_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchParams {
    pub brand_id: Option<String>,
    pub query: Option<String>,
}

pub(super) async fn list_nearby_stores(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    Query(params): Query<NearbyParams>,
) -> Result<Json<ApiResponse<Vec<StoreRecord>>>, ApiError> {
    let brand_id = required(&req_id, params.brand_id.as_deref(), "brand_id")?;
    let marketplace_id = marketplace_id(&state, &headers);
    let geo = geo_context(&headers);

    tracing::info!(
        request_id = %req_id.0,
        brand_id,
        marketplace_id,
        has_customer = geo.customer_id.is_some(),
        has_ip = geo.ip_address.is_some(),
        "listing nearby stores"
    );

    let stores = state
        .finder
        .lookup_nearby(brand_id, marketplace_id, geo)
        .await
        .map_err(|e| ApiError::from_lookup(&req_id, &e))?;

    Ok(ApiResponse::json(&req_id, stores))
}

pub(super) async fn search_stores(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<Vec<StoreRecord>>>, ApiError> {
    let brand_id = required(&req_id, params.brand_id.as_deref(), "brand_id")?;
    let query = required(&req_id, params.query.as_deref(), "query")?;
    let marketplace_id = marketplace_id(&state, &headers);

    let stores = state
        .finder
        .search(brand_id, marketplace_id, query)
        .await
        .map_err(|e| ApiError::from_lookup(&req_id, &e))?;

    tracing::info!(
        request_id = %req_id.0,
        brand_id,
        query,
        count = stores.len(),
        "store search complete"
    );

    Ok(ApiResponse::json(&req_id, stores))
}

fn required<'a>(
    req_id: &RequestId,
    value: Option<&'a str>,
    name: &str,
) -> Result<&'a str, ApiError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            ApiError::new(req_id, ErrorCode::BadRequest, format!("{name} is required"))
        })
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn marketplace_id<'a>(state: &'a AppState, headers: &'a HeaderMap) -> &'a str {
    header_str(headers, MARKETPLACE_HEADER).unwrap_or(&state.default_marketplace_id)
}

/// Customer context for geolocation. The client IP is the first hop of
/// `x-forwarded-for`, falling back to `original-x-forwarded-for`.
pub(super) fn geo_context(headers: &HeaderMap) -> GeoContext {
    let ip_address = header_str(headers, FORWARDED_FOR_HEADER)
        .or_else(|| header_str(headers, ORIGINAL_FORWARDED_FOR_HEADER))
        .and_then(|v| v.split(',').map(str::trim).find(|hop| !hop.is_empty()))
        .map(str::to_string);

    GeoContext {
        customer_id: header_str(headers, CUSTOMER_ID_HEADER).map(str::to_string),
        session_id: header_str(headers, SESSION_ID_HEADER).map(str::to_string),
        ip_address,
    }
}
