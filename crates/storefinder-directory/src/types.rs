//! Store-directory wire types.
//!
//! Requests are JSON bodies POSTed to `{base}/{operation}`. Every response
//! uses the same envelope, [`StoresEnvelope`], in which every part is
//! optional: a missing `stores` list and a missing `context` are both legal.

use serde::{Deserialize, Serialize};
use storefinder_core::BrandRole;

use crate::location::DiscoveryLocation;

/// Program every request is scoped to.
pub const PROGRAM: &str = "UFG";

/// Search radius for discovery calls, in miles.
pub const DISCOVERY_RADIUS_MILES: f64 = 50.0;

/// Complex attributes the directory only returns when asked for.
pub const COMPLEX_ATTRIBUTES: [&str; 1] = ["OPERATIONAL_DAILY_HOURS"];

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body shared by `discoverGeoInStoreStores` and `discoverGeoPickupStores`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverStoresRequest {
    pub alm_program: &'static str,
    pub alm_brand_ids: Vec<String>,
    pub marketplace_id: String,
    pub build_complex_attributes: Vec<&'static str>,
    pub customer_info: CustomerInfo,
    pub location_criteria: LocationCriteria,
}

impl DiscoverStoresRequest {
    #[must_use]
    pub fn new(brand_id: &str, marketplace_id: &str, location: &DiscoveryLocation) -> Self {
        let customer_info = match location {
            DiscoveryLocation::Geo(ctx) => CustomerInfo {
                customer_id: ctx.customer_id.clone(),
                session_id: ctx.session_id.clone(),
                ip_address: ctx.ip_address.clone(),
            },
            DiscoveryLocation::PostalCode(_) => CustomerInfo::default(),
        };

        Self {
            alm_program: PROGRAM,
            alm_brand_ids: vec![brand_id.to_string()],
            marketplace_id: marketplace_id.to_string(),
            build_complex_attributes: COMPLEX_ATTRIBUTES.to_vec(),
            customer_info,
            location_criteria: LocationCriteria {
                postal_code: location.postal_code().map(str::to_string),
                radius: DISCOVERY_RADIUS_MILES,
            },
        }
    }
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    pub radius: f64,
}

/// Body for `findStoresForBrand`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FindStoresForBrandRequest {
    pub alm_program: &'static str,
    pub alm_brand_id: String,
    pub marketplace_id: String,
    pub build_complex_attributes: Vec<&'static str>,
    pub role: StoreRole,
}

impl FindStoresForBrandRequest {
    #[must_use]
    pub fn new(brand_id: &str, marketplace_id: &str, role: BrandRole) -> Self {
        Self {
            alm_program: PROGRAM,
            alm_brand_id: brand_id.to_string(),
            marketplace_id: marketplace_id.to_string(),
            build_complex_attributes: COMPLEX_ATTRIBUTES.to_vec(),
            role: role.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StoreRole {
    #[serde(rename = "INSTORE")]
    InStore,
    #[serde(rename = "PICKUP")]
    Pickup,
}

impl From<BrandRole> for StoreRole {
    fn from(role: BrandRole) -> Self {
        match role {
            BrandRole::InStore => StoreRole::InStore,
            BrandRole::Pickup => StoreRole::Pickup,
        }
    }
}

// ---------------------------------------------------------------------------
// Response envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoresEnvelope {
    #[serde(default, alias = "almStores")]
    pub stores: Option<Vec<WireStore>>,
    #[serde(default)]
    pub context: Option<ResponseContext>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseContext {
    #[serde(default)]
    pub execution_info: Option<ExecutionInfo>,
}

/// Failures the directory hit while serving the request.
#[derive(Debug, Default, Deserialize)]
pub struct ExecutionInfo {
    #[serde(default)]
    pub errors: Option<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireStore {
    pub physical_store_id: String,
    #[serde(default)]
    pub store_name: String,
    #[serde(default)]
    pub references_info: Option<ReferencesInfo>,
    /// Absent for some stores.
    #[serde(default)]
    pub location_info: Option<LocationInfo>,
    /// Only present on discovery responses.
    #[serde(default)]
    pub reachability_info: Option<ReachabilityInfo>,
    #[serde(default)]
    pub operational_info: Option<OperationalInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferencesInfo {
    #[serde(default)]
    pub libby_store_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationInfo {
    #[serde(default)]
    pub address_lines: Vec<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub time_zone: Option<String>,
    #[serde(default)]
    pub geocode: Option<Geocode>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Geocode {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReachabilityInfo {
    #[serde(default)]
    pub distance_in_miles: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationalInfo {
    #[serde(default)]
    pub operational_daily_hours: Vec<WireDailyHours>,
}

/// One day of hours. Timestamps are RFC 3339 instants, e.g.
/// `"2021-05-07T07:00:00Z"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDailyHours {
    pub date: String,
    #[serde(default)]
    pub operational_hours: Vec<WireHours>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireHours {
    pub start_time: String,
    pub end_time: String,
}
