//! Normalized store record, independent of the directory wire format.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A physical store as returned to callers.
///
/// Produced once by the directory adapter and never mutated afterwards; the
/// cache hands out shared slices of these.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreRecord {
    pub store_id: String,
    /// Secondary identifier assigned by the directory ("libby" store id).
    pub external_id: Option<String>,
    pub name: String,
    pub address_lines: Vec<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    /// IANA timezone name, needed to interpret `operational_hours`.
    pub timezone: Option<String>,
    pub coordinates: Option<GeoPoint>,
    /// Only set on geo-discovery results.
    pub distance_in_miles: Option<f64>,
    /// Hours for the next few days only; dates need not be contiguous.
    pub operational_hours: Vec<DailyHours>,
}

impl StoreRecord {
    /// A record with only identity fields set.
    #[must_use]
    pub fn new(store_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            store_id: store_id.into(),
            external_id: None,
            name: name.into(),
            address_lines: Vec::new(),
            city: None,
            state: None,
            postal_code: None,
            timezone: None,
            coordinates: None,
            distance_in_miles: None,
            operational_hours: Vec::new(),
        }
    }

    /// Whitespace-separated words of `"{city} {state}"`, skipping whichever is
    /// absent.
    pub fn city_state_words(&self) -> impl Iterator<Item = &str> {
        self.city
            .as_deref()
            .into_iter()
            .chain(self.state.as_deref())
            .flat_map(str::split_whitespace)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Opening windows for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyHours {
    pub date: DateTime<Utc>,
    pub operational_hours: Vec<OpenWindow>,
}

/// A single opening interval. `start_time < end_time` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenWindow {
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
}

impl OpenWindow {
    /// Returns `None` unless `start_time` is strictly before `end_time`.
    #[must_use]
    pub fn new(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Option<Self> {
        (start_time < end_time).then_some(Self {
            start_time,
            end_time,
        })
    }

    #[must_use]
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    #[must_use]
    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }
}
