//! Maps directory wire types into [`StoreRecord`]s.

use chrono::{DateTime, Utc};
use storefinder_core::{DailyHours, EventSink, GeoPoint, OpenWindow, StoreEvent, StoreRecord};

use crate::error::DirectoryError;
use crate::types::{StoresEnvelope, WireDailyHours, WireStore};

/// What a response envelope actually says.
///
/// An empty store list is ambiguous on its own; only the embedded execution
/// errors tell "nothing nearby" apart from "the directory failed".
#[derive(Debug)]
pub(crate) enum EnvelopeOutcome {
    Stores(Vec<WireStore>),
    NoStores,
    ExecutionErrors(Vec<String>),
}

impl StoresEnvelope {
    /// Any embedded error marks the whole call failed, even if stores came back.
    pub(crate) fn classify(self) -> EnvelopeOutcome {
        let errors = self
            .context
            .and_then(|c| c.execution_info)
            .and_then(|info| info.errors)
            .unwrap_or_default();

        if !errors.is_empty() {
            return EnvelopeOutcome::ExecutionErrors(errors);
        }

        match self.stores {
            Some(stores) if !stores.is_empty() => EnvelopeOutcome::Stores(stores),
            _ => EnvelopeOutcome::NoStores,
        }
    }
}

/// Map every store, failing the whole batch on the first bad timestamp or
/// hours interval.
pub(crate) fn map_stores(
    stores: Vec<WireStore>,
    events: &dyn EventSink,
) -> Result<Vec<StoreRecord>, DirectoryError> {
    stores
        .into_iter()
        .map(|store| map_store(store, events))
        .collect()
}

pub(crate) fn map_store(
    store: WireStore,
    events: &dyn EventSink,
) -> Result<StoreRecord, DirectoryError> {
    let operational_hours = match store.operational_info {
        Some(info) => map_daily_hours(&store.physical_store_id, info.operational_daily_hours)?,
        None => Vec::new(),
    };

    let mut record = StoreRecord {
        external_id: store.references_info.and_then(|r| r.libby_store_id),
        distance_in_miles: store.reachability_info.and_then(|r| r.distance_in_miles),
        operational_hours,
        ..StoreRecord::new(store.physical_store_id, store.store_name)
    };

    match store.location_info {
        Some(location) => {
            record.address_lines = location.address_lines;
            record.city = location.city;
            record.state = location.state;
            record.postal_code = location.postal_code;
            record.timezone = location.time_zone;
            record.coordinates = location.geocode.map(|g| GeoPoint {
                latitude: g.latitude,
                longitude: g.longitude,
            });
        }
        None => {
            tracing::info!(store_id = %record.store_id, "store location not found");
            events.record(StoreEvent::StoreLocationMissing);
        }
    }

    Ok(record)
}

fn map_daily_hours(
    store_id: &str,
    days: Vec<WireDailyHours>,
) -> Result<Vec<DailyHours>, DirectoryError> {
    days.into_iter()
        .map(|day| {
            let operational_hours = day
                .operational_hours
                .iter()
                .map(|hours| {
                    let start = parse_instant(store_id, &hours.start_time)?;
                    let end = parse_instant(store_id, &hours.end_time)?;
                    OpenWindow::new(start, end).ok_or_else(|| DirectoryError::InvalidHours {
                        store_id: store_id.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            Ok(DailyHours {
                date: parse_instant(store_id, &day.date)?,
                operational_hours,
            })
        })
        .collect()
}

fn parse_instant(store_id: &str, value: &str) -> Result<DateTime<Utc>, DirectoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DirectoryError::MalformedTimestamp {
            store_id: store_id.to_string(),
            value: value.to_string(),
            source: e,
        })
}

#[cfg(test)]
#[path = "mapping_test.rs"]
mod tests;
