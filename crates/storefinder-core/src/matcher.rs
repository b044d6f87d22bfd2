//! Filters store lists against a parsed search query.

use crate::store::StoreRecord;

/// Returns the stores matching `postal_code` and `place_words`, in input order.
///
/// - With a `postal_code`, a store's postal code must start with it
///   (case-insensitive). Stores without a postal code never match.
/// - Every place word must be a case-insensitive prefix of at least one word
///   of the store's `"{city} {state}"`. Word position does not matter, so
///   `["lake", "ut"]` matches Salt Lake City, UT.
#[must_use]
pub fn filter_stores(
    stores: &[StoreRecord],
    postal_code: Option<&str>,
    place_words: &[String],
) -> Vec<StoreRecord> {
    let postal_prefix = postal_code.map(str::to_lowercase);
    let query_words: Vec<String> = place_words.iter().map(|w| w.to_lowercase()).collect();

    stores
        .iter()
        .filter(|store| matches_postal_code(store, postal_prefix.as_deref()))
        .filter(|store| matches_place_words(store, &query_words))
        .cloned()
        .collect()
}

fn matches_postal_code(store: &StoreRecord, prefix: Option<&str>) -> bool {
    let Some(prefix) = prefix else {
        return true;
    };
    store
        .postal_code
        .as_deref()
        .is_some_and(|code| code.to_lowercase().starts_with(prefix))
}

fn matches_place_words(store: &StoreRecord, query_words: &[String]) -> bool {
    if query_words.is_empty() {
        return true;
    }
    let store_words: Vec<String> = store.city_state_words().map(str::to_lowercase).collect();
    query_words
        .iter()
        .all(|q| store_words.iter().any(|w| w.starts_with(q.as_str())))
}
