//! Free-text store search query parsing.
//!
//! A raw query such as `"seattle, wa 98101"` is split into alphabetic place
//! words (matched later against store city/state) and at most one numeric
//! postal code.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::QueryError;

static ALLOWED_CHARACTERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9, ]*$").expect("valid regex"));

/// Length of a complete US postal code; only such codes trigger a
/// postal-radius discovery.
pub const EXACT_POSTAL_CODE_LEN: usize = 5;

/// A parsed search query. Never empty: it always has a postal code, at least
/// one place word, or both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedQuery {
    postal_code: Option<String>,
    place_words: Vec<String>,
}

impl NormalizedQuery {
    /// The numeric token from the query, of any length.
    #[must_use]
    pub fn postal_code(&self) -> Option<&str> {
        self.postal_code.as_deref()
    }

    /// The postal code if it is a complete five-digit code.
    #[must_use]
    pub fn exact_postal_code(&self) -> Option<&str> {
        self.postal_code()
            .filter(|code| code.len() == EXACT_POSTAL_CODE_LEN)
    }

    /// Alphabetic words in order of appearance.
    #[must_use]
    pub fn place_words(&self) -> &[String] {
        &self.place_words
    }

    /// Place words joined with single spaces, e.g. `"seat wa"`.
    #[must_use]
    pub fn place_text(&self) -> String {
        self.place_words.join(" ")
    }
}

/// Parse a raw search query into a [`NormalizedQuery`].
///
/// Commas are treated as spaces. Each word must be all letters (a place word)
/// or all digits (the postal code); blank words are skipped.
///
/// # Errors
///
/// Returns a [`QueryError`] when the query has characters other than ASCII
/// letters, digits, commas and spaces, is shorter than two characters after
/// trimming, contains a mixed alphanumeric word, contains two numeric words,
/// or has no words at all.
pub fn normalize_query(raw: &str) -> Result<NormalizedQuery, QueryError> {
    let result = parse(raw);
    if let Err(e) = &result {
        // client-side fault, not worth more than info
        tracing::info!(query = raw, reason = %e, "rejected search query");
    }
    result
}

fn parse(raw: &str) -> Result<NormalizedQuery, QueryError> {
    if !ALLOWED_CHARACTERS.is_match(raw) {
        return Err(QueryError::InvalidCharacters(raw.to_owned()));
    }

    if raw.trim().len() < 2 {
        return Err(QueryError::TooShort(raw.to_owned()));
    }

    let mut postal_code: Option<String> = None;
    let mut place_words = Vec::new();

    let spaced = raw.replace(',', " ");
    for token in spaced.trim().split(' ') {
        if token.is_empty() {
            continue;
        }
        if token.chars().all(|c| c.is_ascii_alphabetic()) {
            place_words.push(token.to_owned());
        } else if token.chars().all(|c| c.is_ascii_digit()) {
            if postal_code.is_some() {
                return Err(QueryError::PostalCodeAlreadySet(raw.to_owned()));
            }
            postal_code = Some(token.to_owned());
        } else {
            return Err(QueryError::MixedToken {
                query: raw.to_owned(),
                token: token.to_owned(),
            });
        }
    }

    if postal_code.is_none() && place_words.is_empty() {
        return Err(QueryError::Empty(raw.to_owned()));
    }

    Ok(NormalizedQuery {
        postal_code,
        place_words,
    })
}

#[cfg(test)]
#[path = "query_test.rs"]
mod tests;
