use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Discovery mode used when listing or discovering a brand's stores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrandRole {
    /// Stores the customer shops inside.
    InStore,
    /// Stores that serve as order pickup points.
    #[default]
    Pickup,
}

impl std::fmt::Display for BrandRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BrandRole::InStore => write!(f, "instore"),
            BrandRole::Pickup => write!(f, "pickup"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandConfig {
    /// Directory brand identifier, as passed by callers.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: BrandRole,
    /// Load this brand's store list into the cache at startup.
    #[serde(default)]
    pub prewarm: bool,
}

/// The brands this deployment serves.
#[derive(Debug, Clone, Deserialize)]
pub struct BrandCatalog {
    pub brands: Vec<BrandConfig>,
}

impl BrandCatalog {
    #[must_use]
    pub fn get(&self, brand_id: &str) -> Option<&BrandConfig> {
        self.brands.iter().find(|b| b.id == brand_id)
    }

    /// Role for `brand_id`; brands without a configured role use pickup.
    #[must_use]
    pub fn role_for(&self, brand_id: &str) -> BrandRole {
        self.get(brand_id).map(|b| b.role).unwrap_or_default()
    }

    /// Brand ids flagged for startup pre-warm, in file order.
    pub fn prewarm_brand_ids(&self) -> impl Iterator<Item = &str> {
        self.brands
            .iter()
            .filter(|b| b.prewarm)
            .map(|b| b.id.as_str())
    }
}

/// Load and validate the brand catalog from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_brands(path: &Path) -> Result<BrandCatalog, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::BrandsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_brands(&content)
}

/// Parse and validate a brand catalog from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the text does not parse or fails validation.
pub fn parse_brands(yaml: &str) -> Result<BrandCatalog, ConfigError> {
    let catalog: BrandCatalog = serde_yaml::from_str(yaml).map_err(ConfigError::BrandsFileParse)?;
    validate_brands(&catalog)?;
    Ok(catalog)
}

/// Collects every problem in the catalog so one edit fixes the file.
fn validate_brands(catalog: &BrandCatalog) -> Result<(), ConfigError> {
    if catalog.brands.is_empty() {
        return Err(ConfigError::Validation(
            "at least one brand must be configured".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    let problems: Vec<String> = catalog
        .brands
        .iter()
        .enumerate()
        .flat_map(|(index, brand)| {
            let id = brand.id.trim();
            let mut found = Vec::new();
            if id.is_empty() {
                found.push(format!("brand #{} has an empty id", index + 1));
            }
            if brand.name.trim().is_empty() {
                found.push(format!("brand '{id}' must have a non-empty name"));
            }
            if !id.is_empty() && !seen.insert(id) {
                found.push(format!("duplicate brand id '{id}'"));
            }
            found
        })
        .collect();

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Validation(problems.join("; ")))
    }
}

#[cfg(test)]
#[path = "brands_test.rs"]
mod tests;
