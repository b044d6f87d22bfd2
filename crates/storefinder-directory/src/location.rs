/// Customer context the directory geolocates on its own.
///
/// Every field is optional; the directory falls back from customer profile to
/// IP address as it sees fit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoContext {
    pub customer_id: Option<String>,
    pub session_id: Option<String>,
    pub ip_address: Option<String>,
}

/// Where a discovery call should search from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryLocation {
    Geo(GeoContext),
    PostalCode(String),
}

impl DiscoveryLocation {
    #[must_use]
    pub fn postal_code(&self) -> Option<&str> {
        match self {
            DiscoveryLocation::PostalCode(code) => Some(code),
            DiscoveryLocation::Geo(_) => None,
        }
    }
}

impl From<GeoContext> for DiscoveryLocation {
    fn from(ctx: GeoContext) -> Self {
        DiscoveryLocation::Geo(ctx)
    }
}
