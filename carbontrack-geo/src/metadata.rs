//! Geographic and cloud execution-context models.

use serde::{Deserialize, Serialize};

/// Where a run executes geographically.
///
/// The ISO code and country name always travel together, so both fields are
/// non-optional. `region` is a sub-national entity and only affects
/// calculations for countries with regional emission data (currently the
/// United States).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoMetadata {
    pub country_iso_code: String,
    pub country_name: String,
    pub region: Option<String>,
}

impl GeoMetadata {
    /// ISO codes are stored uppercase and regions lowercase, the form the
    /// emission-factor tables are keyed by.
    pub fn new(
        country_iso_code: impl Into<String>,
        country_name: impl Into<String>,
        region: Option<String>,
    ) -> Self {
        Self {
            country_iso_code: country_iso_code.into().to_uppercase(),
            country_name: country_name.into(),
            region: region.map(|r| r.to_lowercase()),
        }
    }
}

/// Cloud execution context. `provider == None` means the run is on private
/// (non-tracked) infrastructure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CloudMetadata {
    pub provider: Option<String>,
    pub region: Option<String>,
}

impl CloudMetadata {
    pub fn new(provider: Option<String>, region: Option<String>) -> Self {
        Self { provider, region }
    }

    pub fn on_private() -> Self {
        Self::default()
    }

    pub fn is_on_private_infra(&self) -> bool {
        self.provider.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_metadata_normalization() {
        let geo = GeoMetadata::new("usa", "United States", Some("California".to_string()));
        assert_eq!(geo.country_iso_code, "USA");
        assert_eq!(geo.country_name, "United States");
        assert_eq!(geo.region.as_deref(), Some("california"));
    }

    #[test]
    fn test_private_infra_flag() {
        assert!(CloudMetadata::on_private().is_on_private_infra());
        assert!(CloudMetadata::new(None, Some("us-east-1".to_string())).is_on_private_infra());

        let on_cloud = CloudMetadata::new(Some("aws".to_string()), Some("us-east-1".to_string()));
        assert!(!on_cloud.is_on_private_infra());
    }
}
