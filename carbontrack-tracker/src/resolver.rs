//! Execution-context resolution strategies.
//!
//! Two strategies implement the same capability: [`AutoResolver`] asks the
//! network where the run executes, [`OfflineResolver`] is told up front.
//! The tracker picks one at construction.

use carbontrack_geo::{CloudMetadata, GeoError, GeoMetadata, MetadataClient};

/// Resolves the execution context once, when a run stops.
pub trait MetadataResolver: Send {
    fn geo_metadata(&self) -> Result<GeoMetadata, GeoError>;
    fn cloud_metadata(&self) -> Result<CloudMetadata, GeoError>;
}

/// Auto-detects geography from the machine's public IP and cloud placement
/// from the instance-local metadata endpoints.
pub struct AutoResolver {
    client: MetadataClient,
}

impl AutoResolver {
    pub fn new(client: MetadataClient) -> Self {
        Self { client }
    }
}

impl MetadataResolver for AutoResolver {
    fn geo_metadata(&self) -> Result<GeoMetadata, GeoError> {
        self.client.fetch_geo()
    }

    fn cloud_metadata(&self) -> Result<CloudMetadata, GeoError> {
        self.client.fetch_cloud()
    }
}

/// Caller-supplied geography for air-gapped runs. Both country fields are
/// required at construction; there is no default country. Cloud placement
/// is always private.
pub struct OfflineResolver {
    geo: GeoMetadata,
}

impl OfflineResolver {
    pub fn new(country_iso_code: &str, country_name: &str, region: Option<String>) -> Self {
        Self {
            geo: GeoMetadata::new(country_iso_code, country_name, region),
        }
    }
}

impl MetadataResolver for OfflineResolver {
    fn geo_metadata(&self) -> Result<GeoMetadata, GeoError> {
        Ok(self.geo.clone())
    }

    fn cloud_metadata(&self) -> Result<CloudMetadata, GeoError> {
        Ok(CloudMetadata::on_private())
    }
}
