//! Blocking HTTP client for geolocation and cloud-metadata endpoints.
//!
//! Resolution happens exactly once per run, when the tracker stops, so a
//! blocking client with bounded timeouts keeps the library free of an async
//! runtime.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::metadata::{CloudMetadata, GeoMetadata};

const GEO_JS_URL: &str = "https://get.geojs.io/v1/ip/geo.json";

const AWS_IDENTITY_URL: &str =
    "http://169.254.169.254/latest/dynamic/instance-identity/document";
const GCP_ZONE_URL: &str = "http://metadata.google.internal/computeMetadata/v1/instance/zone";
const AZURE_LOCATION_URL: &str =
    "http://169.254.169.254/metadata/instance/compute/location?api-version=2021-02-01&format=text";

/// Geolocation crosses the WAN; the cloud probes are link-local and answer
/// within milliseconds when the machine is actually on that provider.
const GEO_TIMEOUT: Duration = Duration::from_secs(5);
const CLOUD_PROBE_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("Geolocation resolution unavailable: {0}")]
    Resolution(#[from] reqwest::Error),

    #[error("Resolution unavailable: {0}")]
    Unavailable(String),
}

/// Response shape of the geojs IP-geolocation endpoint.
#[derive(Debug, Deserialize)]
struct GeoJsResponse {
    country: String,
    country_code3: String,
    region: Option<String>,
}

/// Response shape of the AWS instance-identity document.
#[derive(Debug, Deserialize)]
struct AwsIdentityDocument {
    region: String,
}

/// Client for the external metadata endpoints. Constructed once and passed
/// to the tracker; there is no shared global instance.
pub struct MetadataClient {
    geo_http: reqwest::blocking::Client,
    probe_http: reqwest::blocking::Client,
    geo_url: String,
}

impl MetadataClient {
    pub fn new() -> Result<Self, GeoError> {
        Ok(Self {
            geo_http: reqwest::blocking::Client::builder()
                .timeout(GEO_TIMEOUT)
                .build()?,
            probe_http: reqwest::blocking::Client::builder()
                .timeout(CLOUD_PROBE_TIMEOUT)
                .build()?,
            geo_url: GEO_JS_URL.to_string(),
        })
    }

    /// Point geolocation at a different endpoint (tests, self-hosted mirrors).
    pub fn with_geo_url(mut self, url: impl Into<String>) -> Self {
        self.geo_url = url.into();
        self
    }

    /// Best-effort country/region lookup for the machine's public IP.
    pub fn fetch_geo(&self) -> Result<GeoMetadata, GeoError> {
        let response: GeoJsResponse = self
            .geo_http
            .get(&self.geo_url)
            .send()?
            .error_for_status()?
            .json()?;

        // The ISO code and country name must arrive together.
        if response.country_code3.trim().is_empty() || response.country.trim().is_empty() {
            return Err(GeoError::Unavailable(
                "geolocation response carries no country".to_string(),
            ));
        }

        Ok(GeoMetadata::new(
            response.country_code3,
            response.country,
            response.region,
        ))
    }

    /// Probe the instance-local metadata endpoints of the tracked cloud
    /// providers. First answer wins; no endpoint answering means private
    /// infrastructure, not an error.
    pub fn fetch_cloud(&self) -> Result<CloudMetadata, GeoError> {
        if let Some(region) = self.probe_aws() {
            debug!("AWS metadata endpoint answered: region {}", region);
            return Ok(CloudMetadata::new(Some("aws".to_string()), Some(region)));
        }
        if let Some(region) = self.probe_gcp() {
            debug!("GCP metadata endpoint answered: region {}", region);
            return Ok(CloudMetadata::new(Some("gcp".to_string()), Some(region)));
        }
        if let Some(region) = self.probe_azure() {
            debug!("Azure metadata endpoint answered: region {}", region);
            return Ok(CloudMetadata::new(Some("azure".to_string()), Some(region)));
        }

        Ok(CloudMetadata::on_private())
    }

    fn probe_aws(&self) -> Option<String> {
        let document: AwsIdentityDocument = self
            .probe_http
            .get(AWS_IDENTITY_URL)
            .send()
            .ok()?
            .error_for_status()
            .ok()?
            .json()
            .ok()?;
        Some(document.region)
    }

    fn probe_gcp(&self) -> Option<String> {
        let zone = self
            .probe_http
            .get(GCP_ZONE_URL)
            .header("Metadata-Flavor", "Google")
            .send()
            .ok()?
            .error_for_status()
            .ok()?
            .text()
            .ok()?;
        region_from_gcp_zone(&zone)
    }

    fn probe_azure(&self) -> Option<String> {
        let location = self
            .probe_http
            .get(AZURE_LOCATION_URL)
            .header("Metadata", "true")
            .send()
            .ok()?
            .error_for_status()
            .ok()?
            .text()
            .ok()?;
        let location = location.trim();
        (!location.is_empty()).then(|| location.to_string())
    }
}

/// GCP reports a zone path ("projects/…/zones/us-central1-a"); the region is
/// the zone minus its single-letter suffix.
fn region_from_gcp_zone(zone: &str) -> Option<String> {
    let zone = zone.trim().rsplit('/').next()?;
    let (region, _suffix) = zone.rsplit_once('-')?;
    (!region.is_empty()).then(|| region.to_string())
}
