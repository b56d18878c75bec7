//! Calculator and dataset errors.

use carbontrack_units::UnitError;
use thiserror::Error;

/// Lookup failures are data-completeness bugs and fail fast; callers decide
/// whether to abort or substitute.
#[derive(Debug, Error)]
pub enum EmissionsError {
    #[error("No emission factor found for country {0}")]
    UnknownCountry(String),

    #[error("No emission factor found for region {region} ({country})")]
    UnknownRegion { country: String, region: String },

    #[error("No emission factor found for cloud provider {provider} region {region}")]
    UnknownCloudRegion { provider: String, region: String },

    #[error("GeoMetadata has no region to look up")]
    MissingRegion,

    #[error("Cloud metadata has no provider/region to look up")]
    MissingCloudIdentity,

    #[error("Malformed emission-factor dataset: {0}")]
    Dataset(#[from] serde_json::Error),

    #[error(transparent)]
    Unit(#[from] UnitError),
}
