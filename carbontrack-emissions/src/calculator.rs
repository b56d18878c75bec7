//! Pure conversion from consumed energy to estimated CO2-equivalent mass.

use carbontrack_geo::{CloudMetadata, GeoMetadata};
use carbontrack_units::{EmissionFactor, Energy};
use tracing::warn;

use crate::data::{CloudRegionRecord, DataSource};
use crate::error::EmissionsError;

/// Emissions estimation over a set of emission-factor tables.
///
/// Stateless beyond the tables themselves; every method is a lookup and a
/// multiply.
pub struct Emissions {
    data: DataSource,
}

impl Emissions {
    pub fn new(data: DataSource) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &DataSource {
        &self.data
    }

    /// Emissions for a run on private infrastructure.
    ///
    /// Uses the region-level factor when the region has one; an unrecognized
    /// region falls back to the country-level figure with a warning. An
    /// unknown country is an error.
    pub fn get_private_infra_emissions(
        &self,
        energy: Energy,
        geo: &GeoMetadata,
    ) -> Result<f64, EmissionsError> {
        if let Some(region) = geo.region.as_deref() {
            if geo.country_iso_code.eq_ignore_ascii_case("USA") {
                if let Some(factor) = self.data.usa_region(region) {
                    return Ok(
                        EmissionFactor::from_g_per_kwh(factor.co2e_g_per_kwh)?.emissions_for(energy)
                    );
                }
            }
            warn!(
                "No regional emission factor for {} ({}); using the country figure",
                region, geo.country_iso_code
            );
        }
        self.get_country_emissions(energy, geo)
    }

    /// Country-level emissions, ignoring any region.
    pub fn get_country_emissions(
        &self,
        energy: Energy,
        geo: &GeoMetadata,
    ) -> Result<f64, EmissionsError> {
        let mix = self
            .data
            .country_mix(&geo.country_iso_code)
            .ok_or_else(|| EmissionsError::UnknownCountry(geo.country_iso_code.clone()))?;
        Ok(EmissionFactor::from_kg_per_kwh(mix.co2e_kg_per_kwh)?.emissions_for(energy))
    }

    /// Region-level emissions. Strict: used by reporting code iterating
    /// known regions, so an unknown region is an error, not a fallback.
    pub fn get_region_emissions(
        &self,
        energy: Energy,
        geo: &GeoMetadata,
    ) -> Result<f64, EmissionsError> {
        let region = geo.region.as_deref().ok_or(EmissionsError::MissingRegion)?;

        let factor = if geo.country_iso_code.eq_ignore_ascii_case("USA") {
            self.data.usa_region(region)
        } else {
            None
        };
        let factor = factor.ok_or_else(|| EmissionsError::UnknownRegion {
            country: geo.country_iso_code.clone(),
            region: region.to_string(),
        })?;

        Ok(EmissionFactor::from_g_per_kwh(factor.co2e_g_per_kwh)?.emissions_for(energy))
    }

    /// Emissions for a run in a tracked cloud provider's region.
    pub fn get_cloud_emissions(
        &self,
        energy: Energy,
        cloud: &CloudMetadata,
    ) -> Result<f64, EmissionsError> {
        let record = self.cloud_record(cloud)?;
        Ok(EmissionFactor::from_g_per_kwh(record.impact)?.emissions_for(energy))
    }

    /// Name of the country physically hosting a cloud region.
    pub fn get_cloud_country_name(&self, cloud: &CloudMetadata) -> Result<String, EmissionsError> {
        Ok(self.cloud_record(cloud)?.country_name.clone())
    }

    /// ISO code of the country physically hosting a cloud region.
    pub fn get_cloud_country_iso_code(
        &self,
        cloud: &CloudMetadata,
    ) -> Result<String, EmissionsError> {
        Ok(self.cloud_record(cloud)?.country_iso_code.clone())
    }

    /// Sub-national location of a cloud region, when the dataset records one.
    pub fn get_cloud_geo_region(
        &self,
        cloud: &CloudMetadata,
    ) -> Result<Option<String>, EmissionsError> {
        Ok(self.cloud_record(cloud)?.state.clone())
    }

    fn cloud_record(&self, cloud: &CloudMetadata) -> Result<&CloudRegionRecord, EmissionsError> {
        let (provider, region) = match (cloud.provider.as_deref(), cloud.region.as_deref()) {
            (Some(provider), Some(region)) => (provider, region),
            _ => return Err(EmissionsError::MissingCloudIdentity),
        };
        self.data
            .cloud_region(provider, region)
            .ok_or_else(|| EmissionsError::UnknownCloudRegion {
                provider: provider.to_string(),
                region: region.to_string(),
            })
    }
}
