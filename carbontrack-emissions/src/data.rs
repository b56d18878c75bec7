//! Embedded emission-factor datasets.
//!
//! The tables ship inside the crate so offline tracking needs no data files
//! on disk. A [`DataSource`] owns the parsed tables and is constructed
//! explicitly by whoever needs one; there is no shared global instance.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::EmissionsError;

const GLOBAL_ENERGY_MIX_JSON: &str = include_str!("../data/global_energy_mix.json");
const USA_EMISSIONS_JSON: &str = include_str!("../data/usa_emissions.json");
const CLOUD_EMISSIONS_JSON: &str = include_str!("../data/cloud_emissions.json");

/// One country's generation mix (TWh per source) and carbon intensity.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryEnergyMix {
    pub country_name: String,
    pub coal: f64,
    pub petroleum: f64,
    pub natural_gas: f64,
    pub low_carbon: f64,
    pub total: f64,
    pub co2e_kg_per_kwh: f64,
}

/// Sub-national emission factor, in g CO2e per kWh.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionFactor {
    pub region_code: String,
    pub co2e_g_per_kwh: f64,
}

/// One cloud region's carbon impact and physical location.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudRegionRecord {
    pub provider: String,
    pub provider_name: String,
    pub region: String,
    /// g CO2e per kWh for the region's energy mix.
    pub impact: f64,
    pub country_name: String,
    pub country_iso_code: String,
    #[serde(default)]
    pub state: Option<String>,
}

/// Parsed emission-factor tables.
pub struct DataSource {
    global_energy_mix: HashMap<String, CountryEnergyMix>,
    usa_regions: HashMap<String, RegionFactor>,
    cloud_regions: Vec<CloudRegionRecord>,
}

impl DataSource {
    /// Parse the datasets shipped with the crate.
    pub fn embedded() -> Result<Self, EmissionsError> {
        Self::from_json(
            GLOBAL_ENERGY_MIX_JSON,
            USA_EMISSIONS_JSON,
            CLOUD_EMISSIONS_JSON,
        )
    }

    /// Parse caller-supplied tables. Country keys are ISO-3166 alpha-3
    /// codes; region keys are lowercase region names.
    pub fn from_json(
        global_energy_mix: &str,
        usa_regions: &str,
        cloud_regions: &str,
    ) -> Result<Self, EmissionsError> {
        Ok(Self {
            global_energy_mix: serde_json::from_str(global_energy_mix)?,
            usa_regions: serde_json::from_str(usa_regions)?,
            cloud_regions: serde_json::from_str(cloud_regions)?,
        })
    }

    pub fn country_mix(&self, country_iso_code: &str) -> Option<&CountryEnergyMix> {
        self.global_energy_mix.get(&country_iso_code.to_uppercase())
    }

    pub fn countries(&self) -> impl Iterator<Item = (&String, &CountryEnergyMix)> {
        self.global_energy_mix.iter()
    }

    /// Sub-national factors currently exist for the United States only.
    pub fn usa_region(&self, region: &str) -> Option<&RegionFactor> {
        self.usa_regions.get(&region.to_lowercase())
    }

    pub fn usa_regions(&self) -> impl Iterator<Item = (&String, &RegionFactor)> {
        self.usa_regions.iter()
    }

    pub fn cloud_region(&self, provider: &str, region: &str) -> Option<&CloudRegionRecord> {
        self.cloud_regions
            .iter()
            .find(|record| record.provider == provider && record.region == region)
    }

    pub fn cloud_regions(&self) -> &[CloudRegionRecord] {
        &self.cloud_regions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_datasets_parse() {
        let data = DataSource::embedded().unwrap();

        let usa = data.country_mix("USA").unwrap();
        assert_eq!(usa.country_name, "United States");
        assert!(usa.co2e_kg_per_kwh > 0.0);

        assert!(data.usa_region("California").is_some());
        assert!(data.cloud_region("aws", "us-east-1").is_some());
        assert!(data.cloud_regions().len() >= 10);
    }

    #[test]
    fn test_lookup_normalization() {
        let data = DataSource::embedded().unwrap();
        assert!(data.country_mix("usa").is_some());
        assert!(data.usa_region("NEW YORK").is_some());
        assert!(data.country_mix("ATLANTIS").is_none());
    }
}
