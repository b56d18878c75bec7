//! Cross-geography comparison tables.
//!
//! Answers "what would this run have emitted elsewhere": per-country and
//! per-region tables feeding choropleth views, and a per-cloud-region table
//! for provider comparisons.

use carbontrack_emissions::{CloudRegionRecord, Emissions, EmissionsError};
use carbontrack_geo::GeoMetadata;
use carbontrack_units::{EmissionFactor, Energy};
use serde::Serialize;

/// Estimated emissions of a run's energy in one country, with that
/// country's generation mix.
#[derive(Debug, Clone, Serialize)]
pub struct CountryComparison {
    pub iso_code: String,
    pub country: String,
    pub emissions_kg: f64,
    pub coal_percent: f64,
    pub petroleum_percent: f64,
    pub natural_gas_percent: f64,
    pub low_carbon_percent: f64,
}

/// Estimated emissions of a run's energy in one sub-national region.
#[derive(Debug, Clone, Serialize)]
pub struct RegionComparison {
    pub region_code: String,
    pub region_name: String,
    pub emissions_kg: f64,
}

/// Estimated emissions of a run's energy in one cloud region.
#[derive(Debug, Clone, Serialize)]
pub struct CloudRegionComparison {
    pub provider: String,
    pub region: String,
    pub emissions_kg: f64,
    pub country_name: String,
}

/// Mix shares are displayed to one decimal place.
fn share_percent(part: f64, total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    (part / total * 1000.0).round() / 10.0
}

/// Estimated emissions of `net_energy` in every country in the dataset,
/// sorted by ISO code.
pub fn global_emissions_by_country(
    emissions: &Emissions,
    net_energy: Energy,
) -> Result<Vec<CountryComparison>, EmissionsError> {
    let mut rows = Vec::new();
    for (iso_code, mix) in emissions.data().countries() {
        // Antarctica has no grid worth comparing against.
        if iso_code == "ATA" {
            continue;
        }
        let geo = GeoMetadata::new(iso_code.clone(), mix.country_name.clone(), None);
        rows.push(CountryComparison {
            iso_code: iso_code.clone(),
            country: mix.country_name.clone(),
            emissions_kg: emissions.get_country_emissions(net_energy, &geo)?,
            coal_percent: share_percent(mix.coal, mix.total),
            petroleum_percent: share_percent(mix.petroleum, mix.total),
            natural_gas_percent: share_percent(mix.natural_gas, mix.total),
            low_carbon_percent: share_percent(mix.low_carbon, mix.total),
        });
    }
    rows.sort_by(|a, b| a.iso_code.cmp(&b.iso_code));
    Ok(rows)
}

/// Per-region table for countries with regional data (currently the United
/// States), sorted by region code. Empty for everywhere else.
pub fn regional_emissions(
    emissions: &Emissions,
    net_energy: Energy,
    country_iso_code: &str,
) -> Result<Vec<RegionComparison>, EmissionsError> {
    if !country_iso_code.eq_ignore_ascii_case("USA") {
        return Ok(Vec::new());
    }

    let country_name = emissions
        .data()
        .country_mix(country_iso_code)
        .map(|mix| mix.country_name.clone())
        .unwrap_or_else(|| country_iso_code.to_string());

    let mut rows = Vec::new();
    for (region_name, factor) in emissions.data().usa_regions() {
        let geo = GeoMetadata::new(
            country_iso_code,
            country_name.clone(),
            Some(region_name.clone()),
        );
        rows.push(RegionComparison {
            region_code: factor.region_code.clone(),
            region_name: region_name.clone(),
            emissions_kg: emissions.get_region_emissions(net_energy, &geo)?,
        });
    }
    rows.sort_by(|a, b| a.region_code.cmp(&b.region_code));
    Ok(rows)
}

fn cloud_row(
    record: &CloudRegionRecord,
    net_energy: Energy,
) -> Result<CloudRegionComparison, EmissionsError> {
    Ok(CloudRegionComparison {
        provider: record.provider.clone(),
        region: record.region.clone(),
        emissions_kg: EmissionFactor::from_g_per_kwh(record.impact)?.emissions_for(net_energy),
        country_name: record.country_name.clone(),
    })
}

/// Comparison across one provider's regions: the run's own region first,
/// then the provider's other regions ordered by ascending emissions.
/// Returns the provider's display name alongside the rows.
pub fn cloud_emissions_by_region(
    emissions: &Emissions,
    net_energy: Energy,
    provider: &str,
    current_region: &str,
) -> Result<(String, Vec<CloudRegionComparison>), EmissionsError> {
    let data = emissions.data();
    let current = data.cloud_region(provider, current_region).ok_or_else(|| {
        EmissionsError::UnknownCloudRegion {
            provider: provider.to_string(),
            region: current_region.to_string(),
        }
    })?;

    let mut rows = vec![cloud_row(current, net_energy)?];

    let mut others = data
        .cloud_regions()
        .iter()
        .filter(|record| record.provider == provider && record.region != current_region)
        .map(|record| cloud_row(record, net_energy))
        .collect::<Result<Vec<_>, _>>()?;
    others.sort_by(|a, b| {
        a.emissions_kg
            .partial_cmp(&b.emissions_kg)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    rows.extend(others);
    Ok((current.provider_name.clone(), rows))
}
