//! The terminal output record of a tracking run.

use serde::{Deserialize, Serialize};

/// One completed tracking run. Immutable once constructed; exactly one is
/// produced per run that actually tracked something.
///
/// Field order matches the columns of the file sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionsRecord {
    pub timestamp: String,
    pub run_id: String,
    pub project_name: String,
    pub duration_s: f64,
    pub emissions_kg: f64,
    pub energy_consumed_kwh: f64,
    pub country_name: String,
    pub country_iso_code: String,
    pub region: String,
    /// "Y" when the run executed on a tracked cloud provider, else "N".
    pub on_cloud: String,
    pub cloud_provider: String,
    pub cloud_region: String,
}
