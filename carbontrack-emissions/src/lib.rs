//! Emissions estimation for carbontrack.
//!
//! Converts accumulated energy into an estimated CO2-equivalent mass using
//! embedded emission-factor datasets, models the terminal record of a
//! tracking run, and persists records through output sinks.

pub mod calculator;
pub mod data;
pub mod error;
pub mod models;
pub mod output;

pub use calculator::Emissions;
pub use data::{CloudRegionRecord, CountryEnergyMix, DataSource, RegionFactor};
pub use error::EmissionsError;
pub use models::EmissionsRecord;
pub use output::{read_records, EmissionsOutput, FileOutput, OutputError};
