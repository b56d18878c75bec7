//! Report and dashboard data-shaping for carbontrack.
//!
//! Turns run records and the emission-factor tables into the flat structures
//! a dashboard or CLI renders: real-world equivalents, per-project
//! summaries, and cross-geography comparison tables.

pub mod comparison;
pub mod equivalents;
pub mod summary;

pub use comparison::{
    cloud_emissions_by_region, global_emissions_by_country, regional_emissions,
    CloudRegionComparison, CountryComparison, RegionComparison,
};
pub use equivalents::{car_miles, household_fraction, tv_time};
pub use summary::{project_summary, ProjectSummary, RunTotals};
