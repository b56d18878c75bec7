//! Carbontrack tracker library.
//!
//! Orchestrates a tracking run: background power sampling, energy
//! accumulation, execution-context resolution and final record assembly.

pub mod config;
pub mod resolver;
pub mod scheduler;
pub mod tracker;

pub use config::TrackerConfig;
pub use resolver::{AutoResolver, MetadataResolver, OfflineResolver};
pub use scheduler::{PeriodicTask, ThreadScheduler};
pub use tracker::{track_function, tracked, Tracker, TrackerError};
