//! Execution-context metadata for carbontrack.
//!
//! Answers two questions about the machine a tracked run executes on: which
//! country/region it sits in, and whether it is on tracked cloud
//! infrastructure.

pub mod client;
pub mod metadata;

pub use client::{GeoError, MetadataClient};
pub use metadata::{CloudMetadata, GeoMetadata};
