//! Hardware power metering for carbontrack.
//!
//! Wraps platform power-draw APIs behind the [`PowerSource`] trait. NVIDIA
//! GPUs are read through NVML; capability detection runs once, when a tracker
//! is constructed, never per sample.

pub mod power;

pub use power::{detect_power_source, HardwareError, PowerSource};
