//! GPU power sampling via NVML.

use carbontrack_units::{Power, UnitError};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum HardwareError {
    #[error("Failed to initialize power metering: {0}")]
    Init(String),

    #[error("Failed to query power draw: {0}")]
    Query(String),

    #[error(transparent)]
    Unit(#[from] UnitError),
}

/// A power-metering capability polled by the sampler.
///
/// `total_power` is a synchronous read of instantaneous draw summed across
/// all tracked devices, safe to call repeatedly with no side effects beyond
/// the read itself.
pub trait PowerSource: Send + Sync {
    fn total_power(&self) -> Result<Power, HardwareError>;
    fn device_name(&self) -> &str;
}

/// One-time capability check. Returns the best available power source, or
/// `None` (with a warning) when the machine exposes no power metering.
pub fn detect_power_source() -> Option<Box<dyn PowerSource>> {
    #[cfg(any(target_os = "linux", target_os = "windows"))]
    {
        match nvidia::NvmlPowerSource::new() {
            Ok(source) => {
                info!("Power metering enabled: {}", source.device_name());
                return Some(Box::new(source));
            }
            Err(e) => warn!("NVML power metering unavailable: {}", e),
        }
    }

    warn!("No power metering capability detected");
    None
}

// NVIDIA power source (Linux/Windows via NVML)
#[cfg(any(target_os = "linux", target_os = "windows"))]
pub mod nvidia {
    use super::*;

    #[cfg(feature = "gpu-monitoring")]
    use nvml_wrapper::Nvml;

    /// NVIDIA power source backed by NVML. Draw is summed across every
    /// device NVML enumerates.
    pub struct NvmlPowerSource {
        #[cfg(feature = "gpu-monitoring")]
        nvml: Nvml,

        device_count: u32,
        device_name: String,
    }

    impl NvmlPowerSource {
        pub fn new() -> Result<Self, HardwareError> {
            #[cfg(feature = "gpu-monitoring")]
            {
                let nvml = Nvml::init()
                    .map_err(|e| HardwareError::Init(format!("NVML init failed: {}", e)))?;

                let device_count = nvml
                    .device_count()
                    .map_err(|e| HardwareError::Init(format!("Failed to enumerate GPUs: {}", e)))?;

                if device_count == 0 {
                    return Err(HardwareError::Init("No NVIDIA devices found".to_string()));
                }

                let device_name = nvml
                    .device_by_index(0)
                    .and_then(|device| device.name())
                    .unwrap_or_else(|_| "NVIDIA GPU".to_string());

                Ok(Self {
                    nvml,
                    device_count,
                    device_name,
                })
            }

            #[cfg(not(feature = "gpu-monitoring"))]
            Err(HardwareError::Init("NVML support not compiled".to_string()))
        }
    }

    impl PowerSource for NvmlPowerSource {
        fn total_power(&self) -> Result<Power, HardwareError> {
            #[cfg(feature = "gpu-monitoring")]
            {
                let mut milliwatts: u64 = 0;
                for index in 0..self.device_count {
                    let device = self
                        .nvml
                        .device_by_index(index)
                        .map_err(|e| HardwareError::Query(format!("GPU {}: {}", index, e)))?;
                    let draw = device
                        .power_usage()
                        .map_err(|e| HardwareError::Query(format!("GPU {}: {}", index, e)))?;
                    milliwatts += u64::from(draw);
                }
                Ok(Power::from_milliwatts(milliwatts as f64)?)
            }

            #[cfg(not(feature = "gpu-monitoring"))]
            Err(HardwareError::Query("NVML support not compiled".to_string()))
        }

        fn device_name(&self) -> &str {
            &self.device_name
        }
    }
}
