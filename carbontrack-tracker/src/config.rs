//! Tracker run configuration.

use std::path::PathBuf;

/// Configuration for a single tracking run.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Project name stamped on the run record.
    pub project_name: String,

    /// Power sampling interval, in seconds. Accumulation is a rectangle-rule
    /// integral, so accuracy is bounded by this interval.
    pub measure_power_secs: u64,

    /// Directory the emissions file is written to.
    pub output_dir: PathBuf,

    /// Whether to register the default file sink.
    pub save_to_file: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            project_name: "default".to_string(),
            measure_power_secs: 15,
            output_dir: PathBuf::from("."),
            save_to_file: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrackerConfig::default();
        assert_eq!(config.project_name, "default");
        assert_eq!(config.measure_power_secs, 15);
        assert!(config.save_to_file);
    }
}
