//! The tracking state machine.
//!
//! A tracker runs once: `start` launches the background sampler, each tick
//! adds `power × interval` to the accumulated energy (rectangle-rule
//! integration), and `stop` cancels the sampler, resolves the execution
//! context, converts energy to emissions and hands the record to every sink.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use carbontrack_emissions::{
    DataSource, Emissions, EmissionsError, EmissionsOutput, EmissionsRecord, FileOutput,
};
use carbontrack_geo::{CloudMetadata, GeoError, MetadataClient};
use carbontrack_hardware::{detect_power_source, PowerSource};
use carbontrack_units::{Energy, Time};
use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::TrackerConfig;
use crate::resolver::{AutoResolver, MetadataResolver, OfflineResolver};
use crate::scheduler::{PeriodicTask, ThreadScheduler};

const EMISSIONS_FILE: &str = "emissions.csv";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Geo(#[from] GeoError),

    #[error(transparent)]
    Emissions(#[from] EmissionsError),
}

/// One tracking run: Idle until `start`, then sampling until `stop`, then
/// finished. `start` and `stop` are each effective at most once.
pub struct Tracker {
    project_name: String,
    measure_power_secs: u64,
    start_time: Option<Instant>,
    stopped: bool,
    total_energy: Arc<Mutex<Energy>>,
    power_source: Option<Arc<dyn PowerSource>>,
    scheduler: Box<dyn PeriodicTask>,
    resolver: Box<dyn MetadataResolver>,
    emissions: Emissions,
    sinks: Vec<Box<dyn EmissionsOutput>>,
}

impl Tracker {
    /// Tracker that auto-detects its execution context over the network at
    /// `stop` time.
    pub fn online(config: TrackerConfig) -> Result<Self, TrackerError> {
        let client = MetadataClient::new()?;
        Self::assemble(config, Box::new(AutoResolver::new(client)))
    }

    /// Tracker for air-gapped runs with caller-supplied geography. Both
    /// country fields are required; misconfiguration fails here, not at the
    /// end of a run.
    pub fn offline(
        config: TrackerConfig,
        country_iso_code: &str,
        country_name: &str,
        region: Option<String>,
    ) -> Result<Self, TrackerError> {
        Self::assemble(
            config,
            Box::new(OfflineResolver::new(country_iso_code, country_name, region)),
        )
    }

    fn assemble(
        config: TrackerConfig,
        resolver: Box<dyn MetadataResolver>,
    ) -> Result<Self, TrackerError> {
        let power_source = detect_power_source().map(Arc::from);
        let emissions = Emissions::new(DataSource::embedded()?);

        let mut sinks: Vec<Box<dyn EmissionsOutput>> = Vec::new();
        if config.save_to_file {
            sinks.push(Box::new(FileOutput::new(
                config.output_dir.join(EMISSIONS_FILE),
            )));
        }

        Ok(Self::from_parts(
            config,
            resolver,
            power_source,
            Box::new(ThreadScheduler::new()),
            emissions,
            sinks,
        ))
    }

    /// Fully injected constructor; the seam used by tests and embedders.
    pub fn from_parts(
        config: TrackerConfig,
        resolver: Box<dyn MetadataResolver>,
        power_source: Option<Arc<dyn PowerSource>>,
        scheduler: Box<dyn PeriodicTask>,
        emissions: Emissions,
        sinks: Vec<Box<dyn EmissionsOutput>>,
    ) -> Self {
        Self {
            project_name: config.project_name,
            measure_power_secs: config.measure_power_secs,
            start_time: None,
            stopped: false,
            total_energy: Arc::new(Mutex::new(Energy::default())),
            power_source,
            scheduler,
            resolver,
            emissions,
            sinks,
        }
    }

    /// Register an additional output sink.
    pub fn add_output(&mut self, sink: Box<dyn EmissionsOutput>) {
        self.sinks.push(sink);
    }

    /// Energy accumulated so far.
    pub fn total_energy(&self) -> Energy {
        *self.total_energy.lock().unwrap()
    }

    pub fn is_running(&self) -> bool {
        self.start_time.is_some() && !self.stopped
    }

    /// Begin tracking. A no-op (with a warning) when no power-metering
    /// capability was detected, when already running, or after `stop`.
    pub fn start(&mut self) {
        let Some(power_source) = self.power_source.as_ref() else {
            warn!("No power metering capability available; tracker stays idle");
            return;
        };
        if self.stopped {
            warn!("Tracker already finished; ignoring start");
            return;
        }
        if self.start_time.is_some() {
            warn!("Tracking already started");
            return;
        }

        let interval = Duration::from_secs(self.measure_power_secs);
        let sample_time = Time::from_duration(interval);
        let total_energy = Arc::clone(&self.total_energy);
        let power_source = Arc::clone(power_source);

        self.start_time = Some(Instant::now());
        self.scheduler.start(
            interval,
            Box::new(move || match power_source.total_power() {
                Ok(power) => {
                    let sample = Energy::from_power_and_time(power, sample_time);
                    *total_energy.lock().unwrap() += sample;
                }
                Err(e) => warn!("Power sample failed: {}", e),
            }),
        );

        info!("🌱 Tracking started (project: {})", self.project_name);
    }

    /// Finish tracking and return the estimated emissions in kg CO2e.
    ///
    /// Returns `Ok(None)` when there is nothing to report (never started,
    /// or already stopped). Sink failures are logged and do not affect the
    /// returned value.
    pub fn stop(&mut self) -> Result<Option<f64>, TrackerError> {
        let Some(start_time) = self.start_time else {
            error!("Tracker was never started; nothing to report");
            return Ok(None);
        };
        if self.stopped {
            error!("Tracker already stopped");
            return Ok(None);
        }
        self.stopped = true;

        // Join the sampler before the final read so no sample races the total.
        self.scheduler.cancel();

        let duration = Time::from_duration(start_time.elapsed());
        let total_energy = *self.total_energy.lock().unwrap();

        let cloud = self.resolver.cloud_metadata().unwrap_or_else(|e| {
            warn!(
                "Cloud metadata resolution failed ({}); assuming private infrastructure",
                e
            );
            CloudMetadata::on_private()
        });

        let (emissions_kg, country_name, country_iso_code, region, on_cloud, provider, cloud_region) =
            if cloud.is_on_private_infra() {
                let geo = self.resolver.geo_metadata()?;
                let kg = self
                    .emissions
                    .get_private_infra_emissions(total_energy, &geo)?;
                (
                    kg,
                    geo.country_name,
                    geo.country_iso_code,
                    geo.region.unwrap_or_default(),
                    "N",
                    String::new(),
                    String::new(),
                )
            } else {
                let kg = self.emissions.get_cloud_emissions(total_energy, &cloud)?;
                (
                    kg,
                    self.emissions.get_cloud_country_name(&cloud)?,
                    self.emissions.get_cloud_country_iso_code(&cloud)?,
                    self.emissions
                        .get_cloud_geo_region(&cloud)?
                        .unwrap_or_default(),
                    "Y",
                    cloud.provider.clone().unwrap_or_default(),
                    cloud.region.clone().unwrap_or_default(),
                )
            };

        let record = EmissionsRecord {
            timestamp: Utc::now().format(TIMESTAMP_FORMAT).to_string(),
            run_id: Uuid::new_v4().to_string(),
            project_name: self.project_name.clone(),
            duration_s: duration.seconds(),
            emissions_kg,
            energy_consumed_kwh: total_energy.kwh(),
            country_name,
            country_iso_code,
            region,
            on_cloud: on_cloud.to_string(),
            cloud_provider: provider,
            cloud_region,
        };

        for sink in &self.sinks {
            if let Err(e) = sink.out(&record) {
                error!("Failed to persist emissions record: {}", e);
            }
        }

        info!(
            "🌍 Tracking stopped: {:.6} kg CO2eq over {:.1}s",
            emissions_kg, record.duration_s
        );
        Ok(Some(emissions_kg))
    }
}

/// Track a closure: start before, stop after, returning the closure's
/// output alongside the emissions estimate.
pub fn tracked<T>(
    mut tracker: Tracker,
    f: impl FnOnce() -> T,
) -> Result<(T, Option<f64>), TrackerError> {
    tracker.start();
    let value = f();
    let emissions = tracker.stop()?;
    Ok((value, emissions))
}

/// Wrap a point function for deferred execution under tracking. A thin
/// convenience over [`tracked`].
pub fn track_function<T, F>(
    tracker: Tracker,
    f: F,
) -> impl FnOnce() -> Result<(T, Option<f64>), TrackerError>
where
    F: FnOnce() -> T,
{
    move || tracked(tracker, f)
}
