//! End-to-end tracker lifecycle with deterministic sampling.
//!
//! These tests inject a hand-fired scheduler and a constant power source so
//! accumulation, idempotence and the stop contract can be verified without
//! real time or real hardware.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use carbontrack_emissions::{
    read_records, DataSource, Emissions, EmissionsOutput, FileOutput,
};
use carbontrack_geo::{CloudMetadata, GeoError, GeoMetadata};
use carbontrack_hardware::{HardwareError, PowerSource};
use carbontrack_tracker::{
    tracked, MetadataResolver, OfflineResolver, PeriodicTask, Tracker, TrackerConfig,
};
use carbontrack_units::Power;
use tempfile::TempDir;

// Fixture tables with round factors: USA country figure 0.3 kg/kWh,
// california 500 g/kWh, one cloud region at 200 g/kWh.
const MIX_JSON: &str = r#"{
    "USA": { "countryName": "United States", "coal": 25.0, "petroleum": 25.0, "naturalGas": 25.0, "lowCarbon": 25.0, "total": 100.0, "co2eKgPerKwh": 0.3 }
}"#;
const USA_JSON: &str = r#"{
    "california": { "regionCode": "CA", "co2eGPerKwh": 500.0 }
}"#;
const CLOUD_JSON: &str = r#"[
    { "provider": "gcp", "providerName": "Google Cloud Platform", "region": "us-test1", "impact": 200.0, "countryName": "United States", "countryIsoCode": "USA", "state": "california" }
]"#;

struct ConstantPower {
    watts: f64,
}

impl PowerSource for ConstantPower {
    fn total_power(&self) -> Result<Power, HardwareError> {
        Ok(Power::from_watts(self.watts)?)
    }

    fn device_name(&self) -> &str {
        "test GPU"
    }
}

/// Scheduler driven by hand from the test body.
#[derive(Clone, Default)]
struct ManualScheduler {
    job: Arc<Mutex<Option<Box<dyn FnMut() + Send>>>>,
    starts: Arc<AtomicUsize>,
    cancels: Arc<AtomicUsize>,
}

impl ManualScheduler {
    fn fire(&self) {
        if let Some(job) = self.job.lock().unwrap().as_mut() {
            job();
        }
    }

    fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

impl PeriodicTask for ManualScheduler {
    fn start(&mut self, _interval: Duration, job: Box<dyn FnMut() + Send>) {
        self.starts.fetch_add(1, Ordering::SeqCst);
        *self.job.lock().unwrap() = Some(job);
    }

    fn cancel(&mut self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        self.job.lock().unwrap().take();
    }
}

/// Resolver reporting a fixed cloud placement.
struct CloudResolver;

impl MetadataResolver for CloudResolver {
    fn geo_metadata(&self) -> Result<GeoMetadata, GeoError> {
        Ok(GeoMetadata::new("USA", "United States", None))
    }

    fn cloud_metadata(&self) -> Result<CloudMetadata, GeoError> {
        Ok(CloudMetadata::new(
            Some("gcp".to_string()),
            Some("us-test1".to_string()),
        ))
    }
}

fn fixture_emissions() -> Emissions {
    Emissions::new(DataSource::from_json(MIX_JSON, USA_JSON, CLOUD_JSON).unwrap())
}

fn offline_tracker(
    output_dir: &Path,
    interval_secs: u64,
    watts: Option<f64>,
) -> (Tracker, ManualScheduler) {
    let scheduler = ManualScheduler::default();
    let config = TrackerConfig {
        project_name: "lifecycle".to_string(),
        measure_power_secs: interval_secs,
        output_dir: output_dir.to_path_buf(),
        save_to_file: false,
    };
    let power_source: Option<Arc<dyn PowerSource>> =
        watts.map(|watts| Arc::new(ConstantPower { watts }) as Arc<dyn PowerSource>);
    let sinks: Vec<Box<dyn EmissionsOutput>> = vec![Box::new(FileOutput::new(
        output_dir.join("emissions.csv"),
    ))];

    let tracker = Tracker::from_parts(
        config,
        Box::new(OfflineResolver::new(
            "USA",
            "United States",
            Some("california".to_string()),
        )),
        power_source,
        Box::new(scheduler.clone()),
        fixture_emissions(),
        sinks,
    );
    (tracker, scheduler)
}

#[test]
fn test_rectangle_rule_accumulation() {
    let tmp_dir = TempDir::new().unwrap();
    let (mut tracker, scheduler) = offline_tracker(tmp_dir.path(), 1, Some(100.0));

    tracker.start();
    for _ in 0..5 {
        scheduler.fire();
    }

    // 100 W for 5 one-second samples
    let expected_kwh = 100.0 * 5.0 / 3_600_000.0;
    assert!((tracker.total_energy().kwh() - expected_kwh).abs() < 1e-15);

    let emissions = tracker.stop().unwrap().expect("tracked run has a result");
    // california factor: 500 g/kWh = 0.5 kg/kWh
    assert!((emissions - expected_kwh * 0.5).abs() < 1e-15);

    let records = read_records(tmp_dir.path().join("emissions.csv")).unwrap();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.project_name, "lifecycle");
    assert_eq!(record.country_iso_code, "USA");
    assert_eq!(record.region, "california");
    assert_eq!(record.on_cloud, "N");
    assert!(record.cloud_provider.is_empty());
    assert!((record.energy_consumed_kwh - expected_kwh).abs() < 1e-15);
    assert!((record.emissions_kg - emissions).abs() < 1e-15);
    assert!(!record.run_id.is_empty());
}

#[test]
fn test_double_start_keeps_a_single_sampler() {
    let tmp_dir = TempDir::new().unwrap();
    let (mut tracker, scheduler) = offline_tracker(tmp_dir.path(), 1, Some(100.0));

    tracker.start();
    tracker.start();
    assert_eq!(scheduler.starts(), 1);

    scheduler.fire();
    let single_sample = 100.0 / 3_600_000.0;
    assert!((tracker.total_energy().kwh() - single_sample).abs() < 1e-15);
}

#[test]
fn test_stop_without_start_reports_nothing() {
    let tmp_dir = TempDir::new().unwrap();
    let (mut tracker, scheduler) = offline_tracker(tmp_dir.path(), 1, Some(100.0));

    assert!(tracker.stop().unwrap().is_none());
    assert_eq!(scheduler.cancels(), 0);
    // No record written
    assert!(!tmp_dir.path().join("emissions.csv").exists());
}

#[test]
fn test_stop_cancels_sampler_before_reading_energy() {
    let tmp_dir = TempDir::new().unwrap();
    let (mut tracker, scheduler) = offline_tracker(tmp_dir.path(), 1, Some(100.0));

    tracker.start();
    scheduler.fire();
    tracker.stop().unwrap();

    assert_eq!(scheduler.cancels(), 1);
    // A late tick after cancellation cannot change the accumulated total
    let energy_after_stop = tracker.total_energy();
    scheduler.fire();
    assert_eq!(tracker.total_energy(), energy_after_stop);
}

#[test]
fn test_second_stop_reports_nothing() {
    let tmp_dir = TempDir::new().unwrap();
    let (mut tracker, scheduler) = offline_tracker(tmp_dir.path(), 1, Some(100.0));

    tracker.start();
    scheduler.fire();
    assert!(tracker.stop().unwrap().is_some());
    assert!(tracker.stop().unwrap().is_none());

    let records = read_records(tmp_dir.path().join("emissions.csv")).unwrap();
    assert_eq!(records.len(), 1);
}

#[test]
fn test_no_metering_capability_leaves_tracker_idle() {
    let tmp_dir = TempDir::new().unwrap();
    let (mut tracker, scheduler) = offline_tracker(tmp_dir.path(), 1, None);

    tracker.start();
    assert!(!tracker.is_running());
    assert_eq!(scheduler.starts(), 0);

    // stop() after the ignored start behaves like stop-before-start
    assert!(tracker.stop().unwrap().is_none());
    assert!(!tmp_dir.path().join("emissions.csv").exists());
}

#[test]
fn test_cloud_run_uses_cloud_factors_and_labels() {
    let tmp_dir = TempDir::new().unwrap();
    let scheduler = ManualScheduler::default();
    let config = TrackerConfig {
        project_name: "cloud-run".to_string(),
        measure_power_secs: 1,
        output_dir: tmp_dir.path().to_path_buf(),
        save_to_file: false,
    };
    let sinks: Vec<Box<dyn EmissionsOutput>> = vec![Box::new(FileOutput::new(
        tmp_dir.path().join("emissions.csv"),
    ))];
    let mut tracker = Tracker::from_parts(
        config,
        Box::new(CloudResolver),
        Some(Arc::new(ConstantPower { watts: 100.0 })),
        Box::new(scheduler.clone()),
        fixture_emissions(),
        sinks,
    );

    tracker.start();
    for _ in 0..10 {
        scheduler.fire();
    }
    let emissions = tracker.stop().unwrap().expect("tracked run has a result");

    // us-test1 impact: 200 g/kWh = 0.2 kg/kWh
    let expected_kwh = 100.0 * 10.0 / 3_600_000.0;
    assert!((emissions - expected_kwh * 0.2).abs() < 1e-15);

    let records = read_records(tmp_dir.path().join("emissions.csv")).unwrap();
    let record = &records[0];
    assert_eq!(record.on_cloud, "Y");
    assert_eq!(record.cloud_provider, "gcp");
    assert_eq!(record.cloud_region, "us-test1");
    // Physical location resolved from the cloud table
    assert_eq!(record.country_iso_code, "USA");
    assert_eq!(record.country_name, "United States");
    assert_eq!(record.region, "california");
}

/// Resolver whose cloud lookup fails but whose geo lookup succeeds.
struct FlakyCloudResolver;

impl MetadataResolver for FlakyCloudResolver {
    fn geo_metadata(&self) -> Result<GeoMetadata, GeoError> {
        Ok(GeoMetadata::new("USA", "United States", None))
    }

    fn cloud_metadata(&self) -> Result<CloudMetadata, GeoError> {
        Err(GeoError::Unavailable("no metadata endpoint".to_string()))
    }
}

/// Resolver that cannot determine geography at all.
struct NoGeoResolver;

impl MetadataResolver for NoGeoResolver {
    fn geo_metadata(&self) -> Result<GeoMetadata, GeoError> {
        Err(GeoError::Unavailable("geolocation offline".to_string()))
    }

    fn cloud_metadata(&self) -> Result<CloudMetadata, GeoError> {
        Ok(CloudMetadata::on_private())
    }
}

fn bare_tracker(resolver: Box<dyn MetadataResolver>) -> (Tracker, ManualScheduler) {
    let scheduler = ManualScheduler::default();
    let config = TrackerConfig {
        project_name: "resolution".to_string(),
        measure_power_secs: 1,
        output_dir: std::env::temp_dir(),
        save_to_file: false,
    };
    let tracker = Tracker::from_parts(
        config,
        resolver,
        Some(Arc::new(ConstantPower { watts: 100.0 })),
        Box::new(scheduler.clone()),
        fixture_emissions(),
        Vec::new(),
    );
    (tracker, scheduler)
}

#[test]
fn test_cloud_resolution_failure_falls_back_to_private_infra() {
    let (mut tracker, scheduler) = bare_tracker(Box::new(FlakyCloudResolver));

    tracker.start();
    scheduler.fire();
    let emissions = tracker.stop().unwrap().expect("tracked run has a result");

    // Country figure (0.3 kg/kWh), not a cloud factor
    let expected_kwh = 100.0 / 3_600_000.0;
    assert!((emissions - expected_kwh * 0.3).abs() < 1e-15);
}

#[test]
fn test_geo_resolution_failure_surfaces_as_error() {
    let (mut tracker, scheduler) = bare_tracker(Box::new(NoGeoResolver));

    tracker.start();
    scheduler.fire();
    assert!(tracker.stop().is_err());
}

#[test]
fn test_tracked_closure_returns_value_and_emissions() {
    let tmp_dir = TempDir::new().unwrap();
    let (tracker, scheduler) = offline_tracker(tmp_dir.path(), 1, Some(100.0));

    let sampler = scheduler.clone();
    let (value, emissions) = tracked(tracker, move || {
        sampler.fire();
        41 + 1
    })
    .unwrap();

    assert_eq!(value, 42);
    let expected_kwh = 100.0 / 3_600_000.0;
    assert!((emissions.unwrap() - expected_kwh * 0.5).abs() < 1e-15);
}

#[test]
fn test_track_function_defers_execution() {
    let tmp_dir = TempDir::new().unwrap();
    let (tracker, _scheduler) = offline_tracker(tmp_dir.path(), 1, Some(100.0));

    let wrapped = carbontrack_tracker::track_function(tracker, || "done");
    let (value, emissions) = wrapped().unwrap();

    assert_eq!(value, "done");
    // The sampler never fired, so the run tracked zero energy
    assert_eq!(emissions, Some(0.0));
}
