//! Per-project aggregation of run records.

use carbontrack_emissions::EmissionsRecord;
use serde::Serialize;

/// Duration/emissions/energy triple, for one run or a lifetime total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunTotals {
    pub duration_s: f64,
    pub emissions_kg: f64,
    pub energy_consumed_kwh: f64,
}

/// Last-run snapshot plus lifetime totals for one project. Geo/cloud labels
/// come from the most recent run.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    pub project_name: String,
    pub run_count: usize,
    pub last_run_timestamp: String,
    pub last_run: RunTotals,
    pub total: RunTotals,
    pub country_name: String,
    pub country_iso_code: String,
    pub region: String,
    pub on_cloud: String,
    pub cloud_provider: String,
    pub cloud_region: String,
}

/// Aggregate a project's runs; `None` when the project has no records.
pub fn project_summary(records: &[EmissionsRecord], project_name: &str) -> Option<ProjectSummary> {
    let mut runs: Vec<&EmissionsRecord> = records
        .iter()
        .filter(|record| record.project_name == project_name)
        .collect();
    if runs.is_empty() {
        return None;
    }

    // Timestamps are ISO-formatted, so string order is chronological order.
    runs.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    let last = *runs.last()?;

    Some(ProjectSummary {
        project_name: project_name.to_string(),
        run_count: runs.len(),
        last_run_timestamp: last.timestamp.clone(),
        last_run: RunTotals {
            duration_s: last.duration_s,
            emissions_kg: last.emissions_kg,
            energy_consumed_kwh: last.energy_consumed_kwh,
        },
        total: RunTotals {
            duration_s: runs.iter().map(|r| r.duration_s).sum(),
            emissions_kg: runs.iter().map(|r| r.emissions_kg).sum(),
            energy_consumed_kwh: runs.iter().map(|r| r.energy_consumed_kwh).sum(),
        },
        country_name: last.country_name.clone(),
        country_iso_code: last.country_iso_code.clone(),
        region: last.region.clone(),
        on_cloud: last.on_cloud.clone(),
        cloud_provider: last.cloud_provider.clone(),
        cloud_region: last.cloud_region.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(project: &str, timestamp: &str, emissions_kg: f64) -> EmissionsRecord {
        EmissionsRecord {
            timestamp: timestamp.to_string(),
            run_id: format!("run-{}", timestamp),
            project_name: project.to_string(),
            duration_s: 100.0,
            emissions_kg,
            energy_consumed_kwh: emissions_kg * 2.0,
            country_name: "Canada".to_string(),
            country_iso_code: "CAN".to_string(),
            region: String::new(),
            on_cloud: "N".to_string(),
            cloud_provider: String::new(),
            cloud_region: String::new(),
        }
    }

    #[test]
    fn test_summary_aggregates_and_orders() {
        let records = vec![
            record("train", "2026-08-02T09:00:00", 0.3),
            record("other", "2026-08-03T09:00:00", 9.0),
            record("train", "2026-08-01T09:00:00", 0.1),
            record("train", "2026-08-03T09:00:00", 0.2),
        ];

        let summary = project_summary(&records, "train").unwrap();
        assert_eq!(summary.run_count, 3);
        assert_eq!(summary.last_run_timestamp, "2026-08-03T09:00:00");
        assert!((summary.last_run.emissions_kg - 0.2).abs() < 1e-12);
        assert!((summary.total.emissions_kg - 0.6).abs() < 1e-12);
        assert!((summary.total.duration_s - 300.0).abs() < 1e-12);
        assert_eq!(summary.country_iso_code, "CAN");
    }

    #[test]
    fn test_summary_of_unknown_project_is_none() {
        let records = vec![record("train", "2026-08-01T09:00:00", 0.1)];
        assert!(project_summary(&records, "missing").is_none());
    }
}
