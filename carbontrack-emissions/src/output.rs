//! Output sinks for emissions records.
//!
//! The file sink appends one CSV row per completed run, writing the header
//! on first use. Sink failures are reported to the caller and never abort a
//! run.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::EmissionsRecord;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write emissions record: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed emissions file at line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

/// Destination for completed run records.
pub trait EmissionsOutput: Send {
    fn out(&self, record: &EmissionsRecord) -> Result<(), OutputError>;
}

const HEADER: &str = "timestamp,run_id,project_name,duration_s,emissions_kg,\
energy_consumed_kwh,country_name,country_iso_code,region,on_cloud,\
cloud_provider,cloud_region";
const FIELD_COUNT: usize = 12;

/// CSV sink, one row per completed run. Creates the file (and header) on
/// first write, appends afterwards.
pub struct FileOutput {
    path: PathBuf,
}

impl FileOutput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EmissionsOutput for FileOutput {
    fn out(&self, record: &EmissionsRecord) -> Result<(), OutputError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let write_header = !self.path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        if write_header {
            writeln!(file, "{}", HEADER)?;
        }
        writeln!(file, "{}", format_row(record))?;
        Ok(())
    }
}

fn format_row(record: &EmissionsRecord) -> String {
    [
        escape(&record.timestamp),
        escape(&record.run_id),
        escape(&record.project_name),
        record.duration_s.to_string(),
        record.emissions_kg.to_string(),
        record.energy_consumed_kwh.to_string(),
        escape(&record.country_name),
        escape(&record.country_iso_code),
        escape(&record.region),
        escape(&record.on_cloud),
        escape(&record.cloud_provider),
        escape(&record.cloud_region),
    ]
    .join(",")
}

fn escape(field: &str) -> String {
    if field.contains(&[',', '"', '\n'][..]) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Read an emissions file back into records. Used by reporting and by the
/// round-trip tests; the header row is skipped.
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<EmissionsRecord>, OutputError> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let mut records = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if index == 0 || line.is_empty() {
            continue;
        }

        let fields = split_row(&line);
        if fields.len() != FIELD_COUNT {
            return Err(OutputError::Parse {
                line: index + 1,
                reason: format!("expected {} fields, found {}", FIELD_COUNT, fields.len()),
            });
        }

        let number = |position: usize| -> Result<f64, OutputError> {
            fields[position].parse().map_err(|_| OutputError::Parse {
                line: index + 1,
                reason: format!("invalid number: {}", fields[position]),
            })
        };

        records.push(EmissionsRecord {
            duration_s: number(3)?,
            emissions_kg: number(4)?,
            energy_consumed_kwh: number(5)?,
            timestamp: fields[0].clone(),
            run_id: fields[1].clone(),
            project_name: fields[2].clone(),
            country_name: fields[6].clone(),
            country_iso_code: fields[7].clone(),
            region: fields[8].clone(),
            on_cloud: fields[9].clone(),
            cloud_provider: fields[10].clone(),
            cloud_region: fields[11].clone(),
        });
    }

    Ok(records)
}

fn split_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}
