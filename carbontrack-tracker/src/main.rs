//! carbontrack CLI - estimate the CO2 footprint of compute workloads.
//!
//! `carbontrack run -- python train.py` samples GPU power while the child
//! process runs, then prints the footprint with real-world equivalents.
//! `carbontrack summary` aggregates a previously written emissions file.

use std::path::PathBuf;
use std::process::Command;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use carbontrack_emissions::read_records;
use carbontrack_report::{car_miles, household_fraction, project_summary, tv_time};
use carbontrack_tracker::{Tracker, TrackerConfig};

#[derive(Parser)]
#[command(name = "carbontrack", version, about = "Estimate the CO2 footprint of compute workloads")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command under emissions tracking
    Run(RunArgs),
    /// Summarize recorded runs of a project
    Summary(SummaryArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Project name stamped on the emissions record
    #[arg(long, default_value = "default")]
    project: String,

    /// Power sampling interval in seconds
    #[arg(long, default_value_t = 15)]
    interval: u64,

    /// Directory for the emissions file
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Skip writing the emissions file
    #[arg(long)]
    no_save: bool,

    /// Resolve geography from explicit arguments instead of the network
    #[arg(long, requires = "country_iso_code", requires = "country_name")]
    offline: bool,

    /// 3-letter ISO code of the country the run executes in
    #[arg(long)]
    country_iso_code: Option<String>,

    /// Name of the country the run executes in
    #[arg(long)]
    country_name: Option<String>,

    /// Sub-national region (affects US runs only)
    #[arg(long)]
    region: Option<String>,

    /// Command to execute, after `--`
    #[arg(last = true, required = true)]
    command: Vec<String>,
}

#[derive(Args)]
struct SummaryArgs {
    /// Project to summarize
    #[arg(long, default_value = "default")]
    project: String,

    /// Emissions file written by `run`
    #[arg(long, default_value = "emissions.csv")]
    file: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    match Cli::parse().command {
        Commands::Run(args) => run(args),
        Commands::Summary(args) => summarize(args),
    }
}

fn run(args: RunArgs) -> Result<()> {
    let config = TrackerConfig {
        project_name: args.project,
        measure_power_secs: args.interval,
        output_dir: args.output_dir,
        save_to_file: !args.no_save,
    };

    let mut tracker = if args.offline {
        // clap's `requires` already insists on both fields; keep the check
        // so library misuse cannot fall back to a default country.
        let iso = args
            .country_iso_code
            .context("--country-iso-code is required in offline mode")?;
        let name = args
            .country_name
            .context("--country-name is required in offline mode")?;
        Tracker::offline(config, &iso, &name, args.region)?
    } else {
        Tracker::online(config)?
    };

    tracker.start();
    let status = Command::new(&args.command[0])
        .args(&args.command[1..])
        .status()
        .with_context(|| format!("Failed to launch {}", args.command[0]))?;
    let emissions = tracker.stop()?;

    match emissions {
        Some(kg) => {
            info!("Estimated footprint: {:.6} kg CO2eq", kg);
            info!("  ≈ {:.1} miles driven by an average car", car_miles(kg));
            info!("  ≈ {} of television", tv_time(kg));
            info!(
                "  ≈ {:.2}% of an average household's weekly footprint",
                household_fraction(kg)
            );
        }
        None => warn!("Nothing was tracked; no emissions to report"),
    }

    if !status.success() {
        bail!("Command exited with {}", status);
    }
    Ok(())
}

fn summarize(args: SummaryArgs) -> Result<()> {
    let records = read_records(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let Some(summary) = project_summary(&records, &args.project) else {
        bail!("No recorded runs for project {}", args.project);
    };

    println!("Project: {}", summary.project_name);
    println!("Runs: {}", summary.run_count);
    println!(
        "Last run: {} ({:.1}s, {:.6} kg CO2eq, {:.6} kWh)",
        summary.last_run_timestamp,
        summary.last_run.duration_s,
        summary.last_run.emissions_kg,
        summary.last_run.energy_consumed_kwh
    );
    println!(
        "Total: {:.1}s, {:.6} kg CO2eq, {:.6} kWh",
        summary.total.duration_s, summary.total.emissions_kg, summary.total.energy_consumed_kwh
    );

    if summary.on_cloud == "Y" {
        println!("Cloud: {} / {}", summary.cloud_provider, summary.cloud_region);
    } else if summary.region.is_empty() {
        println!(
            "Location: {} ({})",
            summary.country_name, summary.country_iso_code
        );
    } else {
        println!(
            "Location: {} ({}) / {}",
            summary.country_name, summary.country_iso_code, summary.region
        );
    }

    let total_kg = summary.total.emissions_kg;
    println!(
        "Equivalents: {:.1} car miles, {} of TV, {:.2}% of a household week",
        car_miles(total_kg),
        tv_time(total_kg),
        household_fraction(total_kg)
    );
    Ok(())
}
