// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use destmap_core::config::{self, ResolverConfig};
use destmap_core::loader::ReferenceOrigin;
use destmap_core::{ResolverError, RunSummary};
use simplelog::{ColorChoice, LevelFilter, TermLogger, TerminalMode};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

const SECS_PER_HOUR: u64 = 60 * 60;

/// Converts the airline's served-airports CSV into destinations.json for the map page.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Served-airports CSV exported from the airline system
    #[arg(default_value = config::DEFAULT_INPUT_CSV)]
    csv: PathBuf,

    /// Where to write the destinations JSON
    #[arg(short, long, default_value = config::DEFAULT_OUTPUT_JSON)]
    output: PathBuf,

    /// Reference airports dataset (OurAirports CSV format)
    #[arg(long, default_value = config::OURAIRPORTS_URL)]
    reference_url: String,

    /// Local copy of the reference dataset
    #[arg(long)]
    reference_cache: Option<PathBuf>,

    /// Reuse the local copy if it is younger than this (0 always refetches)
    #[arg(long, default_value_t = 24)]
    cache_ttl_hours: u64,

    /// Never touch the network; use the local copy only
    #[arg(long)]
    offline: bool,

    /// Fail instead of guessing reference columns from fixed offsets
    #[arg(long)]
    strict_schema: bool,

    /// Give up on the reference download after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Report what would be written without touching the output file
    #[arg(long)]
    dry_run: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn to_config(&self) -> ResolverConfig {
        let mut config = ResolverConfig::new(&self.csv)
            .output_json(&self.output)
            .reference_url(self.reference_url.as_str())
            .cache_ttl(Duration::from_secs(self.cache_ttl_hours.saturating_mul(SECS_PER_HOUR)))
            .offline(self.offline)
            .strict_schema(self.strict_schema)
            .fetch_timeout(self.timeout_secs.map(Duration::from_secs))
            .dry_run(self.dry_run);
        if let Some(cache) = &self.reference_cache {
            config = config.reference_cache(cache);
        }
        config
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let _ = TermLogger::init(
        level,
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    execute(&cli)
}

/// Runs the conversion and reports it. A bad input CSV prints the reason and
/// the usage line and yields exit status 1; other failures propagate.
fn execute(cli: &Cli) -> Result<ExitCode> {
    let config = cli.to_config();
    match destmap_core::run(&config) {
        Ok(summary) => {
            print_summary(&config, &summary);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.is_input_error() => {
            eprintln!("{}", input_failure_text(&e));
            Ok(ExitCode::from(1))
        }
        Err(e) => Err(e).context("Conversion failed"),
    }
}

fn input_failure_text(e: &ResolverError) -> String {
    format!("{}\n{}", e, Cli::command().render_usage())
}

fn print_summary(config: &ResolverConfig, summary: &RunSummary) {
    match summary.reference_origin {
        ReferenceOrigin::Remote => println!(
            "Fetched {} airport coordinates from {}.",
            summary.coordinates_loaded, config.reference_url
        ),
        ReferenceOrigin::Cache | ReferenceOrigin::StaleCache => println!(
            "Loaded {} airport coordinates from {}.",
            summary.coordinates_loaded,
            config.reference_cache.display()
        ),
        ReferenceOrigin::Unavailable => {
            if let Some(err) = &summary.fetch_error {
                println!("Could not fetch airport coordinates: {}", err);
            }
        }
    }
    if let Some(err) = &summary.schema_error {
        println!("Could not read airport coordinates: {}", err);
    }
    if summary.coordinates_loaded == 0 {
        println!(
            "Output will use lat/lng 0,0 where unknown. You can edit {} later.",
            config.output_json.display()
        );
    }

    match &summary.output_path {
        Some(path) => println!("Wrote {} destinations to {}", summary.written, path.display()),
        None => println!("Dry run: {} destinations, nothing written.", summary.written),
    }
    if summary.join.hubs > 0 {
        println!("{} of them marked as hubs.", summary.join.hubs);
    }
    if summary.join.rows_skipped > 0 {
        println!("Skipped {} incomplete row(s).", summary.join.rows_skipped);
    }
    if summary.join.missing_coordinates > 0 {
        println!(
            "Missing coords for {} airport(s). Edit {} or add the ICAO code to OurAirports.",
            summary.join.missing_coordinates,
            config.output_json.display()
        );
    }
}
