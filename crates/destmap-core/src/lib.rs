// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

pub mod config;
pub mod csv_line;
pub mod destinations;
pub mod loader;
pub mod reference;

use chrono::{Local, NaiveDate};
use config::ResolverConfig;
use destinations::{build_destinations, count_data_rows, DestinationsDocument, JoinStats};
use loader::{HttpSource, ReferenceLoader, ReferenceOrigin, ReferenceSource};
use log::{info, warn};
use reference::{CoordinateIndex, SchemaError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("CSV not found: {}", .0.display())]
    InputNotFound(PathBuf),
    #[error("Could not read CSV {}: {source}", .path.display())]
    InputUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("CSV has no data rows: {}", .0.display())]
    NoDataRows(PathBuf),
    #[error("Could not write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ResolverError {
    /// Problems with the served-airports CSV itself; these end the run before
    /// any output is written.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ResolverError::InputNotFound(_)
                | ResolverError::InputUnreadable { .. }
                | ResolverError::NoDataRows(_)
        )
    }
}

/// What a run did, for the end-of-run report.
#[derive(Debug)]
pub struct RunSummary {
    pub reference_origin: ReferenceOrigin,
    pub fetch_error: Option<String>,
    pub schema_error: Option<SchemaError>,
    /// Airports (identifiers) available for lookup.
    pub coordinates_loaded: usize,
    pub reference_rows_skipped: usize,
    pub join: JoinStats,
    pub written: usize,
    /// `None` on a dry run.
    pub output_path: Option<PathBuf>,
    pub document: DestinationsDocument,
}

/// Runs the conversion against the live reference dataset.
pub fn run(config: &ResolverConfig) -> Result<RunSummary, ResolverError> {
    let source = HttpSource::new(config.fetch_timeout);
    run_with_source(config, source, Local::now().date_naive())
}

/// Runs the conversion with an injected reference source and date.
pub fn run_with_source<S: ReferenceSource>(
    config: &ResolverConfig,
    source: S,
    today: NaiveDate,
) -> Result<RunSummary, ResolverError> {
    let served_csv = read_input(&config.input_csv)?;

    let loader = ReferenceLoader::new(source, config.reference_url.as_str(), &config.reference_cache)
        .with_cache_ttl(config.cache_ttl)
        .offline(config.offline);
    let loaded = loader.load();

    let mut schema_error = None;
    let index = match loaded.text.as_deref() {
        Some(text) => match CoordinateIndex::from_csv(text, config.strict_schema) {
            Ok(index) => index,
            Err(e) => {
                warn!(
                    "Reference dataset unusable, continuing without coordinates — error={}",
                    e
                );
                schema_error = Some(e);
                CoordinateIndex::new()
            }
        },
        None => CoordinateIndex::new(),
    };
    info!(
        "Coordinate index ready — origin={:?} airports={} keys={}",
        loaded.origin,
        index.airport_count(),
        index.len()
    );

    let (document, join) = build_destinations(&served_csv, &index, today);

    let output_path = if config.dry_run {
        info!("Dry run, not writing — output={}", config.output_json.display());
        None
    } else {
        document.save(&config.output_json)?;
        info!(
            "Wrote destinations — output={} count={}",
            config.output_json.display(),
            document.destinations.len()
        );
        Some(config.output_json.clone())
    };

    Ok(RunSummary {
        reference_origin: loaded.origin,
        fetch_error: loaded.fetch_error.map(|e| e.to_string()),
        schema_error,
        coordinates_loaded: index.airport_count(),
        reference_rows_skipped: index.rows_skipped(),
        join,
        written: document.destinations.len(),
        output_path,
        document,
    })
}

fn read_input(path: &Path) -> Result<String, ResolverError> {
    if !path.exists() {
        return Err(ResolverError::InputNotFound(path.to_path_buf()));
    }
    let text = fs::read_to_string(path).map_err(|e| ResolverError::InputUnreadable {
        path: path.to_path_buf(),
        source: e,
    })?;
    if count_data_rows(&text) == 0 {
        return Err(ResolverError::NoDataRows(path.to_path_buf()));
    }
    Ok(text)
}
