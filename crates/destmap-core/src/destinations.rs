// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::csv_line::{data_lines, split_line};
use crate::reference::{Coordinate, CoordinateIndex};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use std::fs;
use std::path::Path;

/// Served-airport rows need ICAO, name, an unused column and the base flag.
const SERVED_MIN_FIELDS: usize = 4;

/// A row of the airline's own airport export.
#[derive(Debug, Clone, PartialEq)]
pub struct ServedAirport {
    pub icao: String,
    pub name: String,
    pub is_base: bool,
}

impl ServedAirport {
    /// Returns `None` for short rows and rows without a code or name.
    pub fn from_fields(fields: &[String]) -> Option<Self> {
        if fields.len() < SERVED_MIN_FIELDS {
            return None;
        }
        let icao = fields[0].trim().to_string();
        let name = fields[1].trim().to_string();
        if icao.is_empty() || name.is_empty() {
            return None;
        }
        let is_base = fields[3].eq_ignore_ascii_case("TRUE");
        Some(Self { icao, name, is_base })
    }

    /// Label shown on the map, e.g. `Kuala Lumpur International Airport (WMKK)`.
    pub fn display_name(&self) -> String {
        if self.name.contains(&self.icao) {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.icao)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestinationType {
    Hub,
    International,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub name: String,
    #[serde(serialize_with = "serialize_degrees")]
    pub lat: f64,
    #[serde(serialize_with = "serialize_degrees")]
    pub lng: f64,
    #[serde(rename = "type")]
    pub kind: DestinationType,
}

/// Largest magnitude at which every whole `f64` is an exact integer.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Whole degrees are written without a fraction (`0`, not `0.0`), matching
/// the map page's existing data files.
fn serialize_degrees<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() <= MAX_EXACT_INTEGER {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationsDocument {
    pub as_of: String,
    pub destinations: Vec<Destination>,
}

/// Counts gathered while joining the served airports against the index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinStats {
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub hubs: usize,
    pub missing_coordinates: usize,
}

/// Parses the data rows of a served-airports CSV, dropping invalid ones.
/// The first non-empty line is the header. Returns the valid rows and the
/// number of data rows that were dropped.
pub fn parse_served_airports(text: &str) -> (Vec<ServedAirport>, usize) {
    let mut airports = Vec::new();
    let mut dropped = 0;
    for line in data_lines(text).skip(1) {
        match ServedAirport::from_fields(&split_line(line)) {
            Some(a) => airports.push(a),
            None => dropped += 1,
        }
    }
    (airports, dropped)
}

/// Number of non-empty lines after the header.
pub fn count_data_rows(text: &str) -> usize {
    data_lines(text).skip(1).count()
}

/// Joins served airports against the index. Unknown codes get (0,0).
pub fn build_destinations(
    served_csv: &str,
    index: &CoordinateIndex,
    as_of: NaiveDate,
) -> (DestinationsDocument, JoinStats) {
    let (served, dropped) = parse_served_airports(served_csv);
    let mut stats = JoinStats {
        rows_read: served.len() + dropped,
        rows_skipped: dropped,
        ..JoinStats::default()
    };

    let destinations = served
        .iter()
        .map(|airport| {
            let coordinate = index.lookup(&airport.icao).unwrap_or_else(|| {
                stats.missing_coordinates += 1;
                Coordinate::UNKNOWN
            });
            let kind = if airport.is_base {
                stats.hubs += 1;
                DestinationType::Hub
            } else {
                DestinationType::International
            };
            Destination {
                name: airport.display_name(),
                lat: coordinate.lat,
                lng: coordinate.lng,
                kind,
            }
        })
        .collect();

    let document = DestinationsDocument {
        as_of: format_as_of(as_of),
        destinations,
    };
    (document, stats)
}

/// `16 October 2026`
pub fn format_as_of(date: NaiveDate) -> String {
    date.format("%-d %B %Y").to_string()
}

impl DestinationsDocument {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Replaces the file at `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), crate::ResolverError> {
        let content = self.to_json()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| crate::ResolverError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        fs::write(path, content).map_err(|e| crate::ResolverError::Write {
            path: path.to_path_buf(),
            source: e,
        })
    }
}
