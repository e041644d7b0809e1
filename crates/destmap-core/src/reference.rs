// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::csv_line::{data_lines, split_line};
use log::{debug, warn};
use std::collections::HashMap;
use thiserror::Error;

/// Header token that marks the OurAirports decimal-degree layout.
const LATITUDE_DEG: &str = "latitude_deg";

/// Fallback layouts need at least this many fields per row.
const FALLBACK_MIN_FIELDS: usize = 8;

/// IATA aliases longer than this are treated as malformed and not indexed.
const MAX_IATA_LEN: usize = 4;

#[derive(Error, Debug, PartialEq)]
pub enum SchemaError {
    #[error("Reference CSV has no header line")]
    MissingHeader,
    #[error("Reference CSV header is missing required column '{0}'")]
    MissingColumn(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    /// Placeholder used for destinations whose location could not be resolved.
    pub const UNKNOWN: Coordinate = Coordinate { lat: 0.0, lng: 0.0 };
}

/// How the column positions of a reference CSV were determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutSource {
    /// Every required column was found by header name.
    HeaderNames,
    /// Fixed offsets of the OurAirports layout (header mentions `latitude_deg`).
    FixedOurAirports,
    /// Fixed offsets of the alternative export layout.
    FixedAlternate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub ident: usize,
    pub lat: usize,
    pub lng: usize,
    pub iata: Option<usize>,
    pub source: LayoutSource,
}

impl ColumnLayout {
    /// OurAirports `airports.csv`: id, ident, type, name, latitude_deg, longitude_deg, ..., iata_code.
    pub const OURAIRPORTS: ColumnLayout = ColumnLayout {
        ident: 1,
        lat: 4,
        lng: 5,
        iata: Some(13),
        source: LayoutSource::FixedOurAirports,
    };

    pub const ALTERNATE: ColumnLayout = ColumnLayout {
        ident: 0,
        lat: 6,
        lng: 7,
        iata: Some(4),
        source: LayoutSource::FixedAlternate,
    };

    /// Resolves column positions from the header line.
    ///
    /// Columns are looked up by name first. When that fails and `strict` is
    /// off, the layout is guessed from the presence of `latitude_deg`.
    pub fn resolve(header: &str, strict: bool) -> Result<Self, SchemaError> {
        match Self::from_header_names(header) {
            Ok(layout) => Ok(layout),
            Err(e) if strict => Err(e),
            Err(e) => {
                let layout = if header.to_lowercase().contains(LATITUDE_DEG) {
                    Self::OURAIRPORTS
                } else {
                    Self::ALTERNATE
                };
                warn!(
                    "Reference header not recognised, guessing fixed column offsets — reason=\"{}\" layout={:?}",
                    e, layout.source
                );
                Ok(layout)
            }
        }
    }

    fn from_header_names(header: &str) -> Result<Self, SchemaError> {
        let names: Vec<String> = split_line(header)
            .into_iter()
            .map(|h| h.to_lowercase())
            .collect();

        let ident = column_of(&names, &["ident"]).ok_or(SchemaError::MissingColumn("ident"))?;
        let lat = column_of(&names, &[LATITUDE_DEG, "latitude"])
            .ok_or(SchemaError::MissingColumn("latitude"))?;
        let lng = column_of(&names, &["longitude_deg", "longitude"])
            .ok_or(SchemaError::MissingColumn("longitude"))?;
        let iata = column_of(&names, &["iata_code"]);

        Ok(Self {
            ident,
            lat,
            lng,
            iata,
            source: LayoutSource::HeaderNames,
        })
    }

    /// Rows with fewer fields than this are skipped.
    pub fn min_fields(&self) -> usize {
        match self.source {
            LayoutSource::HeaderNames => {
                let max = [self.ident, self.lat, self.lng, self.iata.unwrap_or(0)]
                    .into_iter()
                    .max()
                    .unwrap_or(0);
                max + 1
            }
            LayoutSource::FixedOurAirports | LayoutSource::FixedAlternate => FALLBACK_MIN_FIELDS,
        }
    }
}

/// Position of the first candidate name present in the header.
fn column_of(names: &[String], candidates: &[&str]) -> Option<usize> {
    candidates
        .iter()
        .find_map(|c| names.iter().position(|n| n == c))
}

/// One usable row of the reference dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct AirportRecord {
    pub identifier: String,
    pub iata_code: Option<String>,
    pub coordinate: Coordinate,
}

impl AirportRecord {
    /// Extracts a record from lexed fields. Returns `None` for rows that are
    /// too short, have no identifier, or carry a non-finite coordinate.
    pub fn from_fields(fields: &[String], layout: &ColumnLayout) -> Option<Self> {
        if fields.len() < layout.min_fields() {
            return None;
        }

        let identifier = fields.get(layout.ident)?.trim().to_uppercase();
        if identifier.is_empty() {
            return None;
        }

        let lat = parse_degrees(fields.get(layout.lat)?)?;
        let lng = parse_degrees(fields.get(layout.lng)?)?;

        let iata_code = layout
            .iata
            .and_then(|i| fields.get(i))
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty());

        Some(Self {
            identifier,
            iata_code,
            coordinate: Coordinate { lat, lng },
        })
    }
}

fn parse_degrees(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Code → coordinate lookup built from the reference dataset.
///
/// Identifiers and IATA aliases live in separate maps so that a lookup can
/// prefer the identifier when a code is both one airport's ident and
/// another's IATA alias.
#[derive(Debug, Default, Clone)]
pub struct CoordinateIndex {
    by_ident: HashMap<String, Coordinate>,
    by_iata: HashMap<String, Coordinate>,
    rows_skipped: usize,
}

impl CoordinateIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the index from the full text of a reference CSV.
    pub fn from_csv(text: &str, strict: bool) -> Result<Self, SchemaError> {
        let mut lines = data_lines(text);
        let header = lines.next().ok_or(SchemaError::MissingHeader)?;
        let layout = ColumnLayout::resolve(header, strict)?;

        let mut index = Self::new();
        for line in lines {
            match AirportRecord::from_fields(&split_line(line), &layout) {
                Some(record) => index.insert(&record),
                None => index.rows_skipped += 1,
            }
        }

        debug!(
            "Built coordinate index — layout={:?} airports={} aliases={} skipped={}",
            layout.source,
            index.by_ident.len(),
            index.by_iata.len(),
            index.rows_skipped
        );
        Ok(index)
    }

    /// Adds a record under its identifier and, when usable, its IATA code.
    /// Later inserts replace earlier ones under the same key.
    pub fn insert(&mut self, record: &AirportRecord) {
        self.by_ident
            .insert(record.identifier.clone(), record.coordinate);

        if let Some(iata) = &record.iata_code {
            if *iata != record.identifier && iata.chars().count() <= MAX_IATA_LEN {
                self.by_iata.insert(iata.clone(), record.coordinate);
            }
        }
    }

    /// Looks the code up as an identifier first, then as an IATA code.
    pub fn lookup(&self, code: &str) -> Option<Coordinate> {
        let key = code.trim().to_uppercase();
        self.by_ident
            .get(&key)
            .or_else(|| self.by_iata.get(&key))
            .copied()
    }

    /// Number of distinct airports (identifiers) in the index.
    pub fn airport_count(&self) -> usize {
        self.by_ident.len()
    }

    /// Number of lookup keys, identifiers and IATA aliases combined.
    pub fn len(&self) -> usize {
        self.by_ident.len() + self.by_iata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_ident.is_empty()
    }

    /// Data rows that were dropped while building the index.
    pub fn rows_skipped(&self) -> usize {
        self.rows_skipped
    }
}
