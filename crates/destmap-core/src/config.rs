// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use std::path::PathBuf;
use std::time::Duration;

pub const OURAIRPORTS_URL: &str = "https://davidmegginson.github.io/ourairports-data/airports.csv";
pub const DEFAULT_INPUT_CSV: &str = "asset/data/airports.csv";
pub const DEFAULT_OUTPUT_JSON: &str = "asset/data/destinations.json";
const REFERENCE_CACHE_FILE: &str = "ourairports.csv";
const DEFAULT_CACHE_TTL_SECS: u64 = 24 * 60 * 60;

/// Everything a single conversion run needs. Nothing is read from the
/// environment; the CLI fills this in from its flags.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Served-airports CSV exported by the airline.
    pub input_csv: PathBuf,
    /// Destination JSON consumed by the map page.
    pub output_json: PathBuf,
    pub reference_url: String,
    /// Local copy of the reference dataset.
    pub reference_cache: PathBuf,
    /// A zero TTL always refetches (the cache is then only a fallback).
    pub cache_ttl: Duration,
    pub offline: bool,
    /// Refuse to guess reference columns when the header names don't match.
    pub strict_schema: bool,
    pub fetch_timeout: Option<Duration>,
    pub dry_run: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            input_csv: PathBuf::from(DEFAULT_INPUT_CSV),
            output_json: PathBuf::from(DEFAULT_OUTPUT_JSON),
            reference_url: OURAIRPORTS_URL.to_string(),
            reference_cache: default_reference_cache(),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            offline: false,
            strict_schema: false,
            fetch_timeout: None,
            dry_run: false,
        }
    }
}

impl ResolverConfig {
    pub fn new(input_csv: impl Into<PathBuf>) -> Self {
        Self {
            input_csv: input_csv.into(),
            ..Self::default()
        }
    }

    pub fn output_json(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_json = path.into();
        self
    }

    pub fn reference_url(mut self, url: impl Into<String>) -> Self {
        self.reference_url = url.into();
        self
    }

    pub fn reference_cache(mut self, path: impl Into<PathBuf>) -> Self {
        self.reference_cache = path.into();
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn strict_schema(mut self, strict: bool) -> Self {
        self.strict_schema = strict;
        self
    }

    pub fn fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Per-user cache directory, or the working directory when none is available.
pub fn default_reference_cache() -> PathBuf {
    directories::ProjectDirs::from("org", "destmap", "destmap")
        .map(|dirs| dirs.cache_dir().join(REFERENCE_CACHE_FILE))
        .unwrap_or_else(|| PathBuf::from(REFERENCE_CACHE_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_point_at_site_data() {
        let config = ResolverConfig::default();
        assert_eq!(config.input_csv, PathBuf::from("asset/data/airports.csv"));
        assert_eq!(config.output_json, PathBuf::from("asset/data/destinations.json"));
        assert_eq!(config.reference_url, OURAIRPORTS_URL);
        assert!(config.reference_cache.ends_with("ourairports.csv"));
        assert!(!config.offline && !config.strict_schema && !config.dry_run);
    }

    #[test]
    fn test_builder_overrides() {
        let config = ResolverConfig::new("in.csv")
            .output_json("out/dest.json")
            .cache_ttl(Duration::ZERO)
            .offline(true);
        assert_eq!(config.input_csv, PathBuf::from("in.csv"));
        assert_eq!(config.output_json, PathBuf::from("out/dest.json"));
        assert!(config.cache_ttl.is_zero());
        assert!(config.offline);
    }
}
