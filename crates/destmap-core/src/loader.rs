// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use log::{debug, info, warn};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP {status}: {url}")]
    Status { status: u16, url: String },
    #[error("Network error: {0}")]
    Network(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        match (e.status(), e.url()) {
            (Some(status), Some(url)) => FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            },
            _ => FetchError::Network(e.to_string()),
        }
    }
}

/// Anything that can hand back the body of the reference dataset.
pub trait ReferenceSource {
    fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

/// Blocking HTTP source. No retry; the timeout is off unless configured.
pub struct HttpSource {
    timeout: Option<Duration>,
}

impl HttpSource {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl ReferenceSource for HttpSource {
    fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;

        let response = client.get(url).send()?.error_for_status()?;
        let text = response.text()?;
        debug!("Downloaded reference dataset — url={} bytes={}", url, text.len());
        Ok(text)
    }
}

/// Where the reference text handed to the index builder came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceOrigin {
    Remote,
    Cache,
    /// The fetch failed and an expired cache copy was used instead.
    StaleCache,
    /// Nothing could be loaded; every destination falls back to (0,0).
    Unavailable,
}

#[derive(Debug)]
pub struct LoadedReference {
    pub origin: ReferenceOrigin,
    pub text: Option<String>,
    /// The error that forced the degraded path, if any.
    pub fetch_error: Option<FetchError>,
}

/// Fetches the reference dataset, keeping a local copy on disk.
pub struct ReferenceLoader<S: ReferenceSource> {
    source: S,
    url: String,
    cache_path: PathBuf,
    cache_ttl: Duration,
    offline: bool,
}

impl<S: ReferenceSource> ReferenceLoader<S> {
    pub fn new(source: S, url: impl Into<String>, cache_path: impl Into<PathBuf>) -> Self {
        Self {
            source,
            url: url.into(),
            cache_path: cache_path.into(),
            cache_ttl: Duration::ZERO,
            offline: false,
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Loads the reference text. Never fails: a missing dataset is reported
    /// as `ReferenceOrigin::Unavailable` so the run can continue.
    pub fn load(&self) -> LoadedReference {
        if self.cache_is_fresh() {
            if let Ok(text) = fs::read_to_string(&self.cache_path) {
                debug!("Using cached reference dataset — cache_path={}", self.cache_path.display());
                return LoadedReference {
                    origin: ReferenceOrigin::Cache,
                    text: Some(text),
                    fetch_error: None,
                };
            }
        }

        if self.offline {
            return match fs::read_to_string(&self.cache_path) {
                Ok(text) => LoadedReference {
                    origin: ReferenceOrigin::Cache,
                    text: Some(text),
                    fetch_error: None,
                },
                Err(e) => {
                    warn!(
                        "Offline and no cached reference dataset — cache_path={} error={}",
                        self.cache_path.display(),
                        e
                    );
                    LoadedReference {
                        origin: ReferenceOrigin::Unavailable,
                        text: None,
                        fetch_error: Some(FetchError::Io(e)),
                    }
                }
            };
        }

        info!("Fetching reference dataset — url={}", self.url);
        match self.source.fetch_text(&self.url) {
            Ok(text) => {
                self.store(&text);
                LoadedReference {
                    origin: ReferenceOrigin::Remote,
                    text: Some(text),
                    fetch_error: None,
                }
            }
            Err(e) => {
                warn!("Could not fetch reference dataset — url={} error={}", self.url, e);
                match fs::read_to_string(&self.cache_path) {
                    Ok(text) => {
                        warn!(
                            "Falling back to expired cache — cache_path={}",
                            self.cache_path.display()
                        );
                        LoadedReference {
                            origin: ReferenceOrigin::StaleCache,
                            text: Some(text),
                            fetch_error: Some(e),
                        }
                    }
                    Err(_) => LoadedReference {
                        origin: ReferenceOrigin::Unavailable,
                        text: None,
                        fetch_error: Some(e),
                    },
                }
            }
        }
    }

    fn cache_is_fresh(&self) -> bool {
        if self.cache_ttl.is_zero() {
            return false;
        }
        fs::metadata(&self.cache_path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| modified.elapsed().ok())
            .map(|elapsed| elapsed < self.cache_ttl)
            .unwrap_or(false)
    }

    fn store(&self, text: &str) {
        let result = self
            .cache_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|_| fs::write(&self.cache_path, text));

        match result {
            Ok(()) => debug!(
                "Reference cache updated — cache_path={} bytes={}",
                self.cache_path.display(),
                text.len()
            ),
            Err(e) => warn!(
                "Could not write reference cache — cache_path={} error={}",
                self.cache_path.display(),
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct StubSource {
        body: Option<&'static str>,
        calls: Cell<usize>,
    }

    impl StubSource {
        fn ok(body: &'static str) -> Self {
            Self { body: Some(body), calls: Cell::new(0) }
        }

        fn failing() -> Self {
            Self { body: None, calls: Cell::new(0) }
        }
    }

    impl ReferenceSource for StubSource {
        fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
            self.calls.set(self.calls.get() + 1);
            match self.body {
                Some(b) => Ok(b.to_string()),
                None => Err(FetchError::Network(format!("unreachable: {}", url))),
            }
        }
    }

    #[test]
    fn test_remote_fetch_writes_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("nested").join("airports.csv");
        let loader = ReferenceLoader::new(StubSource::ok("ident\n"), "http://x", &cache);

        let loaded = loader.load();
        assert_eq!(loaded.origin, ReferenceOrigin::Remote);
        assert_eq!(loaded.text.as_deref(), Some("ident\n"));
        assert_eq!(fs::read_to_string(&cache).unwrap(), "ident\n");
    }

    #[test]
    fn test_fresh_cache_skips_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("airports.csv");
        fs::write(&cache, "cached").unwrap();

        let loader = ReferenceLoader::new(StubSource::ok("remote"), "http://x", &cache)
            .with_cache_ttl(Duration::from_secs(3600));
        let loaded = loader.load();

        assert_eq!(loaded.origin, ReferenceOrigin::Cache);
        assert_eq!(loaded.text.as_deref(), Some("cached"));
        assert_eq!(loader.source.calls.get(), 0);
    }

    #[test]
    fn test_zero_ttl_always_fetches() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("airports.csv");
        fs::write(&cache, "cached").unwrap();

        let loader = ReferenceLoader::new(StubSource::ok("remote"), "http://x", &cache);
        assert_eq!(loader.load().origin, ReferenceOrigin::Remote);
        assert_eq!(loader.source.calls.get(), 1);
    }

    #[test]
    fn test_failed_fetch_uses_stale_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("airports.csv");
        fs::write(&cache, "old").unwrap();

        let loaded = ReferenceLoader::new(StubSource::failing(), "http://x", &cache).load();
        assert_eq!(loaded.origin, ReferenceOrigin::StaleCache);
        assert_eq!(loaded.text.as_deref(), Some("old"));
        assert!(matches!(loaded.fetch_error, Some(FetchError::Network(_))));
    }

    #[test]
    fn test_failed_fetch_without_cache_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let loaded =
            ReferenceLoader::new(StubSource::failing(), "http://x", dir.path().join("none.csv"))
                .load();
        assert_eq!(loaded.origin, ReferenceOrigin::Unavailable);
        assert!(loaded.text.is_none());
    }

    #[test]
    fn test_offline_never_fetches() {
        let dir = tempfile::tempdir().unwrap();
        let loader =
            ReferenceLoader::new(StubSource::ok("remote"), "http://x", dir.path().join("none.csv"))
                .offline(true);
        let loaded = loader.load();
        assert_eq!(loaded.origin, ReferenceOrigin::Unavailable);
        assert_eq!(loader.source.calls.get(), 0);
    }
}
