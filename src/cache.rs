//! ETag-aware local cache for the remote observations snapshot.
//!
//! The source relation is published as a single parquet file behind an HTTPS
//! URL. The cache keeps one local copy, records the ETag it was fetched with,
//! and re-downloads only when a HEAD request reports a different ETag.

use crate::config;
use crate::error::{GasCashError, Result};
use reqwest::blocking::Client;
use reqwest::header::ETAG;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Downloads and caches the observations snapshot.
pub struct CacheManager {
    /// Directory where cached files are stored.
    pub cache_dir: PathBuf,
    /// If true, never touch the network (use cached files only).
    pub offline: bool,
    /// Remote snapshot URL, if one is configured.
    pub source_url: Option<String>,
    timeout: Duration,
    client: Option<Client>,
    remote_etag: Option<String>,
}

impl CacheManager {
    /// Create a new cache manager.
    ///
    /// If `cache_dir` is `None`, uses the platform-appropriate default cache directory.
    /// Creates the cache directory if it does not exist.
    pub fn new(
        cache_dir: Option<PathBuf>,
        offline: bool,
        timeout: Duration,
        source_url: Option<String>,
    ) -> Result<Self> {
        let dir = cache_dir.unwrap_or_else(config::default_cache_dir);
        fs::create_dir_all(&dir)?;
        Ok(Self {
            cache_dir: dir,
            offline,
            source_url,
            timeout,
            client: None,
            remote_etag: None,
        })
    }

    /// Lazy HTTP client, created on first use.
    fn client(&mut self) -> Result<&Client> {
        if self.client.is_none() {
            let client = Client::builder()
                .timeout(self.timeout)
                .redirect(reqwest::redirect::Policy::limited(10))
                .build()?;
            self.client = Some(client);
        }
        self.client
            .as_ref()
            .ok_or_else(|| GasCashError::InvalidArgument("HTTP client unavailable".into()))
    }

    /// Path the snapshot is (or would be) cached at.
    pub fn snapshot_path(&self) -> PathBuf {
        self.cache_dir.join(config::SNAPSHOT_FILE)
    }

    fn local_etag(&self) -> Option<String> {
        fs::read_to_string(self.cache_dir.join(config::ETAG_FILE))
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn save_etag(&self, etag: &str) {
        if let Err(e) = fs::write(self.cache_dir.join(config::ETAG_FILE), etag) {
            warn!(error = %e, "failed to record snapshot etag");
        }
    }

    /// Fetch the current ETag of the remote snapshot via HEAD.
    ///
    /// Returns `None` if offline, unconfigured, unreachable, or the server
    /// sends no ETag. Caches the result for subsequent calls.
    pub fn remote_etag(&mut self) -> Result<Option<String>> {
        if self.remote_etag.is_some() {
            return Ok(self.remote_etag.clone());
        }
        if self.offline {
            return Ok(None);
        }
        let url = match &self.source_url {
            Some(url) => url.clone(),
            None => return Ok(None),
        };
        let client = self.client()?.clone();
        match client.head(&url).send() {
            Ok(resp) => {
                let resp = resp.error_for_status()?;
                let etag = resp
                    .headers()
                    .get(ETAG)
                    .and_then(|v| v.to_str().ok())
                    .map(|s| s.trim().to_string());
                self.remote_etag = etag.clone();
                Ok(etag)
            }
            Err(e) => {
                warn!(url = %url, error = %e, "failed to check snapshot etag");
                Ok(None)
            }
        }
    }

    /// Check if the local snapshot is out of date compared to the remote.
    ///
    /// Returns `true` if there is no local snapshot or the remote ETag differs
    /// from the recorded one. Returns `false` if they match or the remote
    /// cannot be checked.
    pub fn is_stale(&mut self) -> Result<bool> {
        if !self.snapshot_path().exists() {
            return Ok(true);
        }
        let local = self.local_etag();
        let remote = self.remote_etag()?;
        match (local, remote) {
            (_, None) => Ok(false),
            (None, Some(_)) => Ok(true),
            (Some(local), Some(remote)) => Ok(local != remote),
        }
    }

    /// Download the snapshot into `dest`.
    ///
    /// Writes to a temp file in the cache directory and persists it over
    /// `dest` only once the body is complete, so an interrupted download
    /// never leaves a partial file behind.
    fn download(&mut self, url: &str, dest: &Path) -> Result<Option<String>> {
        info!(url = %url, "downloading observations snapshot");

        let client = self.client()?.clone();
        let resp = client.get(url).send()?.error_for_status()?;
        let etag = resp
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_string());
        let bytes = resp.bytes()?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.cache_dir)?;
        tmp.write_all(&bytes)?;
        tmp.flush()?;
        tmp.persist(dest).map_err(|e| GasCashError::Io(e.error))?;

        info!(path = %dest.display(), bytes = bytes.len(), "snapshot cached");
        Ok(etag)
    }

    /// Ensure the snapshot is cached locally, downloading if needed.
    ///
    /// # Returns
    ///
    /// Local filesystem path to the cached parquet file.
    pub fn ensure_snapshot(&mut self) -> Result<PathBuf> {
        let local_path = self.snapshot_path();

        if self.offline {
            if local_path.exists() {
                return Ok(local_path);
            }
            return Err(GasCashError::NotFound(format!(
                "snapshot {} not cached and offline mode is enabled",
                local_path.display()
            )));
        }

        let url = match &self.source_url {
            Some(url) => url.clone(),
            None if local_path.exists() => return Ok(local_path),
            None => {
                return Err(GasCashError::NotFound(
                    "no observations source registered and no snapshot URL configured".into(),
                ))
            }
        };

        if self.is_stale()? {
            let etag = self.download(&url, &local_path)?;
            if let Some(etag) = etag.or_else(|| self.remote_etag.clone()) {
                self.save_etag(&etag);
                self.remote_etag = Some(etag);
            }
        }

        Ok(local_path)
    }

    /// Forget the remembered remote ETag so the next staleness check asks again.
    pub fn forget_remote(&mut self) {
        self.remote_etag = None;
    }

    /// Remove all cached files and recreate the cache directory.
    pub fn clear(&self) -> Result<()> {
        if self.cache_dir.exists() {
            fs::remove_dir_all(&self.cache_dir)?;
            fs::create_dir_all(&self.cache_dir)?;
        }
        Ok(())
    }

    /// Close the HTTP client, if open.
    pub fn close(&mut self) {
        self.client = None;
    }
}
