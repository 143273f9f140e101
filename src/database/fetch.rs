//! Bulk download and local cache of the advisory database.
//!
//! The database is fetched as one zip archive of the
//! FriendsOfPHP/security-advisories repository. The YAML records are
//! extracted into a staging directory and renamed into place, so a cache
//! reader always sees either the previous snapshot or the new one in
//! full. A staleness window avoids re-downloading on every run.

use std::fs;
use std::io::Cursor;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use crate::error::{AuditError, Result};

/// Zip archive of the default advisory database.
pub const DEFAULT_DATABASE_URL: &str =
    "https://codeload.github.com/FriendsOfPHP/security-advisories/zip/refs/heads/master";

/// Default staleness window in hours.
const DATABASE_TTL_HOURS: u64 = 24;

/// Network timeout for the archive download.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Downloads and caches the advisory database archive.
pub struct DatabaseFetcher {
    client: reqwest::Client,
    url: String,
    root: PathBuf,
    ttl: Duration,
}

impl DatabaseFetcher {
    /// Creates a fetcher caching under the platform cache directory
    /// (`~/.cache/lockaudit/` on Linux).
    pub fn new() -> Self {
        Self::with_root(default_cache_dir())
    }

    /// Creates a fetcher caching under a custom directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            url: DEFAULT_DATABASE_URL.to_string(),
            root: root.into(),
            ttl: Duration::from_secs(DATABASE_TTL_HOURS * 3600),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_ttl_hours(mut self, hours: u64) -> Self {
        self.ttl = Duration::from_secs(hours * 3600);
        self
    }

    /// Directory holding the extracted advisory records.
    pub fn database_dir(&self) -> PathBuf {
        self.root.join("security-advisories")
    }

    /// True if the cached database is missing or older than the TTL.
    fn is_stale(&self) -> bool {
        let Ok(metadata) = fs::metadata(self.database_dir()) else {
            return true;
        };
        match metadata.modified() {
            Ok(modified) => SystemTime::now()
                .duration_since(modified)
                .map(|elapsed| elapsed > self.ttl)
                .unwrap_or(false),
            Err(_) => true,
        }
    }

    /// Returns a fresh database directory, downloading only when the
    /// cached copy is missing or stale.
    ///
    /// A failed refresh falls back to an existing stale copy with a
    /// warning; the error is only surfaced when there is nothing usable
    /// on disk.
    pub async fn ensure_fresh(&self) -> Result<PathBuf> {
        if !self.is_stale() {
            tracing::debug!(dir = %self.database_dir().display(), "advisory database cache is fresh");
            return Ok(self.database_dir());
        }

        match self.fetch().await {
            Ok(dir) => Ok(dir),
            Err(e) if self.database_dir().is_dir() => {
                tracing::warn!(error = %e, "advisory database refresh failed, using stale copy");
                Ok(self.database_dir())
            }
            Err(e) => Err(e),
        }
    }

    /// Unconditionally downloads the archive and replaces the cached
    /// database with its records.
    pub async fn fetch(&self) -> Result<PathBuf> {
        tracing::info!(url = %self.url, "downloading advisory database");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AuditError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuditError::Network(format!(
                "HTTP {} fetching advisory database",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AuditError::Network(e.to_string()))?;

        tracing::info!(bytes = bytes.len(), "downloaded advisory database archive");
        self.extract_archive(&bytes)
    }

    /// Extracts the archive's YAML records into a staging directory, then
    /// swaps it in as the cached database.
    fn extract_archive(&self, bytes: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.root)?;
        let staging = tempfile::tempdir_in(&self.root)?;

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| AuditError::Database(format!("invalid archive: {e}")))?;

        let mut extracted = 0usize;
        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|e| AuditError::Database(format!("invalid archive entry: {e}")))?;
            if !entry.is_file() {
                continue;
            }
            // enclosed_name rejects entries that would escape the target.
            let Some(name) = entry.enclosed_name() else {
                continue;
            };
            // Strip the archive's top-level "<repo>-<branch>/" component.
            let relative: PathBuf = name.components().skip(1).collect();
            let is_yaml = relative
                .extension()
                .is_some_and(|ext| ext == "yaml" || ext == "yml");
            if !is_yaml {
                continue;
            }

            let dest = staging.path().join(&relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = fs::File::create(&dest)?;
            std::io::copy(&mut entry, &mut out)?;
            extracted += 1;
        }

        if extracted == 0 {
            return Err(AuditError::Database(
                "archive contained no advisory records".to_string(),
            ));
        }

        let target = self.database_dir();
        if target.exists() {
            fs::remove_dir_all(&target)?;
        }
        fs::rename(staging.keep(), &target)?;

        tracing::info!(
            records = extracted,
            dir = %target.display(),
            "advisory database cache updated"
        );
        Ok(target)
    }
}

impl Default for DatabaseFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache root for lockaudit.
///
/// Falls back to `/tmp/lockaudit/` if no cache directory can be
/// determined.
pub(crate) fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("lockaudit")
}
