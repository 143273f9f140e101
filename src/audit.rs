//! Audit orchestration: runs the matching engine over a whole lock file.

use std::fs;
use std::path::Path;
use std::sync::{Arc, RwLock};

use crate::database::AdvisorySource;
use crate::engine::match_advisories;
use crate::error::{AuditError, Result};
use crate::model::{AdvisoryIndex, AuditReport, LockFile, PackageAdvisories};

/// Checks installed packages against an advisory index.
///
/// The index is an immutable snapshot behind a lock that is only taken
/// long enough to clone an `Arc`: concurrent checks never contend with
/// each other, and [`refresh`](Auditor::refresh) swaps in a fully built
/// replacement so readers observe either the old or the new snapshot,
/// never a partial one.
pub struct Auditor {
    index: RwLock<Arc<AdvisoryIndex>>,
}

impl Auditor {
    /// Creates an auditor over an already-built advisory index.
    pub fn new(index: AdvisoryIndex) -> Self {
        Self {
            index: RwLock::new(Arc::new(index)),
        }
    }

    /// Creates an auditor by loading the index from an advisory source.
    pub async fn from_source<S: AdvisorySource + ?Sized>(source: &S) -> Result<Self> {
        Ok(Self::new(source.load().await?))
    }

    /// Rebuilds the index from the source and atomically swaps it in.
    ///
    /// On error the previous snapshot stays in place.
    pub async fn refresh<S: AdvisorySource + ?Sized>(&self, source: &S) -> Result<()> {
        let index = Arc::new(source.load().await?);
        let mut guard = self.index.write().unwrap_or_else(|e| e.into_inner());
        *guard = index;
        Ok(())
    }

    fn snapshot(&self) -> Arc<AdvisoryIndex> {
        let guard = self.index.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Checks every installed package and returns the affected ones.
    ///
    /// Packages absent from the advisory index contribute nothing, and a
    /// package only appears in the report with at least one advisory.
    pub fn check(&self, lock: &LockFile, include_dev: bool) -> AuditReport {
        let index = self.snapshot();
        let mut report = AuditReport::default();

        for package in lock.installed(include_dev) {
            let Some(candidates) = index.get(&package.name) else {
                continue;
            };
            let advisories = match_advisories(package, candidates);
            if !advisories.is_empty() {
                report.vulnerabilities.insert(
                    package.name.clone(),
                    PackageAdvisories {
                        version: package.version.clone(),
                        advisories,
                    },
                );
            }
        }

        report
    }

    /// Checks already-parsed lock data.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::InvalidLock`] if `data` is not a JSON object
    /// or its package lists do not have the expected shape.
    pub fn check_value(&self, data: &serde_json::Value, include_dev: bool) -> Result<AuditReport> {
        if !data.is_object() {
            return Err(AuditError::InvalidLock(
                "lock data must be a JSON object".to_string(),
            ));
        }
        let lock: LockFile = serde_json::from_value(data.clone())
            .map_err(|e| AuditError::InvalidLock(e.to_string()))?;
        Ok(self.check(&lock, include_dev))
    }

    /// Reads and checks a lock file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::LockNotFound`] if the path does not exist,
    /// and [`AuditError::InvalidLock`] if the content does not parse to a
    /// JSON object.
    pub fn check_path(&self, path: impl AsRef<Path>, include_dev: bool) -> Result<AuditReport> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AuditError::LockNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        let data: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| AuditError::InvalidLock(e.to_string()))?;
        self.check_value(&data, include_dev)
    }
}
