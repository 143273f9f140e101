use serde::{Deserialize, Serialize};

use crate::version::is_development_version;

/// One installed dependency as recorded in a `composer.lock` file.
///
/// Only the fields the matching engine cares about are kept; everything
/// else in a lock entry is ignored during deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstalledPackage {
    pub name: String,
    pub version: String,
    /// Release or build timestamp of the installed code, as written by
    /// Composer (RFC 3339). Only consulted for development versions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

impl InstalledPackage {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            time: None,
        }
    }

    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    /// True if this package tracks a floating branch (`dev-master`,
    /// `1.x-dev`, ...) rather than a pinned release.
    pub fn is_dev_version(&self) -> bool {
        is_development_version(&self.version)
    }
}

/// Parsed view of a `composer.lock` file.
///
/// Both package lists are optional in the wild; a missing list is simply
/// empty, never an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LockFile {
    #[serde(default)]
    pub packages: Vec<InstalledPackage>,
    #[serde(default, rename = "packages-dev")]
    pub packages_dev: Vec<InstalledPackage>,
}

impl LockFile {
    /// All packages to audit, honoring the dev-package switch.
    pub fn installed(&self, include_dev: bool) -> impl Iterator<Item = &InstalledPackage> {
        let dev = if include_dev {
            self.packages_dev.as_slice()
        } else {
            &[]
        };
        self.packages.iter().chain(dev.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lockfile_missing_lists_are_empty() {
        let lock: LockFile = serde_json::from_str("{}").unwrap();
        assert!(lock.packages.is_empty());
        assert!(lock.packages_dev.is_empty());
    }

    #[test]
    fn test_lockfile_parses_both_lists() {
        let json = r#"{
            "packages": [{"name": "league/flysystem", "version": "1.0.70"}],
            "packages-dev": [{"name": "phpunit/phpunit", "version": "9.5.0", "time": "2020-12-04T05:05:53+00:00"}]
        }"#;
        let lock: LockFile = serde_json::from_str(json).unwrap();
        assert_eq!(lock.packages.len(), 1);
        assert_eq!(lock.packages_dev.len(), 1);
        assert_eq!(lock.packages[0].name, "league/flysystem");
        assert_eq!(
            lock.packages_dev[0].time.as_deref(),
            Some("2020-12-04T05:05:53+00:00")
        );
    }

    #[test]
    fn test_installed_respects_dev_switch() {
        let lock = LockFile {
            packages: vec![InstalledPackage::new("a/a", "1.0.0")],
            packages_dev: vec![InstalledPackage::new("b/b", "2.0.0")],
        };
        assert_eq!(lock.installed(true).count(), 2);
        assert_eq!(lock.installed(false).count(), 1);
    }

    #[test]
    fn test_is_dev_version() {
        assert!(InstalledPackage::new("a/a", "dev-master").is_dev_version());
        assert!(!InstalledPackage::new("a/a", "1.2.3").is_dev_version());
    }
}
