//! Directory scanner for YAML advisory records.
//!
//! The advisory database is a tree of `vendor/package/ADVISORY.yaml`
//! files. Individual files that fail to parse are skipped with a warning;
//! only an unreadable root is fatal.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use walkdir::WalkDir;

use crate::error::{AuditError, Result};
use crate::model::{Advisory, AdvisoryBranch, AdvisoryIndex};

use super::AdvisorySource;

/// Builds an [`AdvisoryIndex`] from a directory of advisory records.
pub struct FilesystemSource {
    root: PathBuf,
}

/// On-disk advisory record shape.
#[derive(Deserialize)]
struct RawAdvisory {
    title: String,
    link: String,
    #[serde(default)]
    cve: Option<String>,
    reference: String,
    /// Branch name to branch body, in document order.
    #[serde(default)]
    branches: serde_yaml::Mapping,
}

#[derive(Deserialize)]
struct RawBranch {
    #[serde(default)]
    time: Option<serde_yaml::Value>,
    #[serde(default)]
    versions: Vec<String>,
}

impl FilesystemSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn parse_record(path: &Path) -> anyhow::Result<Advisory> {
        let content = std::fs::read_to_string(path)?;
        let raw: RawAdvisory = serde_yaml::from_str(&content)?;

        let mut branches = Vec::with_capacity(raw.branches.len());
        for (name, body) in raw.branches {
            // Branch keys are usually strings, but bare numerics like
            // `1.0` parse as YAML numbers.
            let name = match name {
                serde_yaml::Value::String(s) => s,
                other => serde_yaml::to_string(&other)
                    .map(|s| s.trim().to_string())
                    .unwrap_or_default(),
            };
            let body: RawBranch = serde_yaml::from_value(body)?;
            branches.push(AdvisoryBranch {
                name,
                versions: body.versions,
                time: branch_time(body.time.as_ref()),
            });
        }

        Ok(Advisory {
            title: raw.title,
            link: raw.link,
            cve: raw.cve,
            reference: raw.reference,
            branches,
        })
    }
}

/// Converts the record's `time` field to canonical integer unix time.
///
/// The database stores it inconsistently: raw integers, integer strings,
/// or datetime strings. Anything unrecognized becomes the zero sentinel.
fn branch_time(value: Option<&serde_yaml::Value>) -> i64 {
    match value {
        Some(serde_yaml::Value::Number(n)) => n.as_i64().unwrap_or(0),
        Some(serde_yaml::Value::String(s)) => parse_time_string(s),
        _ => 0,
    }
}

fn parse_time_string(s: &str) -> i64 {
    if let Ok(n) = s.trim().parse::<i64>() {
        return n;
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return dt.and_utc().timestamp();
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.timestamp())
        .unwrap_or(0)
}

#[async_trait]
impl AdvisorySource for FilesystemSource {
    async fn load(&self) -> Result<AdvisoryIndex> {
        if !self.root.is_dir() {
            return Err(AuditError::Database(format!(
                "advisory directory not found: {}",
                self.root.display()
            )));
        }

        let mut index = AdvisoryIndex::new();
        let mut loaded = 0usize;

        for entry in WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            let is_yaml = path
                .extension()
                .is_some_and(|ext| ext == "yaml" || ext == "yml");
            if !entry.file_type().is_file() || !is_yaml {
                continue;
            }

            match Self::parse_record(path) {
                Ok(advisory) => {
                    let package = advisory.package_name().to_string();
                    index.entry(package).or_insert_with(Vec::new).push(advisory);
                    loaded += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "failed to parse advisory record, skipping"
                    );
                }
            }
        }

        tracing::info!(
            dir = %self.root.display(),
            advisories = loaded,
            packages = index.len(),
            "loaded advisory database"
        );

        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_record(dir: &Path, relative: &str, content: &str) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn test_load_builds_index_from_yaml_tree() {
        let tmp = tempfile::tempdir().unwrap();
        write_record(
            tmp.path(),
            "league/flysystem/2021-06-23.yaml",
            r#"
title: 'TOCTOU race condition'
link: https://example.com/flysystem
cve: CVE-2021-32708
branches:
    1.0.x:
        time: 1624485600
        versions: ['>=1.0.0,<1.0.71']
reference: composer://league/flysystem
"#,
        );
        write_record(
            tmp.path(),
            "twig/twig/2019-12-12.yaml",
            r#"
title: 'Sandbox escape'
link: https://example.com/twig
cve: ~
branches:
    1.x:
        time: '2019-12-12 10:00:00'
        versions: ['<1.38.0']
    2.x:
        time: '2019-12-12 10:00:00'
        versions: ['>=2.0.0,<2.12.0']
reference: composer://twig/twig
"#,
        );

        let index = FilesystemSource::new(tmp.path()).load().await.unwrap();
        assert_eq!(index.len(), 2);

        let flysystem = &index["league/flysystem"][0];
        assert_eq!(flysystem.cve.as_deref(), Some("CVE-2021-32708"));
        assert_eq!(flysystem.branches[0].time, 1_624_485_600);

        let twig = &index["twig/twig"][0];
        assert_eq!(twig.cve, None);
        assert_eq!(twig.branches.len(), 2);
        // Branch order follows document order.
        assert_eq!(twig.branches[0].name, "1.x");
        assert_eq!(twig.branches[1].name, "2.x");
        assert!(twig.branches[0].time > 0);
    }

    #[tokio::test]
    async fn test_unparseable_record_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        write_record(tmp.path(), "bad/pkg/broken.yaml", "title: [unclosed");
        write_record(
            tmp.path(),
            "good/pkg/ok.yaml",
            r#"
title: 'Fine'
link: https://example.com
branches: {}
reference: composer://good/pkg
"#,
        );

        let index = FilesystemSource::new(tmp.path()).load().await.unwrap();
        assert_eq!(index.len(), 1);
        assert!(index.contains_key("good/pkg"));
    }

    #[tokio::test]
    async fn test_non_yaml_files_are_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        write_record(tmp.path(), "README.md", "# not an advisory");
        let index = FilesystemSource::new(tmp.path()).load().await.unwrap();
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn test_missing_root_is_an_error() {
        let result = FilesystemSource::new("/definitely/not/here").load().await;
        assert!(matches!(result, Err(AuditError::Database(_))));
    }

    #[test]
    fn test_branch_time_representations() {
        let int = serde_yaml::Value::Number(1_624_485_600.into());
        assert_eq!(branch_time(Some(&int)), 1_624_485_600);

        let int_string = serde_yaml::Value::String("1624485600".to_string());
        assert_eq!(branch_time(Some(&int_string)), 1_624_485_600);

        let datetime = serde_yaml::Value::String("1970-01-01 00:00:10".to_string());
        assert_eq!(branch_time(Some(&datetime)), 10);

        let garbage = serde_yaml::Value::String("whenever".to_string());
        assert_eq!(branch_time(Some(&garbage)), 0);

        assert_eq!(branch_time(None), 0);
        assert_eq!(branch_time(Some(&serde_yaml::Value::Null)), 0);
    }
}
