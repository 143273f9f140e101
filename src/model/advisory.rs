use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Prefix carried by the `reference` field of every Composer advisory
/// record (`composer://vendor/package`).
pub const REFERENCE_PREFIX: &str = "composer://";

/// A named version line within an advisory (`1.x`, `2.0.x-dev`, ...),
/// carrying its own affected-version constraints and fix timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryBranch {
    pub name: String,
    /// Affected-range expressions; a version is affected if it satisfies
    /// ANY of them. Each expression is comma-joined comparators, e.g.
    /// `>=1.0.0,<1.0.71`.
    pub versions: Vec<String>,
    /// Unix timestamp of the fix/reference for this branch. Zero when the
    /// record carries none.
    pub time: i64,
}

/// One security advisory for one package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advisory {
    pub title: String,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cve: Option<String>,
    /// Package reference as recorded in the database, e.g.
    /// `composer://league/flysystem`.
    pub reference: String,
    /// Branches in record order; the engine stops at the first match.
    pub branches: Vec<AdvisoryBranch>,
}

impl Advisory {
    /// Package name this advisory applies to, with the `composer://`
    /// prefix stripped.
    pub fn package_name(&self) -> &str {
        self.reference
            .strip_prefix(REFERENCE_PREFIX)
            .unwrap_or(&self.reference)
    }
}

/// Immutable mapping from package name to its advisories, built once by an
/// advisory source and shared read-only across checks.
pub type AdvisoryIndex = HashMap<String, Vec<Advisory>>;
