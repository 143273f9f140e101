use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Advisory;

/// Caller-facing view of one advisory: descriptive fields only, branch and
/// reference data never leave the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisorySummary {
    pub title: String,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cve: Option<String>,
}

impl From<&Advisory> for AdvisorySummary {
    fn from(advisory: &Advisory) -> Self {
        Self {
            title: advisory.title.clone(),
            link: advisory.link.clone(),
            cve: advisory.cve.clone(),
        }
    }
}

/// Matching advisories for one installed package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageAdvisories {
    pub version: String,
    pub advisories: Vec<AdvisorySummary>,
}

/// Result of one audit: affected packages keyed by name. Packages with no
/// matching advisory never appear, not even with an empty list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditReport {
    pub vulnerabilities: BTreeMap<String, PackageAdvisories>,
}

impl AuditReport {
    pub fn is_empty(&self) -> bool {
        self.vulnerabilities.is_empty()
    }

    /// Number of affected packages.
    pub fn package_count(&self) -> usize {
        self.vulnerabilities.len()
    }

    /// Total number of matched advisories across all packages.
    pub fn advisory_count(&self) -> usize {
        self.vulnerabilities
            .values()
            .map(|p| p.advisories.len())
            .sum()
    }
}
