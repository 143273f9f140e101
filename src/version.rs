//! Version string classification and range matching.
//!
//! Composer version strings come in two flavors: pinned releases
//! (`1.0.70`, `v2.1.0-beta1`) and floating branch installs (`dev-master`,
//! `1.x-dev`). Pinned releases are matched against advisory range
//! expressions; branch installs are matched by normalized branch name and
//! recency instead.

use semver::{Version, VersionReq};

/// Marker separating a version from a pinned commit hash, as in
/// `1.2.3"#abcdef`.
const COMMIT_PIN: &str = "\"#";

/// Strips the branch decorations from a version string so it can be
/// compared against an advisory branch name.
///
/// A leading `dev-` is removed first, then the first of `.x-dev` / `-dev`
/// that matches the end.
///
/// # Example
///
/// ```
/// use lockaudit::version::normalize;
///
/// assert_eq!(normalize("dev-1.2.x-dev"), "1.2");
/// assert_eq!(normalize("1.2-dev"), "1.2");
/// ```
pub fn normalize(version: &str) -> String {
    let version = version.strip_prefix("dev-").unwrap_or(version);
    let version = version
        .strip_suffix(".x-dev")
        .or_else(|| version.strip_suffix("-dev"))
        .unwrap_or(version);
    version.to_string()
}

/// True if the version string denotes a floating branch install rather
/// than a pinned release.
///
/// A trailing commit pin (`"#abcdef`) is ignored: a pinned commit of a
/// release tag is still a release.
pub fn is_development_version(version: &str) -> bool {
    let version = strip_commit_pin(version);
    version.starts_with("dev-") || version.ends_with("-dev")
}

/// True if the installed version satisfies at least one of the given
/// range expressions.
///
/// Each expression is a comma-joined comparator list (`>=1.0.0,<1.0.71`);
/// the list as a whole is a union. Versions or expressions that fail to
/// parse simply do not match.
pub fn satisfies_any(version: &str, constraints: &[String]) -> bool {
    let Some(version) = parse_lenient(version) else {
        return false;
    };

    constraints.iter().any(|expr| match VersionReq::parse(expr) {
        Ok(req) => req.matches(&version),
        Err(e) => {
            tracing::debug!(constraint = %expr, error = %e, "skipping unparseable constraint");
            false
        }
    })
}

/// Parses an installed version leniently: commit pin and leading `v`
/// stripped, missing minor/patch segments padded with zeros.
pub(crate) fn parse_lenient(version: &str) -> Option<Version> {
    let version = strip_commit_pin(version).trim().trim_start_matches('v');
    if version.is_empty() {
        return None;
    }
    if let Ok(parsed) = Version::parse(version) {
        return Some(parsed);
    }

    // Pad "1" or "1.0" to three segments, keeping any pre-release or
    // build suffix attached.
    let (core, suffix) = match version.find(['-', '+']) {
        Some(i) => (&version[..i], &version[i..]),
        None => (version, ""),
    };
    let segments = core.matches('.').count();
    if segments >= 2 {
        return None;
    }
    let padded = format!("{}{}{}", core, ".0".repeat(2 - segments), suffix);
    Version::parse(&padded).ok()
}

fn strip_commit_pin(version: &str) -> &str {
    match version.find(COMMIT_PIN) {
        Some(i) => &version[..i],
        None => version,
    }
}
