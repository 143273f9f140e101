//! Advisory matching engine.
//!
//! Decides, for one installed package and its candidate advisories, which
//! advisories apply. Pinned releases are matched against each branch's
//! version ranges; floating branch installs are matched by branch name
//! plus a recency check against the branch's fix timestamp.

use chrono::{DateTime, Utc};

use crate::model::{Advisory, AdvisoryBranch, AdvisorySummary, InstalledPackage};
use crate::version::{is_development_version, normalize, satisfies_any};

/// Returns the advisories applying to `package`, in candidate order.
///
/// Advisories are tested independently; within one advisory the first
/// branch that applies settles it and the remaining branches are not
/// examined, so an advisory appears at most once in the result.
pub fn match_advisories(
    package: &InstalledPackage,
    candidates: &[Advisory],
) -> Vec<AdvisorySummary> {
    let is_dev = is_development_version(&package.version);

    candidates
        .iter()
        .filter(|advisory| {
            advisory
                .branches
                .iter()
                .any(|branch| branch_applies(package, is_dev, branch))
        })
        .map(AdvisorySummary::from)
        .collect()
}

fn branch_applies(package: &InstalledPackage, is_dev: bool, branch: &AdvisoryBranch) -> bool {
    if is_dev {
        let branch_name = branch.name.strip_suffix(".x").unwrap_or(&branch.name);
        if branch_name != normalize(&package.version) {
            return false;
        }
        // A branch install newer than the advisory record is assumed to
        // already contain the fix; an unusable timestamp parses to the
        // epoch-zero sentinel and fails the check.
        let installed_at = parse_time_utc(package.time.as_deref());
        installed_at != 0 && installed_at <= branch.time
    } else {
        satisfies_any(&package.version, &branch.versions)
    }
}

/// Parses a lock-file timestamp as UTC unix time, falling back to the
/// epoch-zero sentinel when absent or malformed.
fn parse_time_utc(time: Option<&str>) -> i64 {
    time.and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .map(|dt| dt.with_timezone(&Utc).timestamp())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AdvisoryBranch;

    fn advisory(title: &str, branches: Vec<AdvisoryBranch>) -> Advisory {
        Advisory {
            title: title.to_string(),
            link: format!("https://example.com/{title}"),
            cve: None,
            reference: "composer://acme/widget".to_string(),
            branches,
        }
    }

    fn branch(name: &str, versions: &[&str], time: i64) -> AdvisoryBranch {
        AdvisoryBranch {
            name: name.to_string(),
            versions: versions.iter().map(|v| v.to_string()).collect(),
            time,
        }
    }

    #[test]
    fn test_stable_version_in_range_matches() {
        let package = InstalledPackage::new("league/flysystem", "1.0.70");
        let candidates = vec![advisory(
            "race",
            vec![branch("1.0.x", &[">=1.0.0,<1.0.71"], 0)],
        )];
        let matched = match_advisories(&package, &candidates);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].title, "race");
    }

    #[test]
    fn test_stable_version_out_of_range_does_not_match() {
        let package = InstalledPackage::new("league/flysystem", "1.0.70");
        let candidates = vec![advisory("race", vec![branch("1.0.x", &[">=1.0.71"], 0)])];
        assert!(match_advisories(&package, &candidates).is_empty());
    }

    #[test]
    fn test_advisory_contributes_once_even_if_multiple_branches_match() {
        let package = InstalledPackage::new("acme/widget", "1.5.0");
        let candidates = vec![advisory(
            "dup",
            vec![
                branch("1.x", &[">=1.0.0,<2.0.0"], 0),
                branch("all", &[">=0.0.0"], 0),
            ],
        )];
        assert_eq!(match_advisories(&package, &candidates).len(), 1);
    }

    #[test]
    fn test_distinct_advisories_accumulate_in_order() {
        let package = InstalledPackage::new("acme/widget", "1.5.0");
        let candidates = vec![
            advisory("first", vec![branch("1.x", &[">=1.0.0,<2.0.0"], 0)]),
            advisory("miss", vec![branch("2.x", &[">=2.0.0"], 0)]),
            advisory("second", vec![branch("1.x", &["<1.6.0"], 0)]),
        ];
        let matched = match_advisories(&package, &candidates);
        let titles: Vec<_> = matched.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second"]);
    }

    #[test]
    fn test_dev_version_matches_branch_by_name_and_recency() {
        let package =
            InstalledPackage::new("twig/twig", "1.x-dev").with_time("2020-01-01T00:00:00+00:00");
        // Fix landed after the install snapshot.
        let fix_time = DateTime::parse_from_rfc3339("2020-06-01T00:00:00+00:00")
            .unwrap()
            .timestamp();
        let candidates = vec![advisory("sandbox escape", vec![branch("1.x", &[], fix_time)])];
        assert_eq!(match_advisories(&package, &candidates).len(), 1);
    }

    #[test]
    fn test_dev_version_newer_than_fix_is_excluded() {
        let package =
            InstalledPackage::new("twig/twig", "1.x-dev").with_time("2021-01-01T00:00:00+00:00");
        let fix_time = DateTime::parse_from_rfc3339("2020-06-01T00:00:00+00:00")
            .unwrap()
            .timestamp();
        let candidates = vec![advisory("sandbox escape", vec![branch("1.x", &[], fix_time)])];
        assert!(match_advisories(&package, &candidates).is_empty());
    }

    #[test]
    fn test_dev_version_branch_name_mismatch_is_excluded() {
        let package =
            InstalledPackage::new("twig/twig", "2.x-dev").with_time("2020-01-01T00:00:00+00:00");
        let candidates = vec![advisory("sandbox escape", vec![branch("1.x", &[], i64::MAX)])];
        assert!(match_advisories(&package, &candidates).is_empty());
    }

    #[test]
    fn test_dev_version_without_timestamp_is_excluded() {
        let package = InstalledPackage::new("twig/twig", "1.x-dev");
        let candidates = vec![advisory("sandbox escape", vec![branch("1.x", &[], i64::MAX)])];
        assert!(match_advisories(&package, &candidates).is_empty());
    }

    #[test]
    fn test_dev_version_with_malformed_timestamp_is_excluded() {
        let package = InstalledPackage::new("twig/twig", "1.x-dev").with_time("not a date");
        let candidates = vec![advisory("sandbox escape", vec![branch("1.x", &[], i64::MAX)])];
        assert!(match_advisories(&package, &candidates).is_empty());
    }

    #[test]
    fn test_dev_master_matches_master_branch() {
        let package =
            InstalledPackage::new("acme/widget", "dev-master").with_time("2020-01-01T00:00:00+00:00");
        let fix_time = DateTime::parse_from_rfc3339("2020-06-01T00:00:00+00:00")
            .unwrap()
            .timestamp();
        let candidates = vec![advisory("rce", vec![branch("master", &[], fix_time)])];
        assert_eq!(match_advisories(&package, &candidates).len(), 1);
    }

    #[test]
    fn test_timestamp_equal_to_fix_time_matches() {
        let time = "2020-06-01T00:00:00+00:00";
        let fix_time = DateTime::parse_from_rfc3339(time).unwrap().timestamp();
        let package = InstalledPackage::new("acme/widget", "1.x-dev").with_time(time);
        let candidates = vec![advisory("rce", vec![branch("1.x", &[], fix_time)])];
        assert_eq!(match_advisories(&package, &candidates).len(), 1);
    }

    #[test]
    fn test_parse_time_utc_sentinel() {
        assert_eq!(parse_time_utc(None), 0);
        assert_eq!(parse_time_utc(Some("garbage")), 0);
        assert_eq!(parse_time_utc(Some("1970-01-01T00:00:01+00:00")), 1);
    }

    #[test]
    fn test_malformed_stable_version_matches_nothing() {
        let package = InstalledPackage::new("acme/widget", "totally-broken");
        let candidates = vec![advisory("any", vec![branch("1.x", &[">=0.0.0"], 0)])];
        assert!(match_advisories(&package, &candidates).is_empty());
    }
}
