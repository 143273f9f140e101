use crate::model::AuditReport;
use anyhow::Result;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct AdvisoryRow {
    #[tabled(rename = "Package")]
    package: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "CVE")]
    cve: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Link")]
    link: String,
}

pub fn print_table(report: &AuditReport) -> Result<()> {
    if report.is_empty() {
        println!("No known vulnerabilities found.");
        return Ok(());
    }

    println!();
    println!(
        "Found {} advisories affecting {} packages:",
        report.advisory_count(),
        report.package_count()
    );
    println!();

    let rows: Vec<AdvisoryRow> = report
        .vulnerabilities
        .iter()
        .flat_map(|(name, entry)| {
            entry.advisories.iter().map(move |advisory| AdvisoryRow {
                package: name.clone(),
                version: entry.version.clone(),
                cve: advisory.cve.clone().unwrap_or_else(|| "-".to_string()),
                title: truncate(&advisory.title, 60),
                link: truncate(&advisory.link, 70),
            })
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);

    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len - 3).collect();
        format!("{}...", cut)
    }
}
