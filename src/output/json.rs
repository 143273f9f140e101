use crate::model::AuditReport;
use anyhow::Result;

pub fn print_json(report: &AuditReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
