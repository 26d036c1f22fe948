use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::info;

use super::prompt::Prompter;
use crate::ingest::register::parse_register;
use crate::ingest::{RiskRecord, RiskRow, RiskStatus, REGISTER_HEADERS};
use crate::report::write_report;
use crate::scoring::register::{classify, MAX_RATING, MIN_RATING};

/// Days from the entry date to the default next review.
const DEFAULT_REVIEW_DAYS: u64 = 90;

fn rating_check(value: &u8) -> Result<(), String> {
    if (MIN_RATING..=MAX_RATING).contains(value) {
        Ok(())
    } else {
        Err(format!("must be between {} and {}", MIN_RATING, MAX_RATING))
    }
}

/// Collect a new register entry interactively.
///
/// Likelihood and impact are re-asked until they classify; the resulting
/// score and tier are shown before the remaining fields.
pub fn risk_form<R: BufRead, W: Write>(
    p: &mut Prompter<R, W>,
    today: NaiveDate,
) -> Result<RiskRow> {
    p.say("New register entry")?;
    p.say("==================")?;

    let risk_id = p.ask_required("Risk ID (e.g. R-011)", "")?;
    let risk_title = p.ask_required("Title", "")?;
    let category = p.ask_with_default("Category", "Operational")?;
    let risk_owner = p.ask_required("Owner", "")?;

    let likelihood: u8 = p.ask_parsed("Likelihood (1-5)", "", rating_check)?;
    let impact: u8 = p.ask_parsed("Impact (1-5)", "", rating_check)?;
    let (score, tier) = classify(likelihood, impact)?;
    p.say(&format!("  Score {}/25 -> {} {}", score, tier.icon(), tier))?;

    let existing_controls = p.ask_with_default("Existing controls", "")?;
    let remediation_action = p.ask_with_default("Remediation action", "")?;

    let default_review = today
        .checked_add_days(Days::new(DEFAULT_REVIEW_DAYS))
        .unwrap_or(today)
        .to_string();
    let review_date: NaiveDate =
        p.ask_parsed("Next review date (YYYY-MM-DD)", &default_review, |_| Ok(()))?;
    let status: RiskStatus =
        p.ask_parsed("Status (Open, In Progress, Closed)", "Open", |_| Ok(()))?;
    let framework_ref = p.ask_with_default("Framework reference", "")?;

    Ok(RiskRow {
        risk_id,
        risk_title,
        category,
        risk_owner,
        likelihood: likelihood.to_string(),
        impact: impact.to_string(),
        existing_controls,
        remediation_action,
        review_date: review_date.to_string(),
        status: status.to_string(),
        framework_ref,
    })
}

/// Append a row to the register CSV, creating the file with a header if needed.
///
/// The row must classify and its identifier must be new. The whole file is
/// rewritten atomically.
pub fn append_risk(path: &Path, row: RiskRow) -> Result<RiskRecord> {
    let record = RiskRecord::try_from(row.clone())
        .map_err(|reason| anyhow::anyhow!("Invalid risk entry: {}", reason))?;

    let existing = if path.exists() {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read register at {}", path.display()))?
    } else {
        String::new()
    };
    let is_new = existing.trim().is_empty();

    if !is_new {
        let outcome = parse_register(&existing)
            .with_context(|| format!("Failed to parse register at {}", path.display()))?;
        if outcome.records.iter().any(|r| r.id == record.id) {
            anyhow::bail!("Risk {} already exists in {}", record.id, path.display());
        }
    }

    // Existing files keep their own column order
    let columns: Vec<String> = if is_new {
        REGISTER_HEADERS.iter().map(|h| h.to_string()).collect()
    } else {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(existing.as_bytes());
        let headers = reader
            .headers()
            .with_context(|| format!("Failed to read register header in {}", path.display()))?;
        headers.iter().map(str::to_string).collect()
    };

    let mut wtr = csv::Writer::from_writer(vec![]);
    if is_new {
        wtr.write_record(&columns).context("Failed to write register header")?;
    }
    wtr.write_record(columns.iter().map(|c| row.field(c).unwrap_or("")))
        .context("Failed to encode risk row")?;
    let encoded = wtr
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e))?;
    let encoded = String::from_utf8(encoded).context("Risk row is not valid UTF-8")?;

    let mut content = if is_new { String::new() } else { existing };
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(&encoded);

    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Invalid register path {}", path.display()))?;
    write_report(dir, name, &content)?;

    info!(id = %record.id, score = record.score, tier = %record.tier, "risk appended");
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::Tier;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 1).unwrap()
    }

    fn sample_row(id: &str) -> RiskRow {
        RiskRow {
            risk_id: id.to_string(),
            risk_title: "Ransomware, double extortion".to_string(),
            category: "Cyber".to_string(),
            risk_owner: "CISO".to_string(),
            likelihood: "4".to_string(),
            impact: "5".to_string(),
            existing_controls: "EDR".to_string(),
            remediation_action: "Immutable backups".to_string(),
            review_date: "2026-12-31".to_string(),
            status: "Open".to_string(),
            framework_ref: "ISO 27001 A.8.7".to_string(),
        }
    }

    #[test]
    fn test_form_collects_row() {
        let input = "R-011\nSupplier outage\n\nCOO\n7\n3\n4\nBCP\nTest failover\n\nin progress\nFCA SYSC 8\n";
        let mut p = Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        let row = risk_form(&mut p, today()).unwrap();

        assert_eq!(row.risk_id, "R-011");
        assert_eq!(row.category, "Operational");
        assert_eq!(row.likelihood, "3");
        assert_eq!(row.impact, "4");
        assert_eq!(row.review_date, "2026-12-30");
        assert_eq!(row.status, "In Progress");

        let out = String::from_utf8(p.into_output()).unwrap();
        assert!(out.contains("Score 12/25 -> 🟠 HIGH"));
        assert!(out.contains("Invalid: must be between 1 and 5"));
    }

    #[test]
    fn test_append_creates_file_with_header() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("risk_register.csv");
        let record = append_risk(&path, sample_row("R-001")).unwrap();
        assert_eq!(record.score, 20);
        assert_eq!(record.tier, Tier::Critical);

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().next().unwrap(), REGISTER_HEADERS.join(","));
        assert!(text.contains("\"Ransomware, double extortion\""));

        let outcome = parse_register(&text).unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert!(outcome.rejected.is_empty());
    }

    #[test]
    fn test_append_keeps_existing_rows() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("risk_register.csv");
        append_risk(&path, sample_row("R-001")).unwrap();
        append_risk(&path, sample_row("R-002")).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let outcome = parse_register(&text).unwrap();
        let ids: Vec<&str> = outcome.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["R-001", "R-002"]);
        assert_eq!(text.matches("risk_id").count(), 1);
    }

    #[test]
    fn test_append_follows_existing_column_order() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("risk_register.csv");
        let header = "risk_title,risk_id,category,risk_owner,likelihood,impact,existing_controls,remediation_action,review_date,status,framework_ref,notes";
        std::fs::write(
            &path,
            format!(
                "{}\nLate filing,R-001,Regulatory,CCO,2,3,Calendar,Automate,2026-12-01,Open,SYSC,kept\n",
                header
            ),
        )
        .unwrap();

        append_risk(&path, sample_row("R-002")).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().next().unwrap(), header);
        let outcome = parse_register(&text).unwrap();
        assert!(outcome.rejected.is_empty());
        let added = outcome.records.iter().find(|r| r.id == "R-002").unwrap();
        assert_eq!(added.title, "Ransomware, double extortion");
        assert_eq!(added.score, 20);
        assert!(text.lines().last().unwrap().ends_with("ISO 27001 A.8.7,"));
    }

    #[test]
    fn test_append_rejects_duplicate_id() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("risk_register.csv");
        append_risk(&path, sample_row("R-001")).unwrap();
        let err = append_risk(&path, sample_row("R-001")).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_append_rejects_out_of_range_rating() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("risk_register.csv");
        let mut row = sample_row("R-001");
        row.impact = "6".to_string();
        assert!(append_risk(&path, row).is_err());
        assert!(!path.exists());
    }
}
