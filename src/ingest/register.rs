use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use super::{IngestError, LoadOutcome};
use crate::scoring::{register, Tier};

/// Column order of the register CSV.
pub const REGISTER_HEADERS: [&str; 11] = [
    "risk_id",
    "risk_title",
    "category",
    "risk_owner",
    "likelihood",
    "impact",
    "existing_controls",
    "remediation_action",
    "review_date",
    "status",
    "framework_ref",
];

/// One register row exactly as it appears in the CSV.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskRow {
    pub risk_id: String,
    pub risk_title: String,
    pub category: String,
    pub risk_owner: String,
    pub likelihood: String,
    pub impact: String,
    pub existing_controls: String,
    pub remediation_action: String,
    pub review_date: String,
    pub status: String,
    pub framework_ref: String,
}

impl RiskRow {
    /// Value of the named register column, `None` for a column the register does not define.
    pub fn field(&self, column: &str) -> Option<&str> {
        let value = match column {
            "risk_id" => &self.risk_id,
            "risk_title" => &self.risk_title,
            "category" => &self.category,
            "risk_owner" => &self.risk_owner,
            "likelihood" => &self.likelihood,
            "impact" => &self.impact,
            "existing_controls" => &self.existing_controls,
            "remediation_action" => &self.remediation_action,
            "review_date" => &self.review_date,
            "status" => &self.status,
            "framework_ref" => &self.framework_ref,
            _ => return None,
        };
        Some(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RiskStatus {
    Open,
    InProgress,
    Closed,
}

impl RiskStatus {
    pub const REPORT_ORDER: [RiskStatus; 3] =
        [RiskStatus::Open, RiskStatus::InProgress, RiskStatus::Closed];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskStatus::Open => "Open",
            RiskStatus::InProgress => "In Progress",
            RiskStatus::Closed => "Closed",
        }
    }
}

impl FromStr for RiskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['_', '-'], " ").as_str() {
            "open" => Ok(RiskStatus::Open),
            "in progress" => Ok(RiskStatus::InProgress),
            "closed" => Ok(RiskStatus::Closed),
            other => Err(format!(
                "unknown status '{}' (expected Open, In Progress or Closed)",
                other
            )),
        }
    }
}

impl fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated, classified register entry.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskRecord {
    pub id: String,
    pub title: String,
    pub category: String,
    pub owner: String,
    pub likelihood: u8,
    pub impact: u8,
    pub score: u8,
    pub tier: Tier,
    pub controls: String,
    pub action: String,
    pub review_date: NaiveDate,
    pub status: RiskStatus,
    pub framework_ref: String,
}

fn parse_rating(field: &str, raw: &str) -> Result<u8, String> {
    raw.trim()
        .parse::<u8>()
        .map_err(|_| format!("{} is not a whole number: '{}'", field, raw))
}

impl TryFrom<RiskRow> for RiskRecord {
    type Error = String;

    fn try_from(row: RiskRow) -> Result<Self, Self::Error> {
        if row.risk_id.trim().is_empty() {
            return Err("risk_id is empty".to_string());
        }
        let likelihood = parse_rating("likelihood", &row.likelihood)?;
        let impact = parse_rating("impact", &row.impact)?;
        let (score, tier) = register::classify(likelihood, impact).map_err(|e| e.to_string())?;
        let review_date = NaiveDate::parse_from_str(row.review_date.trim(), "%Y-%m-%d")
            .map_err(|_| {
                format!("invalid review_date '{}' (expected YYYY-MM-DD)", row.review_date)
            })?;
        let status = row.status.parse::<RiskStatus>()?;

        Ok(RiskRecord {
            id: row.risk_id.trim().to_string(),
            title: row.risk_title,
            category: row.category,
            owner: row.risk_owner,
            likelihood,
            impact,
            score,
            tier,
            controls: row.existing_controls,
            action: row.remediation_action,
            review_date,
            status,
            framework_ref: row.framework_ref,
        })
    }
}

/// Parse register CSV text. A missing column is fatal; a bad row is rejected.
pub fn parse_register(data: &str) -> Result<LoadOutcome<RiskRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data.as_bytes());

    let headers = reader.headers().context("Failed to read register header row")?.clone();
    let missing: Vec<&str> = REGISTER_HEADERS
        .iter()
        .copied()
        .filter(|h| !headers.iter().any(|c| c == *h))
        .collect();
    if !missing.is_empty() {
        anyhow::bail!("Register is missing column(s): {}", missing.join(", "));
    }

    let mut outcome = LoadOutcome::new();
    let mut seen = HashSet::new();

    for (index, result) in reader.deserialize::<RiskRow>().enumerate() {
        // Header is line 1
        let line = format!("row {}", index + 2);
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                outcome.rejected.push(IngestError::malformed(line, e.to_string()));
                continue;
            }
        };

        let label = if row.risk_id.trim().is_empty() {
            line
        } else {
            row.risk_id.trim().to_string()
        };

        match RiskRecord::try_from(row) {
            Ok(record) => {
                if seen.insert(record.id.clone()) {
                    outcome.records.push(record);
                } else {
                    outcome.rejected.push(IngestError::DuplicateId { record: label });
                }
            }
            Err(reason) => outcome.rejected.push(IngestError::malformed(label, reason)),
        }
    }

    debug!(
        accepted = outcome.records.len(),
        rejected = outcome.rejected.len(),
        "parsed register"
    );
    Ok(outcome)
}

pub fn load_register(path: &Path) -> Result<LoadOutcome<RiskRecord>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read register at {}", path.display()))?;
    parse_register(&data).with_context(|| format!("Invalid register file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "risk_id,risk_title,category,risk_owner,likelihood,impact,existing_controls,remediation_action,review_date,status,framework_ref";

    fn csv_with(rows: &[&str]) -> String {
        let mut out = String::from(HEADER);
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out
    }

    #[test]
    fn test_parse_valid_rows() {
        let data = csv_with(&[
            "R-001,Ransomware,Cyber,CISO,4,5,EDR,Patch,2026-11-01,Open,ISO 27001 A.8.7",
            "R-002,Late filing,Regulatory,CCO,2,3,Calendar,Automate,2026-12-01,In Progress,FCA SYSC",
        ]);
        let outcome = parse_register(&data).unwrap();
        assert!(outcome.rejected.is_empty());
        assert_eq!(outcome.records.len(), 2);

        let first = &outcome.records[0];
        assert_eq!(first.score, 20);
        assert_eq!(first.tier, Tier::Critical);
        assert_eq!(first.status, RiskStatus::Open);
        assert_eq!(outcome.records[1].tier, Tier::Medium);
        assert_eq!(outcome.records[1].status, RiskStatus::InProgress);
    }

    #[test]
    fn test_out_of_range_row_rejected_not_fatal() {
        let data = csv_with(&[
            "R-001,Ransomware,Cyber,CISO,4,5,EDR,Patch,2026-11-01,Open,A.8.7",
            "R-002,Bad,Cyber,CISO,0,5,EDR,Patch,2026-11-01,Open,A.8.7",
        ]);
        let outcome = parse_register(&data).unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].record(), "R-002");
        assert!(outcome.rejected[0].reason().contains("likelihood"));
    }

    #[test]
    fn test_bad_date_and_status_rejected() {
        let data = csv_with(&[
            "R-001,A,Cyber,CISO,1,1,-,-,01/11/2026,Open,-",
            "R-002,B,Cyber,CISO,1,1,-,-,2026-11-01,Parked,-",
        ]);
        let outcome = parse_register(&data).unwrap();
        assert!(outcome.records.is_empty());
        assert!(outcome.rejected[0].reason().contains("review_date"));
        assert!(outcome.rejected[1].reason().contains("unknown status"));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let data = csv_with(&[
            "R-001,A,Cyber,CISO,1,1,-,-,2026-11-01,Open,-",
            "R-001,B,Cyber,CISO,2,2,-,-,2026-11-01,Open,-",
        ]);
        let outcome = parse_register(&data).unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].title, "A");
        assert_eq!(
            outcome.rejected,
            vec![IngestError::DuplicateId {
                record: "R-001".to_string()
            }]
        );
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let data = "risk_id,risk_title\nR-001,A\n";
        let err = parse_register(data).unwrap_err();
        assert!(err.to_string().contains("likelihood"));
    }

    #[test]
    fn test_short_row_rejected_with_position() {
        let data = csv_with(&["R-001,A,Cyber"]);
        let outcome = parse_register(&data).unwrap();
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].record(), "row 2");
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("in_progress".parse(), Ok(RiskStatus::InProgress));
        assert_eq!("CLOSED".parse(), Ok(RiskStatus::Closed));
    }
}
