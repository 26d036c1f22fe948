//! Interactive data entry for the register CSV and the metrics JSON file.

pub mod metric;
pub mod prompt;
pub mod risk;

use anyhow::Result;
use chrono::NaiveDate;
use std::io::{BufRead, Write};
use std::path::Path;

pub use metric::{load_for_update, metric_form, save_metric};
pub use prompt::Prompter;
pub use risk::{append_risk, risk_form};

use crate::ingest::{RiskRecord, Upsert};

/// Run the register entry form and append the result.
///
/// Returns `None` when the user declines to save.
pub fn add_risk<R: BufRead, W: Write>(
    p: &mut Prompter<R, W>,
    path: &Path,
    today: NaiveDate,
) -> Result<Option<RiskRecord>> {
    let row = risk_form(p, today)?;
    p.say("")?;
    if !p.ask_yes_no(&format!("Append {} to {}?", row.risk_id, path.display()), true)? {
        return Ok(None);
    }
    append_risk(path, row).map(Some)
}

/// Run the metric entry form and upsert the result.
///
/// Returns `None` when the user declines to save.
pub fn add_metric<R: BufRead, W: Write>(
    p: &mut Prompter<R, W>,
    path: &Path,
) -> Result<Option<(String, Upsert)>> {
    let mut metrics = load_for_update(path)?;
    let reading = metric_form(p, &metrics)?;
    p.say("")?;
    if !p.ask_yes_no(&format!("Save {} to {}?", reading.metric, path.display()), true)? {
        return Ok(None);
    }
    let name = reading.metric.clone();
    let result = save_metric(path, &mut metrics, reading)?;
    Ok(Some((name, result)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_add_risk_declined_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("risk_register.csv");
        let input = "R-001\nPhishing\nCyber\nCISO\n3\n3\n\n\n2026-11-01\nOpen\n\nn\n";
        let today = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        let saved = add_risk(&mut prompter(input), &path, today).unwrap();
        assert!(saved.is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_add_metric_saves() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("metrics.json");
        let input = "Phishing Click Rate\nCISO\nlower\n5\n10\n4\n%\n\n\n\n\n";
        let saved = add_metric(&mut prompter(input), &path).unwrap();
        assert_eq!(saved, Some(("Phishing Click Rate".to_string(), Upsert::Inserted)));
        assert_eq!(load_for_update(&path).unwrap().len(), 1);
    }
}
