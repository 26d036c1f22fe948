mod error;
pub mod metrics;
pub mod questionnaires;
pub mod register;
pub mod vendors;

pub use error::IngestError;
pub use metrics::{load_metrics, upsert_metric, MetricRecord, Upsert, HISTORY_LIMIT};
pub use questionnaires::load_questionnaires;
pub use register::{load_register, RiskRecord, RiskRow, RiskStatus, REGISTER_HEADERS};
pub use vendors::{load_vendors, VendorRecord};

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Records admitted from one input file, plus the ones that were turned away.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutcome<T> {
    pub records: Vec<T>,
    pub rejected: Vec<IngestError>,
}

impl<T> LoadOutcome<T> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

impl<T> Default for LoadOutcome<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a file that must hold a top-level JSON array.
///
/// Elements are returned untyped so each one can be validated separately.
pub(crate) fn read_json_array(path: &Path) -> Result<Vec<serde_json::Value>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}: invalid JSON", path.display()))?;

    match value {
        serde_json::Value::Array(items) => Ok(items),
        _ => anyhow::bail!("{} must contain a JSON array of records", path.display()),
    }
}

/// Best-effort label for an untyped record: its identifier field, else its position.
pub(crate) fn record_label(value: &serde_json::Value, id_field: &str, index: usize) -> String {
    value
        .get(id_field)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("record {}", index + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_json_array() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"[{{"a": 1}}, {{"a": 2}}]"#).unwrap();
        let items = read_json_array(file.path()).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_read_json_object_is_fatal() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"a": 1}}"#).unwrap();
        let err = read_json_array(file.path()).unwrap_err();
        assert!(err.to_string().contains("must contain a JSON array"));
    }

    #[test]
    fn test_read_invalid_json_is_fatal() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[{{").unwrap();
        assert!(read_json_array(file.path()).is_err());
    }

    #[test]
    fn test_record_label() {
        let value = serde_json::json!({"vendor_name": "Acme"});
        assert_eq!(record_label(&value, "vendor_name", 0), "Acme");
        assert_eq!(record_label(&value, "metric", 3), "record 4");
    }
}
