use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

use super::{read_json_array, record_label, IngestError, LoadOutcome};
use crate::scoring::Questionnaire;

/// Admit every questionnaire that is a well-typed object.
///
/// Missing fields are not rejected here: an incomplete submission is a
/// resolution outcome, not a load error.
pub fn parse_questionnaires(items: Vec<serde_json::Value>) -> LoadOutcome<Questionnaire> {
    let mut outcome = LoadOutcome::new();

    for (index, item) in items.into_iter().enumerate() {
        let label = record_label(&item, "vendor_name", index);
        if !item.is_object() {
            outcome
                .rejected
                .push(IngestError::malformed(label, "expected a JSON object"));
            continue;
        }
        match serde_json::from_value::<Questionnaire>(item) {
            Ok(q) => outcome.records.push(q),
            Err(e) => outcome.rejected.push(IngestError::malformed(label, e.to_string())),
        }
    }

    debug!(
        accepted = outcome.records.len(),
        rejected = outcome.rejected.len(),
        "parsed questionnaires"
    );
    outcome
}

pub fn load_questionnaires(path: &Path) -> Result<LoadOutcome<Questionnaire>> {
    let items = read_json_array(path).context("Failed to load questionnaires")?;
    Ok(parse_questionnaires(items))
}
