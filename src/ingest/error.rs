use thiserror::Error;

/// A single record that could not be admitted to the run.
///
/// File-level failures (unreadable file, wrong shape) are not represented
/// here; they abort the load with an `anyhow` error instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    #[error("{record}: {reason}")]
    MalformedInput { record: String, reason: String },

    #[error("{record}: duplicate identifier")]
    DuplicateId { record: String },
}

impl IngestError {
    pub fn malformed(record: impl Into<String>, reason: impl Into<String>) -> Self {
        IngestError::MalformedInput {
            record: record.into(),
            reason: reason.into(),
        }
    }

    /// Label of the offending record (identifier or row position).
    pub fn record(&self) -> &str {
        match self {
            IngestError::MalformedInput { record, .. } | IngestError::DuplicateId { record } => {
                record
            }
        }
    }

    pub fn reason(&self) -> String {
        match self {
            IngestError::MalformedInput { reason, .. } => reason.clone(),
            IngestError::DuplicateId { .. } => "duplicate identifier".to_string(),
        }
    }
}
