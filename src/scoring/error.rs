use thiserror::Error;

/// Errors raised by the classifiers when handed values outside their domain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    #[error("{field} must be between {min} and {max}, got {value}")]
    InvalidInput {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    #[error("score {score} falls outside every band")]
    Unbanded { score: u32 },

    #[error("{0}")]
    InconsistentThresholds(String),
}
