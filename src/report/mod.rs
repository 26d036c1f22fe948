//! Committee-pack rendering: one Markdown document and one CSV mirror per variant.

pub mod csv;
pub mod markdown;
mod writer;

pub use writer::write_report;

use chrono::NaiveDate;
use serde::Serialize;

use crate::pipeline::RunContext;

/// Report-wide settings shared by the renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    pub as_of: NaiveDate,
    pub top_n: usize,
    pub due_soon_days: i64,
}

impl ReportOptions {
    pub fn from_context(ctx: &RunContext) -> Self {
        Self {
            as_of: ctx.as_of,
            top_n: ctx.scoring.top_n(),
            due_soon_days: ctx.scoring.due_soon_days(),
        }
    }
}

/// The wire name serde gives a unit enum variant (e.g. `highly_confidential`).
pub(crate) fn serde_name<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        Ok(other) => other.to_string(),
        Err(_) => String::new(),
    }
}

/// Format a metric value for display: at most two decimals, no trailing zeros.
pub(crate) fn format_value(value: f64) -> String {
    let text = if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    };
    // Values that round to zero lose their sign
    if text == "-0" {
        "0".to_string()
    } else {
        text
    }
}

/// Format a metric value at full precision, so it parses back to the same `f64`.
pub(crate) fn exact_value(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else {
        value.to_string()
    }
}
