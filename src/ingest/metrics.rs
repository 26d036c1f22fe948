use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

use super::{read_json_array, record_label, IngestError, LoadOutcome};
use crate::scoring::appetite::validate_thresholds;
use crate::scoring::Direction;

/// Prior-period values retained per metric.
pub const HISTORY_LIMIT: usize = 6;

/// A key risk indicator with its appetite and tolerance thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub metric: String,
    #[serde(default)]
    pub owner: String,
    pub current: f64,
    pub appetite: f64,
    pub tolerance: f64,
    pub direction: Direction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    #[serde(default)]
    pub history: Vec<f64>,
}

impl MetricRecord {
    /// Explicit prior-period value, else the most recent history entry.
    pub fn prior_value(&self) -> Option<f64> {
        self.prior.or_else(|| self.history.last().copied())
    }

    pub fn unit(&self) -> &str {
        self.unit.as_deref().unwrap_or("")
    }

    fn validate(&self) -> Result<(), String> {
        if self.metric.trim().is_empty() {
            return Err("metric name is empty".to_string());
        }
        if !self.current.is_finite() {
            return Err("current value must be a finite number".to_string());
        }
        validate_thresholds(self.appetite, self.tolerance, self.direction)
            .map_err(|e| e.to_string())
    }

    fn key(&self) -> String {
        self.metric.trim().to_lowercase()
    }
}

fn trim_history(history: &mut Vec<f64>) {
    if history.len() > HISTORY_LIMIT {
        history.drain(..history.len() - HISTORY_LIMIT);
    }
}

pub fn parse_metrics(items: Vec<serde_json::Value>) -> LoadOutcome<MetricRecord> {
    let mut outcome = LoadOutcome::new();
    let mut seen = HashSet::new();

    for (index, item) in items.into_iter().enumerate() {
        let label = record_label(&item, "metric", index);
        let mut metric = match serde_json::from_value::<MetricRecord>(item) {
            Ok(metric) => metric,
            Err(e) => {
                outcome.rejected.push(IngestError::malformed(label, e.to_string()));
                continue;
            }
        };
        if let Err(reason) = metric.validate() {
            outcome.rejected.push(IngestError::malformed(label, reason));
            continue;
        }
        if !seen.insert(metric.key()) {
            outcome.rejected.push(IngestError::DuplicateId { record: label });
            continue;
        }
        if metric.history.len() > HISTORY_LIMIT {
            debug!(metric = %metric.metric, len = metric.history.len(), "trimming history");
            trim_history(&mut metric.history);
        }
        outcome.records.push(metric);
    }

    debug!(
        accepted = outcome.records.len(),
        rejected = outcome.rejected.len(),
        "parsed metrics"
    );
    outcome
}

pub fn load_metrics(path: &Path) -> Result<LoadOutcome<MetricRecord>> {
    let items = read_json_array(path).context("Failed to load metrics")?;
    Ok(parse_metrics(items))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
}

/// Insert `metric`, or replace the same-named metric and roll its old value into history.
///
/// Names match case-insensitively. Returns an error when the new thresholds
/// are inconsistent; the collection is left untouched in that case.
pub fn upsert_metric(metrics: &mut Vec<MetricRecord>, mut metric: MetricRecord) -> Result<Upsert> {
    metric.validate().map_err(|reason| anyhow::anyhow!("{}: {}", metric.metric, reason))?;

    let key = metric.key();
    match metrics.iter_mut().find(|m| m.key() == key) {
        Some(existing) => {
            let mut history = std::mem::take(&mut existing.history);
            history.push(existing.current);
            trim_history(&mut history);
            metric.history = history;
            metric.prior = None;
            *existing = metric;
            Ok(Upsert::Updated)
        }
        None => {
            metric.history.clear();
            metric.prior = None;
            metrics.push(metric);
            Ok(Upsert::Inserted)
        }
    }
}
