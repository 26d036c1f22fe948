use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::info;

use super::prompt::Prompter;
use crate::ingest::{load_metrics, upsert_metric, MetricRecord, Upsert};
use crate::report::{exact_value, format_value, write_report};
use crate::scoring::appetite::{evaluate, validate_thresholds};
use crate::scoring::Direction;

fn finite(value: &f64) -> Result<(), String> {
    if value.is_finite() {
        Ok(())
    } else {
        Err("must be a finite number".to_string())
    }
}

fn optional(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Collect a metric reading interactively.
///
/// When the name matches an existing metric its owner, thresholds and
/// labels become the defaults; only the current value has to be typed.
pub fn metric_form<R: BufRead, W: Write>(
    p: &mut Prompter<R, W>,
    existing: &[MetricRecord],
) -> Result<MetricRecord> {
    p.say("Metric reading")?;
    p.say("==============")?;

    let metric = p.ask_required("Metric name", "")?;
    let key = metric.trim().to_lowercase();
    let known = existing.iter().find(|m| m.metric.trim().to_lowercase() == key);
    if let Some(m) = known {
        p.say(&format!(
            "  Updating {}: current {}{}, {} prior value(s) kept",
            m.metric,
            format_value(m.current),
            m.unit(),
            m.history.len()
        ))?;
    }

    let text_default =
        |f: fn(&MetricRecord) -> Option<&str>| known.and_then(f).unwrap_or("").to_string();
    let number_default =
        |f: fn(&MetricRecord) -> f64| known.map(|m| exact_value(f(m))).unwrap_or_default();

    let owner = p.ask_with_default("Owner", &text_default(|m| Some(m.owner.as_str())))?;

    let direction_default = known
        .map(|m| m.direction)
        .unwrap_or(Direction::LowerIsBetter);
    let direction: Direction = p.ask_parsed(
        "Direction (lower_is_better / higher_is_better)",
        match direction_default {
            Direction::LowerIsBetter => "lower_is_better",
            Direction::HigherIsBetter => "higher_is_better",
        },
        |_| Ok(()),
    )?;

    let (appetite, tolerance) = loop {
        let appetite: f64 =
            p.ask_parsed("Appetite (target)", &number_default(|m| m.appetite), finite)?;
        let tolerance: f64 = p.ask_parsed(
            "Tolerance (hard limit)",
            &number_default(|m| m.tolerance),
            finite,
        )?;
        match validate_thresholds(appetite, tolerance, direction) {
            Ok(()) => break (appetite, tolerance),
            Err(e) => p.say(&format!("  Invalid: {}. Try again.", e))?,
        }
    };

    let current: f64 = p.ask_parsed("Current value", "", finite)?;
    let unit = p.ask_with_default("Unit (e.g. %, days)", &text_default(|m| m.unit.as_deref()))?;
    let period = p.ask_with_default("Period", &text_default(|m| m.period.as_deref()))?;
    let action = p.ask_with_default("Action", &text_default(|m| m.action.as_deref()))?;
    let framework =
        p.ask_with_default("Framework reference", &text_default(|m| m.framework.as_deref()))?;

    let status = evaluate(current, appetite, tolerance, direction, known.map(|m| m.current))?;
    let trend = status
        .trend
        .map(|t| format!(" {} {}", t.arrow(), t))
        .unwrap_or_default();
    p.say(&format!("  Status {} {}{}", status.rag.icon(), status.rag, trend))?;

    Ok(MetricRecord {
        metric,
        owner,
        current,
        appetite,
        tolerance,
        direction,
        prior: None,
        unit: optional(unit),
        period: optional(period),
        action: optional(action),
        framework: optional(framework),
        history: Vec::new(),
    })
}

/// Load the metrics file, or an empty collection when it does not exist yet.
///
/// A file holding malformed records is refused: rewriting it would drop them.
pub fn load_for_update(path: &Path) -> Result<Vec<MetricRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let outcome = load_metrics(path)?;
    if !outcome.rejected.is_empty() {
        let reasons: Vec<String> = outcome.rejected.iter().map(ToString::to_string).collect();
        anyhow::bail!(
            "{} has {} malformed record(s); fix them before adding readings: {}",
            path.display(),
            outcome.rejected.len(),
            reasons.join("; ")
        );
    }
    Ok(outcome.records)
}

/// Upsert a reading into the metrics file and rewrite it atomically.
pub fn save_metric(
    path: &Path,
    metrics: &mut Vec<MetricRecord>,
    metric: MetricRecord,
) -> Result<Upsert> {
    let name = metric.metric.clone();
    let result = upsert_metric(metrics, metric)?;

    let mut json = serde_json::to_string_pretty(metrics).context("Failed to serialize metrics")?;
    json.push('\n');

    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let file = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Invalid metrics path {}", path.display()))?;
    write_report(dir, file, &json)?;

    info!(metric = %name, ?result, "metric saved");
    Ok(result)
}
