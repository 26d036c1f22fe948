use crate::pipeline::AssessedMetric;

const PREAMBLE: &str = "You are supporting a UK financial services risk committee. \
Metrics are key risk indicators tracked against a board-approved risk appetite \
(target) and tolerance (hard limit). RAG status: Green within appetite, Amber \
between appetite and tolerance, Red beyond tolerance.";

const INSTRUCTIONS: &str = "Write a concise, professional committee briefing paragraph \
(max 150 words) summarising the current risk appetite position. Include: overall RAG \
summary, key breaches requiring escalation, notable trends, and recommended committee \
actions. Write in formal financial services governance language suitable for a board \
or risk committee pack.";

/// One line per metric with its value, thresholds, status and trend.
pub fn metrics_context(metrics: &[AssessedMetric]) -> String {
    let mut lines = vec!["Current Risk Appetite Metrics:".to_string()];
    for m in metrics {
        let change = match m.status.period_change {
            Some(delta) if delta > 0.0 => format!(" (▲{} vs last period)", delta.abs()),
            Some(delta) if delta < 0.0 => format!(" (▼{} vs last period)", delta.abs()),
            Some(_) => " (→0 vs last period)".to_string(),
            None => String::new(),
        };
        lines.push(format!(
            "- {}: {}{}{} | Appetite: {} | Tolerance: {} | RAG: {} | Trend: {} | Owner: {} | Action: {}",
            m.record.metric,
            m.record.current,
            m.record.unit(),
            change,
            m.record.appetite,
            m.record.tolerance,
            m.status.rag,
            m.status.trend.map(|t| t.as_str()).unwrap_or("-"),
            if m.record.owner.is_empty() { "-" } else { m.record.owner.as_str() },
            m.record.action.as_deref().unwrap_or("-"),
        ));
    }
    lines.join("\n")
}

pub fn committee_prompt(metrics: &[AssessedMetric]) -> String {
    format!("{}\n\n{}\n\n{}", PREAMBLE, metrics_context(metrics), INSTRUCTIONS)
}
