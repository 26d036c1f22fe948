use std::io::IsTerminal;
use std::path::PathBuf;

use owo_colors::OwoColorize;
use terminal_size::{terminal_size, Width};

use crate::ingest::RiskStatus;
use crate::pipeline::RunOutput;
use crate::portfolio::{count_by, ranked};
use crate::report::format_value;
use crate::scoring::{DiligenceStatus, Rag, Tier};

/// How loudly a label should be rendered on the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Ok,
    Warn,
    Alert,
    Critical,
}

impl From<Tier> for Severity {
    fn from(tier: Tier) -> Self {
        match tier {
            Tier::Low => Severity::Ok,
            Tier::Medium => Severity::Warn,
            Tier::High => Severity::Alert,
            Tier::Critical => Severity::Critical,
        }
    }
}

impl From<Rag> for Severity {
    fn from(rag: Rag) -> Self {
        match rag {
            Rag::Green => Severity::Ok,
            Rag::Amber => Severity::Warn,
            Rag::Red => Severity::Critical,
        }
    }
}

impl From<DiligenceStatus> for Severity {
    fn from(status: DiligenceStatus) -> Self {
        match status {
            DiligenceStatus::Approved => Severity::Ok,
            DiligenceStatus::Conditional => Severity::Warn,
            DiligenceStatus::Reject => Severity::Critical,
        }
    }
}

fn paint(text: &str, severity: Severity, use_colors: bool) -> String {
    if !use_colors {
        return text.to_string();
    }
    match severity {
        Severity::Ok => text.green().to_string(),
        Severity::Warn => text.yellow().to_string(),
        Severity::Alert => text.red().to_string(),
        Severity::Critical => text.red().bold().to_string(),
    }
}

/// One line of the ranked terminal table
pub struct SummaryRow {
    pub score: String,
    pub title: String,
    pub badge: String,
    pub severity: Severity,
}

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate title to fit available width, accounting for Unicode
fn truncate_title(title: &str, max_width: usize) -> String {
    let chars: Vec<char> = title.chars().collect();
    if chars.len() <= max_width {
        title.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Format rows as a ranked table: Index, Score, Title, Badge.
/// Score column is right-aligned, 7 chars wide (fits "100/100")
pub fn format_ranked_table(rows: &[SummaryRow], use_colors: bool) -> String {
    format_ranked_table_width(rows, use_colors, get_terminal_width())
}

fn format_ranked_table_width(
    rows: &[SummaryRow],
    use_colors: bool,
    term_width: Option<usize>,
) -> String {
    if rows.is_empty() {
        return "No records to show.".to_string();
    }

    let index_width = 3;
    let score_width = 7;
    let separator = "  ";

    rows.iter()
        .enumerate()
        .map(|(idx, row)| {
            let index_str = format!("{:>2}.", idx + 1);
            let score_padded = format!("{:>width$}", row.score, width = score_width);

            let fixed_width =
                index_width + 1 + score_width + separator.len() * 2 + row.badge.chars().count();
            let title = match term_width {
                Some(width) if width > fixed_width + 10 => {
                    truncate_title(&row.title, width - fixed_width)
                }
                // Very narrow terminal, show truncated
                Some(_) => truncate_title(&row.title, 20),
                None => row.title.clone(),
            };

            if use_colors {
                format!(
                    "{} {}{}{}{}{}",
                    index_str.dimmed(),
                    score_padded.bold(),
                    separator,
                    title,
                    separator,
                    paint(&row.badge, row.severity, true)
                )
            } else {
                format!(
                    "{} {}{}{}{}{}",
                    index_str, score_padded, separator, title, separator, row.badge
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn counts_line<K: Copy + PartialEq + std::fmt::Display>(
    counts: Vec<(K, usize)>,
    severity: impl Fn(K) -> Severity,
    use_colors: bool,
) -> String {
    counts
        .into_iter()
        .map(|(label, count)| paint(&format!("{} {}", label, count), severity(label), use_colors))
        .collect::<Vec<_>>()
        .join("  ")
}

/// The rows the terminal summary ranks for each variant, most severe first.
pub fn summary_rows(output: &RunOutput) -> Vec<SummaryRow> {
    match output {
        RunOutput::Register { risks, .. } => ranked(risks, |r| r.score as u32, |r| r.id.as_str())
            .into_iter()
            .map(|r| SummaryRow {
                score: format!("{}/25", r.score),
                title: format!("{} {}", r.id, r.title),
                badge: r.tier.to_string(),
                severity: r.tier.into(),
            })
            .collect(),
        RunOutput::Vendors { vendors, .. } => ranked(
            vendors,
            |v| v.assessment.residual,
            |v| v.record.vendor_name.as_str(),
        )
        .into_iter()
        .map(|v| {
            let flagged = if v.assessment.flags.any() { " !" } else { "" };
            SummaryRow {
                score: format!("{}/100", v.assessment.residual),
                title: v.record.vendor_name.clone(),
                badge: format!("{}{}", v.assessment.residual_tier, flagged),
                severity: v.assessment.residual_tier.into(),
            }
        })
        .collect(),
        RunOutput::Appetite { metrics, .. } => {
            let mut ordered: Vec<_> = metrics.iter().collect();
            ordered.sort_by_key(|m| std::cmp::Reverse(m.status.rag));
            ordered
                .into_iter()
                .map(|m| SummaryRow {
                    score: format_value(m.record.current),
                    title: m.record.metric.clone(),
                    badge: match m.status.trend {
                        Some(t) => format!("{} {}", m.status.rag, t.arrow()),
                        None => m.status.rag.to_string(),
                    },
                    severity: m.status.rag.into(),
                })
                .collect()
        }
        RunOutput::Diligence { results, .. } => {
            let mut ordered: Vec<_> = results.iter().collect();
            ordered.sort_by_key(|r| std::cmp::Reverse(r.resolution.status));
            ordered
                .into_iter()
                .map(|r| SummaryRow {
                    score: format!("{}R/{}A", r.resolution.red.len(), r.resolution.amber.len()),
                    title: r.vendor_name().to_string(),
                    badge: r.resolution.status.to_string(),
                    severity: r.resolution.status.into(),
                })
                .collect()
        }
    }
}

/// Headline counts for a run: one title line, one line of per-label counts.
pub fn format_headline(output: &RunOutput, use_colors: bool) -> String {
    let variant = output.variant();
    let title = format!(
        "{}: {} accepted, {} rejected",
        variant.title(),
        output.accepted(),
        output.rejected().len()
    );
    let title = if use_colors { title.bold().to_string() } else { title };

    let counts = match output {
        RunOutput::Register { risks, .. } => {
            let tiers = counts_line(
                count_by(risks, &Tier::REPORT_ORDER, |r| r.tier),
                Severity::from,
                use_colors,
            );
            let open = count_by(risks, &RiskStatus::REPORT_ORDER, |r| r.status)
                .into_iter()
                .map(|(status, count)| format!("{} {}", status, count))
                .collect::<Vec<_>>()
                .join("  ");
            format!("{}\n  {}", tiers, open)
        }
        RunOutput::Vendors { vendors, .. } => {
            let tiers = counts_line(
                count_by(vendors, &Tier::REPORT_ORDER, |v| v.assessment.residual_tier),
                Severity::from,
                use_colors,
            );
            let flagged = vendors.iter().filter(|v| v.assessment.flags.any()).count();
            format!("{}\n  {} vendor(s) with escalation flags", tiers, flagged)
        }
        RunOutput::Appetite { metrics, briefing, .. } => {
            let rags = counts_line(
                count_by(metrics, &Rag::REPORT_ORDER, |m| m.status.rag),
                Severity::from,
                use_colors,
            );
            let note = match briefing.text() {
                Some(_) => "AI briefing included".to_string(),
                None => "AI briefing unavailable".to_string(),
            };
            format!("{}\n  {}", rags, note)
        }
        RunOutput::Diligence { results, .. } => counts_line(
            count_by(results, &DiligenceStatus::REPORT_ORDER, |r| r.resolution.status),
            Severity::from,
            use_colors,
        ),
    };

    format!("{}\n  {}", title, counts)
}

/// Full terminal summary for a run: headline, ranked rows, written files.
pub fn format_summary(
    output: &RunOutput,
    written: &[PathBuf],
    limit: usize,
    use_colors: bool,
) -> String {
    let mut rows = summary_rows(output);
    rows.truncate(limit);

    let mut sections = vec![format_headline(output, use_colors)];
    if !rows.is_empty() {
        sections.push(format_ranked_table(&rows, use_colors));
    }
    if !written.is_empty() {
        let paths = written
            .iter()
            .map(|p| format!("  wrote {}", p.display()))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(if use_colors { paths.dimmed().to_string() } else { paths });
    }
    sections.join("\n")
}
