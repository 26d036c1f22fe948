use anyhow::{Context, Result};

use super::{exact_value, serde_name, ReportOptions};
use crate::ingest::{RiskRecord, REGISTER_HEADERS};
use crate::pipeline::{AssessedMetric, ResolvedQuestionnaire, RunOutput, ScoredVendor};
use crate::portfolio::{ranked, review_status};
use crate::scoring::{Answer, Questionnaire};

/// Render the CSV mirror of a run: the input columns plus the computed ones.
///
/// Rows follow the same order as the Markdown tables. Rejected records are
/// not exported.
pub fn render(output: &RunOutput, options: &ReportOptions) -> Result<String> {
    let mut wtr = ::csv::Writer::from_writer(vec![]);

    let (header, rows) = match output {
        RunOutput::Register { risks, .. } => register(risks, options),
        RunOutput::Vendors { vendors, .. } => vendors_rows(vendors, options),
        RunOutput::Appetite { metrics, .. } => appetite(metrics),
        RunOutput::Diligence { results, .. } => diligence(results),
    };

    wtr.write_record(&header).context("Failed to write CSV header")?;
    for row in rows {
        wtr.write_record(&row).context("Failed to write CSV row")?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e))?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

type Table = (Vec<String>, Vec<Vec<String>>);

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn opt(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

fn register(risks: &[RiskRecord], options: &ReportOptions) -> Table {
    let mut header = columns(&REGISTER_HEADERS);
    header.extend(columns(&["score", "tier", "days_until_review", "overdue", "due_soon"]));

    let rows = ranked(risks, |r| r.score as u32, |r| r.id.as_str())
        .into_iter()
        .map(|r| {
            let review = review_status(r.review_date, options.as_of, options.due_soon_days);
            vec![
                r.id.clone(),
                r.title.clone(),
                r.category.clone(),
                r.owner.clone(),
                r.likelihood.to_string(),
                r.impact.to_string(),
                r.controls.clone(),
                r.action.clone(),
                r.review_date.to_string(),
                r.status.to_string(),
                r.framework_ref.clone(),
                r.score.to_string(),
                r.tier.to_string(),
                review.days_until.to_string(),
                review.overdue.to_string(),
                review.due_soon.to_string(),
            ]
        })
        .collect();
    (header, rows)
}

fn vendors_rows(vendors: &[ScoredVendor], options: &ReportOptions) -> Table {
    let header = columns(&[
        "vendor_name",
        "service_type",
        "data_sensitivity",
        "hosting_location",
        "ai_usage",
        "subcontractors",
        "service_criticality",
        "certifications",
        "outsourcing_type",
        "risk_owner",
        "review_date",
        "status",
        "inherent_score",
        "inherent_tier",
        "residual_score",
        "residual_tier",
        "ai_governance_flag",
        "gdpr_cross_border_flag",
        "critical_jurisdiction_flag",
        "review_overdue",
    ]);

    let rows = ranked(
        vendors,
        |v| v.assessment.residual,
        |v| v.record.vendor_name.as_str(),
    )
    .into_iter()
    .map(|v| {
        let r = &v.record;
        let a = &v.assessment;
        let overdue = r
            .review_date
            .map(|d| review_status(d, options.as_of, options.due_soon_days).overdue)
            .unwrap_or(false);
        vec![
            r.vendor_name.clone(),
            r.service_type.clone(),
            serde_name(&r.data_sensitivity),
            serde_name(&r.hosting_location),
            serde_name(&r.ai_usage),
            serde_name(&r.subcontractors),
            serde_name(&r.service_criticality),
            r.certifications.join(";"),
            serde_name(&r.outsourcing_type),
            r.risk_owner.clone(),
            r.review_date.map(|d| d.to_string()).unwrap_or_default(),
            r.status.clone(),
            a.inherent.to_string(),
            a.inherent_tier.to_string(),
            a.residual.to_string(),
            a.residual_tier.to_string(),
            a.flags.ai_governance.to_string(),
            a.flags.gdpr_cross_border.to_string(),
            a.flags.critical_jurisdiction.to_string(),
            overdue.to_string(),
        ]
    })
    .collect();
    (header, rows)
}

fn appetite(metrics: &[AssessedMetric]) -> Table {
    let header = columns(&[
        "metric",
        "owner",
        "current",
        "appetite",
        "tolerance",
        "direction",
        "prior",
        "unit",
        "period",
        "action",
        "framework",
        "rag",
        "trend",
        "period_change",
        "breach",
    ]);

    let mut ordered: Vec<&AssessedMetric> = metrics.iter().collect();
    ordered.sort_by_key(|m| std::cmp::Reverse(m.status.rag));

    let rows = ordered
        .into_iter()
        .map(|m| {
            let r = &m.record;
            vec![
                r.metric.clone(),
                r.owner.clone(),
                exact_value(r.current),
                exact_value(r.appetite),
                exact_value(r.tolerance),
                serde_name(&r.direction),
                r.prior_value().map(exact_value).unwrap_or_default(),
                r.unit().to_string(),
                opt(r.period.as_deref()),
                opt(r.action.as_deref()),
                opt(r.framework.as_deref()),
                m.status.rag.to_string(),
                m.status.trend.map(|t| t.to_string()).unwrap_or_default(),
                m.status.period_change.map(exact_value).unwrap_or_default(),
                m.status.breach().to_string(),
            ]
        })
        .collect();
    (header, rows)
}

/// Raw control answer: booleans as `true`/`false`, text as submitted.
fn answer(value: Option<&Answer>) -> String {
    match value {
        Some(Answer::Flag(b)) => b.to_string(),
        Some(Answer::Text(s)) => s.clone(),
        None => String::new(),
    }
}

fn diligence(results: &[ResolvedQuestionnaire]) -> Table {
    let mut header = columns(&["vendor_name", "service_type", "outsourcing_type"]);
    header.extend(
        Questionnaire::default()
            .controls()
            .iter()
            .map(|(field, _)| field.to_string()),
    );
    header.extend(columns(&[
        "certifications",
        "penetration_test_date",
        "data_residency",
        "contact_name",
        "data_classification",
        "status",
        "missing_fields",
        "red_findings",
        "amber_findings",
        "escalated",
        "rationale",
    ]));

    let mut ordered: Vec<&ResolvedQuestionnaire> = results.iter().collect();
    ordered.sort_by_key(|r| std::cmp::Reverse(r.resolution.status));

    let rows = ordered
        .into_iter()
        .map(|r| {
            let q = &r.questionnaire;
            let res = &r.resolution;
            let mut row = vec![
                opt(q.vendor_name.as_deref()),
                opt(q.service_type.as_deref()),
                opt(q.outsourcing_type.as_deref()),
            ];
            row.extend(q.controls().iter().map(|(_, value)| answer(*value)));
            row.extend([
                q.certifications
                    .as_ref()
                    .map(|c| c.join(";"))
                    .unwrap_or_default(),
                opt(q.penetration_test_date.as_deref()),
                opt(q.data_residency.as_deref()),
                opt(q.contact_name.as_deref()),
                opt(q.data_classification.as_deref()),
                res.status.to_string(),
                res.missing.len().to_string(),
                res.red.len().to_string(),
                res.amber.len().to_string(),
                res.escalated.to_string(),
                res.rationale.join("; "),
            ]);
            row
        })
        .collect();
    (header, rows)
}
