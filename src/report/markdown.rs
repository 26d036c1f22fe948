use chrono::NaiveDate;

use super::{format_value, ReportOptions};
use crate::briefing::BriefingStatus;
use crate::ingest::{IngestError, RiskRecord, RiskStatus};
use crate::pipeline::{AssessedMetric, ResolvedQuestionnaire, RunOutput, ScoredVendor, Variant};
use crate::portfolio::{count_by, due_soon, overdue, ranked, top_n};
use crate::scoring::register::REGISTER_BANDS;
use crate::scoring::vendor::{Certification, FactorLevel, VENDOR_BANDS};
use crate::scoring::{DiligenceStatus, Rag, Tier};

/// Render the committee-pack Markdown for a run.
pub fn render(output: &RunOutput, options: &ReportOptions) -> String {
    let lines = match output {
        RunOutput::Register { risks, rejected } => register(risks, rejected, options),
        RunOutput::Vendors { vendors, rejected } => vendors_pack(vendors, rejected, options),
        RunOutput::Appetite {
            metrics,
            rejected,
            briefing,
        } => appetite(metrics, rejected, briefing, options),
        RunOutput::Diligence { results, rejected } => diligence(results, rejected, options),
    };
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Escape a value for use inside a Markdown table cell.
fn cell(value: &str) -> String {
    let flat = value.replace(['\r', '\n'], " ").replace('|', "\\|");
    if flat.trim().is_empty() {
        "-".to_string()
    } else {
        flat
    }
}

fn row(cells: &[String]) -> String {
    format!("| {} |", cells.join(" | "))
}

fn table_header(columns: &[&str]) -> Vec<String> {
    vec![
        format!("| {} |", columns.join(" | ")),
        format!("|{}", "---|".repeat(columns.len())),
    ]
}

fn signed(delta: f64) -> String {
    let text = format_value(delta);
    if delta > 0.0 && text != "0" {
        format!("+{}", text)
    } else {
        text
    }
}

fn long_date(date: NaiveDate) -> String {
    date.format("%d %B %Y").to_string()
}

fn header(variant: Variant, framework: &str, options: &ReportOptions) -> Vec<String> {
    vec![
        format!("# {} - Committee Pack", variant.title()),
        format!("**Report Date:** {}  ", long_date(options.as_of)),
        "**Classification:** Internal - Risk & Compliance  ".to_string(),
        format!("**Framework:** {}", framework),
        String::new(),
        "---".to_string(),
        String::new(),
    ]
}

fn rejected_section(rejected: &[IngestError]) -> Vec<String> {
    let mut lines = vec!["## Rejected Records".to_string(), String::new()];
    if rejected.is_empty() {
        lines.push("All records were accepted.".to_string());
        return lines;
    }
    lines.push(format!(
        "{} record(s) were excluded from scoring and aggregates:",
        rejected.len()
    ));
    lines.push(String::new());
    lines.extend(table_header(&["Record", "Reason"]));
    for err in rejected {
        lines.push(row(&[cell(err.record()), cell(&err.reason())]));
    }
    lines
}

fn tier_range(bands: &crate::scoring::Bands<Tier>, tier: Tier) -> String {
    bands
        .range_of(tier)
        .map(|(low, high)| format!("{}-{}", low, high))
        .unwrap_or_else(|| "-".to_string())
}

fn register(
    risks: &[RiskRecord],
    rejected: &[IngestError],
    options: &ReportOptions,
) -> Vec<String> {
    let mut lines = header(
        Variant::Register,
        "ISO 27001:2022 · NIST CSF · FCA SYSC · UK GDPR",
        options,
    );

    lines.push("## Executive Summary".to_string());
    lines.push(String::new());
    lines.push(format!("Total risks assessed: **{}**", risks.len()));
    lines.push(String::new());
    lines.extend(table_header(&["Tier", "Score Range", "Count"]));
    for (tier, count) in count_by(risks, &Tier::REPORT_ORDER, |r| r.tier) {
        lines.push(row(&[
            format!("{} {}", tier.icon(), tier),
            tier_range(&REGISTER_BANDS, tier),
            count.to_string(),
        ]));
    }
    lines.push(String::new());
    lines.extend(table_header(&["Status", "Count"]));
    for (status, count) in count_by(risks, &RiskStatus::REPORT_ORDER, |r| r.status) {
        lines.push(row(&[status.to_string(), count.to_string()]));
    }

    lines.push(String::new());
    lines.push("### Overdue Reviews".to_string());
    lines.push(String::new());
    let late = overdue(risks, options.as_of, |r| Some(r.review_date));
    if late.is_empty() {
        lines.push("No reviews are overdue.".to_string());
    }
    for (risk, days) in late {
        lines.push(format!(
            "- **{}** - {} (overdue by {} days, owner: {})",
            risk.id, risk.title, days, risk.owner
        ));
    }

    lines.push(String::new());
    lines.push(format!(
        "### Reviews Due Within {} Days",
        options.due_soon_days
    ));
    lines.push(String::new());
    let soon = due_soon(risks, options.as_of, options.due_soon_days, |r| Some(r.review_date));
    if soon.is_empty() {
        lines.push("No reviews fall due in this window.".to_string());
    }
    for (risk, days) in soon {
        lines.push(format!(
            "- **{}** - {} (due in {} days, {})",
            risk.id, risk.title, days, risk.review_date
        ));
    }

    lines.push(String::new());
    lines.push("---".to_string());
    lines.push(String::new());
    lines.push(format!("## Top {} Risks", options.top_n));
    lines.push(String::new());
    for risk in top_n(risks, options.top_n, |r| r.score as u32, |r| r.id.as_str()) {
        lines.push(format!("### {} {} - {}", risk.tier.icon(), risk.id, risk.title));
        lines.push(format!(
            "**Category:** {}  |  **Owner:** {}  ",
            risk.category, risk.owner
        ));
        lines.push(format!(
            "**Score:** {}/25  |  **Tier:** {}  |  **Status:** {}  ",
            risk.score, risk.tier, risk.status
        ));
        lines.push(format!("**Controls:** {}  ", risk.controls));
        lines.push(format!("**Action:** {}  ", risk.action));
        lines.push(format!("**Framework Ref:** {}", risk.framework_ref));
        lines.push(String::new());
    }

    lines.push("---".to_string());
    lines.push(String::new());
    lines.push("## Full Risk Register".to_string());
    lines.push(String::new());
    lines.extend(table_header(&[
        "ID",
        "Title",
        "Category",
        "Owner",
        "L",
        "I",
        "Score",
        "Tier",
        "Review Date",
        "Status",
        "Framework Ref",
    ]));
    for risk in ranked(risks, |r| r.score as u32, |r| r.id.as_str()) {
        lines.push(row(&[
            cell(&risk.id),
            cell(&risk.title),
            cell(&risk.category),
            cell(&risk.owner),
            risk.likelihood.to_string(),
            risk.impact.to_string(),
            risk.score.to_string(),
            risk.tier.to_string(),
            risk.review_date.to_string(),
            risk.status.to_string(),
            cell(&risk.framework_ref),
        ]));
    }

    lines.push(String::new());
    lines.extend(rejected_section(rejected));
    lines
}

fn vendor_flags(vendor: &ScoredVendor) -> String {
    let flags = vendor.assessment.flags.descriptions();
    if flags.is_empty() {
        "-".to_string()
    } else {
        flags.join("; ")
    }
}

fn factor_row<F: FactorLevel>(name: &str, level: &F) -> String {
    row(&[
        name.to_string(),
        level.label().to_string(),
        format!("{}/{}", level.score(), F::MAX),
    ])
}

fn vendors_pack(
    vendors: &[ScoredVendor],
    rejected: &[IngestError],
    options: &ReportOptions,
) -> Vec<String> {
    let mut lines = header(
        Variant::Vendors,
        "ISO 27001:2022 · FCA SS2/21 · EBA GL/2019/02 · UK GDPR",
        options,
    );

    lines.push("## Executive Summary".to_string());
    lines.push(String::new());
    lines.push(format!("Vendors assessed: **{}**", vendors.len()));
    lines.push(String::new());
    lines.extend(table_header(&["Residual Tier", "Score Range", "Count"]));
    for (tier, count) in count_by(vendors, &Tier::REPORT_ORDER, |v| v.assessment.residual_tier) {
        lines.push(row(&[
            format!("{} {}", tier.icon(), tier),
            tier_range(&VENDOR_BANDS, tier),
            count.to_string(),
        ]));
    }
    lines.push(String::new());
    let count_flag = |f: fn(&ScoredVendor) -> bool| vendors.iter().filter(|v| f(v)).count();
    lines.extend(table_header(&["Escalation Flag", "Vendors"]));
    lines.push(row(&[
        "AI governance (no ISO 42001)".to_string(),
        count_flag(|v| v.assessment.flags.ai_governance).to_string(),
    ]));
    lines.push(row(&[
        "GDPR cross-border transfer".to_string(),
        count_flag(|v| v.assessment.flags.gdpr_cross_border).to_string(),
    ]));
    lines.push(row(&[
        "Material service in high-risk jurisdiction".to_string(),
        count_flag(|v| v.assessment.flags.critical_jurisdiction).to_string(),
    ]));

    lines.push(String::new());
    lines.push("### Overdue Reviews".to_string());
    lines.push(String::new());
    let late = overdue(vendors, options.as_of, |v| v.record.review_date);
    if late.is_empty() {
        lines.push("No vendor reviews are overdue.".to_string());
    }
    for (vendor, days) in late {
        lines.push(format!(
            "- **{}** - overdue by {} days (owner: {})",
            vendor.record.vendor_name,
            days,
            cell(&vendor.record.risk_owner)
        ));
    }

    fn residual(v: &ScoredVendor) -> u32 {
        v.assessment.residual
    }
    fn name(v: &ScoredVendor) -> &str {
        &v.record.vendor_name
    }

    lines.push(String::new());
    lines.push("---".to_string());
    lines.push(String::new());
    lines.push(format!("## Top {} Vendors by Residual Risk", options.top_n));
    lines.push(String::new());
    lines.extend(table_header(&["#", "Vendor", "Service", "Residual", "Tier", "Flags"]));
    for (i, vendor) in top_n(vendors, options.top_n, residual, name).iter().enumerate() {
        lines.push(row(&[
            (i + 1).to_string(),
            cell(&vendor.record.vendor_name),
            cell(&vendor.record.service_type),
            vendor.assessment.residual.to_string(),
            format!(
                "{} {}",
                vendor.assessment.residual_tier.icon(),
                vendor.assessment.residual_tier
            ),
            cell(&vendor_flags(vendor)),
        ]));
    }

    lines.push(String::new());
    lines.push("## Full Vendor Register".to_string());
    lines.push(String::new());
    lines.extend(table_header(&[
        "Vendor",
        "Service",
        "Materiality",
        "Inherent",
        "Inherent Tier",
        "Residual",
        "Residual Tier",
        "Owner",
        "Review Date",
        "Status",
    ]));
    for vendor in ranked(vendors, residual, name) {
        lines.push(row(&[
            cell(&vendor.record.vendor_name),
            cell(&vendor.record.service_type),
            vendor.record.outsourcing_type.to_string(),
            vendor.assessment.inherent.to_string(),
            vendor.assessment.inherent_tier.to_string(),
            vendor.assessment.residual.to_string(),
            vendor.assessment.residual_tier.to_string(),
            cell(&vendor.record.risk_owner),
            vendor
                .record
                .review_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
            cell(&vendor.record.status),
        ]));
    }

    lines.push(String::new());
    lines.push("## Vendor Detail".to_string());
    lines.push(String::new());
    for vendor in ranked(vendors, residual, name) {
        let r = &vendor.record;
        let a = &vendor.assessment;
        lines.push(format!("### {} {}", a.residual_tier.icon(), r.vendor_name));
        lines.push(format!(
            "**Inherent:** {}/100 ({})  |  **Residual:** {}/100 ({})  ",
            a.inherent, a.inherent_tier, a.residual, a.residual_tier
        ));
        lines.push(String::new());
        lines.extend(table_header(&["Factor", "Assessment", "Score"]));
        lines.push(factor_row("Data Sensitivity", &r.data_sensitivity));
        lines.push(factor_row("Hosting Location", &r.hosting_location));
        lines.push(factor_row("AI Usage", &r.ai_usage));
        lines.push(factor_row("Subcontractors", &r.subcontractors));
        lines.push(factor_row("Service Criticality", &r.service_criticality));
        lines.push(String::new());

        let certs: Vec<String> = r
            .certifications
            .iter()
            .map(|c| match Certification::from_id(c) {
                Some(cert) => format!("{} (-{})", cert.label(), cert.deduction()),
                None => format!("{} (no credit)", c),
            })
            .collect();
        lines.push(format!(
            "**Certifications:** {}  ",
            if certs.is_empty() { "None".to_string() } else { certs.join(", ") }
        ));
        lines.push(format!("**Escalation Flags:** {}", vendor_flags(vendor)));
        lines.push(String::new());

        if !a.control_domains.is_empty() {
            lines.push("**Control Domains Impacted:**".to_string());
            for domain in &a.control_domains {
                lines.push(format!("- {} *({})*", domain.domain, domain.reference));
            }
            lines.push(String::new());
        }

        lines.push("**Evidence Required:**".to_string());
        for item in &a.evidence_required {
            lines.push(format!("- [ ] {}", item));
        }
        lines.push(String::new());
    }

    lines.push("---".to_string());
    lines.push(String::new());
    lines.extend(rejected_section(rejected));
    lines
}

fn appetite(
    metrics: &[AssessedMetric],
    rejected: &[IngestError],
    briefing: &BriefingStatus,
    options: &ReportOptions,
) -> Vec<String> {
    let mut lines = header(
        Variant::Appetite,
        "ISO 27001:2022 · FCA SYSC · UK GDPR · ISO 42001:2023",
        options,
    );

    lines.push("## Executive Summary".to_string());
    lines.push(String::new());
    lines.push(format!("Metrics tracked: **{}**", metrics.len()));
    lines.push(String::new());
    lines.extend(table_header(&["RAG", "Count"]));
    for (rag, count) in count_by(metrics, &Rag::REPORT_ORDER, |m| m.status.rag) {
        lines.push(row(&[format!("{} {}", rag.icon(), rag), count.to_string()]));
    }

    lines.push(String::new());
    lines.push("### Committee Briefing".to_string());
    lines.push(String::new());
    match briefing {
        BriefingStatus::Available(text) => lines.push(text.clone()),
        BriefingStatus::Unavailable(reason) => {
            lines.push(format!("_AI briefing unavailable: {}._", reason))
        }
    }

    lines.push(String::new());
    lines.push("### Tolerance Breaches".to_string());
    lines.push(String::new());
    let breaches: Vec<&AssessedMetric> = metrics.iter().filter(|m| m.status.breach()).collect();
    if breaches.is_empty() {
        lines.push("No metric is beyond tolerance.".to_string());
    }
    for m in breaches {
        lines.push(format!(
            "- **{}**: {}{} against tolerance {} (owner: {}). Action: {}",
            m.record.metric,
            format_value(m.record.current),
            m.record.unit(),
            format_value(m.record.tolerance),
            cell(&m.record.owner),
            m.record.action.as_deref().unwrap_or("-")
        ));
    }

    lines.push(String::new());
    lines.push("---".to_string());
    lines.push(String::new());
    lines.push("## Metrics".to_string());
    lines.push(String::new());
    lines.extend(table_header(&[
        "Metric",
        "Owner",
        "Current",
        "Appetite",
        "Tolerance",
        "Direction",
        "RAG",
        "Trend",
        "Change",
    ]));
    let mut ordered: Vec<&AssessedMetric> = metrics.iter().collect();
    ordered.sort_by_key(|m| std::cmp::Reverse(m.status.rag));
    for m in ordered {
        lines.push(row(&[
            cell(&m.record.metric),
            cell(&m.record.owner),
            format!("{}{}", format_value(m.record.current), m.record.unit()),
            format_value(m.record.appetite),
            format_value(m.record.tolerance),
            m.record.direction.label().to_string(),
            format!("{} {}", m.status.rag.icon(), m.status.rag),
            m.status
                .trend
                .map(|t| format!("{} {}", t.arrow(), t))
                .unwrap_or_else(|| "-".to_string()),
            m.status
                .period_change
                .map(signed)
                .unwrap_or_else(|| "-".to_string()),
        ]));
    }

    lines.push(String::new());
    lines.extend(rejected_section(rejected));
    lines
}

fn diligence(
    results: &[ResolvedQuestionnaire],
    rejected: &[IngestError],
    options: &ReportOptions,
) -> Vec<String> {
    let mut lines = header(
        Variant::Diligence,
        "ISO 27001:2022 · FCA SS2/21 · EBA GL/2019/02 · UK GDPR Art.28",
        options,
    );

    lines.push("## Executive Summary".to_string());
    lines.push(String::new());
    lines.push(format!(
        "Due diligence validation completed for **{} suppliers**.",
        results.len()
    ));
    lines.push(String::new());
    lines.extend(table_header(&["Status", "Count"]));
    let counts = count_by(results, &DiligenceStatus::REPORT_ORDER, |r| r.resolution.status);
    for (status, count) in counts {
        lines.push(row(&[format!("{} {}", status.icon(), status), count.to_string()]));
    }

    let mut ordered: Vec<&ResolvedQuestionnaire> = results.iter().collect();
    ordered.sort_by_key(|r| std::cmp::Reverse(r.resolution.status));

    lines.push(String::new());
    lines.extend(table_header(&[
        "Supplier", "Service", "Materiality", "Red", "Amber", "Missing", "Status",
    ]));
    for r in &ordered {
        let q = &r.questionnaire;
        lines.push(row(&[
            cell(r.vendor_name()),
            cell(q.service_type.as_deref().unwrap_or("")),
            q.materiality()
                .map(|m| m.to_string())
                .unwrap_or_else(|| "-".to_string()),
            r.resolution.red.len().to_string(),
            r.resolution.amber.len().to_string(),
            r.resolution.missing.len().to_string(),
            format!("{} {}", r.resolution.status.icon(), r.resolution.status),
        ]));
    }

    lines.push(String::new());
    lines.push("---".to_string());
    lines.push(String::new());
    lines.push("## Supplier Assessment Detail".to_string());
    lines.push(String::new());
    for r in &ordered {
        let q = &r.questionnaire;
        let res = &r.resolution;
        let text = |v: &Option<String>| {
            v.as_deref()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or("-")
                .to_string()
        };

        lines.push(format!("### {} {}", res.status.icon(), r.vendor_name()));
        lines.push(format!("**Service:** {}  ", text(&q.service_type)));
        lines.push(format!("**Contact:** {}  ", text(&q.contact_name)));
        lines.push(format!("**Outsourcing Type:** {}  ", text(&q.outsourcing_type)));
        lines.push(format!("**Data Classification:** {}  ", text(&q.data_classification)));
        lines.push(format!("**Data Residency:** {}  ", text(&q.data_residency)));
        lines.push(format!("**Assurance Status:** {}", res.status));
        lines.push(String::new());
        lines.push("**Rationale:**".to_string());
        for reason in &res.rationale {
            lines.push(format!("- {}", reason));
        }
        lines.push(String::new());

        if !res.red.is_empty() {
            lines.push("**🔴 Red Risks:**".to_string());
            for f in &res.red {
                lines.push(format!("- {} *(Ref: {})*", f.message, f.reference));
            }
            lines.push(String::new());
        }
        if !res.amber.is_empty() {
            let title = if res.escalated {
                "**🔴 Amber Risks (escalated for material supplier):**"
            } else {
                "**⚠ Amber Risks:**"
            };
            lines.push(title.to_string());
            for f in &res.amber {
                lines.push(format!("- {} *(Ref: {})*", f.message, f.reference));
            }
            lines.push(String::new());
        }
        lines.push("---".to_string());
        lines.push(String::new());
    }

    lines.push("## Methodology".to_string());
    lines.push(String::new());
    lines.push(
        "**Reject**: mandatory fields missing, critical control failures, or amber risks \
         on a material or critical supplier.  "
            .to_string(),
    );
    lines.push(
        "**Conditional**: amber risks requiring remediation within an agreed timeframe.  "
            .to_string(),
    );
    lines.push(
        "**Approved**: all mandatory controls satisfied and no risks identified.".to_string(),
    );
    lines.push(String::new());
    lines.extend(rejected_section(rejected));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::register::parse_register;
    use crate::ingest::REGISTER_HEADERS;

    fn register_rows(rows: &[&str]) -> Vec<RiskRecord> {
        let mut data = REGISTER_HEADERS.join(",");
        for r in rows {
            data.push('\n');
            data.push_str(r);
        }
        parse_register(&data).unwrap().records
    }

    fn options() -> ReportOptions {
        ReportOptions {
            as_of: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            top_n: 2,
            due_soon_days: 30,
        }
    }

    #[test]
    fn test_cell_escapes_pipes_and_newlines() {
        assert_eq!(cell("a|b\nc"), "a\\|b c");
        assert_eq!(cell("  "), "-");
    }

    #[test]
    fn test_table_header() {
        assert_eq!(table_header(&["A", "B"]), vec!["| A | B |", "|---|---|"]);
    }

    #[test]
    fn test_register_pack_sections() {
        let risks = register_rows(&[
            "R-001,Ransomware,Cyber,CISO,4,5,EDR,Patch,2026-09-01,Open,A.8.7",
            "R-002,Late filing,Regulatory,CCO,2,3,Calendar,Automate,2026-10-20,Closed,SYSC",
            "R-003,Vendor outage,TPRM,COO,3,4,BCP,Test,2027-01-01,In Progress,A.5.30",
        ]);
        let rejected = vec![IngestError::malformed(
            "R-004",
            "likelihood must be between 1 and 5, got 9",
        )];
        let md = render(
            &RunOutput::Register { risks, rejected },
            &options(),
        );

        assert!(md.starts_with("# Compliance Risk Register - Committee Pack"));
        assert!(md.contains("**Report Date:** 01 October 2026"));
        assert!(md.contains("| 🔴 CRITICAL | 20-25 | 1 |"));
        assert!(md.contains("| 🟢 LOW | 1-5 | 0 |"));
        assert!(md.contains("- **R-001** - Ransomware (overdue by 30 days, owner: CISO)"));
        assert!(md.contains("- **R-002** - Late filing (due in 19 days, 2026-10-20)"));
        assert!(md.contains("## Top 2 Risks"));
        assert!(md.contains("### 🔴 R-001 - Ransomware"));
        assert!(md.contains("### 🟠 R-003 - Vendor outage"));
        assert!(!md.contains("### 🟡 R-002"));
        assert!(md.contains("| R-004 | likelihood must be between 1 and 5, got 9 |"));
    }

    #[test]
    fn test_signed_change() {
        assert_eq!(signed(2.0), "+2");
        assert_eq!(signed(-1.5), "-1.5");
        assert_eq!(signed(0.0), "0");
        assert_eq!(signed(-0.001), "0");
        assert_eq!(signed(0.001), "0");
    }

    #[test]
    fn test_empty_rejected_section() {
        let lines = rejected_section(&[]);
        assert_eq!(lines.last().unwrap(), "All records were accepted.");
    }
}
