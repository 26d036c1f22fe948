use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::materiality::Materiality;

/// A control answer as submitted: either a JSON boolean or a yes/no string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Flag(bool),
    Text(String),
}

impl Answer {
    fn is_blank(&self) -> bool {
        matches!(self, Answer::Text(s) if s.trim().is_empty())
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Answer::Flag(b) => !b,
            Answer::Text(s) => {
                let s = s.trim().to_ascii_lowercase();
                s == "no" || s == "false"
            }
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Flag(true) => f.write_str("Yes"),
            Answer::Flag(false) => f.write_str("No"),
            Answer::Text(s) => f.write_str(s),
        }
    }
}

/// A supplier's due-diligence submission. Every field may be absent in the
/// source document; absence is judged by [`resolve`], not by deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Questionnaire {
    pub vendor_name: Option<String>,
    pub service_type: Option<String>,
    pub outsourcing_type: Option<String>,
    pub encryption_at_rest: Option<Answer>,
    pub encryption_in_transit: Option<Answer>,
    pub mfa_enforced: Option<Answer>,
    pub incident_response_plan: Option<Answer>,
    pub bcdr_tested: Option<Answer>,
    pub subprocessors_disclosed: Option<Answer>,
    pub vulnerability_management: Option<Answer>,
    pub access_control_policy: Option<Answer>,
    pub certifications: Option<Vec<String>>,
    pub penetration_test_date: Option<String>,
    pub data_residency: Option<String>,
    pub contact_name: Option<String>,
    pub data_classification: Option<String>,
}

impl Questionnaire {
    pub fn materiality(&self) -> Option<Materiality> {
        self.outsourcing_type.as_deref()?.parse().ok()
    }

    /// The eight control answers with their field names, in schema order.
    pub fn controls(&self) -> [(&'static str, Option<&Answer>); 8] {
        [
            ("encryption_at_rest", self.encryption_at_rest.as_ref()),
            ("encryption_in_transit", self.encryption_in_transit.as_ref()),
            ("mfa_enforced", self.mfa_enforced.as_ref()),
            ("incident_response_plan", self.incident_response_plan.as_ref()),
            ("bcdr_tested", self.bcdr_tested.as_ref()),
            ("subprocessors_disclosed", self.subprocessors_disclosed.as_ref()),
            ("vulnerability_management", self.vulnerability_management.as_ref()),
            ("access_control_policy", self.access_control_policy.as_ref()),
        ]
    }

    /// Mandatory fields that are absent or empty, in schema order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let text = |v: &Option<String>| v.as_deref().map_or(true, |s| s.trim().is_empty());
        let answer = |v: Option<&Answer>| v.map_or(true, Answer::is_blank);

        let mut missing = Vec::new();
        if text(&self.vendor_name) {
            missing.push("vendor_name");
        }
        if text(&self.service_type) {
            missing.push("service_type");
        }
        if self.materiality().is_none() {
            missing.push("outsourcing_type");
        }
        for (field, value) in self.controls() {
            if answer(value) {
                missing.push(field);
            }
        }
        // An explicit empty list is an answer ("none held"), not an omission.
        if self.certifications.is_none() {
            missing.push("certifications");
        }
        if text(&self.penetration_test_date) {
            missing.push("penetration_test_date");
        }
        if text(&self.data_residency) {
            missing.push("data_residency");
        }
        if text(&self.contact_name) {
            missing.push("contact_name");
        }
        missing
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DiligenceStatus {
    Approved,
    Conditional,
    Reject,
}

impl DiligenceStatus {
    pub const REPORT_ORDER: [DiligenceStatus; 3] = [
        DiligenceStatus::Reject,
        DiligenceStatus::Conditional,
        DiligenceStatus::Approved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiligenceStatus::Approved => "Approved",
            DiligenceStatus::Conditional => "Conditional",
            DiligenceStatus::Reject => "Reject",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            DiligenceStatus::Approved => "✅",
            DiligenceStatus::Conditional => "⚠️",
            DiligenceStatus::Reject => "❌",
        }
    }
}

impl fmt::Display for DiligenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub field: &'static str,
    pub message: String,
    pub reference: &'static str,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.reference)
    }
}

fn red_rule(field: &str) -> Option<(&'static str, &'static str)> {
    let rule = match field {
        "encryption_at_rest" => ("No encryption at rest - data exposure risk", "ISO 27001 A.8.24"),
        "encryption_in_transit" => (
            "No encryption in transit - interception risk",
            "ISO 27001 A.8.24",
        ),
        "mfa_enforced" => ("MFA not enforced - unauthorised access risk", "ISO 27001 A.5.17"),
        "incident_response_plan" => (
            "No incident response plan - regulatory breach risk",
            "ISO 27001 A.5.26",
        ),
        "bcdr_tested" => ("BCP/DR not tested - resilience risk", "ISO 27001 A.5.30"),
        "subprocessors_disclosed" => (
            "Subprocessors not disclosed - fourth-party risk",
            "ISO 27001 A.5.19 / UK GDPR Art.28",
        ),
        "vulnerability_management" => (
            "No vulnerability management process - patching risk",
            "ISO 27001 A.8.8",
        ),
        "access_control_policy" => (
            "No access control policy - privilege escalation risk",
            "ISO 27001 A.5.15",
        ),
        _ => return None,
    };
    Some(rule)
}

/// Tunables for the amber checks.
#[derive(Debug, Clone, PartialEq)]
pub struct DiligencePolicy {
    pub pen_test_max_age_days: i64,
    pub high_risk_jurisdictions: Vec<String>,
}

pub const DEFAULT_HIGH_RISK_JURISDICTIONS: &[&str] = &[
    "china",
    "prc",
    "mainland china",
    "hong kong",
    "russia",
    "russian federation",
    "ru",
    "iran",
    "iran (tehran)",
    "ir",
    "north korea",
    "dprk",
    "kp",
    "belarus",
    "by",
];

impl Default for DiligencePolicy {
    fn default() -> Self {
        Self {
            pen_test_max_age_days: 365,
            high_risk_jurisdictions: DEFAULT_HIGH_RISK_JURISDICTIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

fn words(s: &str) -> Vec<String> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// True when the jurisdiction's words appear as a contiguous run in the residency.
pub fn matches_jurisdiction(residency: &str, jurisdiction: &str) -> bool {
    let haystack = words(residency);
    let needle = words(jurisdiction);
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle.as_slice())
}

fn red_findings(q: &Questionnaire) -> Vec<Finding> {
    q.controls()
        .into_iter()
        .filter(|(_, answer)| answer.is_some_and(Answer::is_negative))
        .filter_map(|(field, _)| {
            red_rule(field).map(|(message, reference)| Finding {
                field,
                message: message.to_string(),
                reference,
            })
        })
        .collect()
}

fn amber_findings(
    q: &Questionnaire,
    assessed_on: NaiveDate,
    policy: &DiligencePolicy,
) -> Vec<Finding> {
    let mut findings = Vec::new();

    if let Some(raw) = q
        .penetration_test_date
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(tested) => {
                let age = (assessed_on - tested).num_days();
                if age > policy.pen_test_max_age_days {
                    findings.push(Finding {
                        field: "penetration_test_date",
                        message: format!(
                            "Pen test is {} days old (limit {} days)",
                            age, policy.pen_test_max_age_days
                        ),
                        reference: "ISO 27001 A.8.8 / FCA SS2/21",
                    });
                }
            }
            Err(_) => findings.push(Finding {
                field: "penetration_test_date",
                message: format!("Invalid pen test date format: {}", raw),
                reference: "ISO 27001 A.8.8",
            }),
        }
    }

    if q.certifications.as_ref().is_some_and(|c| c.is_empty()) {
        findings.push(Finding {
            field: "certifications",
            message: "No certifications held - limited independent assurance".to_string(),
            reference: "ISO 27001 A.5.19",
        });
    }

    if let Some(residency) = q.data_residency.as_deref() {
        if policy
            .high_risk_jurisdictions
            .iter()
            .any(|j| matches_jurisdiction(residency, j))
        {
            findings.push(Finding {
                field: "data_residency",
                message: format!("Data residency in high-risk jurisdiction: {}", residency.trim()),
                reference: "UK GDPR Art.44 / FCA SS2/21",
            });
        }
    }

    findings
}

/// Outcome of the gate sequence for one questionnaire.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub status: DiligenceStatus,
    pub rationale: Vec<String>,
    pub missing: Vec<&'static str>,
    pub red: Vec<Finding>,
    pub amber: Vec<Finding>,
    pub escalated: bool,
}

/// Run the completeness, red-risk and amber/escalation gates in that order.
///
/// All findings are collected for reporting; the first gate that fires
/// decides the status and the rationale.
pub fn resolve(q: &Questionnaire, assessed_on: NaiveDate, policy: &DiligencePolicy) -> Resolution {
    let missing = q.missing_fields();
    let red = red_findings(q);
    let amber = amber_findings(q, assessed_on, policy);
    let material = q.materiality().is_some_and(|m| m.is_material());

    let mut rationale = Vec::new();
    let mut escalated = false;

    let status = if !missing.is_empty() {
        rationale.push("Incomplete submission".to_string());
        rationale.extend(missing.iter().map(|f| format!("Missing mandatory field: {}", f)));
        DiligenceStatus::Reject
    } else if !red.is_empty() {
        rationale.extend(red.iter().map(|f| format!("Critical control failure: {}", f)));
        DiligenceStatus::Reject
    } else if !amber.is_empty() && material {
        escalated = true;
        let label = q.materiality().map(|m| m.label()).unwrap_or("Material");
        rationale.push(format!(
            "Escalated: {} amber finding(s) on a {} supplier",
            amber.len(),
            label
        ));
        rationale.extend(amber.iter().map(ToString::to_string));
        DiligenceStatus::Reject
    } else if !amber.is_empty() {
        rationale.extend(amber.iter().map(ToString::to_string));
        DiligenceStatus::Conditional
    } else {
        rationale.push("All mandatory controls satisfied and no risks identified".to_string());
        DiligenceStatus::Approved
    };

    Resolution {
        status,
        rationale,
        missing,
        red,
        amber,
        escalated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yes() -> Option<Answer> {
        Some(Answer::Flag(true))
    }

    fn complete() -> Questionnaire {
        Questionnaire {
            vendor_name: Some("Acme Cloud".to_string()),
            service_type: Some("Hosting".to_string()),
            outsourcing_type: Some("non-material".to_string()),
            encryption_at_rest: yes(),
            encryption_in_transit: yes(),
            mfa_enforced: yes(),
            incident_response_plan: yes(),
            bcdr_tested: yes(),
            subprocessors_disclosed: yes(),
            vulnerability_management: yes(),
            access_control_policy: yes(),
            certifications: Some(vec!["iso_27001".to_string()]),
            penetration_test_date: Some("2026-03-01".to_string()),
            data_residency: Some("United Kingdom".to_string()),
            contact_name: Some("J. Smith".to_string()),
            data_classification: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 1).unwrap()
    }

    fn run(q: &Questionnaire) -> Resolution {
        resolve(q, today(), &DiligencePolicy::default())
    }

    #[test]
    fn test_complete_clean_submission_approved() {
        let r = run(&complete());
        assert_eq!(r.status, DiligenceStatus::Approved);
        assert_eq!(
            r.rationale,
            vec!["All mandatory controls satisfied and no risks identified".to_string()]
        );
    }

    #[test]
    fn test_missing_field_rejects_as_incomplete() {
        let mut q = complete();
        q.contact_name = Some("  ".to_string());
        let r = run(&q);
        assert_eq!(r.status, DiligenceStatus::Reject);
        assert_eq!(r.rationale[0], "Incomplete submission");
        assert_eq!(r.missing, vec!["contact_name"]);
    }

    #[test]
    fn test_false_is_an_answer_not_missing() {
        let mut q = complete();
        q.bcdr_tested = Some(Answer::Flag(false));
        assert!(q.missing_fields().is_empty());
    }

    #[test]
    fn test_unknown_materiality_is_missing() {
        let mut q = complete();
        q.outsourcing_type = Some("strategic".to_string());
        assert_eq!(q.missing_fields(), vec!["outsourcing_type"]);
    }

    #[test]
    fn test_mfa_no_rejects_regardless_of_materiality() {
        for mat in ["non-material", "material", "critical"] {
            let mut q = complete();
            q.outsourcing_type = Some(mat.to_string());
            q.mfa_enforced = Some(Answer::Text("No".to_string()));
            let r = run(&q);
            assert_eq!(r.status, DiligenceStatus::Reject);
            assert!(r.rationale[0].starts_with("Critical control failure: MFA not enforced"));
        }
    }

    #[test]
    fn test_red_rationale_lists_each_failing_control() {
        let mut q = complete();
        q.encryption_at_rest = Some(Answer::Flag(false));
        q.access_control_policy = Some(Answer::Text("false".to_string()));
        let r = run(&q);
        assert_eq!(r.red.len(), 2);
        assert_eq!(r.rationale.len(), 2);
        assert!(r.rationale[1].contains("ISO 27001 A.5.15"));
    }

    #[test]
    fn test_stale_pen_test_conditional_for_non_material() {
        let mut q = complete();
        q.penetration_test_date = Some("2025-09-01".to_string());
        let r = run(&q);
        assert_eq!(r.status, DiligenceStatus::Conditional);
        assert_eq!(r.amber.len(), 1);
        assert_eq!(r.amber[0].message, "Pen test is 395 days old (limit 365 days)");
    }

    #[test]
    fn test_stale_pen_test_uses_configured_limit() {
        let mut q = complete();
        q.penetration_test_date = Some("2026-03-01".to_string());
        assert_eq!(run(&q).status, DiligenceStatus::Approved);

        let policy = DiligencePolicy {
            pen_test_max_age_days: 180,
            ..Default::default()
        };
        let r = resolve(&q, today(), &policy);
        assert_eq!(r.status, DiligenceStatus::Conditional);
        assert_eq!(r.amber[0].message, "Pen test is 214 days old (limit 180 days)");
    }

    #[test]
    fn test_pen_test_exactly_one_year_is_fine() {
        let mut q = complete();
        q.penetration_test_date = Some("2025-10-01".to_string());
        assert_eq!(run(&q).status, DiligenceStatus::Approved);
    }

    #[test]
    fn test_amber_escalates_for_material() {
        let mut q = complete();
        q.outsourcing_type = Some("material".to_string());
        q.certifications = Some(vec![]);
        let r = run(&q);
        assert_eq!(r.status, DiligenceStatus::Reject);
        assert!(r.escalated);
        assert!(r.rationale[0].starts_with("Escalated: 1 amber finding(s)"));
    }

    #[test]
    fn test_invalid_pen_test_date_is_amber() {
        let mut q = complete();
        q.penetration_test_date = Some("last spring".to_string());
        let r = run(&q);
        assert_eq!(r.status, DiligenceStatus::Conditional);
        assert_eq!(r.amber[0].field, "penetration_test_date");
    }

    #[test]
    fn test_high_risk_residency() {
        let mut q = complete();
        q.data_residency = Some("Hong Kong SAR".to_string());
        assert_eq!(run(&q).status, DiligenceStatus::Conditional);
    }

    #[test]
    fn test_jurisdiction_matches_whole_words() {
        assert!(matches_jurisdiction("Russia", "russia"));
        assert!(matches_jurisdiction("Iran (Tehran)", "iran (tehran)"));
        assert!(!matches_jurisdiction("Ireland", "ir"));
        assert!(!matches_jurisdiction("Germany, Hamburg", "by"));
        assert!(!matches_jurisdiction("Hong", "hong kong"));
    }

    #[test]
    fn test_answer_deserializes_bool_or_text() {
        let q: Questionnaire =
            serde_json::from_str(r#"{"mfa_enforced": "no", "bcdr_tested": true}"#).unwrap();
        assert_eq!(q.mfa_enforced, Some(Answer::Text("no".to_string())));
        assert_eq!(q.bcdr_tested, Some(Answer::Flag(true)));
        assert!(q.certifications.is_none());
    }
}
