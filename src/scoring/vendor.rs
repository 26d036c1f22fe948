use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::bands::Bands;
use super::error::ScoringError;
use super::materiality::Materiality;
use super::tier::Tier;

/// Raw factor sum that normalizes to a full score of 100.
///
/// The five factor maxima (30 + 20 + 15 + 15 + 20) add up to 100, so raw
/// sums above this divisor saturate at [`MAX_SCORE`].
pub const NORMALIZING_SUM: u32 = 90;

/// Ceiling of the normalized inherent and residual scores.
pub const MAX_SCORE: u32 = 100;

/// Vendor tiers over the normalized 0–100 score.
pub const VENDOR_BANDS: Bands<Tier> = Bands::new(
    0,
    &[
        (25, Tier::Low),
        (50, Tier::Medium),
        (75, Tier::High),
        (100, Tier::Critical),
    ],
);

/// A categorical answer that maps onto a bounded factor sub-score.
pub trait FactorLevel {
    const MAX: u8;

    fn score(&self) -> u8;
    fn label(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSensitivity {
    Public,
    Internal,
    Confidential,
    HighlyConfidential,
}

impl FactorLevel for DataSensitivity {
    const MAX: u8 = 30;

    fn score(&self) -> u8 {
        match self {
            DataSensitivity::Public => 0,
            DataSensitivity::Internal => 10,
            DataSensitivity::Confidential => 20,
            DataSensitivity::HighlyConfidential => 30,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            DataSensitivity::Public => "Public",
            DataSensitivity::Internal => "Internal",
            DataSensitivity::Confidential => "Confidential",
            DataSensitivity::HighlyConfidential => "Highly Confidential",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostingLocation {
    Uk,
    Eu,
    Us,
    Other,
    HighRisk,
}

impl FactorLevel for HostingLocation {
    const MAX: u8 = 20;

    fn score(&self) -> u8 {
        match self {
            HostingLocation::Uk | HostingLocation::Eu => 5,
            HostingLocation::Us => 10,
            HostingLocation::Other => 15,
            HostingLocation::HighRisk => 20,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            HostingLocation::Uk => "United Kingdom",
            HostingLocation::Eu => "European Union",
            HostingLocation::Us => "United States",
            HostingLocation::Other => "Other Jurisdiction",
            HostingLocation::HighRisk => "High-Risk Jurisdiction",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiUsage {
    None,
    Internal,
    ThirdParty,
    Autonomous,
}

impl FactorLevel for AiUsage {
    const MAX: u8 = 15;

    fn score(&self) -> u8 {
        match self {
            AiUsage::None => 0,
            AiUsage::Internal => 5,
            AiUsage::ThirdParty => 10,
            AiUsage::Autonomous => 15,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            AiUsage::None => "No AI Usage",
            AiUsage::Internal => "Internal AI Tools",
            AiUsage::ThirdParty => "Third-Party AI",
            AiUsage::Autonomous => "Autonomous AI Decision-Making",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subcontractors {
    None,
    Low,
    Medium,
    High,
}

impl FactorLevel for Subcontractors {
    const MAX: u8 = 15;

    fn score(&self) -> u8 {
        match self {
            Subcontractors::None => 0,
            Subcontractors::Low => 5,
            Subcontractors::Medium => 10,
            Subcontractors::High => 15,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Subcontractors::None => "None",
            Subcontractors::Low => "1-2 Subcontractors",
            Subcontractors::Medium => "3-5 Subcontractors",
            Subcontractors::High => "5+ Subcontractors",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCriticality {
    Low,
    Medium,
    High,
    Critical,
}

impl FactorLevel for ServiceCriticality {
    const MAX: u8 = 20;

    fn score(&self) -> u8 {
        match self {
            ServiceCriticality::Low => 5,
            ServiceCriticality::Medium => 10,
            ServiceCriticality::High => 15,
            ServiceCriticality::Critical => 20,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ServiceCriticality::Low => "Low",
            ServiceCriticality::Medium => "Medium",
            ServiceCriticality::High => "High",
            ServiceCriticality::Critical => "Critical",
        }
    }
}

/// Certifications that earn a residual-risk deduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Certification {
    Iso27001,
    Soc2Type2,
    PciDss,
    Gdpr,
    Iso42001,
    CyberEssentials,
}

impl Certification {
    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim().to_ascii_lowercase().as_str() {
            "iso_27001" => Some(Certification::Iso27001),
            "soc2_type2" => Some(Certification::Soc2Type2),
            "pci_dss" => Some(Certification::PciDss),
            "gdpr" => Some(Certification::Gdpr),
            "iso_42001" => Some(Certification::Iso42001),
            "cyber_essentials" => Some(Certification::CyberEssentials),
            _ => None,
        }
    }

    pub fn deduction(&self) -> u32 {
        match self {
            Certification::Iso27001 => 10,
            Certification::Soc2Type2 => 8,
            Certification::PciDss => 7,
            Certification::Gdpr => 5,
            Certification::Iso42001 => 5,
            Certification::CyberEssentials => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Certification::Iso27001 => "ISO 27001:2022",
            Certification::Soc2Type2 => "SOC 2 Type II",
            Certification::PciDss => "PCI DSS",
            Certification::Gdpr => "GDPR Compliance",
            Certification::Iso42001 => "ISO 42001 (AI Governance)",
            Certification::CyberEssentials => "Cyber Essentials Plus",
        }
    }

    fn evidence(&self) -> &'static [&'static str] {
        match self {
            Certification::Iso27001 => &[
                "ISO 27001 certificate + Statement of Applicability (SoA)",
                "Most recent internal audit report (or surveillance audit summary)",
            ],
            Certification::Soc2Type2 => &[
                "SOC 2 Type II report (confirm scope + coverage period)",
                "Bridge letter if report is > 6 months old",
            ],
            Certification::PciDss => &[
                "PCI DSS Attestation of Compliance (AoC)",
                "Cardholder data environment scope diagram",
            ],
            Certification::Gdpr => &[
                "Data Processing Agreement (DPA)",
                "Record of Processing Activities (RoPA) extract (or equivalent evidence)",
            ],
            Certification::Iso42001 => &[
                "ISO 42001 certificate",
                "AI governance documentation (model cards, oversight, change management)",
            ],
            Certification::CyberEssentials => &[],
        }
    }
}

/// Deduction for a certification identifier; unknown identifiers deduct nothing.
pub fn deduction(id: &str) -> u32 {
    Certification::from_id(id).map(|c| c.deduction()).unwrap_or(0)
}

/// Five factor sub-scores, each bounded by its declared maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VendorFactors {
    data_sensitivity: u8,
    hosting_location: u8,
    ai_usage: u8,
    subcontractors: u8,
    service_criticality: u8,
}

impl VendorFactors {
    pub fn new(
        data_sensitivity: u8,
        hosting_location: u8,
        ai_usage: u8,
        subcontractors: u8,
        service_criticality: u8,
    ) -> Result<Self, ScoringError> {
        check_factor("data_sensitivity", data_sensitivity, DataSensitivity::MAX)?;
        check_factor("hosting_location", hosting_location, HostingLocation::MAX)?;
        check_factor("ai_usage", ai_usage, AiUsage::MAX)?;
        check_factor("subcontractors", subcontractors, Subcontractors::MAX)?;
        check_factor("service_criticality", service_criticality, ServiceCriticality::MAX)?;
        Ok(Self {
            data_sensitivity,
            hosting_location,
            ai_usage,
            subcontractors,
            service_criticality,
        })
    }

    pub fn sum(&self) -> u32 {
        self.data_sensitivity as u32
            + self.hosting_location as u32
            + self.ai_usage as u32
            + self.subcontractors as u32
            + self.service_criticality as u32
    }

    pub fn data_sensitivity(&self) -> u8 {
        self.data_sensitivity
    }

    pub fn hosting_location(&self) -> u8 {
        self.hosting_location
    }

    pub fn ai_usage(&self) -> u8 {
        self.ai_usage
    }

    pub fn subcontractors(&self) -> u8 {
        self.subcontractors
    }

    pub fn service_criticality(&self) -> u8 {
        self.service_criticality
    }
}

fn check_factor(field: &'static str, value: u8, max: u8) -> Result<(), ScoringError> {
    if value <= max {
        Ok(())
    } else {
        Err(ScoringError::InvalidInput {
            field,
            value: value as u32,
            min: 0,
            max: max as u32,
        })
    }
}

/// Inherent score normalized to 0–100: round(100 × sum / 90), capped at 100.
///
/// `10 × sum / 9` never lands exactly on a half, so integer rounding matches
/// round-half-to-even.
pub fn score_inherent(factors: &VendorFactors) -> u32 {
    let scaled = (factors.sum() * MAX_SCORE + NORMALIZING_SUM / 2) / NORMALIZING_SUM;
    scaled.min(MAX_SCORE)
}

/// Inherent score less the deduction of each distinct certification held, floored at 0.
pub fn score_residual(inherent: u32, certifications: &[String]) -> u32 {
    let distinct: BTreeSet<String> = certifications
        .iter()
        .map(|c| c.trim().to_ascii_lowercase())
        .collect();
    let total: u32 = distinct.iter().map(|c| deduction(c)).sum();
    inherent.saturating_sub(total)
}

/// The scoring-relevant part of a vendor assessment input.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorProfile {
    pub data_sensitivity: DataSensitivity,
    pub hosting_location: HostingLocation,
    pub ai_usage: AiUsage,
    pub subcontractors: Subcontractors,
    pub service_criticality: ServiceCriticality,
    pub certifications: Vec<String>,
    pub materiality: Materiality,
}

impl VendorProfile {
    pub fn factors(&self) -> Result<VendorFactors, ScoringError> {
        VendorFactors::new(
            self.data_sensitivity.score(),
            self.hosting_location.score(),
            self.ai_usage.score(),
            self.subcontractors.score(),
            self.service_criticality.score(),
        )
    }

    pub fn holds(&self, certification: Certification) -> bool {
        self.certifications
            .iter()
            .any(|c| Certification::from_id(c) == Some(certification))
    }
}

/// Jurisdiction sets driving the GDPR and critical-jurisdiction flags.
#[derive(Debug, Clone, PartialEq)]
pub struct JurisdictionPolicy {
    pub approved: Vec<HostingLocation>,
    pub high_risk: Vec<HostingLocation>,
}

impl Default for JurisdictionPolicy {
    fn default() -> Self {
        Self {
            approved: vec![HostingLocation::Uk, HostingLocation::Eu],
            high_risk: vec![HostingLocation::HighRisk],
        }
    }
}

/// Boolean escalations derived from raw fields, independent of the score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EscalationFlags {
    pub ai_governance: bool,
    pub gdpr_cross_border: bool,
    pub critical_jurisdiction: bool,
}

impl EscalationFlags {
    pub fn any(&self) -> bool {
        self.ai_governance || self.gdpr_cross_border || self.critical_jurisdiction
    }

    /// Human-readable flag descriptions in a fixed order.
    pub fn descriptions(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.ai_governance {
            out.push("AI Governance Flag: ISO 42001 certification absent");
        }
        if self.gdpr_cross_border {
            out.push("GDPR Cross-Border Transfer Flag");
        }
        if self.critical_jurisdiction {
            out.push("Material service hosted in high-risk jurisdiction");
        }
        out
    }
}

pub fn escalation_flags(profile: &VendorProfile, policy: &JurisdictionPolicy) -> EscalationFlags {
    EscalationFlags {
        ai_governance: profile.ai_usage.score() > 0 && !profile.holds(Certification::Iso42001),
        gdpr_cross_border: !policy.approved.contains(&profile.hosting_location),
        critical_jurisdiction: policy.high_risk.contains(&profile.hosting_location)
            && profile.materiality.is_material(),
    }
}

const BASE_EVIDENCE: &[&str] = &[
    "Completed Third-Party Security Questionnaire",
    "Business Continuity and Disaster Recovery test results (within 12 months)",
    "Penetration test summary (within 12 months)",
    "Subprocessor / fourth-party list",
    "Data flow and hosting architecture diagram",
];

/// Evidence to request for the assurance review, de-duplicated in first-seen order.
pub fn evidence_required(profile: &VendorProfile, flags: &EscalationFlags) -> Vec<String> {
    let mut items: Vec<&str> = BASE_EVIDENCE.to_vec();

    for cert in profile.certifications.iter().filter_map(|c| Certification::from_id(c)) {
        items.extend_from_slice(cert.evidence());
    }
    if matches!(profile.ai_usage, AiUsage::ThirdParty | AiUsage::Autonomous) {
        items.push("AI governance pack (model cards, DPIA, evaluation results)");
    }
    if flags.gdpr_cross_border {
        items.push(
            "Standard Contractual Clauses (SCCs) / adequacy evidence + Transfer Impact Assessment (TIA)",
        );
    }
    if matches!(profile.subcontractors, Subcontractors::Medium | Subcontractors::High) {
        items.push("Fourth-party risk management policy / subcontractor oversight evidence");
    }

    let mut seen = BTreeSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(*item))
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlDomain {
    pub domain: &'static str,
    pub reference: &'static str,
}

/// Governance domains impacted by factors at or above their threshold.
pub fn control_domains(factors: &VendorFactors) -> Vec<ControlDomain> {
    let checks = [
        (
            factors.data_sensitivity(),
            20,
            ControlDomain {
                domain: "Information Classification",
                reference: "ISO 27001 A.5.12 / A.8.10",
            },
        ),
        (
            factors.hosting_location(),
            10,
            ControlDomain {
                domain: "Cross-Border Transfer Controls",
                reference: "UK GDPR Art.44 / ISO 27001 A.5.19",
            },
        ),
        (
            factors.ai_usage(),
            10,
            ControlDomain {
                domain: "AI Governance & Oversight",
                reference: "ISO 42001 / FCA AI Principles",
            },
        ),
        (
            factors.subcontractors(),
            10,
            ControlDomain {
                domain: "Supplier Relationship Mgmt",
                reference: "ISO 27001 A.5.19-A.5.22",
            },
        ),
        (
            factors.service_criticality(),
            15,
            ControlDomain {
                domain: "Business Continuity / DR",
                reference: "ISO 27001 A.5.29-A.5.30",
            },
        ),
    ];

    checks
        .into_iter()
        .filter(|(score, threshold, _)| score >= threshold)
        .map(|(_, _, domain)| domain)
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct VendorAssessment {
    pub factors: VendorFactors,
    pub inherent: u32,
    pub inherent_tier: Tier,
    pub residual: u32,
    pub residual_tier: Tier,
    pub flags: EscalationFlags,
    pub evidence_required: Vec<String>,
    pub control_domains: Vec<ControlDomain>,
}

pub fn assess_vendor(
    profile: &VendorProfile,
    policy: &JurisdictionPolicy,
) -> Result<VendorAssessment, ScoringError> {
    let factors = profile.factors()?;
    let inherent = score_inherent(&factors);
    let residual = score_residual(inherent, &profile.certifications);
    let inherent_tier = VENDOR_BANDS
        .classify(inherent)
        .ok_or(ScoringError::Unbanded { score: inherent })?;
    let residual_tier = VENDOR_BANDS
        .classify(residual)
        .ok_or(ScoringError::Unbanded { score: residual })?;
    let flags = escalation_flags(profile, policy);

    Ok(VendorAssessment {
        factors,
        inherent,
        inherent_tier,
        residual,
        residual_tier,
        flags,
        evidence_required: evidence_required(profile, &flags),
        control_domains: control_domains(&factors),
    })
}
