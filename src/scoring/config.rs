use serde::{Deserialize, Serialize};

use super::diligence::{DiligencePolicy, DEFAULT_HIGH_RISK_JURISDICTIONS};
use super::vendor::{HostingLocation, JurisdictionPolicy};

pub const DEFAULT_DUE_SOON_DAYS: i64 = 30;
pub const DEFAULT_TOP_N: usize = 5;
pub const DEFAULT_PEN_TEST_MAX_AGE_DAYS: i64 = 365;

/// Tunables for the classifiers and portfolio views.
///
/// Every field is optional; absent fields fall back to the built-in default.
///
/// Example YAML:
/// ```yaml
/// scoring:
///   due_soon_days: 45
///   top_n: 10
///   approved_hosting: [uk, eu]
///   high_risk_hosting: [high_risk, other]
///   pen_test_max_age_days: 365
///   high_risk_jurisdictions: ["russia", "north korea"]
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    /// Reviews due within this many days are flagged as due soon (default: 30)
    #[serde(default)]
    pub due_soon_days: Option<i64>,

    /// Number of records in the "top risks" section (default: 5)
    #[serde(default)]
    pub top_n: Option<usize>,

    /// Hosting locations that need no cross-border transfer mechanism (default: [uk, eu])
    #[serde(default)]
    pub approved_hosting: Option<Vec<HostingLocation>>,

    /// Hosting locations that escalate material vendors (default: [high_risk])
    #[serde(default)]
    pub high_risk_hosting: Option<Vec<HostingLocation>>,

    /// Pen tests older than this are an amber finding (default: 365)
    #[serde(default)]
    pub pen_test_max_age_days: Option<i64>,

    /// Free-text residency names treated as high-risk in questionnaires
    #[serde(default)]
    pub high_risk_jurisdictions: Option<Vec<String>>,
}

impl ScoringConfig {
    pub fn due_soon_days(&self) -> i64 {
        self.due_soon_days.unwrap_or(DEFAULT_DUE_SOON_DAYS)
    }

    pub fn top_n(&self) -> usize {
        self.top_n.unwrap_or(DEFAULT_TOP_N)
    }

    pub fn jurisdiction_policy(&self) -> JurisdictionPolicy {
        let defaults = JurisdictionPolicy::default();
        JurisdictionPolicy {
            approved: self.approved_hosting.clone().unwrap_or(defaults.approved),
            high_risk: self.high_risk_hosting.clone().unwrap_or(defaults.high_risk),
        }
    }

    pub fn diligence_policy(&self) -> DiligencePolicy {
        DiligencePolicy {
            pen_test_max_age_days: self
                .pen_test_max_age_days
                .unwrap_or(DEFAULT_PEN_TEST_MAX_AGE_DAYS),
            high_risk_jurisdictions: self.high_risk_jurisdictions.clone().unwrap_or_else(|| {
                DEFAULT_HIGH_RISK_JURISDICTIONS
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            }),
        }
    }
}
