use anyhow::Result;
use chrono::NaiveDate;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::briefing::{self, BriefingStatus};
use crate::config::BriefingConfig;
use crate::ingest::{self, IngestError, MetricRecord, RiskRecord, VendorRecord};
use crate::report;
use crate::scoring::appetite::evaluate;
use crate::scoring::diligence::resolve;
use crate::scoring::vendor::assess_vendor;
use crate::scoring::{MetricStatus, Questionnaire, Resolution, ScoringConfig, VendorAssessment};

/// The four report variants the tool produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Register,
    Vendors,
    Appetite,
    Diligence,
}

impl Variant {
    pub const ALL: [Variant; 4] = [
        Variant::Register,
        Variant::Vendors,
        Variant::Appetite,
        Variant::Diligence,
    ];

    /// Input file name under the data directory.
    pub fn input_file(&self) -> &'static str {
        match self {
            Variant::Register => "risk_register.csv",
            Variant::Vendors => "vendors.json",
            Variant::Appetite => "metrics.json",
            Variant::Diligence => "questionnaires.json",
        }
    }

    /// Report file stem; `.md` and `.csv` are appended.
    pub fn report_stem(&self) -> &'static str {
        match self {
            Variant::Register => "register_report",
            Variant::Vendors => "vendor_report",
            Variant::Appetite => "appetite_report",
            Variant::Diligence => "diligence_report",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Variant::Register => "Compliance Risk Register",
            Variant::Vendors => "Third-Party Risk Assessment",
            Variant::Appetite => "Risk Appetite & Metrics",
            Variant::Diligence => "Supplier Due Diligence Validation",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Variant::Register => "register",
            Variant::Vendors => "vendors",
            Variant::Appetite => "appetite",
            Variant::Diligence => "diligence",
        };
        f.write_str(name)
    }
}

/// Everything a run needs besides the input files themselves.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub data_dir: PathBuf,
    pub out_dir: PathBuf,
    pub as_of: NaiveDate,
    pub scoring: ScoringConfig,
    /// `None` skips the AI briefing entirely
    pub briefing: Option<BriefingConfig>,
}

impl RunContext {
    pub fn input_path(&self, variant: Variant) -> PathBuf {
        self.data_dir.join(variant.input_file())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredVendor {
    pub record: VendorRecord,
    pub assessment: VendorAssessment,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssessedMetric {
    pub record: MetricRecord,
    pub status: MetricStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedQuestionnaire {
    pub questionnaire: Questionnaire,
    pub resolution: Resolution,
}

impl ResolvedQuestionnaire {
    pub fn vendor_name(&self) -> &str {
        self.questionnaire
            .vendor_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("Unknown")
    }
}

/// Classified records of one variant plus the records turned away.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutput {
    Register {
        risks: Vec<RiskRecord>,
        rejected: Vec<IngestError>,
    },
    Vendors {
        vendors: Vec<ScoredVendor>,
        rejected: Vec<IngestError>,
    },
    Appetite {
        metrics: Vec<AssessedMetric>,
        rejected: Vec<IngestError>,
        briefing: BriefingStatus,
    },
    Diligence {
        results: Vec<ResolvedQuestionnaire>,
        rejected: Vec<IngestError>,
    },
}

impl RunOutput {
    pub fn variant(&self) -> Variant {
        match self {
            RunOutput::Register { .. } => Variant::Register,
            RunOutput::Vendors { .. } => Variant::Vendors,
            RunOutput::Appetite { .. } => Variant::Appetite,
            RunOutput::Diligence { .. } => Variant::Diligence,
        }
    }

    pub fn accepted(&self) -> usize {
        match self {
            RunOutput::Register { risks, .. } => risks.len(),
            RunOutput::Vendors { vendors, .. } => vendors.len(),
            RunOutput::Appetite { metrics, .. } => metrics.len(),
            RunOutput::Diligence { results, .. } => results.len(),
        }
    }

    pub fn rejected(&self) -> &[IngestError] {
        match self {
            RunOutput::Register { rejected, .. }
            | RunOutput::Vendors { rejected, .. }
            | RunOutput::Appetite { rejected, .. }
            | RunOutput::Diligence { rejected, .. } => rejected,
        }
    }
}

/// Failures that abort a run, split by the stage they came from.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0:#}")]
    Input(anyhow::Error),

    #[error("{0:#}")]
    Write(anyhow::Error),
}

pub fn score_vendors(
    records: Vec<VendorRecord>,
    scoring: &ScoringConfig,
) -> (Vec<ScoredVendor>, Vec<IngestError>) {
    let policy = scoring.jurisdiction_policy();
    let mut scored = Vec::new();
    let mut rejected = Vec::new();
    for record in records {
        match assess_vendor(&record.profile(), &policy) {
            Ok(assessment) => scored.push(ScoredVendor { record, assessment }),
            Err(e) => {
                rejected.push(IngestError::malformed(record.vendor_name.clone(), e.to_string()))
            }
        }
    }
    (scored, rejected)
}

pub fn assess_metrics(records: Vec<MetricRecord>) -> (Vec<AssessedMetric>, Vec<IngestError>) {
    let mut assessed = Vec::new();
    let mut rejected = Vec::new();
    for record in records {
        match evaluate(
            record.current,
            record.appetite,
            record.tolerance,
            record.direction,
            record.prior_value(),
        ) {
            Ok(status) => assessed.push(AssessedMetric { record, status }),
            Err(e) => rejected.push(IngestError::malformed(record.metric.clone(), e.to_string())),
        }
    }
    (assessed, rejected)
}

pub fn resolve_questionnaires(
    questionnaires: Vec<Questionnaire>,
    as_of: NaiveDate,
    scoring: &ScoringConfig,
) -> Vec<ResolvedQuestionnaire> {
    let policy = scoring.diligence_policy();
    questionnaires
        .into_iter()
        .map(|questionnaire| {
            let resolution = resolve(&questionnaire, as_of, &policy);
            ResolvedQuestionnaire {
                questionnaire,
                resolution,
            }
        })
        .collect()
}

fn log_rejections(variant: Variant, rejected: &[IngestError]) {
    for err in rejected {
        warn!(%variant, "record rejected: {}", err);
    }
}

/// Load one variant's input file and classify every admitted record.
///
/// File-level failures are errors; per-record problems are carried in the output.
pub async fn load_and_score(variant: Variant, ctx: &RunContext) -> Result<RunOutput> {
    let path = ctx.input_path(variant);
    debug!(%variant, path = %path.display(), "loading input");

    let output = match variant {
        Variant::Register => {
            let outcome = ingest::load_register(&path)?;
            RunOutput::Register {
                risks: outcome.records,
                rejected: outcome.rejected,
            }
        }
        Variant::Vendors => {
            let outcome = ingest::load_vendors(&path)?;
            let (vendors, unscored) = score_vendors(outcome.records, &ctx.scoring);
            let mut rejected = outcome.rejected;
            rejected.extend(unscored);
            RunOutput::Vendors { vendors, rejected }
        }
        Variant::Appetite => {
            let outcome = ingest::load_metrics(&path)?;
            let (metrics, unassessed) = assess_metrics(outcome.records);
            let mut rejected = outcome.rejected;
            rejected.extend(unassessed);
            let briefing = match ctx.briefing {
                Some(ref config) => briefing::committee_briefing(config, &metrics).await,
                None => BriefingStatus::Unavailable("disabled".to_string()),
            };
            RunOutput::Appetite {
                metrics,
                rejected,
                briefing,
            }
        }
        Variant::Diligence => {
            let outcome = ingest::load_questionnaires(&path)?;
            RunOutput::Diligence {
                results: resolve_questionnaires(outcome.records, ctx.as_of, &ctx.scoring),
                rejected: outcome.rejected,
            }
        }
    };

    log_rejections(variant, output.rejected());
    info!(
        %variant,
        accepted = output.accepted(),
        rejected = output.rejected().len(),
        "classified records"
    );
    Ok(output)
}

/// Render and write the Markdown and CSV reports for a run.
pub fn write_reports(output: &RunOutput, ctx: &RunContext) -> Result<Vec<PathBuf>> {
    let options = report::ReportOptions::from_context(ctx);
    let stem = output.variant().report_stem();

    let markdown = report::markdown::render(output, &options);
    let csv = report::csv::render(output, &options)?;

    let written = vec![
        report::write_report(&ctx.out_dir, &format!("{}.md", stem), &markdown)?,
        report::write_report(&ctx.out_dir, &format!("{}.csv", stem), &csv)?,
    ];
    for path in &written {
        info!(path = %path.display(), "report written");
    }
    Ok(written)
}

/// Load, classify and report one variant.
pub async fn execute(
    variant: Variant,
    ctx: &RunContext,
) -> Result<(RunOutput, Vec<PathBuf>), PipelineError> {
    let output = load_and_score(variant, ctx)
        .await
        .map_err(PipelineError::Input)?;
    let written = write_reports(&output, ctx).map_err(PipelineError::Write)?;
    Ok((output, written))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{DiligenceStatus, Direction, Rag};

    #[test]
    fn test_variant_files() {
        assert_eq!(Variant::Register.input_file(), "risk_register.csv");
        assert_eq!(Variant::Diligence.report_stem(), "diligence_report");
        assert_eq!(Variant::Appetite.to_string(), "appetite");
    }

    #[test]
    fn test_assess_metrics_uses_history_for_prior() {
        let record = MetricRecord {
            metric: "Policy Exceptions Active".to_string(),
            owner: String::new(),
            current: 2.0,
            appetite: 2.0,
            tolerance: 4.0,
            direction: Direction::LowerIsBetter,
            prior: None,
            unit: None,
            period: None,
            action: None,
            framework: None,
            history: vec![1.0, 1.0, 2.0],
        };
        let (assessed, rejected) = assess_metrics(vec![record]);
        assert!(rejected.is_empty());
        assert_eq!(assessed[0].status.rag, Rag::Green);
        assert_eq!(assessed[0].status.period_change, Some(0.0));
    }

    #[test]
    fn test_resolve_questionnaires_keeps_order() {
        let as_of = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        let qs = vec![
            Questionnaire {
                vendor_name: Some("First".to_string()),
                ..Default::default()
            },
            Questionnaire::default(),
        ];
        let results = resolve_questionnaires(qs, as_of, &ScoringConfig::default());
        assert_eq!(results[0].vendor_name(), "First");
        assert_eq!(results[1].vendor_name(), "Unknown");
        assert!(results
            .iter()
            .all(|r| r.resolution.status == DiligenceStatus::Reject));
    }
}
