use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use risk_bro::briefing::BriefingStatus;
use risk_bro::pipeline::{execute, PipelineError, RunContext, RunOutput, Variant};
use risk_bro::scoring::{DiligenceStatus, Rag, ScoringConfig};

fn sample_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("sample_data")
}

fn context(data_dir: PathBuf, out_dir: PathBuf) -> RunContext {
    RunContext {
        data_dir,
        out_dir,
        as_of: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
        scoring: ScoringConfig::default(),
        briefing: None,
    }
}

fn read(path: &PathBuf) -> String {
    fs::read_to_string(path).unwrap()
}

#[tokio::test]
async fn register_run_writes_both_reports() {
    let out = TempDir::new().unwrap();
    let ctx = context(sample_dir(), out.path().join("reports"));

    let (output, written) = execute(Variant::Register, &ctx).await.unwrap();
    assert_eq!(output.accepted(), 10);
    assert!(output.rejected().is_empty());
    assert_eq!(
        written,
        vec![
            out.path().join("reports").join("register_report.md"),
            out.path().join("reports").join("register_report.csv"),
        ]
    );

    let md = read(&written[0]);
    assert!(md.contains("**Report Date:** 01 October 2026"));
    assert!(md.contains("| 🔴 CRITICAL | 20-25 | 2 |"));
    assert!(md.contains("- **R-007** - Late regulatory returns (overdue by 31 days"));
    assert!(md.contains(
        "- **R-005** - Unapproved use of generative AI tools (due in 4 days, 2026-10-05)"
    ));
    assert!(md.contains("## Top 5 Risks"));
    assert!(md.contains("All records were accepted."));

    let csv = read(&written[1]);
    let mut lines = csv.lines();
    assert!(lines
        .next()
        .unwrap()
        .ends_with("framework_ref,score,tier,days_until_review,overdue,due_soon"));
    // Ties on score fall back to identifier order
    assert!(lines.next().unwrap().starts_with("R-001,"));
    assert!(lines.next().unwrap().starts_with("R-009,"));
    assert_eq!(csv.lines().count(), 11);
}

#[tokio::test]
async fn vendor_run_lists_rejected_record() {
    let out = TempDir::new().unwrap();
    let ctx = context(sample_dir(), out.path().to_path_buf());

    let (output, written) = execute(Variant::Vendors, &ctx).await.unwrap();
    assert_eq!(output.accepted(), 6);
    assert_eq!(output.rejected().len(), 1);
    assert_eq!(output.rejected()[0].record(), "Mystery Vendor");

    let md = read(&written[0]);
    assert!(md.contains("## Rejected Records"));
    assert!(md.contains("| Mystery Vendor |"));
    assert!(
        md.contains("### 🔴 OffshoreDev Partners") || md.contains("### 🟠 OffshoreDev Partners")
    );
    assert!(md.contains("Material service in high-risk jurisdiction"));

    let csv = read(&written[1]);
    assert!(!csv.contains("Mystery Vendor"));
    assert!(csv.contains("iso_27001;soc2_type2;cyber_essentials"));
}

#[tokio::test]
async fn appetite_run_without_briefing() {
    let out = TempDir::new().unwrap();
    let ctx = context(sample_dir(), out.path().to_path_buf());

    let (output, written) = execute(Variant::Appetite, &ctx).await.unwrap();
    let RunOutput::Appetite { metrics, briefing, .. } = &output else {
        panic!("expected appetite output");
    };
    assert_eq!(metrics.len(), 10);
    assert_eq!(briefing, &BriefingStatus::Unavailable("disabled".to_string()));

    let count = |rag: Rag| metrics.iter().filter(|m| m.status.rag == rag).count();
    assert_eq!(count(Rag::Red), 1);
    assert_eq!(count(Rag::Amber), 8);
    assert_eq!(count(Rag::Green), 1);

    let md = read(&written[0]);
    assert!(md.contains("_AI briefing unavailable: disabled._"));
    assert!(md.contains("- **Critical Vulnerabilities Open**: 12 against tolerance 10"));

    let csv = read(&written[1]);
    assert!(csv
        .lines()
        .nth(1)
        .unwrap()
        .starts_with("Critical Vulnerabilities Open,CISO,12,5,10,lower_is_better,10,"));
}

#[tokio::test]
async fn diligence_run_resolves_every_gate() {
    let out = TempDir::new().unwrap();
    let ctx = context(sample_dir(), out.path().to_path_buf());

    let (output, written) = execute(Variant::Diligence, &ctx).await.unwrap();
    let RunOutput::Diligence { results, rejected } = &output else {
        panic!("expected diligence output");
    };
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].record(), "record 6");

    let status_of = |name: &str| {
        results
            .iter()
            .find(|r| r.vendor_name() == name)
            .map(|r| r.resolution.status)
            .unwrap()
    };
    assert_eq!(status_of("CloudCore Hosting Ltd"), DiligenceStatus::Approved);
    assert_eq!(status_of("PrintRight Stationery"), DiligenceStatus::Conditional);
    assert_eq!(status_of("HR Cloud Suite"), DiligenceStatus::Reject);
    assert_eq!(status_of("OffshoreDev Partners"), DiligenceStatus::Reject);
    assert_eq!(status_of("QuickForms Ltd"), DiligenceStatus::Reject);

    let md = read(&written[0]);
    assert!(md.contains("| ❌ Reject | 3 |"));
    assert!(md.contains("Data residency in high-risk jurisdiction: Ireland and Russia"));
    assert!(md.contains("Escalated: 1 amber finding(s) on a Material supplier"));
    assert!(md.contains("Missing mandatory field: mfa_enforced"));

    let csv = read(&written[1]);
    let header = csv.lines().next().unwrap();
    assert!(header.starts_with("vendor_name,service_type,outsourcing_type,encryption_at_rest,"));
    assert!(header.contains(
        ",certifications,penetration_test_date,data_residency,contact_name,data_classification,status,"
    ));
    assert!(csv.lines().any(|l| l.starts_with(
        "OffshoreDev Partners,Application development,material,true,true,no,true,false,true,true,true,,2025-12-01,India,Raj Mehta,,Reject,"
    )));
}

#[tokio::test]
async fn missing_input_is_an_input_error() {
    let data = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let ctx = context(data.path().to_path_buf(), out.path().to_path_buf());

    let err = execute(Variant::Register, &ctx).await.unwrap_err();
    assert!(matches!(err, PipelineError::Input(_)));
    assert!(err.to_string().contains("risk_register.csv"));
    assert!(fs::read_dir(out.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn non_array_json_is_an_input_error() {
    let data = TempDir::new().unwrap();
    fs::write(data.path().join("vendors.json"), r#"{"vendor_name": "Solo"}"#).unwrap();
    let out = TempDir::new().unwrap();
    let ctx = context(data.path().to_path_buf(), out.path().to_path_buf());

    let err = execute(Variant::Vendors, &ctx).await.unwrap_err();
    assert!(matches!(err, PipelineError::Input(_)));
}

#[tokio::test]
async fn unwritable_output_is_a_write_error() {
    let out = TempDir::new().unwrap();
    let blocker = out.path().join("reports");
    fs::write(&blocker, "not a directory").unwrap();
    let ctx = context(sample_dir(), blocker.join("nested"));

    let err = execute(Variant::Register, &ctx).await.unwrap_err();
    assert!(matches!(err, PipelineError::Write(_)));
}
