use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use risk_bro::pipeline::{self, PipelineError, RunContext, Variant};

const EXIT_SUCCESS: i32 = 0;
const EXIT_INPUT: i32 = 1;
const EXIT_WRITE: i32 = 2;
const EXIT_CONFIG: i32 = 3;

#[derive(Subcommand, Debug)]
enum AddCommand {
    /// Append a risk to the register CSV
    Risk,
    /// Record a metric reading in the metrics JSON file
    Metric,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify the compliance risk register
    Register,
    /// Score third-party vendors (inherent and residual)
    Vendors,
    /// Compare risk metrics against appetite and tolerance
    Appetite,
    /// Resolve supplier due-diligence questionnaires
    Diligence,
    /// Interactive data entry
    Add {
        #[command(subcommand)]
        what: AddCommand,
    },
}

#[derive(Parser, Debug)]
#[command(name = "risk-bro")]
#[command(about = "GRC risk scoring and committee reporting CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/risk-bro/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Directory holding the input files (default: sample_data)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Directory reports are written to (default: reports)
    #[arg(long, global = true)]
    out_dir: Option<PathBuf>,

    /// Reporting date, YYYY-MM-DD (default: today)
    #[arg(long, global = true)]
    as_of: Option<String>,

    /// Skip the AI committee briefing
    #[arg(long, global = true)]
    no_briefing: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn init_tracing(verbose: bool) {
    let log_format = std::env::var("RISK_BRO_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("risk_bro=debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_env("RISK_BRO_LOG")
            .unwrap_or_else(|_| "risk_bro=warn".into())
    };

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for rustls 0.23+); a second install is harmless
    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let start_time = Instant::now();

    // Load and validate config
    let config_path = cli.config.map(PathBuf::from);
    let config = match risk_bro::config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };
    if let Err(errors) = risk_bro::config::validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let as_of = match cli.as_of.as_deref() {
        Some(raw) => match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
            Ok(d) => d,
            Err(_) => {
                eprintln!("Invalid --as-of date '{}' (expected YYYY-MM-DD)", raw);
                std::process::exit(EXIT_CONFIG);
            }
        },
        None => chrono::Local::now().date_naive(),
    };

    let paths = config.paths.clone().unwrap_or_default();
    let ctx = RunContext {
        data_dir: cli.data_dir.unwrap_or_else(|| paths.data_dir()),
        out_dir: cli.out_dir.unwrap_or_else(|| paths.out_dir()),
        as_of,
        scoring: config.scoring.clone().unwrap_or_default(),
        briefing: if cli.no_briefing {
            None
        } else {
            Some(config.briefing.clone().unwrap_or_default())
        },
    };

    let variants: Vec<Variant> = match cli.command {
        None => Variant::ALL.to_vec(),
        Some(Commands::Register) => vec![Variant::Register],
        Some(Commands::Vendors) => vec![Variant::Vendors],
        Some(Commands::Appetite) => vec![Variant::Appetite],
        Some(Commands::Diligence) => vec![Variant::Diligence],
        Some(Commands::Add { what }) => {
            let code = run_entry(what, &ctx);
            std::process::exit(code);
        }
    };

    let use_colors = risk_bro::output::should_use_colors();
    let limit = if cli.verbose { usize::MAX } else { ctx.scoring.top_n() };
    let mut exit_code = EXIT_SUCCESS;

    for variant in variants {
        match pipeline::execute(variant, &ctx).await {
            Ok((output, written)) => {
                println!(
                    "{}",
                    risk_bro::output::format_summary(&output, &written, limit, use_colors)
                );
                println!();
            }
            Err(e) => {
                let code = match e {
                    PipelineError::Input(_) => EXIT_INPUT,
                    PipelineError::Write(_) => EXIT_WRITE,
                };
                eprintln!("{} failed: {}", variant, e);
                // Keep going with the remaining variants; report the first failure
                if exit_code == EXIT_SUCCESS {
                    exit_code = code;
                }
            }
        }
    }

    if cli.verbose {
        eprintln!("Finished in {:?}", start_time.elapsed());
    }

    std::process::exit(exit_code);
}

fn run_entry(what: AddCommand, ctx: &RunContext) -> i32 {
    let stdin = std::io::stdin();
    let mut prompter = risk_bro::entry::Prompter::new(stdin.lock(), std::io::stdout());

    let result = match what {
        AddCommand::Risk => {
            let path = ctx.input_path(Variant::Register);
            risk_bro::entry::add_risk(&mut prompter, &path, ctx.as_of).map(|saved| match saved {
                Some(record) => format!(
                    "Added {} ({}/25, {}) to {}",
                    record.id,
                    record.score,
                    record.tier,
                    path.display()
                ),
                None => "Nothing saved.".to_string(),
            })
        }
        AddCommand::Metric => {
            let path = ctx.input_path(Variant::Appetite);
            risk_bro::entry::add_metric(&mut prompter, &path).map(|saved| match saved {
                Some((name, risk_bro::ingest::Upsert::Inserted)) => {
                    format!("Added {} to {}", name, path.display())
                }
                Some((name, risk_bro::ingest::Upsert::Updated)) => {
                    format!("Updated {} in {}", name, path.display())
                }
                None => "Nothing saved.".to_string(),
            })
        }
    };

    match result {
        Ok(message) => {
            println!("{}", message);
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("Entry failed: {:#}", e);
            EXIT_INPUT
        }
    }
}
