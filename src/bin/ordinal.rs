#![forbid(unsafe_code)]

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ordinal_harness::aggregation::AggregationMethod;
use ordinal_harness::contradiction::{find_contradictions, ConsistencySummary, ContradictionReport};
use ordinal_harness::judgment::EvaluationInput;
use ordinal_harness::perturbation::PerturbationConfig;
use ordinal_harness::report::{build_report, render_report_markdown, ReportOptions};
use ordinal_harness::synthetic::run_synthetic_suite;
use ordinal_harness::trials::{EvaluationContext, TrialConfig};

#[derive(Parser)]
#[command(name = "ordinal", version, about = "Pairwise judgment aggregation and evaluation")]
struct Cli {
    /// Debug-level logging (overridden by RUST_LOG)
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank judgments and score the ranking against ground truth
    Analyze {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, value_enum, default_value_t = CliMethod::FeedbackArcSet)]
        method: CliMethod,
        #[arg(long, default_value_t = 1)]
        trials: usize,
        #[arg(long, default_value_t = 0)]
        problem_nodes: usize,
        /// Percent chance a problem node wins each judgment
        #[arg(long, default_value_t = 50.0)]
        problem_win_pct: f64,
        /// Percent of judgments dropped per trial
        #[arg(long, default_value_t = 0.0)]
        cut_pct: f64,
        /// Percent of non-tie decisions reversed per trial
        #[arg(long, default_value_t = 0.0)]
        flip_pct: f64,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value = "json")]
        format: String,
        #[arg(long)]
        top_n: Option<usize>,
        #[arg(long)]
        include_synthetic: bool,
    },
    /// List order-reversal contradictions
    Contradictions {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
    /// Run synthetic evaluation suite
    Eval {
        #[arg(long)]
        case: Option<String>,
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        curve_csv: Option<PathBuf>,
    },
}

/// CLI-facing aggregation method enum (clap::ValueEnum).
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliMethod {
    NetWins,
    FeedbackArcSet,
}

impl From<CliMethod> for AggregationMethod {
    fn from(m: CliMethod) -> Self {
        match m {
            CliMethod::NetWins => AggregationMethod::NetWins,
            CliMethod::FeedbackArcSet => AggregationMethod::FeedbackArcSet,
        }
    }
}

#[derive(serde::Serialize)]
struct ContradictionsOutput {
    #[serde(flatten)]
    report: ContradictionReport,
    consistency: ConsistencySummary,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Analyze {
            input,
            out,
            method,
            trials,
            problem_nodes,
            problem_win_pct,
            cut_pct,
            flip_pct,
            seed,
            format,
            top_n,
            include_synthetic,
        } => {
            let cfg = TrialConfig {
                method: method.into(),
                trials,
                perturbation: PerturbationConfig {
                    problem_nodes,
                    problem_node_win_pct: problem_win_pct,
                    edge_cut_pct: cut_pct,
                    flip_pct,
                },
                seed,
                ..TrialConfig::default()
            };
            cfg.validate()?;

            let input = EvaluationInput::from_path(&input)?;
            let context = EvaluationContext::new(input.clone());
            let evaluation = context.evaluate(&cfg)?;
            let opts = ReportOptions {
                top_n,
                include_synthetic,
                ..ReportOptions::default()
            };
            let report = build_report(&input, &evaluation, &opts);
            if format == "md" {
                std::fs::write(out, render_report_markdown(&report))?;
            } else {
                write_json(&out, &report)?;
            }
        }
        Commands::Contradictions { input, out } => {
            let input = EvaluationInput::from_path(&input)?;
            let report = find_contradictions(&input.judgments);
            let consistency = report.consistency();
            write_json(
                &out,
                &ContradictionsOutput {
                    report,
                    consistency,
                },
            )?;
        }
        Commands::Eval {
            case,
            out,
            curve_csv,
        } => {
            let results = run_synthetic_suite(case.as_deref())?;
            let mut file = File::create(out)?;
            for result in &results {
                let line = serde_json::to_string(result)?;
                writeln!(file, "{line}")?;
            }
            if let Some(csv_path) = curve_csv {
                let mut csv = File::create(csv_path)?;
                writeln!(csv, "case,delta,post_accuracy,pre_accuracy")?;
                for result in results {
                    for point in &result.curve {
                        writeln!(
                            csv,
                            "{},{},{},{}",
                            result.case_name, point.delta, point.post_accuracy, point.pre_accuracy
                        )?;
                    }
                }
            }
        }
    }

    Ok(())
}

fn write_json<T: serde::Serialize>(path: &PathBuf, value: &T) -> Result<(), io::Error> {
    let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    std::fs::write(path, json)
}
