use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use kessan_core::{map_json, FinancialRecord};
use kessan_criteria::CriteriaStore;
use kessan_engine::EvaluationEngine;
use kessan_report::Reporter;

/// Evaluate one company's extracted financial statements against the
/// criteria definition and write a Markdown assessment.
#[derive(Debug, Parser)]
#[command(name = "kessan", version, about)]
struct Cli {
    /// Extracted JSON for the current reporting period
    current: PathBuf,

    /// Extracted JSON for the prior-year same quarter (enables YoY and
    /// PEG metrics)
    #[arg(long)]
    prior: Option<PathBuf>,

    /// Current stock price in yen
    #[arg(long)]
    price: f64,

    /// Criteria definition file
    #[arg(long, default_value = "config/criteria.yaml")]
    criteria: PathBuf,

    /// Directory for the generated report
    #[arg(long, default_value = "output")]
    output: PathBuf,
}

fn load_record(path: &PathBuf) -> Result<FinancialRecord> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("invalid JSON in {}", path.display()))?;
    Ok(map_json(&value))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let criteria = CriteriaStore::load(&cli.criteria)
        .with_context(|| format!("failed to load criteria from {}", cli.criteria.display()))?;

    let current = load_record(&cli.current)?;
    tracing::info!(
        company = %current.company_name,
        period = %current.fiscal_period,
        "current period loaded"
    );

    let prior = match &cli.prior {
        Some(path) => {
            let record = load_record(path)?;
            tracing::info!(period = %record.fiscal_period, "prior period loaded");
            Some(record)
        }
        None => {
            tracing::info!("no prior period given, YoY metrics will be skipped");
            None
        }
    };

    let engine = EvaluationEngine::new(criteria);
    let report = engine.evaluate(&current, prior.as_ref(), cli.price);
    tracing::info!(
        evaluations = report.evaluations.len(),
        "evaluation complete"
    );

    let path = Reporter::new(&cli.output)
        .write_markdown(&report)
        .context("failed to write report")?;
    println!("Report generated: {}", path.display());

    Ok(())
}
