//! Replenishment planner
//!
//! Loads a transaction log, reuses or trains the demand model and prints the
//! purchase plan for the requested horizon as CSV on stdout (or to `--output`).
//!
//! Usage:
//!   replenish --input kardex.csv --horizon quarterly --output plan.csv

use clap::Parser;
use demand_forecast::config::EngineConfig;
use demand_forecast::error::Result;
use demand_forecast::export::{save_decisions, save_horizon, write_decisions, write_horizon};
use demand_forecast::finance::CoverageStatus;
use demand_forecast::horizon::{upcoming_labels, Horizon};
use demand_forecast::logging;
use demand_forecast::session::PlanningSession;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "replenish")]
#[command(about = "Forecast monthly consumption and recommend purchase quantities")]
struct Args {
    /// Transaction log (CSV with header)
    #[arg(long)]
    input: PathBuf,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of the saved model, overrides the configuration
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Train a new model even if one is saved
    #[arg(long)]
    retrain: bool,

    /// monthly, quarterly or annual
    #[arg(long, default_value = "monthly")]
    horizon: Horizon,

    /// Write the plan here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Service level, 0.95 or 0.90
    #[arg(long)]
    service_level: Option<f64>,

    /// Lead time in days
    #[arg(long)]
    lead_time: Option<f64>,
}

fn load_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(dir) = &args.model_dir {
        config.model_dir = dir.clone();
    }
    if let Some(level) = args.service_level {
        config.policy.service_level = level;
    }
    if let Some(days) = args.lead_time {
        config.policy.lead_time_days = days;
    }
    config.validate()?;
    Ok(config)
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    let mut session = PlanningSession::new(config);
    session.load_csv(&args.input)?;

    let outcome = session.run(args.retrain)?;

    if let Some(report) = &outcome.training {
        if !report.is_meaningful() {
            warn!("model evaluated on its own training rows; accuracy figures are optimistic");
        }
        eprintln!("{}", report.metrics);
    }

    let finance = &outcome.finance;
    info!(
        inventory = finance.inventory_on_hand,
        purchase_cost = finance.purchase_cost,
        stockout_risk = finance.stockout_risk_value,
        skus_at_risk = finance.skus_at_risk,
        "financial summary"
    );
    info!(
        overstock = outcome.coverage.count(CoverageStatus::Overstock),
        stockout_risk = outcome.coverage.count(CoverageStatus::StockoutRisk),
        optimal = outcome.coverage.count(CoverageStatus::Optimal),
        "coverage summary"
    );
    info!(
        horizon = %args.horizon,
        months = ?upcoming_labels(args.horizon),
        "planning horizon"
    );

    match (outcome.horizon(args.horizon), &args.output) {
        (None, Some(path)) => save_decisions(path, &outcome.latest)?,
        (None, None) => write_decisions(io::stdout().lock(), &outcome.latest)?,
        (Some(plan), Some(path)) => save_horizon(path, args.horizon, plan)?,
        (Some(plan), None) => write_horizon(io::stdout().lock(), args.horizon, plan)?,
    }
    Ok(())
}

fn main() -> ExitCode {
    logging::init();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "replenishment planning failed");
            ExitCode::FAILURE
        }
    }
}
