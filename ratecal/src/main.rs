//! swaption-calibration: fit G2++ and Hull-White to a swaption volatility
//! grid and print the fit.
//!
//! # Usage
//!
//! ```bash
//! # Reference run: both models on the built-in 5x5 grid
//! swaption-calibration
//!
//! # Hull-White only, priced on the finite-difference engine
//! swaption-calibration --model hull-white --hw-engine finite-difference
//!
//! # Grid and settings from a file, fail on non-convergence
//! swaption-calibration --config run.toml --strict -vv
//! ```
//!
//! The report goes to stdout, logs to stderr.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use ratecal::core::Error;
use ratecal::{CalibrationConfig, CalibrationSession, HwEngineKind, ModelChoice};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Calibrate short-rate models to an ATM swaption volatility grid
#[derive(Parser)]
#[command(name = "swaption-calibration")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML run configuration (defaults reproduce the reference run)
    #[arg(short, long, env = "RATECAL_CONFIG")]
    config: Option<PathBuf>,

    /// Models to calibrate
    #[arg(short, long, value_enum, default_value = "all")]
    model: ModelArg,

    /// Engine for the Hull-White round, overriding the configuration
    #[arg(long, value_enum)]
    hw_engine: Option<HwEngineArg>,

    /// Exit with an error when an optimizer does not converge
    #[arg(long)]
    strict: bool,

    /// More logging on stderr (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModelArg {
    /// G2++ only
    G2,
    /// Hull-White only
    HullWhite,
    /// G2++ then Hull-White
    All,
}

impl ModelArg {
    fn choices(self) -> &'static [ModelChoice] {
        match self {
            ModelArg::G2 => &[ModelChoice::G2],
            ModelArg::HullWhite => &[ModelChoice::HullWhite],
            ModelArg::All => &[ModelChoice::G2, ModelChoice::HullWhite],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum HwEngineArg {
    /// Jamshidian decomposition
    Jamshidian,
    /// Crank-Nicolson on a state grid
    FiniteDifference,
}

impl From<HwEngineArg> for HwEngineKind {
    fn from(arg: HwEngineArg) -> Self {
        match arg {
            HwEngineArg::Jamshidian => HwEngineKind::Jamshidian,
            HwEngineArg::FiniteDifference => HwEngineKind::FiniteDifference,
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<CalibrationConfig> {
    let mut config = match &cli.config {
        Some(path) => CalibrationConfig::from_path(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => CalibrationConfig::default(),
    };
    if let Some(engine) = cli.hw_engine {
        config.hw_engine = engine.into();
    }
    Ok(config)
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let session = CalibrationSession::new(config).context("setting up the calibration")?;

    let reports = session.run(cli.model.choices()).context("calibrating")?;
    for report in &reports {
        println!("{report}");
        if cli.strict {
            report
                .outcome
                .ensure_converged()
                .with_context(|| report.title.clone())?;
        }
    }
    Ok(())
}

/// Map a failure to the process exit code.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<Error>() {
        Some(Error::DataShape(_)) => 2,
        Some(Error::InvalidEngine(_) | Error::NoEngine(_)) => 3,
        Some(Error::RootNotBracketed { .. }) => 4,
        Some(Error::CalibrationFailed(_)) => 5,
        _ => 1,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}
