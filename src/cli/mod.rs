// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Command-line interface code. More specific options for `plight`
//! subcommands are contained in modules.
//!
//! Only 3 things should be public in this module: `Plight`, `Plight::run`,
//! and `PlightError`.

mod calibrate;
mod capture_calib;
mod common;
mod error;
mod generate_codes;
mod metrics;
mod scan;

pub use error::PlightError;

use clap::{AppSettings, Args, Parser, Subcommand};
use log::info;

use crate::PROGRESS_BARS;

// Add build-time information from the "built" crate.
include!(concat!(env!("OUT_DIR"), "/built.rs"));

#[derive(Debug, Parser)]
#[clap(
    version,
    author,
    about = r#"Calibration and capture software for a programmable-light rig: an SLM in the
spectral plane of a light source, with a spectrometer and a camera"#
)]
#[clap(global_setting(AppSettings::DeriveDisplayOrder))]
#[clap(disable_help_subcommand = true)]
#[clap(infer_subcommands = true)]
#[clap(propagate_version = true)]
#[clap(infer_long_args = true)]
pub struct Plight {
    #[clap(flatten)]
    global_opts: GlobalArgs,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// Don't draw progress bars.
    #[clap(long)]
    #[clap(global = true)]
    no_progress_bars: bool,

    /// The verbosity of the program. Increase by specifying multiple times
    /// (e.g. -vv). The default is to print only high-level information.
    #[clap(short, long, parse(from_occurrences))]
    #[clap(global = true)]
    verbosity: u8,
}

#[derive(Debug, Subcommand)]
#[clap(arg_required_else_help = true)]
enum Command {
    #[clap(about = "Capture gamma, mapping or contrast calibration data.")]
    CaptureCalib(capture_calib::CaptureCalibArgs),

    #[clap(about = "Fit the device calibration from captured calibration data.")]
    Calibrate(calibrate::CalibrateArgs),

    #[clap(about = "Capture data to evaluate a calibrated device.")]
    CaptureMetrics(metrics::CaptureMetricsArgs),

    #[clap(about = "Evaluate captured metric data.")]
    EvaluateMetrics(metrics::EvaluateMetricsArgs),

    #[clap(about = "Scan a scene with the camera through wavelength bands.")]
    Scan(scan::ScanArgs),

    #[clap(about = "Generate structured-light code planes and summarise them.")]
    GenerateCodes(generate_codes::GenerateCodesArgs),
}

impl Plight {
    pub fn run(self) -> Result<(), PlightError> {
        // Set up logging.
        let GlobalArgs {
            verbosity,
            no_progress_bars,
        } = self.global_opts;
        if let Err(e) = setup_logging(verbosity) {
            return Err(PlightError::Generic(format!(
                "Failed to initialise logging: {e}"
            )));
        }
        // Enable progress bars if the user didn't say "no progress bars".
        if !no_progress_bars {
            PROGRESS_BARS.store(true);
        }

        // Print the version of plight and its build-time information.
        let sub_command = match &self.command {
            Command::CaptureCalib(_) => "capture-calib",
            Command::Calibrate(_) => "calibrate",
            Command::CaptureMetrics(_) => "capture-metrics",
            Command::EvaluateMetrics(_) => "evaluate-metrics",
            Command::Scan(_) => "scan",
            Command::GenerateCodes(_) => "generate-codes",
        };
        info!("plight {} {}", sub_command, env!("CARGO_PKG_VERSION"));
        display_build_info();

        let result = match self.command {
            Command::CaptureCalib(args) => args.run(),
            Command::Calibrate(args) => args.run(),
            Command::CaptureMetrics(args) => args.run(),
            Command::EvaluateMetrics(args) => args.run(),
            Command::Scan(args) => args.run(),
            Command::GenerateCodes(args) => args.run(),
        };
        // Warnings are worth seeing even if things went wrong.
        common::display_warnings();
        result?;

        info!("plight {} complete.", sub_command);
        Ok(())
    }
}

/// Activate a logger. All log messages are put onto `stdout`. `env_logger`
/// automatically only uses colours and fancy symbols if we're on a tty (e.g. a
/// terminal); piped output will be formatted sensibly. Source code lines are
/// displayed in log messages when verbosity >= 3.
fn setup_logging(verbosity: u8) -> Result<(), log::SetLoggerError> {
    let mut builder = env_logger::Builder::from_default_env();
    builder.target(env_logger::Target::Stdout);
    builder.format_target(false);
    match verbosity {
        0 => builder.filter_level(log::LevelFilter::Info),
        1 => builder.filter_level(log::LevelFilter::Debug),
        2 => builder.filter_level(log::LevelFilter::Trace),
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
            builder.format(|buf, record| {
                use std::io::Write;

                let timestamp = buf.timestamp();
                let level = record.level();
                let target = record.target();
                let line = record.line().unwrap_or(0);
                let message = record.args();

                writeln!(buf, "[{timestamp} {level} {target}:{line}] {message}")
            })
        }
    };
    builder.try_init()
}

/// Write info-level log lines of how this executable was compiled.
fn display_build_info() {
    info!("Compiled {}", BUILT_TIME_UTC);
    info!("    with compiler {}", RUSTC_VERSION);
    info!("    for {} ({} profile)", TARGET, PROFILE);
    info!("");
}
