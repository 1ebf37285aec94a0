// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Common arguments for command-line interfaces. Every subcommand that talks
//! to the rig (or reads what it captured) shares the same experiment and rig
//! arguments.

mod printers;

pub(super) use printers::InfoPrinter;
pub(crate) use printers::{display_warnings, Warn};

use std::{
    borrow::Cow,
    path::{Path, PathBuf},
    time::Duration,
};

use clap::Parser;
use itertools::Itertools;
use log::{debug, info};
use ndarray::prelude::*;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use super::PlightError;
use crate::{
    devices::{Camera, Display as SlmDisplay, Rig, RigConfig, Spectrometer},
    io::Experiment,
    protocols::{BenchOperator, CaptureSettings, Operator, StdinOperator},
};

pub(super) const DEFAULT_DATA_DIR: &str = "data";

lazy_static::lazy_static! {
    pub(super) static ref ARG_FILE_TYPES_COMMA_SEPARATED: String = ArgFileTypes::iter().join(", ");

    pub(super) static ref RIG_FILE_HELP: String =
        format!("The rig configuration (display, spectrometer, camera and simulated bench). Supported formats: {}. If not given, defaults are used", *ARG_FILE_TYPES_COMMA_SEPARATED);

    pub(super) static ref DATA_DIR_HELP: String =
        format!("The directory holding every experiment's data. Default: {DEFAULT_DATA_DIR}");
}

#[derive(Debug, Display, EnumIter, EnumString)]
pub(super) enum ArgFileTypes {
    #[strum(serialize = "toml")]
    Toml,
    #[strum(serialize = "json")]
    Json,
}

macro_rules! unpack_arg_file {
    ($arg_file:expr) => ({
        use std::{fs::File, io::Read, str::FromStr};

        use crate::cli::common::{ArgFileTypes, ARG_FILE_TYPES_COMMA_SEPARATED};

        debug!("Attempting to parse argument file {}", $arg_file.display());

        let mut contents = String::new();
        let arg_file_type = $arg_file
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .and_then(|e| ArgFileTypes::from_str(&e).ok());

        match arg_file_type {
            Some(ArgFileTypes::Toml) => {
                debug!("Parsing toml file...");
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match toml::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(PlightError::ArgFile(format!(
                            "Couldn't decode toml structure from {:?}:\n{err}",
                            $arg_file
                        )))
                    }
                }
            }
            Some(ArgFileTypes::Json) => {
                debug!("Parsing json file...");
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match serde_json::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(PlightError::ArgFile(format!(
                            "Couldn't decode json structure from {:?}:\n{err}",
                            $arg_file
                        )))
                    }
                }
            }

            _ => {
                return Err(PlightError::ArgFile(format!(
                    "Argument file '{:?}' doesn't have a recognised file extension! Valid extensions are: {}", $arg_file, *ARG_FILE_TYPES_COMMA_SEPARATED)
                ))
            }
        }
    });
}

/// Read a rig configuration file, or use the defaults.
pub(super) fn read_rig_config(rig_file: Option<&Path>) -> Result<RigConfig, PlightError> {
    match rig_file {
        None => {
            debug!("No rig file given; using the default rig configuration");
            Ok(RigConfig::default())
        }
        Some(rig_file) => {
            if !rig_file.exists() {
                return Err(PlightError::ArgFile(format!(
                    "Rig file '{}' doesn't exist",
                    rig_file.display()
                )));
            }
            let config: RigConfig = unpack_arg_file!(rig_file);
            Ok(config)
        }
    }
}

/// Every variant of a strum enum, comma separated.
pub(super) fn choices<T: IntoEnumIterator + std::fmt::Display>() -> String {
    T::iter().join(", ")
}

/// Parse a case-insensitive choice of a strum enum, listing the valid choices
/// if it isn't one.
pub(super) fn parse_choice<T>(s: &str, what: &'static str) -> Result<T, PlightError>
where
    T: std::str::FromStr + IntoEnumIterator + std::fmt::Display,
{
    T::from_str(&s.to_lowercase()).map_err(|_| {
        PlightError::Generic(format!(
            "Unrecognised {what} '{s}'. Valid choices are: {}",
            choices::<T>()
        ))
    })
}

/// Arguments shared by every subcommand working on an experiment.
#[derive(Parser, Debug, Clone, Default)]
pub(super) struct ExperimentArgs {
    /// The name of the experiment. Its data lives in <DATA_DIR>/<EXPERIMENT>.
    #[clap(short, long, help_heading = "EXPERIMENT")]
    pub(super) experiment: String,

    #[clap(long, parse(from_os_str), help = DATA_DIR_HELP.as_str(), help_heading = "EXPERIMENT")]
    pub(super) data_dir: Option<PathBuf>,

    #[clap(long, parse(from_os_str), help = RIG_FILE_HELP.as_str(), help_heading = "RIG")]
    pub(super) rig: Option<PathBuf>,

    /// Drive a simulated bench instead of hardware. The bench is configured
    /// in the [bench] section of the rig file.
    #[clap(long, help_heading = "RIG")]
    pub(super) simulate: bool,
}

impl ExperimentArgs {
    pub(super) fn experiment(&self) -> Result<Experiment, PlightError> {
        let data_dir = self
            .data_dir
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_DATA_DIR));
        Ok(Experiment::new(data_dir, &self.experiment)?)
    }

    /// Read the rig configuration and set up a session with it.
    pub(super) fn open(&self) -> Result<RigSession, PlightError> {
        let config = read_rig_config(self.rig.as_deref())?;
        let experiment = self.experiment()?;
        let rig = Rig::new(config, self.simulate)?;

        let mut printer = InfoPrinter::new(format!("Experiment '{}'", self.experiment).into());
        printer.push_line(format!("Data directory: {}", experiment.dir().display()).into());
        let display = &rig.config().display;
        let spectrometer = &rig.config().spectrometer;
        let mut block: Vec<Cow<'static, str>> = vec![format!(
            "SLM: {}x{} pixels, {} bits (screen {})",
            display.height, display.width, display.bits, display.screen_id
        )
        .into()];
        block.push(
            format!(
                "Spectrometer: {} scan(s) of {} ms, limits {:?} nm",
                spectrometer.nscans, spectrometer.exposure_ms, spectrometer.lambda_limits
            )
            .into(),
        );
        block.push(format!("Camera: {}", rig.config().camera.backend).into());
        printer.push_block(block);
        if self.simulate {
            printer.push_line("Simulated bench".into());
        }
        printer.display();

        Ok(RigSession {
            rig,
            experiment,
            simulate: self.simulate,
        })
    }
}

/// A rig ready to capture into an experiment.
pub(super) struct RigSession {
    pub(super) rig: Rig,
    pub(super) experiment: Experiment,
    simulate: bool,
}

impl RigSession {
    fn settle(&self) -> Duration {
        if self.simulate {
            Duration::ZERO
        } else {
            Duration::from_millis(self.rig.config().display.settle_ms)
        }
    }

    pub(super) fn lambda_limits(&self) -> [f64; 2] {
        self.rig.config().spectrometer.lambda_limits
    }

    pub(super) fn spectrometer_settings(&self) -> CaptureSettings {
        CaptureSettings {
            settle: self.settle(),
            navg: self.rig.config().spectrometer.nscans,
            ndrops: 0,
        }
    }

    pub(super) fn camera_settings(&self) -> CaptureSettings {
        let camera = &self.rig.config().camera;
        CaptureSettings {
            settle: self.settle(),
            navg: camera.navg,
            ndrops: camera.ndrops,
        }
    }

    /// Who blocks the light for dark captures: the simulated bench itself,
    /// or a person at the terminal.
    pub(super) fn operator(&self) -> Box<dyn Operator> {
        match self.rig.bench() {
            Some(bench) => Box::new(BenchOperator::new(bench)),
            None => Box::new(StdinOperator),
        }
    }

    pub(super) fn open_display(&self) -> Result<Box<dyn SlmDisplay>, PlightError> {
        Ok(self.rig.open_display()?)
    }

    pub(super) fn open_spectrometer(&self) -> Result<Box<dyn Spectrometer>, PlightError> {
        Ok(self.rig.open_spectrometer()?)
    }

    pub(super) fn open_camera(&self) -> Result<Box<dyn Camera>, PlightError> {
        Ok(self.rig.open_camera()?)
    }
}

/// Run `f` with the SLM and spectrometer open; both are closed however `f`
/// finishes.
pub(super) fn with_spectrometer<T>(
    session: &RigSession,
    f: impl FnOnce(&mut dyn SlmDisplay, &mut dyn Spectrometer) -> Result<T, PlightError>,
) -> Result<T, PlightError> {
    let mut display = scopeguard::guard(session.open_display()?, |mut d| {
        if let Err(e) = d.close() {
            format!("Couldn't close the SLM: {e}").warn();
        }
    });
    let mut spectrometer = scopeguard::guard(session.open_spectrometer()?, |mut s| {
        if let Err(e) = s.close() {
            format!("Couldn't close the spectrometer: {e}").warn();
        }
    });
    let result = f(&mut **display, &mut **spectrometer);
    info!("Releasing devices");
    result
}

/// Run `f` with the SLM and camera open; both are closed however `f`
/// finishes.
pub(super) fn with_camera<T>(
    session: &RigSession,
    f: impl FnOnce(&mut dyn SlmDisplay, &mut dyn Camera) -> Result<T, PlightError>,
) -> Result<T, PlightError> {
    let mut display = scopeguard::guard(session.open_display()?, |mut d| {
        if let Err(e) = d.close() {
            format!("Couldn't close the SLM: {e}").warn();
        }
    });
    let mut camera = scopeguard::guard(session.open_camera()?, |mut c| {
        if let Err(e) = c.close() {
            format!("Couldn't close the camera: {e}").warn();
        }
    });
    let result = f(&mut **display, &mut **camera);
    info!("Releasing devices");
    result
}

/// The minimum, median and maximum of the finite values of `values` whose
/// wavelengths are within `limits`.
pub(super) fn summarise(
    wvl: ArrayView1<f64>,
    values: ArrayView1<f64>,
    limits: [f64; 2],
) -> Option<(f64, f64, f64)> {
    let mut within: Vec<f64> = wvl
        .iter()
        .zip(values.iter())
        .filter(|(l, v)| **l >= limits[0] && **l <= limits[1] && v.is_finite())
        .map(|(_, &v)| v)
        .collect();
    if within.is_empty() {
        return None;
    }
    within.sort_unstable_by(|a, b| a.total_cmp(b));
    Some((within[0], within[within.len() / 2], within[within.len() - 1]))
}
