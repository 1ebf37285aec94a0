// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Capture the data needed to calibrate the device.

use clap::Parser;
use log::info;
use strum_macros::{Display, EnumIter, EnumString};

use super::{
    common::{choices, parse_choice, with_spectrometer, ExperimentArgs},
    PlightError,
};
use crate::{
    io::{CONTRAST_DUMP, GAMMA_DUMP, MAPPING_DUMP},
    protocols::{capture_contrast, capture_gamma, capture_mapping},
};

lazy_static::lazy_static! {
    static ref CAPTURE_HELP: String =
        format!("What to capture. Valid choices are: {}", choices::<CaptureKind>());
}

#[derive(Debug, Clone, Copy, Display, EnumIter, EnumString)]
#[strum(serialize_all = "snake_case")]
enum CaptureKind {
    /// Spectra for every display level.
    Gamma,

    /// Spectra of binary column codes.
    Mapping,

    /// Dark, all-off and all-on spectra.
    Contrast,
}

/// Capture calibration data from the rig into the experiment's directory.
#[derive(Parser, Debug, Clone, Default)]
pub struct CaptureCalibArgs {
    #[clap(flatten)]
    experiment: ExperimentArgs,

    #[clap(short, long, help = CAPTURE_HELP.as_str())]
    capture: String,
}

impl CaptureCalibArgs {
    pub fn run(&self) -> Result<(), PlightError> {
        let kind: CaptureKind = parse_choice(&self.capture, "calibration capture")?;
        let session = self.experiment.open()?;
        let settings = session.spectrometer_settings();
        let nlevels = session.rig.config().display.nlevels();
        let mut operator = session.operator();

        let path = with_spectrometer(&session, |display, spectrometer| {
            let experiment = &session.experiment;
            let path = match kind {
                CaptureKind::Gamma => {
                    let data =
                        capture_gamma(display, spectrometer, operator.as_mut(), &settings, nlevels)?;
                    experiment.save_dump(GAMMA_DUMP, &data)?
                }
                CaptureKind::Mapping => {
                    let data = capture_mapping(display, spectrometer, &settings)?;
                    experiment.save_dump(MAPPING_DUMP, &data)?
                }
                CaptureKind::Contrast => {
                    let data =
                        capture_contrast(display, spectrometer, operator.as_mut(), &settings)?;
                    experiment.save_dump(CONTRAST_DUMP, &data)?
                }
            };
            Ok(path)
        })?;
        info!("Wrote {kind} data to '{}'", path.display());

        Ok(())
    }
}
