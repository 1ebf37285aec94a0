// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Hyperspectral scans of a scene with the camera.

use clap::Parser;
use log::info;
use strum_macros::{Display, EnumIter, EnumString};

use super::{
    common::{choices, parse_choice, with_camera, ExperimentArgs, InfoPrinter},
    PlightError,
};
use crate::{
    constants::DEFAULT_NUM_BANDS,
    encode::ProfileEncoder,
    io::scan_dump,
    protocols::{capture_hadamard, capture_identity},
};

lazy_static::lazy_static! {
    static ref BASIS_HELP: String =
        format!("The illumination basis. Valid choices are: {}", choices::<Basis>());

    static ref NUM_BANDS_HELP: String =
        format!("The number of wavelength bands; a power of two for Hadamard scans. Default: {DEFAULT_NUM_BANDS}");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
#[strum(serialize_all = "snake_case")]
enum Basis {
    /// Multiplexed bands; each capture lights half of them.
    Hadamard,

    /// One band at a time.
    Identity,
}

/// Scan a scene with the camera, lighting it through wavelength bands.
#[derive(Parser, Debug, Clone, Default)]
pub struct ScanArgs {
    #[clap(flatten)]
    experiment: ExperimentArgs,

    #[clap(short, long, help = BASIS_HELP.as_str())]
    basis: String,

    #[clap(short = 'w', long, help = NUM_BANDS_HELP.as_str())]
    num_bands: Option<usize>,
}

impl ScanArgs {
    pub fn run(&self) -> Result<(), PlightError> {
        let basis: Basis = parse_choice(&self.basis, "basis")?;
        let nbands = self.num_bands.unwrap_or(DEFAULT_NUM_BANDS);
        let session = self.experiment.open()?;
        let model = session.experiment.load_calibration()?;
        let encoder = ProfileEncoder::new(&model, session.rig.config().display.shape())?;
        let settings = session.camera_settings();
        let limits = session.lambda_limits();
        let dump = scan_dump(&basis.to_string(), nbands);

        let path = with_camera(&session, |display, camera| {
            let experiment = &session.experiment;
            let path = match basis {
                Basis::Hadamard => {
                    let data =
                        capture_hadamard(display, camera, &settings, &encoder, limits, nbands)?;
                    experiment.save_dump(&dump, &data)?
                }
                Basis::Identity => {
                    let data =
                        capture_identity(display, camera, &settings, &encoder, limits, nbands)?;
                    experiment.save_dump(&dump, &data)?
                }
            };
            Ok(path)
        })?;

        let mut printer = InfoPrinter::new(format!("{basis} scan").into());
        printer.push_line(
            format!(
                "{nbands} bands between {} and {} nm",
                limits[0], limits[1]
            )
            .into(),
        );
        printer.push_line(format!("Camera: {} averaged, {} dropped", settings.navg, settings.ndrops).into());
        printer.display();
        info!("Wrote the scan to '{}'", path.display());

        Ok(())
    }
}
