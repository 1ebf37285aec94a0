// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Fit the device calibration from captured data.

use clap::Parser;
use log::info;
use strum_macros::{Display, EnumIter, EnumString};

use super::{
    common::{choices, parse_choice, read_rig_config, summarise, ExperimentArgs, InfoPrinter},
    PlightError,
};
use crate::{
    io::{Experiment, CONTRAST_DUMP, GAMMA_DUMP, MAPPING_DUMP},
    protocols::{ContrastData, GammaData, MappingData},
    DeviceCalibration,
};

lazy_static::lazy_static! {
    static ref CALIBRATE_HELP: String =
        format!("What to calibrate. Valid choices are: {}. Default: all", choices::<CalibrationKind>());
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
#[strum(serialize_all = "snake_case")]
enum CalibrationKind {
    Gamma,
    Mapping,

    /// Only reported; the contrast ratio isn't part of the calibration.
    Contrast,

    All,
}

/// Fit the device calibration from the experiment's captured data, updating
/// (or creating) its device file.
#[derive(Parser, Debug, Clone, Default)]
pub struct CalibrateArgs {
    #[clap(flatten)]
    experiment: ExperimentArgs,

    #[clap(short, long, help = CALIBRATE_HELP.as_str())]
    calibrate: Option<String>,
}

impl CalibrateArgs {
    pub fn run(&self) -> Result<(), PlightError> {
        let kind = match &self.calibrate {
            Some(s) => parse_choice(s, "calibration")?,
            None => CalibrationKind::All,
        };
        let limits = read_rig_config(self.experiment.rig.as_deref())?
            .spectrometer
            .lambda_limits;
        let experiment = self.experiment.experiment()?;
        let mut model = experiment.load_calibration()?;

        let all = kind == CalibrationKind::All;
        if all || kind == CalibrationKind::Gamma {
            calibrate_gamma(&experiment, &mut model)?;
        }
        if all || kind == CalibrationKind::Mapping {
            calibrate_mapping(&experiment, &mut model, limits)?;
        }
        if all || kind == CalibrationKind::Contrast {
            report_contrast(&experiment, limits)?;
        }

        if kind != CalibrationKind::Contrast {
            let path = experiment.save_calibration(&model)?;
            info!("Wrote the device calibration to '{}'", path.display());
        }
        Ok(())
    }
}

fn calibrate_gamma(experiment: &Experiment, model: &mut DeviceCalibration) -> Result<(), PlightError> {
    let data: GammaData = experiment.load_dump(GAMMA_DUMP)?;
    let table = data.fit()?;

    let mut printer = InfoPrinter::new("Gamma".into());
    printer.push_line(format!("{} display levels", table.nlevels()).into());
    printer.push_line(
        format!(
            "Fitted {} of {} wavelengths",
            table.num_fitted(),
            table.wvl.len()
        )
        .into(),
    );
    printer.display();

    model.gamma = Some(table);
    Ok(())
}

fn calibrate_mapping(
    experiment: &Experiment,
    model: &mut DeviceCalibration,
    limits: [f64; 2],
) -> Result<(), PlightError> {
    let data: MappingData = experiment.load_dump(MAPPING_DUMP)?;
    let mapping = data.fit(limits)?;

    let mut printer = InfoPrinter::new("Wavelength mapping".into());
    printer.push_line(
        format!(
            "Degree-{} polynomial between {} and {} nm",
            mapping.polynomial.degree(),
            limits[0],
            limits[1]
        )
        .into(),
    );
    printer.push_block(vec![
        format!("{} nm -> column {:.1}", limits[0], mapping.column_of(limits[0])).into(),
        format!("{} nm -> column {:.1}", limits[1], mapping.column_of(limits[1])).into(),
    ]);
    printer.display();

    model.mapping = Some(mapping);
    Ok(())
}

fn report_contrast(experiment: &Experiment, limits: [f64; 2]) -> Result<(), PlightError> {
    let data: ContrastData = experiment.load_dump(CONTRAST_DUMP)?;
    let contrast = data.contrast_ratio()?;

    let mut printer = InfoPrinter::new("Contrast ratio".into());
    match summarise(data.wvl.view(), contrast.view(), limits) {
        Some((min, median, max)) => printer.push_line(
            format!(
                "Between {} and {} nm: min {min:.1}, median {median:.1}, max {max:.1}",
                limits[0], limits[1]
            )
            .into(),
        ),
        None => printer.push_line("No usable wavelengths".into()),
    }
    printer.display();
    Ok(())
}
