// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Capture and evaluate the data that says how well a calibrated device
//! performs.

use std::borrow::Cow;

use clap::Parser;
use log::info;
use ndarray::prelude::*;
use serde::Serialize;
use strum_macros::{Display, EnumIter, EnumString};

use super::{
    common::{
        choices, parse_choice, read_rig_config, summarise, with_spectrometer, ExperimentArgs,
        InfoPrinter, Warn,
    },
    PlightError,
};
use crate::{
    encode::ProfileEncoder,
    io::{metric_dump, Experiment},
    protocols::{
        capture_contrast_test, capture_fwhm, capture_gamma_test, capture_profiles,
        capture_pwm_test, ContrastData, FwhmData, LevelSweepData, ProfilesData,
    },
};

lazy_static::lazy_static! {
    static ref METRIC_HELP: String =
        format!("The metric. Valid choices are: {}", choices::<Metric>());
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
#[strum(serialize_all = "snake_case")]
enum Metric {
    /// Linearity of gamma-corrected intensities.
    Gamma,

    /// Contrast ratio with gamma correction.
    Contrast,

    /// Spectral resolution from slits of increasing width.
    Fwhm,

    /// Linearity of spatial PWM.
    Pwm,

    /// Reproduction of target profiles.
    Profiles,
}

/// Capture metric data with the experiment's calibrated device.
#[derive(Parser, Debug, Clone, Default)]
pub struct CaptureMetricsArgs {
    #[clap(flatten)]
    experiment: ExperimentArgs,

    #[clap(short, long, help = METRIC_HELP.as_str())]
    metric: String,
}

impl CaptureMetricsArgs {
    pub fn run(&self) -> Result<(), PlightError> {
        let metric: Metric = parse_choice(&self.metric, "metric")?;
        let session = self.experiment.open()?;
        let model = session.experiment.load_calibration()?;
        let encoder = ProfileEncoder::new(&model, session.rig.config().display.shape())?;
        let settings = session.spectrometer_settings();
        let limits = session.lambda_limits();
        let mut operator = session.operator();
        let dump = metric_dump(&metric.to_string());

        let path = with_spectrometer(&session, |display, spectrometer| {
            let experiment = &session.experiment;
            let path = match metric {
                Metric::Gamma => {
                    let data = capture_gamma_test(display, spectrometer, &settings, &encoder)?;
                    experiment.save_dump(&dump, &data)?
                }
                Metric::Contrast => {
                    let data = capture_contrast_test(
                        display,
                        spectrometer,
                        operator.as_mut(),
                        &settings,
                        &encoder,
                    )?;
                    experiment.save_dump(&dump, &data)?
                }
                Metric::Fwhm => {
                    let data = capture_fwhm(display, spectrometer, &settings, &encoder, limits)?;
                    experiment.save_dump(&dump, &data)?
                }
                Metric::Pwm => {
                    let data = capture_pwm_test(display, spectrometer, &settings, &encoder)?;
                    experiment.save_dump(&dump, &data)?
                }
                Metric::Profiles => {
                    let data =
                        capture_profiles(display, spectrometer, &settings, &encoder, limits)?;
                    experiment.save_dump(&dump, &data)?
                }
            };
            Ok(path)
        })?;
        info!("Wrote {metric} test data to '{}'", path.display());

        Ok(())
    }
}

/// Evaluate captured metric data, print a summary and write the results
/// next to the data.
#[derive(Parser, Debug, Clone, Default)]
pub struct EvaluateMetricsArgs {
    #[clap(flatten)]
    experiment: ExperimentArgs,

    #[clap(short, long, help = METRIC_HELP.as_str())]
    metric: String,
}

/// A value per spectrometer wavelength.
#[derive(Serialize)]
struct SpectralResult {
    wvl: Array1<f64>,
    values: Array1<f64>,
}

/// The peak seen through one slit.
#[derive(Serialize)]
struct SlitResult {
    test_wvl: f64,
    slit_width: usize,
    centre: Option<f64>,
    fwhm: Option<f64>,
}

impl EvaluateMetricsArgs {
    pub fn run(&self) -> Result<(), PlightError> {
        let metric: Metric = parse_choice(&self.metric, "metric")?;
        let limits = read_rig_config(self.experiment.rig.as_deref())?
            .spectrometer
            .lambda_limits;
        let experiment = self.experiment.experiment()?;
        let dump = metric_dump(&metric.to_string());
        let results = format!("{metric}_results");

        let path = match metric {
            Metric::Gamma | Metric::Pwm => {
                let data: LevelSweepData = experiment.load_dump(&dump)?;
                let snr = data.linearity_snr()?;
                report_spectral(
                    format!("{metric} linearity").into(),
                    "SNR [dB]",
                    data.wvl.view(),
                    snr.view(),
                    limits,
                );
                save_spectral(&experiment, &results, data.wvl, snr)?
            }
            Metric::Contrast => {
                let data: ContrastData = experiment.load_dump(&dump)?;
                let contrast = data.contrast_ratio()?;
                report_spectral(
                    "Contrast ratio with gamma correction".into(),
                    "Contrast",
                    data.wvl.view(),
                    contrast.view(),
                    limits,
                );
                save_spectral(&experiment, &results, data.wvl, contrast)?
            }
            Metric::Fwhm => {
                let data: FwhmData = experiment.load_dump(&dump)?;
                let slits = evaluate_fwhm(&data);
                experiment.save_dump(&results, &slits)?
            }
            Metric::Profiles => {
                let data: ProfilesData = experiment.load_dump(&dump)?;
                let scores = data.accuracy(limits)?;
                let mut printer = InfoPrinter::new("Profile accuracy [dB]".into());
                for score in &scores {
                    printer.push_line(
                        format!(
                            "{:>14}: gamma {:6.2}, PWM {:6.2}",
                            score.name, score.gamma, score.pwm
                        )
                        .into(),
                    );
                }
                printer.display();
                experiment.save_dump(&results, &scores)?
            }
        };
        info!("Wrote {metric} results to '{}'", path.display());

        Ok(())
    }
}

fn report_spectral(
    title: Cow<'static, str>,
    what: &'static str,
    wvl: ArrayView1<f64>,
    values: ArrayView1<f64>,
    limits: [f64; 2],
) {
    let mut printer = InfoPrinter::new(title);
    match summarise(wvl, values, limits) {
        Some((min, median, max)) => printer.push_line(
            format!(
                "{what} between {} and {} nm: min {min:.2}, median {median:.2}, max {max:.2}",
                limits[0], limits[1]
            )
            .into(),
        ),
        None => printer.push_line("No usable wavelengths".into()),
    }
    printer.display();
}

fn save_spectral(
    experiment: &Experiment,
    name: &str,
    wvl: Array1<f64>,
    values: Array1<f64>,
) -> Result<std::path::PathBuf, PlightError> {
    Ok(experiment.save_dump(name, &SpectralResult { wvl, values })?)
}

/// Find the peak through every slit, and report the narrowest slit's peak
/// for each test wavelength.
fn evaluate_fwhm(data: &FwhmData) -> Vec<SlitResult> {
    let peaks = data.peaks();
    let mut printer = InfoPrinter::new(
        format!(
            "Spectral resolution ({}-column slits)",
            data.slit_widths.first().copied().unwrap_or(0)
        )
        .into(),
    );
    let mut slits = vec![];
    let mut num_missing = 0;
    for (&test_wvl, per_width) in data.test_wvl.iter().zip(peaks.iter()) {
        match per_width.first().copied().flatten() {
            Some(peak) => printer.push_line(
                format!(
                    "{test_wvl:6.1} nm: centre {:6.1} nm, FWHM {:5.2} nm",
                    peak.centre, peak.fwhm
                )
                .into(),
            ),
            None => printer.push_line(format!("{test_wvl:6.1} nm: no peak").into()),
        }
        for (&slit_width, peak) in data.slit_widths.iter().zip(per_width.iter()) {
            if peak.is_none() {
                num_missing += 1;
            }
            slits.push(SlitResult {
                test_wvl,
                slit_width,
                centre: peak.map(|p| p.centre),
                fwhm: peak.map(|p| p.fwhm),
            });
        }
    }
    printer.display();
    if num_missing > 0 {
        format!("No clear peak was found for {num_missing} slit(s)").warn();
    }
    slits
}
