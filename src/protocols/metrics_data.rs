// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Protocols capturing the data used to evaluate a calibrated device, and the
//! evaluations themselves.

use log::{info, warn};
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

use super::*;
use crate::{
    constants::{
        FWHM_MAX_SLIT_WIDTH, FWHM_NUM_TEST_WAVELENGTHS, GAMMA_TEST_LEVEL_STEP,
        PROFILE_TEST_NUM_WAVELENGTHS, PWM_TEST_NUM_LEVELS,
    },
    encode::{EncodeMode, ProfileEncoder},
    math::smooth_spectrum,
    metrics::{
        canonical_profiles, fwhm, linearity_snr, profile_accuracy, MetricsError, SpectralPeak,
        CANONICAL_PROFILE_NAMES,
    },
};

/// Spectra for a sweep of levels; either gamma-corrected intensity buckets or
/// the half-heights of PWM strips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSweepData {
    pub wvl: Array1<f64>,
    pub levels: Vec<usize>,

    /// Shape (len(levels), len(wvl)).
    pub data: Array2<f64>,
}

impl LevelSweepData {
    /// How linear the response to the sweep is, per wavelength \[dB\].
    pub fn linearity_snr(&self) -> Result<Array1<f64>, MetricsError> {
        let levels: Array1<f64> = self.levels.iter().map(|&l| l as f64).collect();
        linearity_snr(levels.view(), self.data.view())
    }
}

/// Spectra of slits of various widths centred on the columns of test
/// wavelengths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FwhmData {
    pub wvl: Array1<f64>,
    pub zeros: Array1<f64>,
    pub test_wvl: Vec<f64>,
    pub slit_widths: Vec<usize>,

    /// Shape (len(test_wvl), len(slit_widths), len(wvl)).
    pub data: Array3<f64>,
}

impl FwhmData {
    /// The peak seen for each test wavelength (outer) and slit width (inner),
    /// after removing the all-off spectrum and smoothing.
    pub fn peaks(&self) -> Vec<Vec<Option<SpectralPeak>>> {
        self.data
            .outer_iter()
            .map(|per_width| {
                per_width
                    .outer_iter()
                    .map(|spectrum| {
                        let spectrum = &spectrum - &self.zeros;
                        fwhm(self.wvl.view(), smooth_spectrum(spectrum.view()).view())
                    })
                    .collect()
            })
            .collect()
    }
}

/// Spectra of the canonical target profiles, displayed in both encoding
/// modes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfilesData {
    pub wvl: Array1<f64>,
    pub target_wvl: Array1<f64>,

    /// Shape (num profiles, len(target_wvl)).
    pub targets: Array2<f64>,

    pub zeros: Array1<f64>,

    /// Shape (num profiles, len(wvl)).
    pub gamma: Array2<f64>,
    pub pwm: Array2<f64>,
}

/// How well one target profile was reproduced \[dB\].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfileScore {
    pub name: &'static str,
    pub gamma: f64,
    pub pwm: f64,
}

impl ProfilesData {
    /// Score each profile against its target between `limits`. Measurements
    /// are divided by the measurement of the first (flat) profile, so the
    /// flat profile itself isn't scored.
    pub fn accuracy(&self, limits: [f64; 2]) -> Result<Vec<ProfileScore>, MetricsError> {
        let relative = |data: &Array2<f64>, i: usize| {
            let flat = &data.row(0) - &self.zeros;
            let measured = &data.row(i) - &self.zeros;
            Array1::from_shape_fn(measured.len(), |j| {
                if flat[j] > 0.0 {
                    measured[j] / flat[j]
                } else {
                    0.0
                }
            })
        };

        (1..self.targets.nrows())
            .map(|i| {
                let target = self.targets.row(i);
                let score = |data: &Array2<f64>| {
                    profile_accuracy(
                        self.target_wvl.view(),
                        target,
                        self.wvl.view(),
                        relative(data, i).view(),
                        limits,
                    )
                };
                Ok(ProfileScore {
                    name: CANONICAL_PROFILE_NAMES.get(i).copied().unwrap_or("custom"),
                    gamma: score(&self.gamma)?,
                    pwm: score(&self.pwm)?,
                })
            })
            .collect()
    }
}

/// Capture gamma-corrected flat patterns for every `GAMMA_TEST_LEVEL_STEP`th
/// intensity bucket. A linear gamma calibration gives spectra that scale
/// linearly with the bucket.
pub fn capture_gamma_test(
    display: &mut dyn Display,
    spectrometer: &mut dyn Spectrometer,
    settings: &CaptureSettings,
    encoder: &ProfileEncoder,
) -> Result<LevelSweepData, ProtocolError> {
    let levels: Vec<usize> = (0..encoder.nlevels().saturating_sub(5))
        .step_by(GAMMA_TEST_LEVEL_STEP)
        .collect();
    let wvl = spectrometer.wavelengths().to_owned();

    info!("Capturing {} gamma-corrected levels", levels.len());
    let mut data = Array2::zeros((levels.len(), wvl.len()));
    let pb = progress_bar(levels.len(), "levels", "Gamma test");
    for (&level, mut spectrum) in levels.iter().zip(data.outer_iter_mut()) {
        let image = encoder.flat_gamma(level)?;
        spectrum.assign(&show_and_measure(
            display,
            spectrometer,
            image.view(),
            settings,
        )?);
        pb.inc(1);
    }
    pb.abandon_with_message("Finished gamma test");

    Ok(LevelSweepData { wvl, levels, data })
}

/// Capture dark, all-off and gamma-corrected all-on spectra.
pub fn capture_contrast_test(
    display: &mut dyn Display,
    spectrometer: &mut dyn Spectrometer,
    operator: &mut dyn Operator,
    settings: &CaptureSettings,
    encoder: &ProfileEncoder,
) -> Result<ContrastData, ProtocolError> {
    let offset = measure_dark(spectrometer, operator, settings)?;
    let dark_image = Array2::zeros(display.shape());
    let zeros = show_and_measure(display, spectrometer, dark_image.view(), settings)?;
    let ones_image = encoder.flat_gamma(encoder.nlevels() - 1)?;
    let ones = show_and_measure(display, spectrometer, ones_image.view(), settings)?;
    Ok(ContrastData {
        wvl: spectrometer.wavelengths().to_owned(),
        offset,
        zeros,
        ones,
    })
}

/// Capture full-intensity strips of increasing height. Spatial PWM is
/// linear if the spectra scale linearly with the strip height.
pub fn capture_pwm_test(
    display: &mut dyn Display,
    spectrometer: &mut dyn Spectrometer,
    settings: &CaptureSettings,
    encoder: &ProfileEncoder,
) -> Result<LevelSweepData, ProtocolError> {
    let half_height = encoder.shape().0 / 2;
    let levels: Vec<usize> = linspace(0.0, half_height as f64, PWM_TEST_NUM_LEVELS)
        .iter()
        .map(|&l| l.floor() as usize)
        .collect();
    let wvl = spectrometer.wavelengths().to_owned();

    info!("Capturing {} PWM strips", levels.len());
    let mut data = Array2::zeros((levels.len(), wvl.len()));
    let pb = progress_bar(levels.len(), "strips", "PWM test");
    for (&level, mut spectrum) in levels.iter().zip(data.outer_iter_mut()) {
        let image = encoder.strip(level);
        spectrum.assign(&show_and_measure(
            display,
            spectrometer,
            image.view(),
            settings,
        )?);
        pb.inc(1);
    }
    pb.abandon_with_message("Finished PWM test");

    Ok(LevelSweepData { wvl, levels, data })
}

/// Capture slits of increasing width centred on the columns of test
/// wavelengths spread across `limits`. Test wavelengths that don't land on
/// the display are skipped.
pub fn capture_fwhm(
    display: &mut dyn Display,
    spectrometer: &mut dyn Spectrometer,
    settings: &CaptureSettings,
    encoder: &ProfileEncoder,
    limits: [f64; 2],
) -> Result<FwhmData, ProtocolError> {
    check_limits(limits)?;
    let [low, high] = limits;
    let step = (high - low) / FWHM_NUM_TEST_WAVELENGTHS as f64;
    let mut test_wvl = vec![];
    let mut columns = vec![];
    for i in 0..FWHM_NUM_TEST_WAVELENGTHS {
        let lambda = low + step * i as f64;
        match encoder.column_of(lambda) {
            Some(c) => {
                test_wvl.push(lambda);
                columns.push(c);
            }
            None => warn!("Test wavelength {lambda:.1} nm doesn't land on the display; skipping"),
        }
    }
    if test_wvl.is_empty() {
        return Err(ProtocolError::NothingOnDisplay);
    }
    let slit_widths: Vec<usize> = (1..FWHM_MAX_SLIT_WIDTH).step_by(2).collect();
    let wvl = spectrometer.wavelengths().to_owned();

    let dark_image = Array2::zeros(display.shape());
    let zeros = show_and_measure(display, spectrometer, dark_image.view(), settings)?;

    info!(
        "Capturing {} slit widths for {} test wavelengths",
        slit_widths.len(),
        test_wvl.len()
    );
    let mut data = Array3::zeros((test_wvl.len(), slit_widths.len(), wvl.len()));
    let pb = progress_bar(test_wvl.len() * slit_widths.len(), "slits", "FWHM test");
    for (&column, mut per_width) in columns.iter().zip(data.outer_iter_mut()) {
        for (&width, mut spectrum) in slit_widths.iter().zip(per_width.outer_iter_mut()) {
            let image = encoder.slit(column, width / 2);
            spectrum.assign(&show_and_measure(
                display,
                spectrometer,
                image.view(),
                settings,
            )?);
            pb.inc(1);
        }
    }
    pb.abandon_with_message("Finished FWHM test");

    Ok(FwhmData {
        wvl,
        zeros,
        test_wvl,
        slit_widths,
        data,
    })
}

/// Capture the canonical target profiles (defined across `limits`), each
/// displayed with both encoding modes.
pub fn capture_profiles(
    display: &mut dyn Display,
    spectrometer: &mut dyn Spectrometer,
    settings: &CaptureSettings,
    encoder: &ProfileEncoder,
    limits: [f64; 2],
) -> Result<ProfilesData, ProtocolError> {
    check_limits(limits)?;
    let target_wvl = linspace(limits[0], limits[1], PROFILE_TEST_NUM_WAVELENGTHS);
    let targets = canonical_profiles(PROFILE_TEST_NUM_WAVELENGTHS);
    let wvl = spectrometer.wavelengths().to_owned();

    let dark_image = Array2::zeros(display.shape());
    let zeros = show_and_measure(display, spectrometer, dark_image.view(), settings)?;

    let num_profiles = targets.nrows();
    let mut gamma = Array2::zeros((num_profiles, wvl.len()));
    let mut pwm = Array2::zeros((num_profiles, wvl.len()));
    let pb = progress_bar(num_profiles, "profiles", "Profiles test");
    for (i, target) in targets.outer_iter().enumerate() {
        for (mode, data) in [(EncodeMode::Gamma, &mut gamma), (EncodeMode::Pwm, &mut pwm)] {
            let image = encoder.encode(target_wvl.view(), target, mode)?;
            data.row_mut(i).assign(&show_and_measure(
                display,
                spectrometer,
                image.view(),
                settings,
            )?);
        }
        pb.inc(1);
    }
    pb.abandon_with_message("Finished profiles");

    Ok(ProfilesData {
        wvl,
        target_wvl,
        targets,
        zeros,
        gamma,
        pwm,
    })
}
