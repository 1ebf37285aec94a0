// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Protocols capturing the data needed to calibrate the device.

use log::{debug, info};
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

use super::*;
use crate::{
    calibration::{fit_gamma, fit_mapping, CalibrationError, GammaTable, WavelengthMapping},
    coding::{binary_codes, decode, CaptureStack, CodeAxis, CodingError},
    metrics::{contrast_ratio, MetricsError},
};

/// Spectra with the whole display at each level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GammaData {
    pub wvl: Array1<f64>,

    /// The dark spectrum.
    pub offset: Array1<f64>,

    /// Shape (nlevels, len(wvl)).
    pub data: Array2<f64>,
}

impl GammaData {
    pub fn fit(&self) -> Result<GammaTable, CalibrationError> {
        fit_gamma(self.wvl.view(), self.data.view(), self.offset.view())
    }
}

/// Spectra of binary column codes and their complements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingData {
    pub wvl: Array1<f64>,
    pub zeros: Array1<f64>,
    pub ones: Array1<f64>,

    /// Shape (num_planes, len(wvl)), most significant bit first.
    pub positive: Array2<f64>,
    pub negative: Array2<f64>,
}

impl MappingData {
    /// The SLM column decoded at each wavelength; `None` where no light was
    /// seen.
    pub fn decode(&self) -> Result<Vec<Option<u32>>, CodingError> {
        let stack = CaptureStack::from_spectra(
            self.positive.view(),
            self.negative.view(),
            self.ones.view(),
            self.zeros.view(),
        )?;
        let map = decode(&stack);
        debug!(
            "Decoded {} of {} wavelengths",
            map.num_valid(),
            self.wvl.len()
        );
        Ok((0..self.wvl.len()).map(|j| map.get(j, 0)).collect())
    }

    /// Fit the wavelength to column mapping between `limits`.
    pub fn fit(&self, limits: [f64; 2]) -> Result<WavelengthMapping, ProtocolError> {
        let trace = self.decode()?;
        Ok(fit_mapping(&trace, self.wvl.view(), limits)?)
    }
}

/// Dark, all-off and all-on spectra.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContrastData {
    pub wvl: Array1<f64>,
    pub offset: Array1<f64>,
    pub zeros: Array1<f64>,
    pub ones: Array1<f64>,
}

impl ContrastData {
    pub fn contrast_ratio(&self) -> Result<Array1<f64>, MetricsError> {
        contrast_ratio(self.offset.view(), self.zeros.view(), self.ones.view())
    }
}

/// Capture spectra for every display level, after a dark spectrum.
pub fn capture_gamma(
    display: &mut dyn Display,
    spectrometer: &mut dyn Spectrometer,
    operator: &mut dyn Operator,
    settings: &CaptureSettings,
    nlevels: usize,
) -> Result<GammaData, ProtocolError> {
    if !(2..=256).contains(&nlevels) {
        return Err(ProtocolError::BadLevelCount { nlevels });
    }
    let offset = measure_dark(spectrometer, operator, settings)?;
    let wvl = spectrometer.wavelengths().to_owned();

    info!("Capturing {nlevels} display levels");
    let mut data = Array2::zeros((nlevels, wvl.len()));
    let mut image = Array2::zeros(display.shape());
    let pb = progress_bar(nlevels, "levels", "Gamma levels");
    for (level, mut spectrum) in data.outer_iter_mut().enumerate() {
        image.fill(level as u8);
        spectrum.assign(&show_and_measure(
            display,
            spectrometer,
            image.view(),
            settings,
        )?);
        pb.inc(1);
    }
    pb.abandon_with_message("Finished gamma");

    Ok(GammaData { wvl, offset, data })
}

/// Capture spectra of binary column codes and their complements, plus the
/// all-off and all-on references.
pub fn capture_mapping(
    display: &mut dyn Display,
    spectrometer: &mut dyn Spectrometer,
    settings: &CaptureSettings,
) -> Result<MappingData, ProtocolError> {
    let (height, width) = display.shape();
    let pattern = binary_codes(height, width, CodeAxis::Columns)?;
    let num_planes = pattern.num_planes();
    let wvl = spectrometer.wavelengths().to_owned();

    let (zeros, ones) = measure_extremes(display, spectrometer, settings)?;

    info!("Capturing {num_planes} binary code planes");
    let mut positive = Array2::zeros((num_planes, wvl.len()));
    let mut negative = Array2::zeros((num_planes, wvl.len()));
    let pb = progress_bar(num_planes, "planes", "Binary codes");
    for k in 0..num_planes {
        positive.row_mut(k).assign(&show_and_measure(
            display,
            spectrometer,
            pattern.to_display(k).view(),
            settings,
        )?);
        negative.row_mut(k).assign(&show_and_measure(
            display,
            spectrometer,
            pattern.to_display_inverted(k).view(),
            settings,
        )?);
        pb.inc(1);
    }
    pb.abandon_with_message("Finished codes");

    Ok(MappingData {
        wvl,
        zeros,
        ones,
        positive,
        negative,
    })
}

/// Capture dark, all-off and all-on spectra.
pub fn capture_contrast(
    display: &mut dyn Display,
    spectrometer: &mut dyn Spectrometer,
    operator: &mut dyn Operator,
    settings: &CaptureSettings,
) -> Result<ContrastData, ProtocolError> {
    let offset = measure_dark(spectrometer, operator, settings)?;
    let (zeros, ones) = measure_extremes(display, spectrometer, settings)?;
    Ok(ContrastData {
        wvl: spectrometer.wavelengths().to_owned(),
        offset,
        zeros,
        ones,
    })
}
