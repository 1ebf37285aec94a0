// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The wavelength -> SLM column mapping.

use log::debug;
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

use super::CalibrationError;
use crate::{
    constants::{MAPPING_MEDIAN_WINDOW, MAPPING_POLY_DEGREE},
    math::{is_strictly_ascending, median_filter, nearest_index, Polynomial},
};

/// Which SLM column each spectrometer wavelength lands on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WavelengthMapping {
    /// Spectrometer wavelengths \[nm\], strictly ascending.
    pub wvl: Array1<f64>,

    /// The (fractional) column of each wavelength, from the smoothed fit.
    pub columns: Array1<f64>,

    /// The wavelength range the fit was made over \[nm\].
    pub limits: [f64; 2],

    pub polynomial: Polynomial,
}

impl WavelengthMapping {
    /// The (fractional) column a wavelength lands on.
    pub fn column_of(&self, wavelength: f64) -> f64 {
        self.polynomial.eval(wavelength)
    }
}

/// Fit the wavelength mapping from a decoded spectrometer trace. `raw_trace`
/// has one decoded column index per wavelength; `None` marks samples that
/// received no light.
///
/// The trace is median filtered (masked samples count as 0, which the filter
/// tolerates at the band edges), and a quadratic is fitted over the unmasked
/// samples between the wavelengths nearest to `limits`.
pub fn fit_mapping(
    raw_trace: &[Option<u32>],
    wvl: ArrayView1<f64>,
    limits: [f64; 2],
) -> Result<WavelengthMapping, CalibrationError> {
    if !is_strictly_ascending(wvl) {
        return Err(CalibrationError::NotAscending {
            thing: "spectrometer",
        });
    }
    if raw_trace.len() != wvl.len() {
        return Err(CalibrationError::LengthMismatch {
            thing: "the decoded trace",
            expected: wvl.len(),
            actual: raw_trace.len(),
        });
    }
    let [low, high] = limits;
    if low.is_nan() || high.is_nan() || low >= high {
        return Err(CalibrationError::InvertedLimits { low, high });
    }

    let dense: Array1<f64> = raw_trace
        .iter()
        .map(|i| i.map(f64::from).unwrap_or(0.0))
        .collect();
    let filtered = median_filter(dense.view(), MAPPING_MEDIAN_WINDOW);

    let start = nearest_index(wvl, low);
    let end = nearest_index(wvl, high);
    let (x, y): (Vec<f64>, Vec<f64>) = (start..end)
        .filter(|&i| raw_trace[i].is_some())
        .map(|i| (wvl[i], filtered[i]))
        .unzip();
    debug!(
        "Fitting the wavelength mapping with {} of {} samples",
        x.len(),
        wvl.len()
    );

    let need = MAPPING_POLY_DEGREE + 1;
    if x.len() < need {
        return Err(CalibrationError::NotEnoughSamples { got: x.len(), need });
    }
    let polynomial = Polynomial::fit(&x, &y, MAPPING_POLY_DEGREE).ok_or(
        CalibrationError::FitFailed {
            what: "wavelength mapping",
        },
    )?;

    Ok(WavelengthMapping {
        wvl: wvl.to_owned(),
        columns: polynomial.eval_all(wvl),
        limits,
        polynomial,
    })
}
