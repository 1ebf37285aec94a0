// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Per-wavelength gamma (display level -> intensity) curves and their
//! inverses.

use log::{debug, warn};
use ndarray::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::CalibrationError;
use crate::{
    constants::{GAMMA_MIN_INVERSE_POINTS, GAMMA_POLY_DEGREE},
    math::{interp_linear, is_strictly_ascending, smooth_spectrum, Polynomial},
};

/// Inverse gamma curves. `table[(b, j)]` is the display level that makes
/// wavelength `j` reach intensity bucket `b` out of `nlevels - 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GammaTable {
    pub wvl: Array1<f64>,

    /// Shape (nlevels, len(wvl)).
    pub table: Array2<u8>,

    /// Was each wavelength's curve fitted? Unfitted wavelengths are all 0
    /// in `table`.
    pub fitted: Vec<bool>,
}

impl GammaTable {
    pub fn nlevels(&self) -> usize {
        self.table.len_of(Axis(0))
    }

    pub fn num_fitted(&self) -> usize {
        self.fitted.iter().filter(|&&f| f).count()
    }

    /// The display level for intensity bucket `bucket` at wavelength index
    /// `j`.
    pub fn level(&self, bucket: usize, j: usize) -> u8 {
        self.table[(bucket, j)]
    }
}

/// Fit inverse gamma curves from spectra captured with the whole display at
/// each level. `data` has shape (nlevels, len(wvl)); row `l` is the spectrum
/// for display level `l`. `offset` is the dark spectrum.
///
/// Wavelengths without enough signal are left at 0 and marked unfitted; a
/// warning is logged for each run of such wavelengths.
pub fn fit_gamma(
    wvl: ArrayView1<f64>,
    data: ArrayView2<f64>,
    offset: ArrayView1<f64>,
) -> Result<GammaTable, CalibrationError> {
    let (nlevels, num_wvl) = data.dim();
    if !is_strictly_ascending(wvl) {
        return Err(CalibrationError::NotAscending {
            thing: "spectrometer",
        });
    }
    if num_wvl != wvl.len() {
        return Err(CalibrationError::LengthMismatch {
            thing: "each gamma spectrum",
            expected: wvl.len(),
            actual: num_wvl,
        });
    }
    if offset.len() != wvl.len() {
        return Err(CalibrationError::LengthMismatch {
            thing: "the dark spectrum",
            expected: wvl.len(),
            actual: offset.len(),
        });
    }
    if !(2..=256).contains(&nlevels) {
        return Err(CalibrationError::BadLevelCount { nlevels });
    }

    let mut smoothed = Array2::zeros((nlevels, num_wvl));
    for (spectrum, mut out) in data.outer_iter().zip(smoothed.outer_iter_mut()) {
        let dark_subtracted = &spectrum - &offset;
        out.assign(&smooth_spectrum(dark_subtracted.view()));
    }

    let degree = GAMMA_POLY_DEGREE.min(nlevels - 1);
    let levels: Vec<f64> = (0..nlevels).map(|l| l as f64).collect();
    // Every wavelength's curve is independent.
    let inverses: Vec<Option<Array1<u8>>> = (0..num_wvl)
        .into_par_iter()
        .map(|j| invert_curve(smoothed.column(j), &levels, degree))
        .collect();
    let mut table = Array2::zeros((nlevels, num_wvl));
    let mut fitted = vec![false; num_wvl];
    for (j, inverse) in inverses.into_iter().enumerate() {
        if let Some(inverse) = inverse {
            table.column_mut(j).assign(&inverse);
            fitted[j] = true;
        }
    }

    warn_unfitted(wvl, &fitted);
    debug!(
        "Fitted gamma curves for {} of {} wavelengths",
        fitted.iter().filter(|&&f| f).count(),
        num_wvl
    );

    Ok(GammaTable {
        wvl: wvl.to_owned(),
        table,
        fitted,
    })
}

/// Invert a single response curve (one value per display level). `None` if
/// the curve can't be inverted reliably.
fn invert_curve(curve: ArrayView1<f64>, levels: &[f64], degree: usize) -> Option<Array1<u8>> {
    let nlevels = curve.len();
    let max = curve.fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));
    if !max.is_finite() || max <= 0.0 {
        return None;
    }
    let normalised: Vec<f64> = curve.iter().map(|v| v / max).collect();
    let poly = Polynomial::fit(levels, &normalised, degree)?;
    let response: Vec<f64> = levels
        .iter()
        .map(|&l| poly.eval(l).clamp(0.0, 1.0))
        .collect();

    // Only the monotonic-ish stretch between the darkest and brightest levels
    // is invertible.
    let (argmin, argmax) = arg_extrema(&response);
    let (first, last) = (argmin.min(argmax), argmin.max(argmax));

    let top = (nlevels - 1) as f64;
    let mut buckets: Vec<Option<usize>> = vec![None; nlevels];
    for (level, &r) in response.iter().enumerate().take(last + 1).skip(first) {
        buckets[(r * top).round() as usize] = Some(level);
    }

    let (xp, fp): (Vec<f64>, Vec<f64>) = buckets
        .iter()
        .enumerate()
        .filter_map(|(b, level)| level.map(|l| (b as f64, l as f64)))
        .unzip();
    if xp.len() < GAMMA_MIN_INVERSE_POINTS {
        return None;
    }
    let lowest = fp.iter().copied().fold(f64::INFINITY, f64::min);
    let highest = fp.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(Array1::from_shape_fn(nlevels, |b| {
        interp_linear(b as f64, &xp, &fp, lowest, highest)
            .round()
            .clamp(0.0, 255.0) as u8
    }))
}

/// The first indices of the minimum and maximum values.
fn arg_extrema(values: &[f64]) -> (usize, usize) {
    let mut argmin = 0;
    let mut argmax = 0;
    for (i, &v) in values.iter().enumerate() {
        if v < values[argmin] {
            argmin = i;
        }
        if v > values[argmax] {
            argmax = i;
        }
    }
    (argmin, argmax)
}

/// Warn about contiguous runs of wavelengths that couldn't be fitted.
fn warn_unfitted(wvl: ArrayView1<f64>, fitted: &[bool]) {
    let mut run_start = None;
    for (j, &f) in fitted.iter().chain(std::iter::once(&true)).enumerate() {
        match (f, run_start) {
            (false, None) => run_start = Some(j),
            (true, Some(start)) => {
                warn!(
                    "Not enough gamma signal between {:.1} and {:.1} nm; {} wavelength(s) left unfitted",
                    wvl[start],
                    wvl[j - 1],
                    j - start
                );
                run_start = None;
            }
            _ => (),
        }
    }
}
