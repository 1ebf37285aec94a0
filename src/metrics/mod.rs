// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Metrics of how well the rig reproduces what it's asked to.

mod error;

pub use error::*;

use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    constants::CONTRAST_MEDIAN_WINDOW,
    math::{interp_linear, is_strictly_ascending, median_filter, nearest_index, Polynomial},
};

pub use crate::math::reconstruction_snr;

/// A spectral peak located by its half-maximum crossings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectralPeak {
    /// Midway between the half-maximum crossings \[nm\].
    pub centre: f64,

    /// Full width at half maximum \[nm\].
    pub fwhm: f64,

    /// The peak value.
    pub peak: f64,
}

/// The per-wavelength contrast ratio of the SLM: how much brighter fully-on
/// is than fully-off, after removing the dark spectrum. Spectra are median
/// filtered first; wavelengths where the off spectrum isn't above the dark
/// spectrum are NaN.
pub fn contrast_ratio(
    offset: ArrayView1<f64>,
    zeros: ArrayView1<f64>,
    ones: ArrayView1<f64>,
) -> Result<Array1<f64>, MetricsError> {
    check_len("the all-off spectrum", offset.len(), zeros.len())?;
    check_len("the all-on spectrum", offset.len(), ones.len())?;

    let offset = median_filter(offset, CONTRAST_MEDIAN_WINDOW);
    let zeros = median_filter(zeros, CONTRAST_MEDIAN_WINDOW);
    let ones = median_filter(ones, CONTRAST_MEDIAN_WINDOW);

    let mut contrast = Array1::zeros(offset.len());
    ndarray::Zip::from(&mut contrast)
        .and(&offset)
        .and(&zeros)
        .and(&ones)
        .for_each(|c, &dark, &off, &on| {
            let denominator = off - dark;
            *c = if denominator > 0.0 {
                (on - dark) / denominator
            } else {
                f64::NAN
            };
        });
    Ok(contrast)
}

/// Locate the highest peak of `spectrum` and its full width at half maximum.
/// `None` if the spectrum has no positive peak, or the peak isn't bounded by
/// half-maximum crossings on both sides.
pub fn fwhm(wvl: ArrayView1<f64>, spectrum: ArrayView1<f64>) -> Option<SpectralPeak> {
    if wvl.len() != spectrum.len() || spectrum.is_empty() {
        return None;
    }
    let (argmax, &peak) = spectrum
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.total_cmp(b))?;
    if !peak.is_finite() || peak <= 0.0 {
        return None;
    }
    let half = peak / 2.0;

    // Interpolated position where the spectrum crosses `half` between samples
    // i and j.
    let crossing = |i: usize, j: usize| {
        let (yi, yj) = (spectrum[i], spectrum[j]);
        wvl[i] + (half - yi) * (wvl[j] - wvl[i]) / (yj - yi)
    };
    let left = (0..argmax)
        .rev()
        .find(|&i| spectrum[i] < half)
        .map(|i| crossing(i, i + 1))?;
    let right = (argmax + 1..spectrum.len())
        .find(|&i| spectrum[i] < half)
        .map(|i| crossing(i - 1, i))?;

    Some(SpectralPeak {
        centre: (left + right) / 2.0,
        fwhm: right - left,
        peak,
    })
}

/// How linear the response to a sweep of levels is, per wavelength. `data`
/// has one row per level and one column per wavelength; a straight line is
/// fitted to each column and the SNR (dB) of the measurement against the fit
/// is returned. Columns that can't be fitted are NaN.
pub fn linearity_snr(
    levels: ArrayView1<f64>,
    data: ArrayView2<f64>,
) -> Result<Array1<f64>, MetricsError> {
    check_len("the level sweep", levels.len(), data.nrows())?;
    let levels = levels.to_vec();
    Ok(data
        .axis_iter(Axis(1))
        .map(|response| {
            let response = response.to_vec();
            match Polynomial::fit(&levels, &response, 1) {
                Some(line) => {
                    let fitted: Array1<f64> = levels.iter().map(|&l| line.eval(l)).collect();
                    reconstruction_snr(fitted.view(), Array1::from(response).view())
                }
                None => f64::NAN,
            }
        })
        .collect())
}

/// How faithfully a measured spectrum reproduces a target profile, as an SNR
/// (dB). The target (defined at `target_wvl`) is linearly interpolated onto
/// the measured wavelengths; both are then normalised to their maximum
/// between the wavelengths nearest to `limits` and compared there.
pub fn profile_accuracy(
    target_wvl: ArrayView1<f64>,
    target: ArrayView1<f64>,
    wvl: ArrayView1<f64>,
    measured: ArrayView1<f64>,
    limits: [f64; 2],
) -> Result<f64, MetricsError> {
    check_len("the target profile", target_wvl.len(), target.len())?;
    check_len("the measured spectrum", wvl.len(), measured.len())?;
    if !is_strictly_ascending(target_wvl) {
        return Err(MetricsError::NotAscending { thing: "target" });
    }
    if !is_strictly_ascending(wvl) {
        return Err(MetricsError::NotAscending {
            thing: "spectrometer",
        });
    }

    let start = nearest_index(wvl, limits[0]);
    let end = nearest_index(wvl, limits[1]);
    if start >= end {
        return Err(MetricsError::EmptyLimits {
            low: limits[0],
            high: limits[1],
        });
    }

    let target_wvl = target_wvl.to_vec();
    let target = target.to_vec();
    let resampled: Array1<f64> = wvl
        .slice(s![start..end])
        .iter()
        .map(|&l| interp_linear(l, &target_wvl, &target, 0.0, 0.0))
        .collect();
    let measured = measured.slice(s![start..end]);

    Ok(reconstruction_snr(
        normalise(resampled.view()).view(),
        normalise(measured).view(),
    ))
}

/// Names of the canonical target profiles, in the order of
/// [`canonical_profiles`].
pub const CANONICAL_PROFILE_NAMES: [&str; 6] = [
    "flat",
    "ramp up",
    "ramp down",
    "triangle",
    "wide gaussian",
    "two gaussians",
];

/// Six test profiles of `n` samples each, one per row: flat, increasing ramp,
/// decreasing ramp, triangle, a wide Gaussian, and two narrow Gaussians (the
/// second at half height).
pub fn canonical_profiles(n: usize) -> Array2<f64> {
    let mut profiles = Array2::zeros((6, n));
    let half = n / 2;

    profiles.row_mut(0).fill(1.0);
    profiles.row_mut(1).assign(&linspace(0.0, 1.0, n));
    profiles.row_mut(2).assign(&linspace(1.0, 0.0, n));
    profiles
        .slice_mut(s![3, ..half])
        .assign(&linspace(0.0, 1.0, half));
    profiles
        .slice_mut(s![3, half..])
        .assign(&linspace(1.0, 0.0, n - half));
    profiles.row_mut(4).assign(&gaussian_window(n, 20.0));
    profiles
        .slice_mut(s![5, ..half])
        .assign(&gaussian_window(half, 4.0));
    profiles
        .slice_mut(s![5, half..])
        .assign(&(gaussian_window(n - half, 4.0) * 0.5));
    profiles
}

fn linspace(start: f64, end: f64, n: usize) -> Array1<f64> {
    match n {
        0 => Array1::zeros(0),
        1 => array![start],
        _ => Array1::linspace(start, end, n),
    }
}

/// A Gaussian window of `n` samples with standard deviation `std` samples,
/// peaking at 1 in the middle.
fn gaussian_window(n: usize, std: f64) -> Array1<f64> {
    let centre = (n as f64 - 1.0) / 2.0;
    Array1::from_shape_fn(n, |i| (-0.5 * ((i as f64 - centre) / std).powi(2)).exp())
}

fn normalise(x: ArrayView1<f64>) -> Array1<f64> {
    let max = x.fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));
    if max > 0.0 {
        x.mapv(|v| v / max)
    } else {
        x.to_owned()
    }
}

fn check_len(thing: &'static str, expected: usize, actual: usize) -> Result<(), MetricsError> {
    if expected == actual {
        Ok(())
    } else {
        Err(MetricsError::LengthMismatch {
            thing,
            expected,
            actual,
        })
    }
}
