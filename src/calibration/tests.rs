// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;
use ndarray::prelude::*;

use super::*;

fn wavelengths() -> Array1<f64> {
    Array1::from_shape_fn(201, |i| 400.0 + 2.0 * i as f64)
}

fn true_column(wavelength: f64) -> f64 {
    let dl = wavelength - 400.0;
    100.0 + 3.0 * dl + 0.002 * dl * dl
}

fn decoded_trace(wvl: ArrayView1<f64>) -> Vec<Option<u32>> {
    wvl.iter()
        .map(|&l| Some(true_column(l).floor() as u32))
        .collect()
}

#[test]
fn test_fit_mapping_recovers_dispersion() {
    let wvl = wavelengths();
    let trace = decoded_trace(wvl.view());
    let mapping = fit_mapping(&trace, wvl.view(), [420.0, 780.0]).unwrap();

    assert_eq!(mapping.wvl, wvl);
    assert_eq!(mapping.columns.len(), wvl.len());
    assert_eq!(mapping.limits, [420.0, 780.0]);
    assert_eq!(mapping.polynomial.degree(), 2);
    // Decoding floors, so the fit sits about half a column low.
    for (&l, &c) in wvl.iter().zip(mapping.columns.iter()) {
        assert_abs_diff_eq!(c, true_column(l) - 0.5, epsilon = 0.5);
    }
    assert_abs_diff_eq!(mapping.column_of(600.0), mapping.columns[100]);
}

#[test]
fn test_fit_mapping_ignores_masked_samples_and_spikes() {
    let wvl = wavelengths();
    let mut trace = decoded_trace(wvl.view());
    for t in trace.iter_mut().take(40) {
        *t = None;
    }
    trace[150] = None;
    trace[100] = Some(0);
    let mapping = fit_mapping(&trace, wvl.view(), [420.0, 780.0]).unwrap();
    for (&l, &c) in wvl.iter().zip(mapping.columns.iter()).skip(40) {
        assert_abs_diff_eq!(c, true_column(l) - 0.5, epsilon = 1.0);
    }
}

#[test]
fn test_fit_mapping_errors() {
    let wvl = wavelengths();
    let trace = decoded_trace(wvl.view());

    let reversed = wvl.slice(s![..;-1]).to_owned();
    assert!(matches!(
        fit_mapping(&trace, reversed.view(), [420.0, 780.0]),
        Err(CalibrationError::NotAscending { .. })
    ));
    assert!(matches!(
        fit_mapping(&trace[1..], wvl.view(), [420.0, 780.0]),
        Err(CalibrationError::LengthMismatch {
            expected: 201,
            actual: 200,
            ..
        })
    ));
    assert!(matches!(
        fit_mapping(&trace, wvl.view(), [780.0, 420.0]),
        Err(CalibrationError::InvertedLimits { .. })
    ));
    assert!(matches!(
        fit_mapping(&trace, wvl.view(), [500.0, 500.0]),
        Err(CalibrationError::InvertedLimits { .. })
    ));

    let mut sparse = vec![None; wvl.len()];
    sparse[50] = Some(300);
    sparse[60] = Some(370);
    assert!(matches!(
        fit_mapping(&sparse, wvl.view(), [420.0, 780.0]),
        Err(CalibrationError::NotEnoughSamples { got: 2, need: 3 })
    ));
}

/// Gamma capture data where every wavelength responds as `response(level)`,
/// scaled per wavelength, on top of a constant dark level.
fn gamma_data(
    nlevels: usize,
    num_wvl: usize,
    response: impl Fn(f64) -> f64,
) -> (Array1<f64>, Array2<f64>, Array1<f64>) {
    let wvl = Array1::from_shape_fn(num_wvl, |j| 450.0 + 5.0 * j as f64);
    let offset = Array1::from_elem(num_wvl, 3.0);
    let top = (nlevels - 1) as f64;
    let data = Array2::from_shape_fn((nlevels, num_wvl), |(l, j)| {
        3.0 + 1000.0 * (1.0 + j as f64 / num_wvl as f64) * response(l as f64 / top)
    });
    (wvl, data, offset)
}

#[test]
fn test_linear_gamma_inverts_to_identity() {
    let (wvl, data, offset) = gamma_data(256, 40, |x| x);
    let gamma = fit_gamma(wvl.view(), data.view(), offset.view()).unwrap();

    assert_eq!(gamma.nlevels(), 256);
    assert_eq!(gamma.table.dim(), (256, 40));
    assert_eq!(gamma.num_fitted(), 40);
    let identity = Array1::from_shape_fn(256, |b| b as u8);
    for column in gamma.table.axis_iter(Axis(1)) {
        assert_eq!(column, identity);
    }
    assert_eq!(gamma.level(128, 7), 128);
}

#[test]
fn test_power_law_gamma_inverse() {
    let g = 2.2;
    let (wvl, data, offset) = gamma_data(256, 10, |x| x.powf(g));
    let gamma = fit_gamma(wvl.view(), data.view(), offset.view()).unwrap();
    assert_eq!(gamma.num_fitted(), 10);

    for column in gamma.table.axis_iter(Axis(1)) {
        assert_eq!(column[255], 255);
        for b in 0..255 {
            assert!(column[b] <= column[b + 1]);
        }
        // The darkest buckets are poorly constrained by the fit.
        for b in 20..256 {
            let expected = 255.0 * (b as f64 / 255.0).powf(1.0 / g);
            assert_abs_diff_eq!(f64::from(column[b]), expected, epsilon = 2.0);
        }
    }
}

#[test]
fn test_decreasing_gamma_inverse() {
    // An SLM that goes dark as the level increases.
    let (wvl, data, offset) = gamma_data(256, 5, |x| 1.0 - x);
    let gamma = fit_gamma(wvl.view(), data.view(), offset.view()).unwrap();
    let expected = Array1::from_shape_fn(256, |b| (255 - b) as u8);
    for column in gamma.table.axis_iter(Axis(1)) {
        assert_eq!(column, expected);
    }
}

#[test]
fn test_gamma_with_few_levels() {
    let (wvl, data, offset) = gamma_data(16, 5, |x| x);
    let gamma = fit_gamma(wvl.view(), data.view(), offset.view()).unwrap();
    assert_eq!(gamma.nlevels(), 16);
    assert_eq!(
        gamma.table.column(2),
        Array1::from_shape_fn(16, |b| b as u8)
    );
}

#[test]
fn test_gamma_dark_wavelengths_are_unfitted() {
    let (wvl, mut data, offset) = gamma_data(256, 30, |x| x);
    // No light at all in the first 10 wavelengths. Smoothing leaks a little
    // signal into the neighbours of the last dark wavelength, so only test the
    // clearly-dark ones.
    data.slice_mut(s![.., ..10]).fill(3.0);
    let gamma = fit_gamma(wvl.view(), data.view(), offset.view()).unwrap();

    for j in 0..8 {
        assert!(!gamma.fitted[j]);
        assert!(gamma.table.column(j).iter().all(|&v| v == 0));
    }
    for j in 12..30 {
        assert!(gamma.fitted[j]);
        assert_eq!(gamma.table[(255, j)], 255);
    }
}

#[test]
fn test_gamma_never_saturated_is_unfitted() {
    // A response that is flat everywhere has a single bucket.
    let (wvl, data, offset) = gamma_data(256, 5, |_| 0.5);
    let gamma = fit_gamma(wvl.view(), data.view(), offset.view()).unwrap();
    assert_eq!(gamma.num_fitted(), 0);
}

#[test]
fn test_gamma_floor_clamps_to_known_levels() {
    // Level 0 already passes 20% of the light, so buckets below 51 have no
    // direct inverse and take the lowest known level.
    let (wvl, data, offset) = gamma_data(256, 6, |x| 0.2 + 0.8 * x);
    let gamma = fit_gamma(wvl.view(), data.view(), offset.view()).unwrap();
    assert_eq!(gamma.num_fitted(), 6);

    for column in gamma.table.axis_iter(Axis(1)) {
        for b in 0..51 {
            assert_eq!(column[b], 0, "bucket {b}");
        }
        for b in 51..256 {
            let expected = (b as f64 - 51.0) / 0.8;
            assert_abs_diff_eq!(f64::from(column[b]), expected, epsilon = 1.5);
        }
        assert_eq!(column[255], 255);
        let lowest = column.iter().copied().min().unwrap();
        let highest = column.iter().copied().max().unwrap();
        assert_eq!((lowest, highest), (0, 255));
    }
}

#[test]
fn test_gamma_needs_three_inverse_points() {
    // Three levels landing on three distinct buckets can be inverted.
    let (wvl, data, offset) = gamma_data(3, 4, |x| x);
    let gamma = fit_gamma(wvl.view(), data.view(), offset.view()).unwrap();
    assert_eq!(gamma.num_fitted(), 4);
    assert_eq!(gamma.table.column(1), array![0u8, 1, 2]);

    // The first two levels share a bucket, leaving only two.
    let (wvl, data, offset) = gamma_data(3, 4, |x| if x < 0.75 { 0.5 } else { 1.0 });
    let gamma = fit_gamma(wvl.view(), data.view(), offset.view()).unwrap();
    assert_eq!(gamma.num_fitted(), 0);
    assert!(gamma.table.iter().all(|&v| v == 0));
}

#[test]
fn test_gamma_errors() {
    let (wvl, data, offset) = gamma_data(256, 10, |x| x);
    assert!(matches!(
        fit_gamma(wvl.view(), data.slice(s![..1, ..]), offset.view()),
        Err(CalibrationError::BadLevelCount { nlevels: 1 })
    ));
    let too_many = Array2::<f64>::ones((257, 10));
    assert!(matches!(
        fit_gamma(wvl.view(), too_many.view(), offset.view()),
        Err(CalibrationError::BadLevelCount { nlevels: 257 })
    ));
    assert!(matches!(
        fit_gamma(wvl.view(), data.slice(s![.., ..9]), offset.view()),
        Err(CalibrationError::LengthMismatch { .. })
    ));
    assert!(matches!(
        fit_gamma(wvl.view(), data.view(), offset.slice(s![..9])),
        Err(CalibrationError::LengthMismatch { .. })
    ));
    let reversed = wvl.slice(s![..;-1]).to_owned();
    assert!(matches!(
        fit_gamma(reversed.view(), data.view(), offset.view()),
        Err(CalibrationError::NotAscending { .. })
    ));
}

#[test]
fn test_device_calibration_states() {
    let mut device = DeviceCalibration::default();
    assert!(!device.is_fitted());
    assert!(matches!(
        device.mapping(),
        Err(CalibrationError::MappingNotFitted)
    ));
    assert!(matches!(device.gamma(), Err(CalibrationError::GammaNotFitted)));

    let (wvl, data, offset) = gamma_data(256, 10, |x| x);
    device.gamma = Some(fit_gamma(wvl.view(), data.view(), offset.view()).unwrap());
    assert!(!device.is_fitted());
    assert!(device.gamma().is_ok());

    let wvl = wavelengths();
    let trace = decoded_trace(wvl.view());
    device.mapping = Some(fit_mapping(&trace, wvl.view(), [420.0, 780.0]).unwrap());
    assert!(device.is_fitted());
}
