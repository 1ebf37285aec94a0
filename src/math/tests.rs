// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use approx::assert_abs_diff_eq;

use super::*;

#[test]
fn test_next_pow2() {
    assert_eq!(next_pow2(1), 1);
    assert_eq!(next_pow2(2), 2);
    assert_eq!(next_pow2(3), 4);
    assert_eq!(next_pow2(1080), 2048);
    assert_eq!(next_pow2(1920), 2048);
    assert_eq!(next_pow2(2048), 2048);
}

#[test]
fn test_hadamard_small_orders() {
    assert_eq!(hadamard(1), array![[1]]);
    assert_eq!(hadamard(2), array![[1, 1], [1, -1]]);
    assert_eq!(
        hadamard(4),
        array![[1, 1, 1, 1], [1, -1, 1, -1], [1, 1, -1, -1], [1, -1, -1, 1]]
    );
}

#[test]
fn test_hadamard_rows_are_orthogonal() {
    let n = 64;
    let h = hadamard(n).mapv(i32::from);
    let gram = h.dot(&h.t());
    assert_eq!(gram, Array2::<i32>::eye(n) * n as i32);
}

#[test]
fn test_median_filter_removes_spikes() {
    let x = array![1.0, 2.0, 100.0, 4.0, 5.0, 6.0, -50.0, 8.0, 9.0];
    let filtered = median_filter(x.view(), 3);
    assert_abs_diff_eq!(
        filtered,
        array![1.0, 2.0, 4.0, 5.0, 5.0, 5.0, 6.0, 8.0, 8.0]
    );
}

#[test]
fn test_median_filter_pads_with_zeros() {
    let x = array![5.0, 5.0, 5.0, 5.0, 5.0];
    let filtered = median_filter(x.view(), 5);
    // The outer two samples see two zero pads.
    assert_abs_diff_eq!(filtered, array![5.0, 5.0, 5.0, 5.0, 5.0]);
    // Without padding the last sample would be 2.
    let filtered = median_filter(array![1.0, 2.0, 3.0].view(), 5);
    assert_abs_diff_eq!(filtered, array![1.0, 1.0, 1.0]);
}

#[test]
fn test_hamming() {
    let w = hamming(5);
    assert_abs_diff_eq!(w, array![0.08, 0.54, 1.0, 0.54, 0.08], epsilon = 1e-12);
    assert_abs_diff_eq!(hamming(1), array![1.0]);
}

#[test]
fn test_convolve_same() {
    let x = array![1.0, 2.0, 3.0, 4.0];
    let k = array![1.0, 1.0, 1.0];
    assert_abs_diff_eq!(
        convolve_same(x.view(), k.view()),
        array![3.0, 6.0, 9.0, 7.0]
    );

    // An asymmetric kernel shows the orientation.
    let x = array![0.0, 1.0, 0.0, 0.0];
    let k = array![1.0, 2.0, 3.0];
    assert_abs_diff_eq!(
        convolve_same(x.view(), k.view()),
        array![1.0, 2.0, 3.0, 0.0]
    );
}

#[test]
fn test_is_strictly_ascending() {
    assert!(is_strictly_ascending(array![1.0, 2.0, 3.0].view()));
    assert!(!is_strictly_ascending(array![1.0, 1.0, 3.0].view()));
    assert!(!is_strictly_ascending(array![3.0, 2.0].view()));
    assert!(!is_strictly_ascending(array![1.0, f64::NAN].view()));
}

#[test]
fn test_nearest_index() {
    let v = array![400.0, 410.0, 420.0, 430.0];
    assert_eq!(nearest_index(v.view(), 0.0), 0);
    assert_eq!(nearest_index(v.view(), 414.0), 1);
    assert_eq!(nearest_index(v.view(), 415.0), 1);
    assert_eq!(nearest_index(v.view(), 416.0), 2);
    assert_eq!(nearest_index(v.view(), 1000.0), 3);
}

#[test]
fn test_interp_linear() {
    let xp = [0.0, 1.0, 3.0];
    let fp = [0.0, 10.0, 30.0];
    assert_abs_diff_eq!(interp_linear(0.5, &xp, &fp, -1.0, -2.0), 5.0);
    assert_abs_diff_eq!(interp_linear(2.0, &xp, &fp, -1.0, -2.0), 20.0);
    assert_abs_diff_eq!(interp_linear(3.0, &xp, &fp, -1.0, -2.0), 30.0);
    assert_abs_diff_eq!(interp_linear(0.0, &xp, &fp, -1.0, -2.0), 0.0);
    assert_abs_diff_eq!(interp_linear(-0.1, &xp, &fp, -1.0, -2.0), -1.0);
    assert_abs_diff_eq!(interp_linear(3.1, &xp, &fp, -1.0, -2.0), -2.0);
}

#[test]
fn test_resample_nearest() {
    let x = array![0.0, 1.0, 2.0];
    let y = array![10.0, 20.0, 30.0];
    let new_x = array![-0.5, 0.0, 0.4, 0.5, 0.6, 2.0, 2.5];
    assert_abs_diff_eq!(
        resample_nearest(x.view(), y.view(), new_x.view()),
        array![0.0, 10.0, 10.0, 10.0, 20.0, 30.0, 0.0]
    );
}

#[test]
fn test_reconstruction_snr() {
    let reference = array![3.0, 4.0];
    assert!(reconstruction_snr(reference.view(), reference.view()).is_infinite());
    // ||ref|| = 5, ||err|| = 0.5 -> 20 dB.
    let estimate = array![3.3, 4.4];
    assert_abs_diff_eq!(
        reconstruction_snr(reference.view(), estimate.view()),
        20.0,
        epsilon = 1e-10
    );
}

#[test]
fn test_polyfit_recovers_quadratic() {
    let x: Vec<f64> = (0..50).map(|i| 400.0 + 8.0 * i as f64).collect();
    let y: Vec<f64> = x.iter().map(|x| 3.0 + 0.5 * x - 2e-4 * x * x).collect();
    let p = Polynomial::fit(&x, &y, 2).unwrap();
    assert_eq!(p.degree(), 2);
    for (&x, &y) in x.iter().zip(y.iter()) {
        assert_abs_diff_eq!(p.eval(x), y, epsilon = 1e-8);
    }
    // Extrapolation follows the same quadratic.
    assert_abs_diff_eq!(p.eval(900.0), 3.0 + 450.0 - 2e-4 * 810000.0, epsilon = 1e-6);
}

#[test]
fn test_polyfit_high_degree_is_stable() {
    let x: Vec<f64> = (0..256).map(|i| i as f64 / 255.0).collect();
    let y: Vec<f64> = x.iter().map(|x| x.powf(2.2)).collect();
    let p = Polynomial::fit(&x, &y, 10).unwrap();
    let fitted = p.eval_all(Array1::from(x.clone()).view());
    for (f, y) in fitted.iter().zip(y.iter()) {
        assert_abs_diff_eq!(f, y, epsilon = 5e-3);
    }
}

#[test]
fn test_polyfit_least_squares_line() {
    // Symmetric noise around y = 2x + 1 doesn't move the fit.
    let x = [0.0, 0.0, 1.0, 1.0, 2.0, 2.0];
    let y = [0.9, 1.1, 2.9, 3.1, 4.9, 5.1];
    let p = Polynomial::fit(&x, &y, 1).unwrap();
    assert_abs_diff_eq!(p.eval(0.0), 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(p.eval(1.0), 3.0, epsilon = 1e-12);
}

#[test]
fn test_polyfit_rejects_degenerate_input() {
    assert!(Polynomial::fit(&[1.0, 2.0], &[1.0, 2.0], 2).is_none());
    assert!(Polynomial::fit(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0], 1).is_none());
    assert!(Polynomial::fit(&[1.0, 2.0, 3.0], &[1.0, 2.0], 1).is_none());
    assert!(Polynomial::fit(&[1.0, 2.0, f64::NAN], &[1.0, 2.0, 3.0], 1).is_none());
    // Three points but only two distinct abscissae can't pin down a quadratic.
    assert!(Polynomial::fit(&[1.0, 1.0, 2.0], &[1.0, 1.0, 2.0], 2).is_none());

    let p = Polynomial::fit(&[2.0, 2.0], &[1.0, 3.0], 0).unwrap();
    assert_abs_diff_eq!(p.eval(100.0), 2.0, epsilon = 1e-12);
}
