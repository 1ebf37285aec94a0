// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Some helper mathematics.
//!
//! Everything here is in double precision; callers convert to display or
//! storage types as late as possible.

#[cfg(test)]
mod tests;

use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

/// The smallest power of two that is greater than or equal to `x`.
///
/// # Examples
///
/// `assert_eq!(next_pow2(1920), 2048);`
#[inline]
pub(crate) fn next_pow2(x: usize) -> usize {
    x.next_power_of_two()
}

/// The Sylvester-construction Hadamard matrix of order `n`. Entry (i, j) is
/// (-1)^popcount(i & j); row 0 is all ones.
///
/// `n` must be a power of two.
pub(crate) fn hadamard(n: usize) -> Array2<i8> {
    debug_assert!(n.is_power_of_two());
    Array2::from_shape_fn((n, n), |(i, j)| {
        if (i & j).count_ones() % 2 == 0 {
            1
        } else {
            -1
        }
    })
}

/// A median filter of odd size `window`. Like scipy's `medfilt`, the input is
/// zero padded at both ends.
pub(crate) fn median_filter(x: ArrayView1<f64>, window: usize) -> Array1<f64> {
    debug_assert!(window % 2 == 1);
    let half = (window / 2) as isize;
    let n = x.len() as isize;
    let mut buf = Vec::with_capacity(window);
    Array1::from_shape_fn(x.len(), |i| {
        buf.clear();
        for offset in -half..=half {
            let j = i as isize + offset;
            buf.push(if (0..n).contains(&j) { x[j as usize] } else { 0.0 });
        }
        buf.sort_unstable_by(|a, b| a.total_cmp(b));
        buf[half as usize]
    })
}

/// A symmetric Hamming window with `m` taps.
pub(crate) fn hamming(m: usize) -> Array1<f64> {
    if m == 1 {
        return array![1.0];
    }
    Array1::from_shape_fn(m, |n| {
        0.54 - 0.46 * (std::f64::consts::TAU * n as f64 / (m - 1) as f64).cos()
    })
}

/// Convolve `x` with `kernel`, returning the central part of the full
/// convolution with the same length as `x` (zero padding outside `x`).
pub(crate) fn convolve_same(x: ArrayView1<f64>, kernel: ArrayView1<f64>) -> Array1<f64> {
    let n = x.len() as isize;
    let shift = ((kernel.len() as isize) - 1) / 2;
    Array1::from_shape_fn(x.len(), |i| {
        kernel
            .iter()
            .enumerate()
            .filter_map(|(k, &w)| {
                let j = i as isize + shift - k as isize;
                (0..n).contains(&j).then(|| w * x[j as usize])
            })
            .sum()
    })
}

/// Smooth a spectrum with the standard Hamming window.
pub(crate) fn smooth_spectrum(spectrum: ArrayView1<f64>) -> Array1<f64> {
    convolve_same(
        spectrum,
        hamming(crate::constants::SPECTRUM_SMOOTHING_TAPS).view(),
    )
}

/// Are the values strictly increasing?
pub(crate) fn is_strictly_ascending(values: ArrayView1<f64>) -> bool {
    values.iter().all(|v| v.is_finite())
        && values
            .iter()
            .zip(values.iter().skip(1))
            .all(|(a, b)| a < b)
}

/// The index of the element closest to `target`. The first index wins ties.
/// An empty array gives 0.
pub(crate) fn nearest_index(values: ArrayView1<f64>, target: f64) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::INFINITY), |(best_i, best_d), (i, &v)| {
            let d = (v - target).abs();
            if d < best_d {
                (i, d)
            } else {
                (best_i, best_d)
            }
        })
        .0
}

/// Linearly interpolate through the points (`xp`, `fp`), where `xp` is
/// strictly ascending. Values of `x` below or above `xp` get `left` or `right`.
pub(crate) fn interp_linear(x: f64, xp: &[f64], fp: &[f64], left: f64, right: f64) -> f64 {
    debug_assert_eq!(xp.len(), fp.len());
    let (first, last) = match (xp.first(), xp.last()) {
        (Some(&f), Some(&l)) => (f, l),
        _ => return left,
    };
    if x < first {
        return left;
    }
    if x > last {
        return right;
    }
    // First index whose value is > x; at least 1 because xp[0] <= x.
    let i = xp.partition_point(|&v| v <= x);
    if i == xp.len() {
        return fp[i - 1];
    }
    let (x0, x1) = (xp[i - 1], xp[i]);
    let (y0, y1) = (fp[i - 1], fp[i]);
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

/// Nearest-neighbour resampling of `y(x)` onto `new_x`. `x` must be strictly
/// ascending. Points outside `[x[0], x[n-1]]` are 0; exact midpoints round
/// down to the lower sample.
pub(crate) fn resample_nearest(
    x: ArrayView1<f64>,
    y: ArrayView1<f64>,
    new_x: ArrayView1<f64>,
) -> Array1<f64> {
    debug_assert_eq!(x.len(), y.len());
    let xs = x.to_vec();
    let n = xs.len();
    new_x.mapv(|xn| {
        if n == 0 || xn < xs[0] || xn > xs[n - 1] {
            return 0.0;
        }
        let upper = xs.partition_point(|&v| v < xn);
        if upper == 0 {
            return y[0];
        }
        let lower = upper - 1;
        if upper == n || xn - xs[lower] <= xs[upper] - xn {
            y[lower]
        } else {
            y[upper]
        }
    })
}

/// The reconstruction SNR of `estimate` against `reference` \[dB\]. A perfect
/// reconstruction is infinitely good.
pub fn reconstruction_snr(reference: ArrayView1<f64>, estimate: ArrayView1<f64>) -> f64 {
    let signal = reference.dot(&reference).sqrt();
    let error = (&reference - &estimate).mapv(|e| e * e).sum().sqrt();
    if error == 0.0 {
        f64::INFINITY
    } else {
        20.0 * (signal / error).log10()
    }
}

/// A polynomial fitted in least squares. The abscissa is mapped onto [-1, 1]
/// before fitting to keep high-degree fits well conditioned, so the stored
/// coefficients are for the scaled variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polynomial {
    /// Coefficients in increasing order of power of the scaled variable.
    coeffs: Vec<f64>,

    /// The abscissa mapped to 0.
    centre: f64,

    /// The distance from `centre` mapped to 1.
    half_width: f64,
}

impl Polynomial {
    /// Fit a polynomial of the given degree to (`x`, `y`). `None` is returned
    /// if there aren't more points than the degree or the system is singular
    /// (e.g. too few distinct abscissae).
    pub fn fit(x: &[f64], y: &[f64], degree: usize) -> Option<Polynomial> {
        let n = x.len();
        if n != y.len() || n <= degree || x.iter().chain(y).any(|v| !v.is_finite()) {
            return None;
        }

        let min = x.iter().copied().fold(f64::INFINITY, f64::min);
        let max = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let centre = (max + min) / 2.0;
        let half_width = match (max - min) / 2.0 {
            w if w > 0.0 => w,
            _ if degree == 0 => 1.0,
            _ => return None,
        };

        let vandermonde = Array2::from_shape_fn((n, degree + 1), |(i, k)| {
            ((x[i] - centre) / half_width).powi(k as i32)
        });
        let coeffs = least_squares(vandermonde, Array1::from(y.to_vec()))?;

        Some(Polynomial {
            coeffs: coeffs.to_vec(),
            centre,
            half_width,
        })
    }

    pub fn degree(&self) -> usize {
        self.coeffs.len().saturating_sub(1)
    }

    /// Evaluate the polynomial at `x`.
    pub fn eval(&self, x: f64) -> f64 {
        let t = (x - self.centre) / self.half_width;
        self.coeffs.iter().rev().fold(0.0, |acc, &c| acc * t + c)
    }

    /// Evaluate the polynomial at every element of `x`.
    pub fn eval_all(&self, x: ArrayView1<f64>) -> Array1<f64> {
        x.mapv(|v| self.eval(v))
    }
}

/// Solve min ||A c - b|| with Householder QR. `A` must have at least as many
/// rows as columns.
fn least_squares(mut a: Array2<f64>, mut b: Array1<f64>) -> Option<Array1<f64>> {
    let (m, n) = a.dim();
    debug_assert!(m >= n);

    for j in 0..n {
        let norm = a.slice(s![j.., j]).dot(&a.slice(s![j.., j])).sqrt();
        if norm == 0.0 {
            return None;
        }
        let alpha = if a[(j, j)] > 0.0 { -norm } else { norm };
        let mut v = a.slice(s![j.., j]).to_owned();
        v[0] -= alpha;
        let v_norm2 = v.dot(&v);

        for k in j..n {
            let proj = 2.0 * v.dot(&a.slice(s![j.., k])) / v_norm2;
            a.slice_mut(s![j.., k]).scaled_add(-proj, &v);
        }
        let proj = 2.0 * v.dot(&b.slice(s![j..])) / v_norm2;
        b.slice_mut(s![j..]).scaled_add(-proj, &v);
    }

    // Back substitution on R.
    let scale = (0..n).map(|j| a[(j, j)].abs()).fold(0.0, f64::max);
    let mut c = Array1::zeros(n);
    for j in (0..n).rev() {
        let r = a[(j, j)];
        if r.abs() <= scale * 1e-12 {
            return None;
        }
        let acc = (j + 1..n).fold(b[j], |acc, k| acc - a[(j, k)] * c[k]);
        c[j] = acc / r;
    }
    Some(c)
}
