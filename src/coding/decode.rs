// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Recovering code words from captured exposures.

use ndarray::{prelude::*, Zip};

use super::CodingError;

/// Captured exposures of every code plane, shape (H, W, K), plus a reference
/// image (H, W) of the fully-lit display. Pixels where the reference is not
/// positive received no light and can't be decoded.
#[derive(Debug, Clone)]
pub struct CaptureStack {
    planes: Array3<f64>,
    reference: Array2<f64>,
}

impl CaptureStack {
    pub fn new(planes: Array3<f64>, reference: Array2<f64>) -> Result<CaptureStack, CodingError> {
        let (h, w, k) = planes.dim();
        if reference.dim() != (h, w) {
            return Err(CodingError::BadShape {
                thing: "the reference image",
                expected: format!("{:?}", (h, w)),
                actual: format!("{:?}", reference.dim()),
            });
        }
        if k > 32 {
            return Err(CodingError::TooManyPlanes { num: k });
        }
        Ok(CaptureStack { planes, reference })
    }

    /// Build a stack from exposures of each plane (`positive`) and of its
    /// complement (`negative`), plus all-on and all-off reference exposures.
    /// Differencing removes ambient light and per-pixel gain, so a plain
    /// sign test decodes each bit.
    pub fn from_pairs(
        positive: ArrayView3<f64>,
        negative: ArrayView3<f64>,
        ones: ArrayView2<f64>,
        zeros: ArrayView2<f64>,
    ) -> Result<CaptureStack, CodingError> {
        if positive.dim() != negative.dim() {
            return Err(CodingError::BadShape {
                thing: "the negative exposures",
                expected: format!("{:?}", positive.dim()),
                actual: format!("{:?}", negative.dim()),
            });
        }
        if ones.dim() != zeros.dim() {
            return Err(CodingError::BadShape {
                thing: "the all-off exposure",
                expected: format!("{:?}", ones.dim()),
                actual: format!("{:?}", zeros.dim()),
            });
        }
        CaptureStack::new(&positive - &negative, &ones - &zeros)
    }

    /// Like [`CaptureStack::from_pairs`], but for spectrometer captures: one
    /// spectrum of N samples per plane, i.e. `positive` and `negative` have
    /// shape (K, N). The resulting stack has shape (N, 1, K).
    pub fn from_spectra(
        positive: ArrayView2<f64>,
        negative: ArrayView2<f64>,
        ones: ArrayView1<f64>,
        zeros: ArrayView1<f64>,
    ) -> Result<CaptureStack, CodingError> {
        let to_stack = |spectra: ArrayView2<f64>| {
            let (k, n) = spectra.dim();
            Array3::from_shape_fn((n, 1, k), |(i, _, j)| spectra[(j, i)])
        };

        CaptureStack::from_pairs(
            to_stack(positive).view(),
            to_stack(negative).view(),
            to_image(ones),
            to_image(zeros),
        )
    }

    pub fn planes(&self) -> ArrayView3<f64> {
        self.planes.view()
    }

    pub fn reference(&self) -> ArrayView2<f64> {
        self.reference.view()
    }

    pub fn num_planes(&self) -> usize {
        self.planes.len_of(Axis(2))
    }
}

/// A spectrum as an (N, 1) image.
fn to_image<'a>(spectrum: ArrayView1<'a, f64>) -> ArrayView2<'a, f64> {
    spectrum.insert_axis(Axis(1))
}

/// Per-pixel decoded code words. Masked pixels (no light in the reference)
/// are kept distinct from pixels that decoded to 0.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrespondenceMap {
    indices: Array2<u32>,
    valid: Array2<bool>,
    num_bits: usize,
}

impl CorrespondenceMap {
    /// The decoded index at (`row`, `col`), or `None` if the pixel is masked
    /// or out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<u32> {
        match self.valid.get((row, col)) {
            Some(true) => Some(self.indices[(row, col)]),
            _ => None,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.indices.dim()
    }

    pub fn num_bits(&self) -> usize {
        self.num_bits
    }

    pub fn valid(&self) -> ArrayView2<bool> {
        self.valid.view()
    }

    pub fn num_valid(&self) -> usize {
        self.valid.iter().filter(|&&v| v).count()
    }

    /// Decoded indices with masked pixels set to 0.
    pub fn to_dense(&self) -> Array2<u32> {
        self.indices.clone()
    }
}

/// Decode a capture stack. For every unmasked pixel, bit k (most significant
/// first) is set when plane k is positive.
pub fn decode(stack: &CaptureStack) -> CorrespondenceMap {
    let (h, w, num_bits) = stack.planes.dim();
    let mut indices = Array2::zeros((h, w));
    let mut valid = Array2::from_elem((h, w), false);

    Zip::from(&mut indices)
        .and(&mut valid)
        .and(stack.planes.lanes(Axis(2)))
        .and(&stack.reference)
        .par_for_each(|index, valid, lane, &reference| {
            if reference > 0.0 {
                *valid = true;
                *index = lane
                    .iter()
                    .fold(0u32, |acc, &v| (acc << 1) | u32::from(v > 0.0));
            }
        });

    CorrespondenceMap {
        indices,
        valid,
        num_bits,
    }
}

/// The thresholded bit planes of a capture stack, shape (H, W, K). Masked
/// pixels are 0 in every plane.
pub fn threshold(stack: &CaptureStack) -> Array3<u8> {
    let mut bits = stack.planes.mapv(|v| u8::from(v > 0.0));
    Zip::from(bits.lanes_mut(Axis(2)))
        .and(&stack.reference)
        .for_each(|mut lane, &reference| {
            if reference <= 0.0 || reference.is_nan() {
                lane.fill(0);
            }
        });
    bits
}
