// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Structured-light codes.
//!
//! A code assigns every SLM column (or row) a K-bit word, K = log2(W2) where
//! W2 is the coded dimension rounded up to a power of two. Plane k of a
//! [`Pattern`] holds bit k (most significant first) of every pixel's word, so
//! displaying the planes in order and thresholding what the spectrometer or
//! camera sees recovers, per sensor pixel, which column lit it up.

mod decode;
mod error;
#[cfg(test)]
mod tests;

pub use decode::*;
pub use error::*;

use ndarray::prelude::*;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::math::{hadamard, next_pow2};

/// Which display dimension is coded.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CodeAxis {
    /// Every column gets its own code; all rows in a column are identical.
    Columns,

    /// Every row gets its own code.
    Rows,
}

/// The flavour of code held by a [`Pattern`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CodeKind {
    Binary,
    Hadamard,
}

/// A stack of binary code planes with shape (H, W, K) and values in {0, 1}.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    planes: Array3<u8>,
    axis: CodeAxis,
    kind: CodeKind,
}

impl Pattern {
    pub fn planes(&self) -> ArrayView3<u8> {
        self.planes.view()
    }

    /// K, the number of code planes.
    pub fn num_planes(&self) -> usize {
        self.planes.len_of(Axis(2))
    }

    /// The display shape (H, W).
    pub fn shape(&self) -> (usize, usize) {
        let (h, w, _) = self.planes.dim();
        (h, w)
    }

    pub fn axis(&self) -> CodeAxis {
        self.axis
    }

    pub fn kind(&self) -> CodeKind {
        self.kind
    }

    /// Plane `k` as a binary image.
    pub fn plane(&self, k: usize) -> ArrayView2<u8> {
        self.planes.index_axis(Axis(2), k)
    }

    /// The code word of column (or row) `i`, one element per plane. `None` if
    /// `i` is outside the coded dimension.
    pub fn code(&self, i: usize) -> Option<ArrayView1<u8>> {
        let (h, w) = self.shape();
        match self.axis {
            CodeAxis::Columns if i < w => Some(self.planes.slice(s![0, i, ..])),
            CodeAxis::Rows if i < h => Some(self.planes.slice(s![i, 0, ..])),
            _ => None,
        }
    }

    /// Plane `k` rendered for the display: lit pixels are 255.
    pub fn to_display(&self, k: usize) -> Array2<u8> {
        self.plane(k).mapv(|b| b * u8::MAX)
    }

    /// The complement of plane `k` rendered for the display.
    pub fn to_display_inverted(&self, k: usize) -> Array2<u8> {
        self.plane(k).mapv(|b| (1 - b) * u8::MAX)
    }
}

/// Hadamard codes along with the matrix they were taken from.
#[derive(Debug, Clone)]
pub struct HadamardCodes {
    pub pattern: Pattern,

    /// The order-W2 Sylvester Hadamard matrix, entries ±1.
    pub basis: Array2<i8>,

    /// The rows of `basis` used for each plane, in plane order.
    pub rows: Vec<usize>,
}

/// Generate binary codes for an `height`x`width` display. Bit k of column `i`
/// is bit (K - 1 - k) of `i`; equivalently, plane k alternates dark and light
/// blocks of W2 / 2^(k+1) columns starting dark.
pub fn binary_codes(height: usize, width: usize, axis: CodeAxis) -> Result<Pattern, CodingError> {
    let n = coded_len(height, width, axis)?;
    let num_bits = next_pow2(n).trailing_zeros() as usize;
    let words = Array2::from_shape_fn((n, num_bits), |(i, k)| {
        ((i >> (num_bits - 1 - k)) & 1) as u8
    });

    Ok(Pattern {
        planes: broadcast_words(words.view(), height, width, axis),
        axis,
        kind: CodeKind::Binary,
    })
}

/// Generate Hadamard codes for an `height`x`width` display. Each plane is a
/// row of the order-W2 Sylvester matrix with -1 mapped to 0. With
/// `include_dc`, rows 0..K are used (row 0 is all ones); otherwise rows 1..=K.
pub fn hadamard_codes(
    height: usize,
    width: usize,
    axis: CodeAxis,
    include_dc: bool,
) -> Result<HadamardCodes, CodingError> {
    let n = coded_len(height, width, axis)?;
    let order = next_pow2(n);
    let num_bits = order.trailing_zeros() as usize;
    let basis = hadamard(order);
    let rows: Vec<usize> = if include_dc {
        (0..num_bits).collect()
    } else {
        (1..=num_bits).collect()
    };

    let words = Array2::from_shape_fn((n, num_bits), |(i, k)| u8::from(basis[(rows[k], i)] == 1));

    Ok(HadamardCodes {
        pattern: Pattern {
            planes: broadcast_words(words.view(), height, width, axis),
            axis,
            kind: CodeKind::Hadamard,
        },
        basis,
        rows,
    })
}

/// A checkerboard display image with `size`x`size` squares. The top-left
/// square is lit (255).
pub fn checkerboard(height: usize, width: usize, size: usize) -> Result<Array2<u8>, CodingError> {
    if height == 0 || width == 0 {
        return Err(CodingError::ZeroDimension { height, width });
    }
    if size == 0 {
        return Err(CodingError::ZeroCheckerSize);
    }
    Ok(Array2::from_shape_fn((height, width), |(r, c)| {
        if (r / size + c / size) % 2 == 0 {
            u8::MAX
        } else {
            0
        }
    }))
}

fn coded_len(height: usize, width: usize, axis: CodeAxis) -> Result<usize, CodingError> {
    if height == 0 || width == 0 {
        return Err(CodingError::ZeroDimension { height, width });
    }
    Ok(match axis {
        CodeAxis::Columns => width,
        CodeAxis::Rows => height,
    })
}

/// Spread per-column (or per-row) code words, shape (n, K), over the whole
/// display.
fn broadcast_words(
    words: ArrayView2<u8>,
    height: usize,
    width: usize,
    axis: CodeAxis,
) -> Array3<u8> {
    let num_bits = words.len_of(Axis(1));
    Array3::from_shape_fn((height, width, num_bits), |(r, c, k)| match axis {
        CodeAxis::Columns => words[(c, k)],
        CodeAxis::Rows => words[(r, k)],
    })
}
