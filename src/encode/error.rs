// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with turning spectral profiles into display patterns.

use thiserror::Error;

use crate::calibration::CalibrationError;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    #[error("Cannot encode for a {height}x{width} display; both dimensions must be non-zero")]
    ZeroDimension { height: usize, width: usize },

    #[error("The gamma table has {gamma} wavelengths, but the wavelength mapping has {mapping}")]
    ModelMismatch { gamma: usize, mapping: usize },

    #[error("The profile has {intensities} intensities but {wavelengths} wavelengths")]
    ProfileLengthMismatch {
        wavelengths: usize,
        intensities: usize,
    },

    #[error("The profile wavelengths are not strictly ascending")]
    ProfileNotAscending,

    #[error("Profile intensity {value} at {wavelength} nm is negative; use the signed encoder for profiles with negative parts")]
    NegativeIntensity { wavelength: f64, value: f64 },

    #[error("Profile intensity at {wavelength} nm is not finite")]
    NonFiniteIntensity { wavelength: f64 },

    #[error("Display level {level} is out of range; the gamma table has {nlevels} levels")]
    LevelOutOfRange { level: usize, nlevels: usize },

    #[error("Cannot combine captures with different shapes ({positive:?} and {other:?})")]
    CaptureShapeMismatch {
        positive: Vec<usize>,
        other: Vec<usize>,
    },
}
