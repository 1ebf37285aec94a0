// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with fitting or using a device calibration.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalibrationError {
    #[error("The {thing} wavelengths are not strictly ascending")]
    NotAscending { thing: &'static str },

    #[error("Expected {thing} to have {expected} elements, but it had {actual} instead")]
    LengthMismatch {
        thing: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("The wavelength limits [{low}, {high}] are inverted or empty")]
    InvertedLimits { low: f64, high: f64 },

    #[error("Only {got} usable samples lie within the wavelength limits; at least {need} are needed to fit the wavelength mapping")]
    NotEnoughSamples { got: usize, need: usize },

    #[error("The least-squares fit of the {what} failed; the data is degenerate")]
    FitFailed { what: &'static str },

    #[error("Gamma data has {nlevels} display levels, but between 2 and 256 are supported")]
    BadLevelCount { nlevels: usize },

    #[error("The device has no wavelength mapping; run 'plight calibrate -c mapping' first")]
    MappingNotFitted,

    #[error("The device has no gamma table; run 'plight calibrate -c gamma' first")]
    GammaNotFitted,
}
