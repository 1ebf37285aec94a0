// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with evaluating rig metrics.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Expected {thing} to have {expected} elements, but it had {actual} instead")]
    LengthMismatch {
        thing: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("The {thing} wavelengths are not strictly ascending")]
    NotAscending { thing: &'static str },

    #[error("The wavelength limits [{low}, {high}] don't contain any measured wavelengths")]
    EmptyLimits { low: f64, high: f64 },
}
