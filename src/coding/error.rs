// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with generating and decoding structured-light codes.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodingError {
    #[error("Cannot generate codes for a {height}x{width} display; both dimensions must be non-zero")]
    ZeroDimension { height: usize, width: usize },

    #[error("The checkerboard square size must be non-zero")]
    ZeroCheckerSize,

    #[error("Expected {thing} to have shape {expected}, but it had shape {actual}")]
    BadShape {
        /// What was it that wasn't sensible? The reference image, the
        /// negative exposures, etc.
        thing: &'static str,
        expected: String,
        actual: String,
    },

    #[error("Got {num} code planes, but at most 32 can be decoded")]
    TooManyPlanes { num: usize },
}
