// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with the rig's devices.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("The {device} backend '{backend}' is not available in this build of plight; use --simulate to run against a simulated bench")]
    BackendUnavailable {
        device: &'static str,
        backend: String,
    },

    #[error("A simulated camera needs a simulated bench; use --simulate")]
    NoBench,

    #[error("Tried to show a {actual_h}x{actual_w} image on a {expected_h}x{expected_w} display")]
    ShapeMismatch {
        expected_h: usize,
        expected_w: usize,
        actual_h: usize,
        actual_w: usize,
    },

    #[error("The number of frames to average must be at least 1")]
    ZeroAverages,

    #[error("The {device} has already been closed")]
    Closed { device: &'static str },

    #[error("Invalid {thing} in the rig configuration: {reason}")]
    InvalidConfig { thing: &'static str, reason: String },
}
