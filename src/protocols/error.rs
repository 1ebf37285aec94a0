// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with running capture protocols.

use thiserror::Error;

use crate::{
    calibration::CalibrationError, coding::CodingError, devices::DeviceError,
    encode::EncodeError, metrics::MetricsError,
};

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Hadamard scans need a power-of-two number of bands of at least 2, but {nbands} were asked for")]
    BadHadamardBands { nbands: usize },

    #[error("Scans need at least one band")]
    NoBands,

    #[error("Can't capture with {nlevels} display levels; need between 2 and 256")]
    BadLevelCount { nlevels: usize },

    #[error("The wavelength limits [{low}, {high}] are not ascending")]
    InvertedLimits { low: f64, high: f64 },

    #[error("None of the test wavelengths land on the display")]
    NothingOnDisplay,

    #[error("The operator went away (stdin was closed) while the protocol was waiting")]
    OperatorGone,

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Coding(#[from] CodingError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    #[error(transparent)]
    Metrics(#[from] MetricsError),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
