// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all plight-related errors. This should be the *only* error
//! enum that is publicly visible.

use thiserror::Error;

use crate::{
    calibration::CalibrationError, coding::CodingError, devices::DeviceError,
    encode::EncodeError, io::BundleError, metrics::MetricsError, protocols::ProtocolError,
};

/// The *only* publicly visible error from plight.
#[derive(Error, Debug)]
pub enum PlightError {
    /// An error related to structured-light code patterns or decoding them.
    #[error("{0}")]
    Coding(String),

    /// An error related to fitting the device calibration.
    #[error("{0}")]
    Calibration(String),

    /// The device hasn't been (fully) calibrated for the experiment.
    #[error("{0}\n\nRun 'plight capture-calib' and 'plight calibrate' for this experiment first")]
    NotCalibrated(String),

    /// An error related to turning profiles into display patterns.
    #[error("{0}")]
    Encode(String),

    /// An error related to the SLM, spectrometer or camera.
    #[error("{0}\n\nIf no hardware is attached, try --simulate")]
    Device(String),

    /// An error raised while capturing.
    #[error("{0}")]
    Capture(String),

    /// An error related to evaluating metrics.
    #[error("{0}")]
    Metrics(String),

    /// An error related to calibration files or capture dumps.
    #[error("{0}")]
    Bundle(String),

    /// An error related to rig configuration files.
    #[error("{0}\n\nRig files may be TOML or JSON; every key is optional")]
    ArgFile(String),

    /// A generic error that can't be clarified further, e.g. IO errors.
    #[error("{0}")]
    Generic(String),
}

// When changing the error propagation below, ensure `Self::from(e)` uses the
// correct `e`!

impl From<CodingError> for PlightError {
    fn from(e: CodingError) -> Self {
        Self::Coding(e.to_string())
    }
}

impl From<CalibrationError> for PlightError {
    fn from(e: CalibrationError) -> Self {
        let s = e.to_string();
        match e {
            CalibrationError::MappingNotFitted | CalibrationError::GammaNotFitted => {
                Self::NotCalibrated(s)
            }
            CalibrationError::NotAscending { .. }
            | CalibrationError::LengthMismatch { .. }
            | CalibrationError::InvertedLimits { .. }
            | CalibrationError::NotEnoughSamples { .. }
            | CalibrationError::FitFailed { .. }
            | CalibrationError::BadLevelCount { .. } => Self::Calibration(s),
        }
    }
}

impl From<EncodeError> for PlightError {
    fn from(e: EncodeError) -> Self {
        match e {
            EncodeError::Calibration(e) => Self::from(e),
            EncodeError::ZeroDimension { .. }
            | EncodeError::ModelMismatch { .. }
            | EncodeError::ProfileLengthMismatch { .. }
            | EncodeError::ProfileNotAscending
            | EncodeError::NegativeIntensity { .. }
            | EncodeError::NonFiniteIntensity { .. }
            | EncodeError::LevelOutOfRange { .. }
            | EncodeError::CaptureShapeMismatch { .. } => Self::Encode(e.to_string()),
        }
    }
}

impl From<DeviceError> for PlightError {
    fn from(e: DeviceError) -> Self {
        let s = e.to_string();
        match e {
            DeviceError::InvalidConfig { .. } => Self::ArgFile(s),
            DeviceError::BackendUnavailable { .. }
            | DeviceError::NoBench
            | DeviceError::ShapeMismatch { .. }
            | DeviceError::ZeroAverages
            | DeviceError::Closed { .. } => Self::Device(s),
        }
    }
}

impl From<MetricsError> for PlightError {
    fn from(e: MetricsError) -> Self {
        Self::Metrics(e.to_string())
    }
}

impl From<ProtocolError> for PlightError {
    fn from(e: ProtocolError) -> Self {
        match e {
            ProtocolError::Device(e) => Self::from(e),
            ProtocolError::Coding(e) => Self::from(e),
            ProtocolError::Encode(e) => Self::from(e),
            ProtocolError::Calibration(e) => Self::from(e),
            ProtocolError::Metrics(e) => Self::from(e),
            ProtocolError::IO(e) => Self::from(e),
            ProtocolError::BadHadamardBands { .. }
            | ProtocolError::NoBands
            | ProtocolError::BadLevelCount { .. }
            | ProtocolError::InvertedLimits { .. }
            | ProtocolError::NothingOnDisplay
            | ProtocolError::OperatorGone => Self::Capture(e.to_string()),
        }
    }
}

impl From<BundleError> for PlightError {
    fn from(e: BundleError) -> Self {
        let s = e.to_string();
        match e {
            BundleError::IO(e) => Self::from(e),
            BundleError::UnsupportedExt { .. }
            | BundleError::Missing { .. }
            | BundleError::BadExperimentName { .. }
            | BundleError::Json { .. }
            | BundleError::Yaml { .. } => Self::Bundle(s),
        }
    }
}

impl From<std::io::Error> for PlightError {
    fn from(e: std::io::Error) -> Self {
        Self::Generic(e.to_string())
    }
}
