// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The device calibration model: which SLM column each wavelength lands on,
//! and which display level gives which intensity at each wavelength.
//!
//! Both halves start out unfitted and are filled in independently by
//! [`fit_mapping`] and [`fit_gamma`]; the model is then persisted with the
//! experiment (see [`crate::io`]) and loaded by every encoding session.

mod error;
mod gamma;
mod mapping;
#[cfg(test)]
mod tests;

pub use error::*;
pub use gamma::*;
pub use mapping::*;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceCalibration {
    pub mapping: Option<WavelengthMapping>,
    pub gamma: Option<GammaTable>,
}

impl DeviceCalibration {
    /// Are both the mapping and the gamma table available?
    pub fn is_fitted(&self) -> bool {
        self.mapping.is_some() && self.gamma.is_some()
    }

    pub fn mapping(&self) -> Result<&WavelengthMapping, CalibrationError> {
        self.mapping.as_ref().ok_or(CalibrationError::MappingNotFitted)
    }

    pub fn gamma(&self) -> Result<&GammaTable, CalibrationError> {
        self.gamma.as_ref().ok_or(CalibrationError::GammaNotFitted)
    }
}
