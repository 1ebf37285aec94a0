// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Calibration and capture software for a programmable-light spectral imaging rig.

The rig is a spatial light modulator (SLM) sitting in the spectral plane of a
light source, a spectrometer and a camera. Structured-light codes recover which
SLM column each wavelength lands on; per-wavelength gamma curves are then used
to display arbitrary spectral profiles.
 */

pub mod calibration;
pub mod cli;
pub mod coding;
pub mod constants;
pub mod devices;
pub mod encode;
pub mod io;
pub(crate) mod math;
pub mod metrics;
pub mod protocols;

use crossbeam_utils::atomic::AtomicCell;

/// Should progress bars be drawn? This is set by the CLI; library users get
/// no progress bars unless they ask for them.
pub static PROGRESS_BARS: AtomicCell<bool> = AtomicCell::new(false);

// Re-exports.
pub use calibration::{DeviceCalibration, GammaTable, WavelengthMapping};
pub use cli::{Plight, PlightError};
pub use coding::{
    binary_codes, decode, hadamard_codes, CaptureStack, CodeAxis, CorrespondenceMap, Pattern,
};
pub use encode::{diffraction_fix, encode, EncodeMode, ProfileEncoder};
pub use math::Polynomial;
