// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The rig's devices: an SLM display, a spectrometer and a camera.
//!
//! Each device is a capability trait. Vendor SDKs (the SLM's SDL2 window, the
//! spectrometer driver, Hamamatsu DCAM, Spinnaker, webcams) aren't compiled
//! into this crate; asking for them gives a [`DeviceError::BackendUnavailable`].
//! The [`SimulatedBench`] implements all three traits and stands in for the
//! optical setup.

mod error;
mod simulated;

pub use error::*;
pub use simulated::*;

use log::debug;
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};
use strum_macros::{EnumIter, EnumString};

use crate::constants::{
    DEFAULT_DISPLAY_BITS, DEFAULT_DISPLAY_SHAPE, DEFAULT_EXPOSURE_MS, DEFAULT_LAMBDA_LIMITS,
    DEFAULT_NUM_DROPPED_FRAMES, DEFAULT_NUM_SCANS, DEFAULT_SETTLE_MS,
};

/// A full-screen display, i.e. the SLM.
pub trait Display {
    /// (rows, columns).
    fn shape(&self) -> (usize, usize);

    /// Show an image. Images that aren't exactly the size of the display are
    /// rejected.
    fn show(&mut self, image: ArrayView2<u8>) -> Result<(), DeviceError>;

    fn close(&mut self) -> Result<(), DeviceError>;
}

/// A spectrometer producing one intensity per wavelength.
pub trait Spectrometer {
    /// The wavelengths of each sample \[nm\], ascending.
    fn wavelengths(&self) -> ArrayView1<f64>;

    /// Capture a spectrum, averaged over `navg` scans.
    fn capture(&mut self, navg: usize) -> Result<Array1<f64>, DeviceError>;

    fn close(&mut self) -> Result<(), DeviceError>;
}

/// A 2D camera.
pub trait Camera {
    /// (rows, columns).
    fn shape(&self) -> (usize, usize);

    /// Capture a frame, averaged over `navg` exposures.
    fn capture(&mut self, navg: usize) -> Result<Array2<f64>, DeviceError>;

    fn close(&mut self) -> Result<(), DeviceError>;
}

/// Camera SDKs the rig has been used with.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum_macros::Display,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CameraBackend {
    /// Hamamatsu cameras through DCAM.
    Hamamatsu,

    /// FLIR (Point Grey) cameras through Spinnaker.
    Spinnaker,

    /// A generic webcam.
    Webcam,

    /// The simulated bench's camera.
    Simulated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Which screen the SLM is.
    pub screen_id: usize,

    /// The name given to the full-screen window.
    pub name: String,

    pub height: usize,
    pub width: usize,

    /// The bit depth of each pixel.
    pub bits: u32,

    /// How long an image takes to settle on the SLM \[ms\].
    pub settle_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            screen_id: 1,
            name: "SLM".to_string(),
            height: DEFAULT_DISPLAY_SHAPE.0,
            width: DEFAULT_DISPLAY_SHAPE.1,
            bits: DEFAULT_DISPLAY_BITS,
            settle_ms: DEFAULT_SETTLE_MS,
        }
    }
}

impl DisplayConfig {
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// The number of distinct display levels.
    pub fn nlevels(&self) -> usize {
        1 << self.bits
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrometerConfig {
    pub device_id: usize,

    /// \[ms\]
    pub exposure_ms: f64,

    /// The number of scans averaged per capture.
    pub nscans: usize,

    /// The wavelengths bounding the spectrometer's reliable band \[nm\].
    pub lambda_limits: [f64; 2],
}

impl Default for SpectrometerConfig {
    fn default() -> Self {
        SpectrometerConfig {
            device_id: 0,
            exposure_ms: DEFAULT_EXPOSURE_MS,
            nscans: DEFAULT_NUM_SCANS,
            lambda_limits: DEFAULT_LAMBDA_LIMITS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub backend: CameraBackend,
    pub device_id: usize,

    /// \[ms\]
    pub exposure_ms: f64,

    pub binning: usize,

    /// The number of exposures averaged per capture.
    pub navg: usize,

    /// The number of frames thrown away before capturing.
    pub ndrops: usize,
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraConfig {
            backend: CameraBackend::Hamamatsu,
            device_id: 0,
            exposure_ms: DEFAULT_EXPOSURE_MS,
            binning: 1,
            navg: 1,
            ndrops: DEFAULT_NUM_DROPPED_FRAMES,
        }
    }
}

/// Everything needed to open the rig's devices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    pub display: DisplayConfig,
    pub spectrometer: SpectrometerConfig,
    pub camera: CameraConfig,

    /// Only used when simulating.
    pub bench: BenchConfig,
}

/// The rig's devices, either real or simulated.
pub struct Rig {
    config: RigConfig,
    bench: Option<SharedBench>,
}

impl Rig {
    /// With `simulate`, every device is a view of one [`SimulatedBench`].
    pub fn new(config: RigConfig, simulate: bool) -> Result<Rig, DeviceError> {
        if config.display.height == 0 || config.display.width == 0 {
            return Err(DeviceError::InvalidConfig {
                thing: "display",
                reason: format!(
                    "the display size must not be zero (got {}x{})",
                    config.display.height, config.display.width
                ),
            });
        }
        if !(1..=8).contains(&config.display.bits) {
            return Err(DeviceError::InvalidConfig {
                thing: "display",
                reason: format!(
                    "the bit depth must be between 1 and 8 (got {})",
                    config.display.bits
                ),
            });
        }
        let bench = if simulate {
            debug!("Simulating the rig");
            Some(SimulatedBench::new(config.bench.clone(), config.display.shape())?.shared())
        } else {
            None
        };
        Ok(Rig { config, bench })
    }

    pub fn config(&self) -> &RigConfig {
        &self.config
    }

    pub fn bench(&self) -> Option<&SharedBench> {
        self.bench.as_ref()
    }

    pub fn open_display(&self) -> Result<Box<dyn Display>, DeviceError> {
        match &self.bench {
            Some(bench) => Ok(Box::new(SimulatedDisplay::new(bench))),
            None => Err(DeviceError::BackendUnavailable {
                device: "display",
                backend: format!("SDL2 screen {}", self.config.display.screen_id),
            }),
        }
    }

    pub fn open_spectrometer(&self) -> Result<Box<dyn Spectrometer>, DeviceError> {
        match &self.bench {
            Some(bench) => Ok(Box::new(SimulatedSpectrometer::new(bench))),
            None => Err(DeviceError::BackendUnavailable {
                device: "spectrometer",
                backend: format!("spectrometer {}", self.config.spectrometer.device_id),
            }),
        }
    }

    pub fn open_camera(&self) -> Result<Box<dyn Camera>, DeviceError> {
        match (&self.bench, self.config.camera.backend) {
            (Some(bench), backend) => {
                if backend != CameraBackend::Simulated {
                    debug!("Using the simulated camera instead of {backend}");
                }
                Ok(Box::new(SimulatedCamera::new(bench)))
            }
            (None, CameraBackend::Simulated) => Err(DeviceError::NoBench),
            (None, backend) => Err(DeviceError::BackendUnavailable {
                device: "camera",
                backend: backend.to_string(),
            }),
        }
    }
}

/// Capture a camera frame after throwing away `ndrops` frames, averaging
/// `navg` single exposures.
pub fn grab(
    camera: &mut dyn Camera,
    navg: usize,
    ndrops: usize,
) -> Result<Array2<f64>, DeviceError> {
    if navg == 0 {
        return Err(DeviceError::ZeroAverages);
    }
    for _ in 0..ndrops {
        camera.capture(1)?;
    }
    let mut frame = Array2::zeros(camera.shape());
    for _ in 0..navg {
        frame += &camera.capture(1)?;
    }
    frame /= navg as f64;
    Ok(frame)
}

/// Reject images that don't fill the display exactly.
pub(crate) fn check_shape(
    expected: (usize, usize),
    image: ArrayView2<u8>,
) -> Result<(), DeviceError> {
    let (actual_h, actual_w) = image.dim();
    if (actual_h, actual_w) == expected {
        Ok(())
    } else {
        Err(DeviceError::ShapeMismatch {
            expected_h: expected.0,
            expected_w: expected.1,
            actual_h,
            actual_w,
        })
    }
}
