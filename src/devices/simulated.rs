// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A simulated optical bench.
//!
//! A broadband source is dispersed across the SLM so that each spectrometer
//! wavelength lands on one SLM column (given by a dispersion polynomial).
//! Each column passes `leakage + (1 - leakage) * mean((level / 255)^gamma)`
//! of the light that falls on it, the mean being over the column's rows. The
//! spectrometer sees the passed light plus a dark level; the camera looks at
//! a scene whose left half reflects the short half of the band and whose
//! right half reflects the long half. The bench is noiseless.

use std::{cell::RefCell, rc::Rc};

use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

use super::{check_shape, Camera, DeviceError, Display, Spectrometer};

/// A [`SimulatedBench`] shared between the device views of it.
pub type SharedBench = Rc<RefCell<SimulatedBench>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// The first and last spectrometer wavelengths \[nm\].
    pub wavelength_range: [f64; 2],

    /// The number of spectrometer samples.
    pub num_samples: usize,

    /// Coefficients, in increasing power, of the polynomial in
    /// `wavelength - wavelength_range[0]` giving the SLM column each
    /// wavelength lands on.
    pub dispersion: Vec<f64>,

    /// The SLM's gamma exponent.
    pub gamma: f64,

    /// The fraction of light passed by a fully-off SLM column.
    pub leakage: f64,

    /// The signal seen with no light at all.
    pub dark: f64,

    /// The source spectrum is a Gaussian with this peak, centre \[nm\] and
    /// standard deviation \[nm\].
    pub source_peak: f64,
    pub source_centre: f64,
    pub source_width: f64,

    pub camera_height: usize,
    pub camera_width: usize,
}

impl Default for BenchConfig {
    fn default() -> Self {
        BenchConfig {
            wavelength_range: [350.0, 850.0],
            num_samples: 501,
            dispersion: vec![50.0, 3.6],
            gamma: 2.2,
            leakage: 0.01,
            dark: 100.0,
            source_peak: 1000.0,
            source_centre: 600.0,
            source_width: 150.0,
            camera_height: 64,
            camera_width: 64,
        }
    }
}

#[derive(Debug)]
pub struct SimulatedBench {
    config: BenchConfig,
    display_shape: (usize, usize),
    wvl: Array1<f64>,

    /// The SLM column each wavelength lands on, if it lands on the SLM.
    columns: Vec<Option<usize>>,

    source: Array1<f64>,

    /// The fraction of light each SLM column passes with the current image.
    transmission: Array1<f64>,

    blocked: bool,
    frames_shown: usize,
}

impl SimulatedBench {
    pub fn new(
        config: BenchConfig,
        display_shape: (usize, usize),
    ) -> Result<SimulatedBench, DeviceError> {
        let invalid = |reason: String| DeviceError::InvalidConfig {
            thing: "simulated bench",
            reason,
        };
        let [first, last] = config.wavelength_range;
        if !(first.is_finite() && last.is_finite() && first < last) {
            return Err(invalid(format!(
                "the wavelength range [{first}, {last}] must be ascending"
            )));
        }
        if config.num_samples < 2 {
            return Err(invalid(
                "there must be at least 2 spectrometer samples".to_string(),
            ));
        }
        if config.dispersion.is_empty() || config.dispersion.iter().any(|c| !c.is_finite()) {
            return Err(invalid(
                "the dispersion polynomial needs finite coefficients".to_string(),
            ));
        }
        if !(config.gamma.is_finite() && config.gamma > 0.0) {
            return Err(invalid(format!(
                "the gamma exponent {} must be positive",
                config.gamma
            )));
        }
        if !(0.0..1.0).contains(&config.leakage) {
            return Err(invalid(format!(
                "the leakage {} must be in [0, 1)",
                config.leakage
            )));
        }
        if config.source_width.is_nan() || config.source_width <= 0.0 {
            return Err(invalid(format!(
                "the source width {} must be positive",
                config.source_width
            )));
        }
        if display_shape.0 == 0
            || display_shape.1 == 0
            || config.camera_height == 0
            || config.camera_width == 0
        {
            return Err(invalid("device sizes must not be zero".to_string()));
        }

        let wvl = Array1::linspace(first, last, config.num_samples);
        let width = display_shape.1 as f64;
        let columns = wvl
            .iter()
            .map(|&l| {
                let c = eval_poly(&config.dispersion, l - first);
                if c >= 0.0 && c < width {
                    Some(c.floor() as usize)
                } else {
                    None
                }
            })
            .collect();
        let source = wvl.mapv(|l| {
            let x = (l - config.source_centre) / config.source_width;
            config.source_peak * (-0.5 * x * x).exp()
        });
        let transmission = Array1::from_elem(display_shape.1, config.leakage);

        Ok(SimulatedBench {
            config,
            display_shape,
            wvl,
            columns,
            source,
            transmission,
            blocked: false,
            frames_shown: 0,
        })
    }

    pub fn shared(self) -> SharedBench {
        Rc::new(RefCell::new(self))
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    pub fn wavelengths(&self) -> ArrayView1<f64> {
        self.wvl.view()
    }

    pub fn display_shape(&self) -> (usize, usize) {
        self.display_shape
    }

    pub fn camera_shape(&self) -> (usize, usize) {
        (self.config.camera_height, self.config.camera_width)
    }

    /// The (fractional) SLM column that `wavelength` lands on.
    pub fn dispersion(&self, wavelength: f64) -> f64 {
        eval_poly(&self.config.dispersion, wavelength - self.config.wavelength_range[0])
    }

    /// Block (or unblock) the source.
    pub fn set_blocked(&mut self, blocked: bool) {
        self.blocked = blocked;
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    /// How many images have been shown on the SLM.
    pub fn frames_shown(&self) -> usize {
        self.frames_shown
    }

    fn illuminate(&mut self, image: ArrayView2<u8>) {
        let gamma = self.config.gamma;
        let leakage = self.config.leakage;
        let lut: Vec<f64> = (0..=u8::MAX)
            .map(|v| (f64::from(v) / 255.0).powf(gamma))
            .collect();
        let height = image.nrows() as f64;
        for (t, column) in self.transmission.iter_mut().zip(image.axis_iter(Axis(1))) {
            let mean = column.iter().map(|&v| lut[usize::from(v)]).sum::<f64>() / height;
            *t = leakage + (1.0 - leakage) * mean;
        }
        self.frames_shown += 1;
    }

    /// The source light passed by the SLM, per wavelength.
    fn passed_light(&self) -> Array1<f64> {
        if self.blocked {
            return Array1::zeros(self.wvl.len());
        }
        self.source
            .iter()
            .zip(self.columns.iter())
            .map(|(&s, column)| match column {
                Some(c) => s * self.transmission[*c],
                None => s * self.config.leakage,
            })
            .collect()
    }

    fn spectrum(&self) -> Array1<f64> {
        self.passed_light() + self.config.dark
    }

    fn camera_frame(&self) -> Array2<f64> {
        let light = self.passed_light();
        let n = light.len();
        let split = n / 2;
        let short = light.slice(s![..split]).sum() / n as f64;
        let long = light.slice(s![split..]).sum() / n as f64;
        let (height, width) = self.camera_shape();
        let dark = self.config.dark;
        Array2::from_shape_fn((height, width), |(_, c)| {
            dark + if c < width / 2 { short } else { long }
        })
    }
}

/// Horner's method; `coeffs` are in increasing power.
fn eval_poly(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

/// The SLM of a [`SimulatedBench`].
pub struct SimulatedDisplay {
    bench: SharedBench,
    shape: (usize, usize),
    closed: bool,
}

impl SimulatedDisplay {
    pub fn new(bench: &SharedBench) -> SimulatedDisplay {
        let shape = bench.borrow().display_shape();
        SimulatedDisplay {
            bench: Rc::clone(bench),
            shape,
            closed: false,
        }
    }
}

impl Display for SimulatedDisplay {
    fn shape(&self) -> (usize, usize) {
        self.shape
    }

    fn show(&mut self, image: ArrayView2<u8>) -> Result<(), DeviceError> {
        if self.closed {
            return Err(DeviceError::Closed { device: "display" });
        }
        check_shape(self.shape, image)?;
        self.bench.borrow_mut().illuminate(image);
        Ok(())
    }

    fn close(&mut self) -> Result<(), DeviceError> {
        self.closed = true;
        Ok(())
    }
}

/// The spectrometer of a [`SimulatedBench`].
pub struct SimulatedSpectrometer {
    bench: SharedBench,
    wvl: Array1<f64>,
    closed: bool,
}

impl SimulatedSpectrometer {
    pub fn new(bench: &SharedBench) -> SimulatedSpectrometer {
        let wvl = bench.borrow().wavelengths().to_owned();
        SimulatedSpectrometer {
            bench: Rc::clone(bench),
            wvl,
            closed: false,
        }
    }
}

impl Spectrometer for SimulatedSpectrometer {
    fn wavelengths(&self) -> ArrayView1<f64> {
        self.wvl.view()
    }

    // Without noise, an average of scans is a single scan.
    fn capture(&mut self, navg: usize) -> Result<Array1<f64>, DeviceError> {
        if navg == 0 {
            return Err(DeviceError::ZeroAverages);
        }
        if self.closed {
            return Err(DeviceError::Closed {
                device: "spectrometer",
            });
        }
        Ok(self.bench.borrow().spectrum())
    }

    fn close(&mut self) -> Result<(), DeviceError> {
        self.closed = true;
        Ok(())
    }
}

/// The camera of a [`SimulatedBench`].
pub struct SimulatedCamera {
    bench: SharedBench,
    shape: (usize, usize),
    closed: bool,
}

impl SimulatedCamera {
    pub fn new(bench: &SharedBench) -> SimulatedCamera {
        let shape = bench.borrow().camera_shape();
        SimulatedCamera {
            bench: Rc::clone(bench),
            shape,
            closed: false,
        }
    }
}

impl Camera for SimulatedCamera {
    fn shape(&self) -> (usize, usize) {
        self.shape
    }

    fn capture(&mut self, navg: usize) -> Result<Array2<f64>, DeviceError> {
        if navg == 0 {
            return Err(DeviceError::ZeroAverages);
        }
        if self.closed {
            return Err(DeviceError::Closed { device: "camera" });
        }
        Ok(self.bench.borrow().camera_frame())
    }

    fn close(&mut self) -> Result<(), DeviceError> {
        self.closed = true;
        Ok(())
    }
}
