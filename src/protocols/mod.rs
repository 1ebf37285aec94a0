// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Capture protocols.
//!
//! Every protocol is a strictly sequential loop of "show an image on the SLM,
//! wait for it to settle, capture". Each produces a dump of everything it
//! captured (see [`crate::io`] for how they're stored); fitting and evaluating
//! is done from the dumps afterwards.

mod calibration_data;
mod error;
mod metrics_data;
mod scans;

pub use calibration_data::*;
pub use error::*;
pub use metrics_data::*;
pub use scans::*;

use std::{
    io::{BufRead, Write},
    time::Duration,
};

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::info;
use ndarray::prelude::*;

use crate::{
    constants::{DEFAULT_NUM_DROPPED_FRAMES, DEFAULT_NUM_SCANS, DEFAULT_SETTLE_MS},
    devices::{grab, Camera, Display, SharedBench, Spectrometer},
    PROGRESS_BARS,
};

/// How each capture is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSettings {
    /// How long to wait after showing an image before capturing.
    pub settle: Duration,

    /// The number of spectrometer scans or camera exposures averaged.
    pub navg: usize,

    /// The number of camera frames thrown away before each capture.
    pub ndrops: usize,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        CaptureSettings {
            settle: Duration::from_millis(DEFAULT_SETTLE_MS),
            navg: DEFAULT_NUM_SCANS,
            ndrops: DEFAULT_NUM_DROPPED_FRAMES,
        }
    }
}

/// Whoever (or whatever) blocks the light source for dark captures.
pub trait Operator {
    fn block_light(&mut self) -> Result<(), ProtocolError>;

    fn unblock_light(&mut self) -> Result<(), ProtocolError>;
}

/// A person at the bench, prompted on stdout and acknowledging on stdin.
pub struct StdinOperator;

impl StdinOperator {
    fn prompt(&self, message: &str) -> Result<(), ProtocolError> {
        print!("{message} and press Enter ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        match std::io::stdin().lock().read_line(&mut line)? {
            0 => Err(ProtocolError::OperatorGone),
            _ => Ok(()),
        }
    }
}

impl Operator for StdinOperator {
    fn block_light(&mut self) -> Result<(), ProtocolError> {
        self.prompt("Block the light")
    }

    fn unblock_light(&mut self) -> Result<(), ProtocolError> {
        self.prompt("Remove the block")
    }
}

/// Blocks the source of a simulated bench.
pub struct BenchOperator {
    bench: SharedBench,
}

impl BenchOperator {
    pub fn new(bench: &SharedBench) -> BenchOperator {
        BenchOperator {
            bench: SharedBench::clone(bench),
        }
    }
}

impl Operator for BenchOperator {
    fn block_light(&mut self) -> Result<(), ProtocolError> {
        info!("Blocking the simulated source");
        self.bench.borrow_mut().set_blocked(true);
        Ok(())
    }

    fn unblock_light(&mut self) -> Result<(), ProtocolError> {
        info!("Unblocking the simulated source");
        self.bench.borrow_mut().set_blocked(false);
        Ok(())
    }
}

fn settle(settings: &CaptureSettings) {
    if !settings.settle.is_zero() {
        std::thread::sleep(settings.settle);
    }
}

/// Show `image`, let it settle and capture a spectrum.
fn show_and_measure(
    display: &mut dyn Display,
    spectrometer: &mut dyn Spectrometer,
    image: ArrayView2<u8>,
    settings: &CaptureSettings,
) -> Result<Array1<f64>, ProtocolError> {
    display.show(image)?;
    settle(settings);
    Ok(spectrometer.capture(settings.navg)?)
}

/// Show `image`, let it settle and grab a camera frame.
fn show_and_grab(
    display: &mut dyn Display,
    camera: &mut dyn Camera,
    image: ArrayView2<u8>,
    settings: &CaptureSettings,
) -> Result<Array2<f64>, ProtocolError> {
    display.show(image)?;
    settle(settings);
    Ok(grab(camera, settings.navg, settings.ndrops)?)
}

/// Spectra from the display all-off and all-on.
fn measure_extremes(
    display: &mut dyn Display,
    spectrometer: &mut dyn Spectrometer,
    settings: &CaptureSettings,
) -> Result<(Array1<f64>, Array1<f64>), ProtocolError> {
    let mut image = Array2::zeros(display.shape());
    let zeros = show_and_measure(display, spectrometer, image.view(), settings)?;
    image.fill(u8::MAX);
    let ones = show_and_measure(display, spectrometer, image.view(), settings)?;
    Ok((zeros, ones))
}

/// A dark spectrum, taken with the light blocked.
fn measure_dark(
    spectrometer: &mut dyn Spectrometer,
    operator: &mut dyn Operator,
    settings: &CaptureSettings,
) -> Result<Array1<f64>, ProtocolError> {
    operator.block_light()?;
    let offset = spectrometer.capture(settings.navg)?;
    operator.unblock_light()?;
    Ok(offset)
}

fn progress_bar(len: usize, units: &str, message: &'static str) -> ProgressBar {
    ProgressBar::with_draw_target(
        Some(len as u64),
        if PROGRESS_BARS.load() {
            ProgressDrawTarget::stdout()
        } else {
            ProgressDrawTarget::hidden()
        },
    )
    .with_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{msg:17}}: [{{wide_bar:.blue}}] {{pos:3}}/{{len:3}} {units} ({{elapsed_precise}}<{{eta_precise}})"
            ))
            .unwrap()
            .progress_chars("=> "),
    )
    .with_position(0)
    .with_message(message)
}

fn check_limits(limits: [f64; 2]) -> Result<(), ProtocolError> {
    let [low, high] = limits;
    if low.is_nan() || high.is_nan() || low >= high {
        Err(ProtocolError::InvertedLimits { low, high })
    } else {
        Ok(())
    }
}

/// `n` evenly spaced values from `start` to `end` inclusive.
fn linspace(start: f64, end: f64, n: usize) -> Array1<f64> {
    match n {
        0 => Array1::zeros(0),
        1 => array![start],
        _ => Array1::linspace(start, end, n),
    }
}
