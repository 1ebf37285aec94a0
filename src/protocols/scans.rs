// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Hyperspectral scans: camera images of a scene lit through spectral bands.

use log::info;
use ndarray::{prelude::*, Zip};
use serde::{Deserialize, Serialize};

use super::*;
use crate::{
    encode::{EncodeMode, ProfileEncoder},
    math::hadamard,
};

/// Camera images for each row of a Hadamard basis over wavelength bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HadamardData {
    /// The band centres \[nm\].
    pub wvl: Array1<f64>,

    /// The ±1 basis; row `i` was displayed as `positive[i]` (the +1 bands)
    /// and `negative[i]` (the -1 bands).
    pub basis: Array2<i8>,

    /// Shape (num bands, camera rows, camera columns).
    pub positive: Array3<f64>,
    pub negative: Array3<f64>,
}

impl HadamardData {
    /// Demultiplex the captures into one image per band. The basis is
    /// orthogonal, so its inverse is its transpose over the number of bands.
    pub fn band_images(&self) -> Array3<f64> {
        let nbands = self.basis.nrows();
        let difference = &self.positive - &self.negative;
        let mut bands = Array3::zeros(difference.dim());
        for (k, mut band) in bands.outer_iter_mut().enumerate() {
            for (i, capture) in difference.outer_iter().enumerate() {
                let weight = f64::from(self.basis[(i, k)]) / nbands as f64;
                Zip::from(&mut band)
                    .and(&capture)
                    .for_each(|b, &c| *b += weight * c);
            }
        }
        bands
    }
}

/// Camera images with one band lit at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityData {
    /// The band centres \[nm\].
    pub wvl: Array1<f64>,

    /// Shape (num bands, camera rows, camera columns).
    pub data: Array3<f64>,
}

/// Scan a scene with the rows of a Hadamard basis over `nbands` bands spread
/// across `limits`. Each row is displayed twice: its +1 bands, then its -1
/// bands (nothing for the all-ones first row).
pub fn capture_hadamard(
    display: &mut dyn Display,
    camera: &mut dyn Camera,
    settings: &CaptureSettings,
    encoder: &ProfileEncoder,
    limits: [f64; 2],
    nbands: usize,
) -> Result<HadamardData, ProtocolError> {
    if nbands < 2 || !nbands.is_power_of_two() {
        return Err(ProtocolError::BadHadamardBands { nbands });
    }
    check_limits(limits)?;
    let wvl = linspace(limits[0], limits[1], nbands);
    let basis = hadamard(nbands);
    let (height, width) = camera.shape();

    info!("Capturing a {nbands}-band Hadamard scan");
    let mut positive = Array3::zeros((nbands, height, width));
    let mut negative = Array3::zeros((nbands, height, width));
    let dark_image = Array2::zeros(encoder.shape());
    let pb = progress_bar(nbands, "rows", "Hadamard scan");
    for (i, row) in basis.outer_iter().enumerate() {
        let plus = row.mapv(|v| if v > 0 { 1.0 } else { 0.0 });
        let image = encoder.encode(wvl.view(), plus.view(), EncodeMode::Gamma)?;
        positive
            .index_axis_mut(Axis(0), i)
            .assign(&show_and_grab(display, camera, image.view(), settings)?);

        let image = if i == 0 {
            dark_image.clone()
        } else {
            let minus = plus.mapv(|v| 1.0 - v);
            encoder.encode(wvl.view(), minus.view(), EncodeMode::Gamma)?
        };
        negative
            .index_axis_mut(Axis(0), i)
            .assign(&show_and_grab(display, camera, image.view(), settings)?);
        pb.inc(1);
    }
    pb.abandon_with_message("Finished Hadamard");

    Ok(HadamardData {
        wvl,
        basis,
        positive,
        negative,
    })
}

/// Scan a scene lighting each of `nbands` bands spread across `limits` in
/// turn.
pub fn capture_identity(
    display: &mut dyn Display,
    camera: &mut dyn Camera,
    settings: &CaptureSettings,
    encoder: &ProfileEncoder,
    limits: [f64; 2],
    nbands: usize,
) -> Result<IdentityData, ProtocolError> {
    if nbands == 0 {
        return Err(ProtocolError::NoBands);
    }
    check_limits(limits)?;
    let wvl = linspace(limits[0], limits[1], nbands);
    let (height, width) = camera.shape();

    info!("Capturing a {nbands}-band identity scan");
    let mut data = Array3::zeros((nbands, height, width));
    let mut profile = Array1::zeros(nbands);
    let pb = progress_bar(nbands, "bands", "Identity scan");
    for (band, mut frame) in data.outer_iter_mut().enumerate() {
        profile[band] = 1.0;
        let image = encoder.encode(wvl.view(), profile.view(), EncodeMode::Gamma)?;
        frame.assign(&show_and_grab(display, camera, image.view(), settings)?);
        profile[band] = 0.0;
        pb.inc(1);
    }
    pb.abandon_with_message("Finished identity");

    Ok(IdentityData { wvl, data })
}
