// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Turning spectral profiles into SLM display patterns.
//!
//! Each spectrometer wavelength lands on one SLM column (see
//! [`WavelengthMapping`]), so a spectral profile is displayed by setting
//! each wavelength's column. With [`EncodeMode::Gamma`] the whole column is
//! set to the display level that gives the desired intensity; with
//! [`EncodeMode::Pwm`] the column is lit at full intensity over a strip whose
//! height is proportional to the desired intensity.

mod error;

pub use error::*;

use log::{trace, warn};
use ndarray::{prelude::*, Zip};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::{
    calibration::{DeviceCalibration, GammaTable, WavelengthMapping},
    math::{is_strictly_ascending, nearest_index, resample_nearest},
};

/// How intensities are realised on the display.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EncodeMode {
    /// Per-wavelength gamma-corrected display levels.
    Gamma,

    /// Spatial pulse-width modulation: the height of a lit strip.
    Pwm,
}

/// Encodes profiles for a fitted device and a fixed display size.
#[derive(Debug, Clone, Copy)]
pub struct ProfileEncoder<'a> {
    mapping: &'a WavelengthMapping,
    gamma: &'a GammaTable,
    height: usize,
    width: usize,
}

impl<'a> ProfileEncoder<'a> {
    pub fn new(
        model: &'a DeviceCalibration,
        (height, width): (usize, usize),
    ) -> Result<ProfileEncoder<'a>, EncodeError> {
        let mapping = model.mapping()?;
        let gamma = model.gamma()?;
        if height == 0 || width == 0 {
            return Err(EncodeError::ZeroDimension { height, width });
        }
        if gamma.wvl.len() != mapping.wvl.len() || gamma.fitted.len() != mapping.wvl.len() {
            return Err(EncodeError::ModelMismatch {
                gamma: gamma.wvl.len(),
                mapping: mapping.wvl.len(),
            });
        }
        Ok(ProfileEncoder {
            mapping,
            gamma,
            height,
            width,
        })
    }

    /// The device (spectrometer) wavelengths profiles are resampled onto.
    pub fn device_wavelengths(&self) -> ArrayView1<f64> {
        self.mapping.wvl.view()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// The number of intensity buckets in the gamma table.
    pub fn nlevels(&self) -> usize {
        self.gamma.nlevels()
    }

    /// The display column lit by the device wavelength nearest to
    /// `wavelength`, if it lands on the display.
    pub fn column_of(&self, wavelength: f64) -> Option<usize> {
        let j = nearest_index(self.mapping.wvl.view(), wavelength);
        let c = *self.mapping.columns.get(j)?;
        if c >= 0.0 && c < self.width as f64 {
            Some(c.floor() as usize)
        } else {
            None
        }
    }

    /// Encode a non-negative profile defined at `wavelengths`. Only the shape
    /// of the profile matters; it is normalised by its maximum.
    pub fn encode(
        &self,
        wavelengths: ArrayView1<f64>,
        profile: ArrayView1<f64>,
        mode: EncodeMode,
    ) -> Result<Array2<u8>, EncodeError> {
        validate_profile(wavelengths, profile)?;
        if let Some((j, &value)) = profile.iter().enumerate().find(|(_, v)| **v < 0.0) {
            return Err(EncodeError::NegativeIntensity {
                wavelength: wavelengths[j],
                value,
            });
        }

        let resampled = resample_nearest(wavelengths, profile, self.mapping.wvl.view());
        Ok(self.encode_device_profile(resampled.view(), mode))
    }

    /// Encode a non-negative profile that is already defined on the device
    /// wavelengths.
    fn encode_device_profile(&self, profile: ArrayView1<f64>, mode: EncodeMode) -> Array2<u8> {
        let mut image = Array2::zeros((self.height, self.width));
        let max = profile.fold(0.0_f64, |acc, &v| acc.max(v));
        if max <= 0.0 {
            return image;
        }

        let top = self.gamma.nlevels() - 1;
        let centre = self.height / 2;
        let mut num_unfitted = 0;
        for (j, column) in self.columns() {
            let p = profile[j] / max;
            if !self.gamma.fitted[j] {
                if p > 0.0 {
                    num_unfitted += 1;
                }
                continue;
            }
            match mode {
                EncodeMode::Gamma => {
                    // The small offset stops p = k / top landing just below k.
                    let bucket = ((p * top as f64 + 1e-9).floor() as usize).min(top);
                    image
                        .column_mut(column)
                        .fill(self.gamma.level(bucket, j));
                }
                EncodeMode::Pwm => {
                    // As above; a rescaled profile mustn't lose a row.
                    let rows = ((self.height as f64 * p + 1e-9).floor() as usize).min(self.height);
                    let half = rows / 2;
                    image
                        .slice_mut(s![centre - half..centre + half, column])
                        .fill(self.gamma.level(top, j));
                }
            }
        }

        if num_unfitted > 0 {
            warn!("{num_unfitted} wavelength(s) have no gamma curve and were left dark");
        }
        image
    }

    /// A pattern with every mapped column at the display level for intensity
    /// bucket `bucket`.
    pub fn flat_gamma(&self, bucket: usize) -> Result<Array2<u8>, EncodeError> {
        let nlevels = self.gamma.nlevels();
        if bucket >= nlevels {
            return Err(EncodeError::LevelOutOfRange {
                level: bucket,
                nlevels,
            });
        }
        let mut image = Array2::zeros((self.height, self.width));
        for (j, column) in self.columns() {
            if self.gamma.fitted[j] {
                image.column_mut(column).fill(self.gamma.level(bucket, j));
            }
        }
        Ok(image)
    }

    /// A pattern with every mapped column at full intensity over the central
    /// `2 * half_height` rows.
    pub fn strip(&self, half_height: usize) -> Array2<u8> {
        let centre = self.height / 2;
        let half = half_height.min(centre);
        let top = self.gamma.nlevels() - 1;
        let mut image = Array2::zeros((self.height, self.width));
        for (j, column) in self.columns() {
            if self.gamma.fitted[j] {
                image
                    .slice_mut(s![centre - half..centre + half, column])
                    .fill(self.gamma.level(top, j));
            }
        }
        image
    }

    /// A fully-lit slit of `2 * half_width + 1` columns centred on `column`,
    /// cropped to the display.
    pub fn slit(&self, column: usize, half_width: usize) -> Array2<u8> {
        let mut image = Array2::zeros((self.height, self.width));
        let start = column.saturating_sub(half_width).min(self.width);
        let end = column
            .saturating_add(half_width)
            .saturating_add(1)
            .min(self.width);
        image.slice_mut(s![.., start..end]).fill(u8::MAX);
        image
    }

    /// Encode a profile that may have negative parts as two patterns. The
    /// negative pattern is absent if there is nothing negative to show.
    pub fn encode_signed(
        &self,
        wavelengths: ArrayView1<f64>,
        profile: ArrayView1<f64>,
        mode: EncodeMode,
    ) -> Result<SignedPatterns, EncodeError> {
        validate_profile(wavelengths, profile)?;
        let split = split_signed(profile);
        let positive = self.encode(wavelengths, split.positive.view(), mode)?;
        let negative = if split.nval > 0.0 {
            Some(self.encode(wavelengths, split.negative.view(), mode)?)
        } else {
            None
        };
        Ok(SignedPatterns {
            positive,
            negative,
            split,
        })
    }

    /// The (wavelength index, display column) pairs for every wavelength that
    /// lands on the display.
    fn columns(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let width = self.width as f64;
        self.mapping
            .columns
            .iter()
            .enumerate()
            .filter_map(move |(j, &c)| {
                if c >= 0.0 && c < width {
                    Some((j, c.floor() as usize))
                } else {
                    trace!("Wavelength index {j} maps off the display (column {c})");
                    None
                }
            })
    }
}

/// Encode a non-negative `profile` defined at `wavelengths` for the device
/// described by `model`, on a display of the given shape.
pub fn encode(
    profile: ArrayView1<f64>,
    wavelengths: ArrayView1<f64>,
    model: &DeviceCalibration,
    shape: (usize, usize),
    mode: EncodeMode,
) -> Result<Array2<u8>, EncodeError> {
    ProfileEncoder::new(model, shape)?.encode(wavelengths, profile, mode)
}

/// A signed profile split into non-negative halves. Each half is displayed
/// normalised, so `pval` and `nval` (the maxima of each half) restore the
/// relative scale when the captures are combined.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedSplit {
    pub positive: Array1<f64>,

    /// The magnitude of the negative part.
    pub negative: Array1<f64>,

    pub pval: f64,
    pub nval: f64,
}

/// Display patterns for a signed profile.
#[derive(Debug, Clone)]
pub struct SignedPatterns {
    pub positive: Array2<u8>,
    pub negative: Option<Array2<u8>>,
    pub split: SignedSplit,
}

pub fn split_signed(profile: ArrayView1<f64>) -> SignedSplit {
    let positive = profile.mapv(|v| v.max(0.0));
    let negative = profile.mapv(|v| (-v).max(0.0));
    let pval = positive.fold(0.0_f64, |acc, &v| acc.max(v));
    let nval = negative.fold(0.0_f64, |acc, &v| acc.max(v));
    SignedSplit {
        positive,
        negative,
        pval,
        nval,
    }
}

/// Combine captures of a signed profile's two patterns:
/// `(positive - zero) * pval - (negative - zero) * nval`. Works for camera
/// images and spectra alike.
pub fn combine_signed<D: Dimension>(
    positive: ArrayView<f64, D>,
    negative: Option<ArrayView<f64, D>>,
    zero: ArrayView<f64, D>,
    split: &SignedSplit,
) -> Result<Array<f64, D>, EncodeError> {
    let check = |other: &ArrayView<f64, D>| {
        if other.shape() == positive.shape() {
            Ok(())
        } else {
            Err(EncodeError::CaptureShapeMismatch {
                positive: positive.shape().to_vec(),
                other: other.shape().to_vec(),
            })
        }
    };
    check(&zero)?;

    let mut combined = positive.to_owned();
    Zip::from(&mut combined)
        .and(&zero)
        .for_each(|c, &z| *c = (*c - z) * split.pval);
    if let Some(negative) = negative {
        check(&negative)?;
        Zip::from(&mut combined)
            .and(&negative)
            .and(&zero)
            .for_each(|c, &n, &z| *c -= (n - z) * split.nval);
    }
    Ok(combined)
}

/// Suppress diffraction from a pupil-plane pattern: rows within `minlim` of
/// the vertical centre are fully lit and rows `maxlim` or more away from it
/// are dark.
pub fn diffraction_fix(image: ArrayView2<u8>, minlim: usize, maxlim: usize) -> Array2<u8> {
    let mut fixed = image.to_owned();
    let height = image.nrows();
    let centre = height / 2;

    let lit_start = centre.saturating_sub(minlim);
    let lit_end = centre.saturating_add(minlim).min(height);
    fixed.slice_mut(s![lit_start..lit_end, ..]).fill(u8::MAX);

    let dark_top = centre.saturating_sub(maxlim);
    fixed.slice_mut(s![..dark_top, ..]).fill(0);
    let dark_bottom = centre.saturating_add(maxlim).min(height);
    fixed.slice_mut(s![dark_bottom.., ..]).fill(0);

    fixed
}

fn validate_profile(
    wavelengths: ArrayView1<f64>,
    profile: ArrayView1<f64>,
) -> Result<(), EncodeError> {
    if wavelengths.len() != profile.len() {
        return Err(EncodeError::ProfileLengthMismatch {
            wavelengths: wavelengths.len(),
            intensities: profile.len(),
        });
    }
    if !is_strictly_ascending(wavelengths) {
        return Err(EncodeError::ProfileNotAscending);
    }
    if let Some(j) = profile.iter().position(|v| !v.is_finite()) {
        return Err(EncodeError::NonFiniteIntensity {
            wavelength: wavelengths[j],
        });
    }
    Ok(())
}
