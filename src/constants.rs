// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.

Fitting constants are tied to the behaviour of the optical setup (smooth
dispersion, slowly-varying gamma) and shouldn't need changing per experiment.
 */

/// The bit depth of the SLM. Gamma tables are stored as 8-bit values.
pub const DEFAULT_DISPLAY_BITS: u32 = 8;

/// The default SLM resolution (rows, columns).
pub const DEFAULT_DISPLAY_SHAPE: (usize, usize) = (1080, 1920);

/// The size of the median filter applied to decoded wavelength -> column
/// traces. Removes single-sample decode errors.
pub const MAPPING_MEDIAN_WINDOW: usize = 5;

/// The degree of the polynomial mapping wavelength to SLM column.
pub const MAPPING_POLY_DEGREE: usize = 2;

/// The number of taps in the Hamming window used to smooth spectra.
pub const SPECTRUM_SMOOTHING_TAPS: usize = 5;

/// The degree of the polynomial fitted to each wavelength's gamma curve.
pub const GAMMA_POLY_DEGREE: usize = 10;

/// Gamma curves with fewer inverse points than this are not interpolated; the
/// wavelength keeps its default (dark) entry.
pub const GAMMA_MIN_INVERSE_POINTS: usize = 3;

/// The size of the median filter applied to contrast-ratio spectra.
pub const CONTRAST_MEDIAN_WINDOW: usize = 101;

/// The default wavelength limits of the spectrometer's reliable band \[nm\].
pub const DEFAULT_LAMBDA_LIMITS: [f64; 2] = [400.0, 800.0];

/// The default number of spectrometer scans to average.
pub const DEFAULT_NUM_SCANS: usize = 1;

/// The default spectrometer exposure time \[ms\].
pub const DEFAULT_EXPOSURE_MS: f64 = 10.0;

/// The default number of camera frames to discard before capturing.
pub const DEFAULT_NUM_DROPPED_FRAMES: usize = 1;

/// The default number of wavelength bands used in basis scans.
pub const DEFAULT_NUM_BANDS: usize = 32;

/// The step between display levels when testing gamma calibration.
pub const GAMMA_TEST_LEVEL_STEP: usize = 10;

/// The number of strip heights captured when testing spatial PWM.
pub const PWM_TEST_NUM_LEVELS: usize = 100;

/// The number of test wavelengths probed by the FWHM slit scan.
pub const FWHM_NUM_TEST_WAVELENGTHS: usize = 20;

/// The widest slit used by the FWHM slit scan \[SLM columns\].
pub const FWHM_MAX_SLIT_WIDTH: usize = 30;

/// The number of wavelengths in the synthetic target profiles.
pub const PROFILE_TEST_NUM_WAVELENGTHS: usize = 100;

/// How long to wait after showing an image before capturing \[ms\].
pub const DEFAULT_SETTLE_MS: u64 = 100;
