// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Reading and writing calibration files and capture dumps.
//!
//! Everything belonging to an experiment lives in `<data_dir>/<experiment>/`:
//! the fitted calibration `device.json`, and one dump per capture protocol
//! (`gamma_data.json`, `fwhm_test.json`, `hadamard_32.json`, ...). The format
//! of any file is chosen by its extension.

mod error;

pub use error::*;

use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
    str::FromStr,
};

use itertools::Itertools;
use log::{debug, trace};
use serde::{de::DeserializeOwned, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::calibration::DeviceCalibration;

lazy_static::lazy_static! {
    pub(crate) static ref BUNDLE_EXTENSIONS: String = BundleType::iter().join(", ");
}

/// The file name of a fitted calibration within an experiment directory.
pub const DEVICE_FILE_NAME: &str = "device.json";

pub const GAMMA_DUMP: &str = "gamma_data";
pub const MAPPING_DUMP: &str = "mapping_data";
pub const CONTRAST_DUMP: &str = "contrast_data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
pub enum BundleType {
    #[strum(serialize = "json")]
    Json,

    #[strum(serialize = "yaml", serialize = "yml")]
    Yaml,
}

impl BundleType {
    fn from_path(path: &Path) -> Result<BundleType, BundleError> {
        let ext = path.extension().and_then(|e| e.to_str());
        ext.and_then(|e| BundleType::from_str(&e.to_lowercase()).ok())
            .ok_or_else(|| BundleError::UnsupportedExt {
                ext: ext.unwrap_or("<no extension>").to_string(),
            })
    }
}

/// Write `value` to `path`, formatted according to the extension.
pub fn save<T: Serialize, P: AsRef<Path>>(value: &T, path: P) -> Result<(), BundleError> {
    let path = path.as_ref();
    let bundle_type = BundleType::from_path(path)?;
    trace!("Writing {bundle_type} to '{}'", path.display());

    let mut writer = BufWriter::new(File::create(path)?);
    match bundle_type {
        BundleType::Json => serde_json::to_writer(&mut writer, value).map_err(|err| {
            BundleError::Json {
                path: path.to_path_buf(),
                err,
            }
        })?,
        BundleType::Yaml => {
            serde_yaml::to_writer(&mut writer, value).map_err(|err| BundleError::Yaml {
                path: path.to_path_buf(),
                err,
            })?
        }
    }
    writer.flush()?;
    Ok(())
}

/// Read a value from `path`, parsed according to the extension.
pub fn load<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T, BundleError> {
    let path = path.as_ref();
    let bundle_type = BundleType::from_path(path)?;
    if !path.exists() {
        return Err(BundleError::Missing {
            path: path.to_path_buf(),
        });
    }
    trace!("Reading {bundle_type} from '{}'", path.display());

    let reader = BufReader::new(File::open(path)?);
    match bundle_type {
        BundleType::Json => serde_json::from_reader(reader).map_err(|err| BundleError::Json {
            path: path.to_path_buf(),
            err,
        }),
        BundleType::Yaml => serde_yaml::from_reader(reader).map_err(|err| BundleError::Yaml {
            path: path.to_path_buf(),
            err,
        }),
    }
}

/// The name of a metric's capture dump, e.g. `fwhm_test`.
pub fn metric_dump(metric: &str) -> String {
    format!("{metric}_test")
}

/// The name of a scan's capture dump, e.g. `hadamard_32`.
pub fn scan_dump(basis: &str, nbands: usize) -> String {
    format!("{basis}_{nbands}")
}

/// The directory holding an experiment's files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Experiment {
    dir: PathBuf,
}

impl Experiment {
    pub fn new<P: AsRef<Path>>(data_dir: P, name: &str) -> Result<Experiment, BundleError> {
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(BundleError::BadExperimentName {
                name: name.to_string(),
            });
        }
        Ok(Experiment {
            dir: data_dir.as_ref().join(name),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the experiment directory if it doesn't exist.
    pub fn create(&self) -> Result<(), BundleError> {
        if !self.dir.exists() {
            debug!("Creating experiment directory '{}'", self.dir.display());
            std::fs::create_dir_all(&self.dir)?;
        }
        Ok(())
    }

    pub fn device_path(&self) -> PathBuf {
        self.dir.join(DEVICE_FILE_NAME)
    }

    pub fn dump_path(&self, dump: &str) -> PathBuf {
        self.dir.join(format!("{dump}.json"))
    }

    /// Write a capture dump, creating the experiment directory if necessary.
    pub fn save_dump<T: Serialize>(&self, dump: &str, value: &T) -> Result<PathBuf, BundleError> {
        self.create()?;
        let path = self.dump_path(dump);
        save(value, &path)?;
        Ok(path)
    }

    pub fn load_dump<T: DeserializeOwned>(&self, dump: &str) -> Result<T, BundleError> {
        load(self.dump_path(dump))
    }

    /// The experiment's calibration; an unfitted one if nothing has been
    /// saved yet.
    pub fn load_calibration(&self) -> Result<DeviceCalibration, BundleError> {
        let path = self.device_path();
        if path.exists() {
            load(path)
        } else {
            debug!("No calibration at '{}'; starting afresh", path.display());
            Ok(DeviceCalibration::default())
        }
    }

    pub fn save_calibration(&self, model: &DeviceCalibration) -> Result<PathBuf, BundleError> {
        self.create()?;
        let path = self.device_path();
        save(model, &path)?;
        Ok(path)
    }
}
