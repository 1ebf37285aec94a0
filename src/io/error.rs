// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with reading and writing calibration files and capture
//! dumps.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BundleError {
    #[error("Tried to use a file with an unsupported extension '{ext}'! Supported: {}", *super::BUNDLE_EXTENSIONS)]
    UnsupportedExt { ext: String },

    #[error("Couldn't find '{}'; has it been captured for this experiment?", path.display())]
    Missing { path: PathBuf },

    #[error("Experiment names can't be empty or contain path separators; got '{name}'")]
    BadExperimentName { name: String },

    #[error("Couldn't parse '{}' as JSON: {err}", path.display())]
    Json {
        path: PathBuf,
        err: serde_json::Error,
    },

    #[error("Couldn't parse '{}' as YAML: {err}", path.display())]
    Yaml {
        path: PathBuf,
        err: serde_yaml::Error,
    },

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
