// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Serializable loader settings, read from RON.

use crate::options::ParserErrorPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// An error raised while reading [`LoaderSettings`].
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The file could not be read.
    #[error("Failed to read settings file '{path}': {source}")]
    Io {
        /// The settings file.
        path: String,
        /// The I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The RON document is malformed.
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// The part of [`Options`](crate::Options) that can be stored in a file.
///
/// ```ron
/// (
///     include_paths: ["assets", "assets/effects"],
///     platforms: ["linux"],
///     user_flags: ["hq"],
///     generate_mipmaps: true,
///     parser_error_policy: Propagate,
/// )
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderSettings {
    /// Folders relative filenames are looked up in, oldest first.
    pub include_paths: Vec<String>,
    /// Platform tokens matched by `configuration` filters.
    pub platforms: Vec<String>,
    /// User flags matched by `configuration` filters.
    pub user_flags: Vec<String>,
    /// Build a mip chain for loaded images.
    pub generate_mipmaps: bool,
    /// Resize non-power-of-two images with filtering.
    pub resize_smoothly: bool,
    /// Drop CPU pixels once a texture is uploaded.
    pub dispose_texture_after_loading: bool,
    /// What loaders do with parser errors.
    pub parser_error_policy: ParserErrorPolicy,
    /// Read files on a worker thread.
    pub threaded_io: bool,
}

impl LoaderSettings {
    /// Parses settings from a RON string.
    pub fn from_ron_str(source: &str) -> Result<Self, SettingsError> {
        Ok(ron::from_str(source)?)
    }

    /// Reads settings from a RON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let settings = Self::from_ron_str(&source)?;
        log::debug!("LoaderSettings: loaded {settings:?} from '{}'", path.display());
        Ok(settings)
    }
}
