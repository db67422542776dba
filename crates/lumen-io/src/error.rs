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

//! Error types of the loading pipeline.
//!
//! Every failure ends up in one of two places: the `Err` of a synchronous call,
//! or the `error` signal of the object that owns an asynchronous operation.
//! [`Loader`](crate::Loader) folds both into a single [`LoadError`] stream.

use std::fmt;
use thiserror::Error;

/// The kind of asset a serialized dependency refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// A geometry.
    Geometry,
    /// A material.
    Material,
    /// A texture.
    Texture,
    /// An effect.
    Effect,
    /// A nested scene container.
    LinkedAsset,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssetKind::Geometry => "geometry",
            AssetKind::Material => "material",
            AssetKind::Texture => "texture",
            AssetKind::Effect => "effect",
            AssetKind::LinkedAsset => "linked asset",
        };
        f.write_str(name)
    }
}

/// An error raised while parsing a file or resolving its dependencies.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParserError {
    /// The file is not in the expected format.
    #[error("Invalid file '{filename}': {reason}")]
    InvalidFile {
        /// The resolved filename.
        filename: String,
        /// What was wrong.
        reason: String,
    },
    /// The JSON document could not be parsed.
    #[error("Failed to parse JSON in '{filename}': {diagnostic}")]
    InvalidJson {
        /// The resolved filename.
        filename: String,
        /// The JSON library diagnostic.
        diagnostic: String,
    },
    /// The container was written by an incompatible major version.
    #[error("Incompatible version {found} in '{filename}', this build reads {supported}")]
    IncompatibleVersion {
        /// The resolved filename.
        filename: String,
        /// The version found in the file.
        found: String,
        /// The version this build writes.
        supported: String,
    },
    /// A pass referenced by name is not defined in any enclosing scope.
    #[error("Undefined pass '{name}'")]
    UndefinedPass {
        /// The referenced pass name.
        name: String,
    },
    /// A state name is not one of the recognized render states.
    #[error("Unknown state '{name}'")]
    UnknownState {
        /// The unrecognized name.
        name: String,
    },
    /// A document node has a shape or value the parser does not accept.
    #[error("Invalid value for '{property}': {reason}")]
    InvalidValue {
        /// The property holding the value.
        property: String,
        /// What was wrong.
        reason: String,
    },
    /// The document excludes itself for the current platforms and user flags.
    #[error("'{filename}' has no configuration matching the current platforms and user flags")]
    UnsupportedConfiguration {
        /// The resolved filename.
        filename: String,
    },
    /// A dependency requested while parsing failed to load.
    #[error("Failed to load dependency '{dependency}' of '{filename}': {reason}")]
    DependencyLoadFailed {
        /// The file being parsed.
        filename: String,
        /// The dependency that failed.
        dependency: String,
        /// Why it failed.
        reason: String,
    },
    /// An external dependency of a serialized container does not exist.
    #[error("Missing {kind} dependency '{path}'")]
    MissingDependency {
        /// The kind of the missing asset.
        kind: AssetKind,
        /// The path the asset was expected at.
        path: String,
    },
    /// A dependency of a serialized container could not be decoded.
    #[error("Failed to decode {kind} dependency '{name}': {reason}")]
    DependencyParsing {
        /// The kind of the asset.
        kind: AssetKind,
        /// The asset name or path.
        name: String,
        /// What was wrong.
        reason: String,
    },
    /// A dependency of a serialized container did not finish synchronously.
    #[error("Dependency '{name}' did not resolve synchronously")]
    UnresolvedDependency {
        /// The asset name or path.
        name: String,
    },
    /// The render context rejected an upload.
    #[error("Device error while loading '{filename}': {reason}")]
    Device {
        /// The file being parsed.
        filename: String,
        /// The device diagnostic.
        reason: String,
    },
}

impl ParserError {
    /// A stable tag naming the error type.
    pub fn type_tag(&self) -> &'static str {
        match self {
            ParserError::InvalidFile { .. } => "InvalidFile",
            ParserError::InvalidJson { .. } => "InvalidJson",
            ParserError::IncompatibleVersion { .. } => "IncompatibleVersion",
            ParserError::UndefinedPass { .. } => "UndefinedPass",
            ParserError::UnknownState { .. } => "UnknownState",
            ParserError::InvalidValue { .. } => "InvalidValue",
            ParserError::UnsupportedConfiguration { .. } => "UnsupportedConfiguration",
            ParserError::DependencyLoadFailed { .. } => "DependencyLoadError",
            ParserError::MissingDependency { kind, .. } => match kind {
                AssetKind::Geometry => "MissingGeometryDependency",
                AssetKind::Material => "MissingMaterialDependency",
                AssetKind::Texture => "MissingTextureDependency",
                AssetKind::Effect => "MissingEffectDependency",
                AssetKind::LinkedAsset => "MissingLinkedAssetDependency",
            },
            ParserError::DependencyParsing { .. } => "DependencyParsingError",
            ParserError::UnresolvedDependency { .. } => "UnresolvedDependency",
            ParserError::Device { .. } => "DeviceError",
        }
    }

    /// Returns `false` for failures limited to one dependency of a container:
    /// the parser still completes after reporting them.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ParserError::MissingDependency { .. }
                | ParserError::DependencyParsing { .. }
                | ParserError::UnresolvedDependency { .. }
        )
    }
}

/// An error raised by a [`Protocol`](crate::protocol::Protocol) while fetching bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// No candidate path exists.
    #[error("File '{filename}' not found (tried {tried:?})")]
    NotFound {
        /// The requested filename.
        filename: String,
        /// Every path that was tried.
        tried: Vec<String>,
    },
    /// A candidate exists but could not be read.
    #[error("Failed to read '{filename}': {reason}")]
    Io {
        /// The path being read.
        filename: String,
        /// The I/O diagnostic.
        reason: String,
    },
    /// The protocol's worker is gone.
    #[error("Protocol worker disconnected while fetching '{filename}'")]
    Disconnected {
        /// The requested filename.
        filename: String,
    },
}

/// A failure of one single-file load.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    /// The bytes could not be fetched.
    #[error("Failed to fetch '{filename}': {source}")]
    Fetch {
        /// The requested filename.
        filename: String,
        /// The protocol error.
        #[source]
        source: FetchError,
    },
    /// The selected parser reported an error.
    #[error("Failed to parse '{filename}': {source}")]
    Parse {
        /// The requested filename.
        filename: String,
        /// The parser error.
        #[source]
        source: ParserError,
        /// Whether the loader will not complete after this error.
        fatal: bool,
    },
}

impl LoadError {
    /// The requested filename.
    pub fn filename(&self) -> &str {
        match self {
            LoadError::Fetch { filename, .. } | LoadError::Parse { filename, .. } => filename,
        }
    }

    /// Returns `true` if the loader will not complete after this error.
    pub fn is_fatal(&self) -> bool {
        match self {
            LoadError::Fetch { .. } => true,
            LoadError::Parse { fatal, .. } => *fatal,
        }
    }

    /// The tag of the underlying error.
    pub fn type_tag(&self) -> &'static str {
        match self {
            LoadError::Fetch { .. } => "FetchError",
            LoadError::Parse { source, .. } => source.type_tag(),
        }
    }
}

/// A failure of one file of a [`BatchLoader`](crate::BatchLoader).
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Batch failed to load '{filename}': {cause}")]
pub struct BatchLoadError {
    /// The queued filename.
    pub filename: String,
    /// What went wrong.
    #[source]
    pub cause: LoadError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_dependencies_are_tagged_per_kind() {
        let error = ParserError::MissingDependency {
            kind: AssetKind::Texture,
            path: "assets/brick.png".to_string(),
        };
        assert_eq!(error.type_tag(), "MissingTextureDependency");
        assert!(!error.is_fatal());
        assert_eq!(
            error.to_string(),
            "Missing texture dependency 'assets/brick.png'"
        );
    }

    #[test]
    fn schema_errors_are_fatal() {
        assert!(ParserError::UndefinedPass {
            name: "p".to_string()
        }
        .is_fatal());
        assert!(LoadError::Fetch {
            filename: "a".to_string(),
            source: FetchError::Disconnected {
                filename: "a".to_string()
            },
        }
        .is_fatal());
    }
}
