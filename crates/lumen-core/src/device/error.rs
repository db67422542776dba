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

//! Errors reported by a [`RenderContext`](super::RenderContext) implementation.

use super::TextureId;
use std::fmt;

/// An error related to the creation or update of device resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The descriptor cannot be honored by the device.
    InvalidDescriptor {
        /// A debug label of the resource being created.
        label: String,
        /// Why the descriptor was rejected.
        reason: String,
    },
    /// The requested texture does not exist (or was already deleted).
    TextureNotFound {
        /// The ID of the missing texture.
        id: TextureId,
    },
    /// Uploaded data does not match the size expected for the target level.
    SizeMismatch {
        /// The ID of the texture being written.
        id: TextureId,
        /// The mip level being written.
        mip_level: u32,
        /// Expected size in bytes.
        expected: usize,
        /// Received size in bytes.
        actual: usize,
    },
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::InvalidDescriptor { label, reason } => {
                write!(f, "Invalid descriptor for '{label}': {reason}")
            }
            DeviceError::TextureNotFound { id } => {
                write!(f, "Texture not found for ID: {id:?}")
            }
            DeviceError::SizeMismatch {
                id,
                mip_level,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Upload size mismatch for texture {id:?} level {mip_level}: expected {expected} bytes, got {actual}"
                )
            }
        }
    }
}

impl std::error::Error for DeviceError {}
