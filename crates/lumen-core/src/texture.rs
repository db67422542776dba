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

//! Textures realized on a [`RenderContext`](crate::device::RenderContext).

use crate::asset::Asset;
use crate::device::{TextureFormat, TextureId};

/// A 2D texture and, unless disposed, its CPU copy.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    /// The texture name, usually the file it was loaded from.
    pub name: String,
    /// Width of the base level, in texels.
    pub width: u32,
    /// Height of the base level, in texels.
    pub height: u32,
    /// Texel layout.
    pub format: TextureFormat,
    /// The device texture, once uploaded.
    pub device_id: Option<TextureId>,
    /// Texels of each mip level, base level first. Empty once disposed.
    pub levels: Vec<Vec<u8>>,
}

impl Texture {
    /// Creates a texture from its base level texels.
    pub fn from_pixels(
        name: impl Into<String>,
        width: u32,
        height: u32,
        format: TextureFormat,
        pixels: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            format,
            device_id: None,
            levels: vec![pixels],
        }
    }

    /// Number of mip levels held on the CPU.
    pub fn mip_level_count(&self) -> u32 {
        self.levels.len() as u32
    }

    /// Texels of the base level, unless disposed.
    pub fn pixels(&self) -> Option<&[u8]> {
        self.levels.first().map(Vec::as_slice)
    }

    /// Returns `true` once the CPU copy was dropped after upload.
    pub fn is_disposed(&self) -> bool {
        self.levels.is_empty()
    }

    /// Drops the CPU copy of the texels.
    pub fn dispose_data(&mut self) {
        self.levels = Vec::new();
    }
}

impl Asset for Texture {}
