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

use super::DeviceError;
use std::fmt::Debug;

/// An opaque identifier for a texture owned by a [`RenderContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

/// The memory layout of texture texels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFormat {
    /// Four 8-bit unsigned normalized components, in RGBA order.
    #[default]
    Rgba8Unorm,
    /// Three 8-bit unsigned normalized components, in RGB order.
    Rgb8Unorm,
}

impl TextureFormat {
    /// Returns the size in bytes of one texel.
    pub fn bytes_per_texel(&self) -> usize {
        match self {
            TextureFormat::Rgba8Unorm => 4,
            TextureFormat::Rgb8Unorm => 3,
        }
    }
}

/// Describes a texture to be created on the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureDescriptor {
    /// A debug label, usually the asset name.
    pub label: String,
    /// Width of the base level, in texels.
    pub width: u32,
    /// Height of the base level, in texels.
    pub height: u32,
    /// Texel layout.
    pub format: TextureFormat,
    /// Number of mip levels, including the base level.
    pub mip_level_count: u32,
    /// Whether the texture can be bound as a render target.
    pub render_target: bool,
}

/// The device backend used to realize loaded assets.
///
/// Every method takes `&self`: implementations are expected to use interior
/// mutability, since one context is shared by every loader of a session.
pub trait RenderContext: Debug {
    /// Creates a texture from the provided descriptor.
    /// ## Arguments
    /// * `descriptor` - The size, format and mip count of the texture.
    /// ## Returns
    /// The ID of the created texture.
    /// ## Errors
    /// * `DeviceError` - If the device rejects the descriptor.
    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, DeviceError>;

    /// Uploads texel data for one mip level of an existing texture.
    /// ## Arguments
    /// * `id` - The texture to write into.
    /// * `mip_level` - The level to fill, `0` being the base level.
    /// * `data` - Tightly packed texels in the texture's format.
    /// ## Errors
    /// * `DeviceError` - If the texture is unknown or the data size mismatches.
    fn upload_texture(&self, id: TextureId, mip_level: u32, data: &[u8])
        -> Result<(), DeviceError>;

    /// Releases the texture associated with the given ID.
    /// ## Errors
    /// * `DeviceError` - If the texture is unknown.
    fn delete_texture(&self, id: TextureId) -> Result<(), DeviceError>;
}
