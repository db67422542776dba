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

//! Sampler states attached to texture uniforms.

use serde::{Deserialize, Serialize};

/// How texture coordinates outside `[0, 1]` are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WrapMode {
    /// Coordinates are clamped to the edge texels.
    #[default]
    Clamp,
    /// The texture repeats.
    Repeat,
}

/// How texels are filtered when magnified or minified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextureFilter {
    /// Nearest texel.
    #[default]
    Nearest,
    /// Bilinear interpolation.
    Linear,
}

/// How mip levels are selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MipFilter {
    /// Mipmapping is disabled.
    #[default]
    None,
    /// Nearest level.
    Nearest,
    /// Interpolate between levels.
    Linear,
}

/// Names of the sampler states a texture uniform accepts.
pub mod sampler_state {
    /// See [`WrapMode`](super::WrapMode).
    pub const WRAP_MODE: &str = "wrapMode";
    /// See [`TextureFilter`](super::TextureFilter).
    pub const TEXTURE_FILTER: &str = "textureFilter";
    /// See [`MipFilter`](super::MipFilter).
    pub const MIP_FILTER: &str = "mipFilter";

    /// Every sampler state name.
    pub const NAMES: [&str; 3] = [WRAP_MODE, TEXTURE_FILTER, MIP_FILTER];

    /// Name under which a sampler state of `uniform` is stored.
    pub fn uniform_property(uniform: &str, state: &str) -> String {
        format!("{uniform}.{state}")
    }
}

impl WrapMode {
    /// Reads a wrap mode token (`clamp` or `repeat`).
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "clamp" => Some(Self::Clamp),
            "repeat" => Some(Self::Repeat),
            _ => None,
        }
    }
}

impl TextureFilter {
    /// Reads a texture filter token (`nearest` or `linear`).
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "nearest" => Some(Self::Nearest),
            "linear" => Some(Self::Linear),
            _ => None,
        }
    }
}

impl MipFilter {
    /// Reads a mip filter token (`none`, `nearest` or `linear`).
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "none" => Some(Self::None),
            "nearest" => Some(Self::Nearest),
            "linear" => Some(Self::Linear),
            _ => None,
        }
    }
}
