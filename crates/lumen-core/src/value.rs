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

//! Dynamically typed values stored in binding defaults and material properties.

use crate::asset::AssetHandle;
use crate::effect::{Blending, CompareMode, StencilOperation, TriangleCulling};
use crate::effect::{MipFilter, TextureFilter, WrapMode};
use crate::texture::Texture;

/// A value a binding can provide to a shader or a render state.
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    Bool(bool),
    Int(i32),
    Int2([i32; 2]),
    Int3([i32; 3]),
    Int4([i32; 4]),
    Float(f32),
    Float2([f32; 2]),
    Float3([f32; 3]),
    Float4([f32; 4]),
    /// A column-major 4x4 matrix.
    Mat4([f32; 16]),
    Texture(AssetHandle<Texture>),
    Blending(Blending),
    Compare(CompareMode),
    Stencil(StencilOperation),
    Culling(TriangleCulling),
    WrapMode(WrapMode),
    TextureFilter(TextureFilter),
    MipFilter(MipFilter),
}

impl DataValue {
    /// Builds an integer value from 1 to 4 components.
    pub fn int_vector(components: &[i32]) -> Option<Self> {
        match *components {
            [x] => Some(Self::Int(x)),
            [x, y] => Some(Self::Int2([x, y])),
            [x, y, z] => Some(Self::Int3([x, y, z])),
            [x, y, z, w] => Some(Self::Int4([x, y, z, w])),
            _ => None,
        }
    }

    /// Builds a float value from 1 to 4 components, or 16 for a matrix.
    pub fn float_vector(components: &[f32]) -> Option<Self> {
        match *components {
            [x] => Some(Self::Float(x)),
            [x, y] => Some(Self::Float2([x, y])),
            [x, y, z] => Some(Self::Float3([x, y, z])),
            [x, y, z, w] => Some(Self::Float4([x, y, z, w])),
            _ => <[f32; 16]>::try_from(components).ok().map(Self::Mat4),
        }
    }

    /// Returns the components of a float value, matrices included.
    pub fn as_floats(&self) -> Option<&[f32]> {
        match self {
            Self::Float(v) => Some(std::slice::from_ref(v)),
            Self::Float2(v) => Some(v),
            Self::Float3(v) => Some(v),
            Self::Float4(v) => Some(v),
            Self::Mat4(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the components of an integer value.
    pub fn as_ints(&self) -> Option<&[i32]> {
        match self {
            Self::Int(v) => Some(std::slice::from_ref(v)),
            Self::Int2(v) => Some(v),
            Self::Int3(v) => Some(v),
            Self::Int4(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the texture of a texture value.
    pub fn as_texture(&self) -> Option<&AssetHandle<Texture>> {
        match self {
            Self::Texture(texture) => Some(texture),
            _ => None,
        }
    }

    /// A short name of the value's type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Int2(_) => "ivec2",
            Self::Int3(_) => "ivec3",
            Self::Int4(_) => "ivec4",
            Self::Float(_) => "float",
            Self::Float2(_) => "vec2",
            Self::Float3(_) => "vec3",
            Self::Float4(_) => "vec4",
            Self::Mat4(_) => "mat4",
            Self::Texture(_) => "texture",
            Self::Blending(_) => "blending",
            Self::Compare(_) => "compare mode",
            Self::Stencil(_) => "stencil operation",
            Self::Culling(_) => "triangle culling",
            Self::WrapMode(_) => "wrap mode",
            Self::TextureFilter(_) => "texture filter",
            Self::MipFilter(_) => "mip filter",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vectors_are_sized_by_component_count() {
        assert_eq!(DataValue::int_vector(&[1, 0]), Some(DataValue::Int2([1, 0])));
        assert_eq!(DataValue::int_vector(&[]), None);
        assert_eq!(DataValue::int_vector(&[1, 2, 3, 4, 5]), None);
        assert_eq!(
            DataValue::float_vector(&[1.0; 4]),
            Some(DataValue::Float4([1.0; 4]))
        );
        assert!(matches!(
            DataValue::float_vector(&[0.0; 16]),
            Some(DataValue::Mat4(_))
        ));
        assert_eq!(DataValue::float_vector(&[0.0; 5]), None);
    }

    #[test]
    fn accessors_match_variants() {
        let v = DataValue::Float3([1.0, 2.0, 3.0]);
        assert_eq!(v.as_floats(), Some(&[1.0, 2.0, 3.0][..]));
        assert_eq!(v.as_ints(), None);
        assert_eq!(v.type_name(), "vec3");
    }
}
