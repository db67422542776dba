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
//! Material containers.

use super::container::ContainerKind;
use super::resolver::{parse_container, AssetFunctions, ResolveContext};
use super::writer::{write_container, WriterError, WriterOptions};
use lumen_core::asset::AssetHandle;
use lumen_core::effect::{
    priority, Blending, CompareMode, MipFilter, StencilOperation, States, TextureFilter,
    TriangleCulling, WrapMode,
};
use lumen_core::material::Material;
use lumen_core::texture::Texture;
use lumen_core::value::DataValue;
use lumen_data::{AssetLibrary, AssetLibraryRef, Dependency, DependencyKind};
use lumen_io::{AbstractParser, Options, ParserError, ParserFactory, ParserRef, ParserSignals};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// A material property as stored in a container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum PropertyValue {
    Floats(Vec<f32>),
    Ints(Vec<i32>),
    Bool(bool),
    /// A texture id of the dependency tables.
    Texture(u32),
    Blending(Blending),
    Culling(TriangleCulling),
    Compare(CompareMode),
    Stencil(StencilOperation),
    WrapMode(WrapMode),
    TextureFilter(TextureFilter),
    MipFilter(MipFilter),
}

#[derive(Serialize, Deserialize)]
struct MaterialPayload {
    name: String,
    properties: Vec<(String, PropertyValue)>,
}

/// Encodes the data block of a material container. Textures are registered
/// in `dependency` and stored by id.
pub(crate) fn encode_material(
    material: &Material,
    dependency: &mut Dependency,
) -> Result<Vec<u8>, WriterError> {
    let properties = material
        .properties()
        .map(|(name, value)| {
            let value = match value {
                DataValue::Bool(v) => PropertyValue::Bool(*v),
                DataValue::Texture(texture) => {
                    PropertyValue::Texture(dependency.register_dependency(texture))
                }
                DataValue::Blending(v) => PropertyValue::Blending(*v),
                DataValue::Culling(v) => PropertyValue::Culling(*v),
                DataValue::Compare(v) => PropertyValue::Compare(*v),
                DataValue::Stencil(v) => PropertyValue::Stencil(*v),
                DataValue::WrapMode(v) => PropertyValue::WrapMode(*v),
                DataValue::TextureFilter(v) => PropertyValue::TextureFilter(*v),
                DataValue::MipFilter(v) => PropertyValue::MipFilter(*v),
                DataValue::Int(_)
                | DataValue::Int2(_)
                | DataValue::Int3(_)
                | DataValue::Int4(_) => {
                    PropertyValue::Ints(value.as_ints().unwrap_or_default().to_vec())
                }
                DataValue::Float(_)
                | DataValue::Float2(_)
                | DataValue::Float3(_)
                | DataValue::Float4(_)
                | DataValue::Mat4(_) => {
                    PropertyValue::Floats(value.as_floats().unwrap_or_default().to_vec())
                }
            };
            (name.to_string(), value)
        })
        .collect();

    let payload = MaterialPayload {
        name: material.name.clone(),
        properties,
    };
    rmp_serde::to_vec(&payload).map_err(|e| WriterError::Encode {
        name: material.name.clone(),
        reason: e.to_string(),
    })
}

/// Decodes the data block of a material container.
///
/// Texture ids are looked up in `dependency`. A missing texture drops its
/// property and is returned as a non-fatal error.
pub(crate) fn decode_material(
    filename: &str,
    data: &[u8],
    dependency: &Dependency,
) -> Result<(Material, Vec<ParserError>), ParserError> {
    let invalid = |reason: String| ParserError::InvalidFile {
        filename: filename.to_string(),
        reason,
    };
    let payload: MaterialPayload = rmp_serde::from_slice(data)
        .map_err(|e| invalid(format!("undecodable material: {e}")))?;

    let mut material = Material::new(payload.name);
    let mut errors = Vec::new();
    for (name, value) in payload.properties {
        let value = match value {
            PropertyValue::Floats(v) => DataValue::float_vector(&v)
                .ok_or_else(|| invalid(format!("'{name}' has {} float components", v.len())))?,
            PropertyValue::Ints(v) => DataValue::int_vector(&v)
                .ok_or_else(|| invalid(format!("'{name}' has {} int components", v.len())))?,
            PropertyValue::Bool(v) => DataValue::Bool(v),
            PropertyValue::Texture(id) => match dependency.reference::<Texture>(id) {
                Some(texture) => DataValue::Texture(texture),
                None => {
                    errors.push(ParserError::UnresolvedDependency {
                        name: format!("{} of material property '{name}'", Texture::describe(id)),
                    });
                    continue;
                }
            },
            PropertyValue::Blending(v) => DataValue::Blending(v),
            PropertyValue::Culling(v) => DataValue::Culling(v),
            PropertyValue::Compare(v) => DataValue::Compare(v),
            PropertyValue::Stencil(v) => DataValue::Stencil(v),
            PropertyValue::WrapMode(v) => DataValue::WrapMode(v),
            PropertyValue::TextureFilter(v) => DataValue::TextureFilter(v),
            PropertyValue::MipFilter(v) => DataValue::MipFilter(v),
        };
        material.set(name, value);
    }

    let blended = matches!(
        material.get(States::PROPERTY_BLEND_MODE),
        Some(DataValue::Blending(blending)) if *blending != Blending::DEFAULT
    );
    if blended {
        if !material.has_property(States::PROPERTY_PRIORITY) {
            material.set(States::PROPERTY_PRIORITY, DataValue::Float(priority::TRANSPARENT));
        }
        if !material.has_property(States::PROPERTY_ZSORTED) {
            material.set(States::PROPERTY_ZSORTED, DataValue::Bool(true));
        }
    }

    Ok((material, errors))
}

/// Parses `.material` containers.
pub struct MaterialParser {
    signals: ParserSignals,
    functions: Rc<AssetFunctions>,
}

impl MaterialParser {
    /// Creates a parser without custom asset functions.
    pub fn new() -> Rc<Self> {
        Self::with_functions(Rc::default())
    }

    /// Creates a parser resolving dependencies with `functions` first.
    pub fn with_functions(functions: Rc<AssetFunctions>) -> Rc<Self> {
        Rc::new(Self {
            signals: ParserSignals::default(),
            functions,
        })
    }

    /// A factory to register under the `material` extension.
    pub fn factory() -> ParserFactory {
        Rc::new(|| -> ParserRef { MaterialParser::new() })
    }

    /// Like [`factory`](Self::factory), with custom asset functions.
    pub fn factory_with(functions: Rc<AssetFunctions>) -> ParserFactory {
        Rc::new(move || -> ParserRef { MaterialParser::with_functions(functions.clone()) })
    }
}

impl AbstractParser for MaterialParser {
    fn parse(
        &self,
        filename: &str,
        resolved_filename: &str,
        options: &Options,
        data: &[u8],
        library: &AssetLibraryRef,
    ) -> Result<(), ParserError> {
        let context = ResolveContext::new(options, library, resolved_filename);
        parse_container(
            &self.signals,
            &self.functions,
            ContainerKind::Material,
            resolved_filename,
            data,
            &context,
            |resolver, payload| {
                let (material, errors) =
                    decode_material(resolved_filename, payload, resolver.dependency())?;
                for error in errors {
                    log::warn!("MaterialParser: {error}");
                    self.signals.error.execute(&error);
                }
                let material = (options.material_function())(filename, AssetHandle::new(material));
                library.set_material(filename, material);
                Ok(())
            },
        )
    }

    fn signals(&self) -> &ParserSignals {
        &self.signals
    }
}

/// Writes `.material` containers.
pub struct MaterialWriter;

impl MaterialWriter {
    /// Encodes `material` as a standalone container carrying its textures.
    pub fn write(
        material: &Material,
        library: &AssetLibrary,
        options: &WriterOptions,
    ) -> Result<Vec<u8>, WriterError> {
        let mut dependency = Dependency::new();
        let data = encode_material(material, &mut dependency)?;
        write_container(ContainerKind::Material, &mut dependency, library, options, &data)
    }
}
