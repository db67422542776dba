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
//! Scene containers.
//!
//! The data block of a scene holds the serialized node graph, which this
//! crate keeps as an opaque payload next to the resolved reference tables.

use super::container::ContainerKind;
use super::resolver::{parse_container, AssetFunctions, AssetResolver, ResolveContext};
use super::writer::{write_container, WriterError, WriterOptions};
use lumen_core::asset::AssetHandle;
use lumen_data::{AssetLibrary, AssetLibraryRef, Dependency, SubScene};
use lumen_io::{AbstractParser, Options, ParserError, ParserFactory, ParserRef, ParserSignals};
use std::rc::Rc;

/// Reads a whole scene container with `resolver`, which keeps the errors of
/// the dependencies that failed.
pub(crate) fn read_sub_scene(
    filename: &str,
    bytes: &[u8],
    resolver: &mut AssetResolver,
    context: &ResolveContext<'_>,
) -> Result<SubScene, ParserError> {
    let payload = resolver.read_container(filename, bytes, ContainerKind::Scene, context)?;
    Ok(SubScene {
        name: filename.to_string(),
        payload: payload.to_vec(),
        dependency: resolver.take_dependency(),
    })
}

/// Parses `.scene` containers into [`SubScene`]s.
pub struct SceneParser {
    signals: ParserSignals,
    functions: Rc<AssetFunctions>,
}

impl SceneParser {
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

    /// A factory to register under the `scene` extension.
    pub fn factory() -> ParserFactory {
        Rc::new(|| -> ParserRef { SceneParser::new() })
    }

    /// Like [`factory`](Self::factory), with custom asset functions.
    pub fn factory_with(functions: Rc<AssetFunctions>) -> ParserFactory {
        Rc::new(move || -> ParserRef { SceneParser::with_functions(functions.clone()) })
    }
}

impl AbstractParser for SceneParser {
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
            ContainerKind::Scene,
            resolved_filename,
            data,
            &context,
            |resolver, payload| {
                let scene = SubScene {
                    name: filename.to_string(),
                    payload: payload.to_vec(),
                    dependency: resolver.take_dependency(),
                };
                log::debug!(
                    "SceneParser: '{filename}' has {} bytes of nodes and {:?}",
                    scene.payload.len(),
                    scene.dependency
                );
                library.set_scene(filename, AssetHandle::new(scene));
                Ok(())
            },
        )
    }

    fn signals(&self) -> &ParserSignals {
        &self.signals
    }
}

/// Writes `.scene` containers.
pub struct SceneWriter;

impl SceneWriter {
    /// Encodes a scene made of the node data `payload` and the assets
    /// registered in `dependency`.
    ///
    /// The node data refers to assets by the ids `dependency` handed out.
    /// Writing may register more of them, such as the textures of materials.
    pub fn write(
        payload: &[u8],
        dependency: &mut Dependency,
        library: &AssetLibrary,
        options: &WriterOptions,
    ) -> Result<Vec<u8>, WriterError> {
        write_container(ContainerKind::Scene, dependency, library, options, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset_lane::serializer::{
        asset_type, write_dependency_block, Container, SerializedAsset,
    };
    use lumen_core::device::{HeadlessContext, TextureFormat};
    use lumen_core::geometry::{Geometry, IndexBuffer, VertexAttribute, VertexBuffer};
    use lumen_core::material::Material;
    use lumen_core::texture::Texture;
    use lumen_core::value::DataValue;
    use std::cell::RefCell;

    fn library() -> AssetLibraryRef {
        AssetLibrary::new(Rc::new(HeadlessContext::new()))
    }

    fn quad() -> AssetHandle<Geometry> {
        AssetHandle::new(Geometry {
            name: "quad".to_string(),
            indices: IndexBuffer::U16(vec![0, 1, 2, 2, 1, 3]),
            vertex_buffers: vec![VertexBuffer {
                data: vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0],
                attributes: vec![VertexAttribute {
                    name: "position".to_string(),
                    size: 2,
                    offset: 0,
                }],
            }],
        })
    }

    /// Parses `bytes` as `name` and returns the tags of the reported errors
    /// and whether the parser completed.
    fn parse(
        parser: Rc<SceneParser>,
        name: &str,
        bytes: &[u8],
        target: &AssetLibraryRef,
    ) -> (Vec<&'static str>, bool) {
        let errors = Rc::new(RefCell::new(Vec::new()));
        let completed = Rc::new(RefCell::new(false));
        let _error = parser.signals().error.connect({
            let errors = errors.clone();
            move |e: &ParserError| errors.borrow_mut().push(e.type_tag())
        });
        let _complete = parser.signals().complete.connect({
            let completed = completed.clone();
            move |_| *completed.borrow_mut() = true
        });
        let options = Options::new(target);
        parser.parse(name, name, &options, bytes, target).unwrap();
        let errors = errors.borrow().clone();
        let completed = *completed.borrow();
        (errors, completed)
    }

    // --- Embedded dependencies ---

    #[test]
    fn embedded_dependencies_resolve_in_one_id_space() {
        let source = library();
        let geometry = quad();
        let texture = AssetHandle::new(Texture::from_pixels(
            "white",
            1,
            1,
            TextureFormat::Rgba8Unorm,
            vec![255; 4],
        ));
        let mut material = Material::new("paint");
        material.set("diffuseMap", DataValue::Texture(texture));
        let material = AssetHandle::new(material);

        let mut dependency = Dependency::new();
        let geometry_id = dependency.register_dependency(&geometry);
        let material_id = dependency.register_dependency(&material);
        let nodes = [geometry_id as u8, material_id as u8];
        let options = WriterOptions::default();
        let bytes = SceneWriter::write(&nodes, &mut dependency, &source, &options).unwrap();

        let target = library();
        let (errors, completed) = parse(SceneParser::new(), "level.scene", &bytes, &target);
        assert!(errors.is_empty(), "{errors:?}");
        assert!(completed);

        let scene = target.scene("level.scene").unwrap();
        assert_eq!(scene.payload, nodes);
        let parsed = scene.dependency.reference::<Geometry>(geometry_id).unwrap();
        assert_eq!(parsed.indices, geometry.indices);
        assert!(target.geometry(&format!("geometry_{geometry_id}")).is_some());

        let parsed = scene.dependency.reference::<Material>(material_id).unwrap();
        let map = parsed.get("diffuseMap").and_then(DataValue::as_texture).unwrap();
        assert_eq!((map.width, map.height), (1, 1));
    }

    #[test]
    fn a_scene_without_dependencies_has_an_empty_block() {
        let bytes = SceneWriter::write(
            b"nodes",
            &mut Dependency::new(),
            &library(),
            &WriterOptions::default(),
        )
        .unwrap();
        let container = Container::read("empty.scene", &bytes, ContainerKind::Scene).unwrap();
        assert!(container.dependencies.is_empty());
        assert_eq!(container.data, b"nodes");
    }

    // --- Plugin types ---

    fn plugin_scene() -> Vec<u8> {
        let asset = SerializedAsset::new(asset_type::FIRST_PLUGIN + 2, 0, 1, b"sky".to_vec());
        let block = write_dependency_block(&[asset]).unwrap();
        Container::write(ContainerKind::Scene, &block, b"nodes")
    }

    #[test]
    fn registered_functions_handle_plugin_types() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut functions = AssetFunctions::new();
        functions.register(asset_type::FIRST_PLUGIN + 2, {
            let seen = seen.clone();
            Rc::new(
                move |asset: &SerializedAsset,
                      _: &ResolveContext<'_>,
                      _: &mut Dependency|
                      -> Result<(), ParserError> {
                    seen.borrow_mut().push(asset.content.clone());
                    Ok(())
                },
            )
        });

        let target = library();
        let parser = SceneParser::with_functions(Rc::new(functions));
        let (errors, completed) = parse(parser, "sky.scene", &plugin_scene(), &target);
        assert!(errors.is_empty());
        assert!(completed);
        assert_eq!(*seen.borrow(), vec![b"sky".to_vec()]);
    }

    #[test]
    fn unregistered_plugin_types_are_reported_without_failing() {
        let target = library();
        let (errors, completed) = parse(SceneParser::new(), "sky.scene", &plugin_scene(), &target);
        assert_eq!(errors, vec!["UnresolvedDependency"]);
        assert!(completed);
        assert!(target.scene("sky.scene").is_some());
    }
}
