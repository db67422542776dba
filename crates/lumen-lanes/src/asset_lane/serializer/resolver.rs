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
//! Turns dependency blocks back into assets.
//!
//! Resolution is synchronous: external files are read with
//! [`Protocol::fetch_blocking`](lumen_io::protocol::Protocol::fetch_blocking)
//! and effects are parsed with a blocking protocol, so every dependency is
//! either registered or reported by the time [`AssetResolver::resolve_block`]
//! returns. A failing dependency does not stop the others.

use super::container::{Container, ContainerKind};
use super::{
    asset_type, geometry, material, read_dependency_block, scene, texture_format, SerializedAsset,
};
use crate::asset_lane::effect::EffectParser;
use crate::asset_lane::texture::{create_texture, decode_image};
use image::RgbaImage;
use lumen_core::asset::AssetHandle;
use lumen_core::effect::Effect;
use lumen_core::geometry::Geometry;
use lumen_core::material::Material;
use lumen_core::texture::Texture;
use lumen_data::{AssetLibraryRef, Dependency, SubScene};
use lumen_io::protocol::{BlockingProtocol, FetchRequest, ProtocolRef};
use lumen_io::{path, AbstractParser, AssetKind, FetchError, Options, ParserError, ParserSignals};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Linked containers nested deeper than this are not resolved.
const MAX_LINK_DEPTH: usize = 16;

/// What a resolution step may read and write.
pub struct ResolveContext<'a> {
    /// The options of the load that reached the container.
    pub options: &'a Options,
    /// Where resolved assets are stored.
    pub library: &'a AssetLibraryRef,
    /// The folder relative paths are resolved against.
    pub asset_folder: String,
}

impl<'a> ResolveContext<'a> {
    /// A context for a container read from `filename`.
    pub fn new(options: &'a Options, library: &'a AssetLibraryRef, filename: &str) -> Self {
        Self {
            options,
            library,
            asset_folder: path::folder(filename).to_string(),
        }
    }

    fn nested(&self, filename: &str) -> ResolveContext<'a> {
        ResolveContext::new(self.options, self.library, filename)
    }
}

/// Deserializes one entry of a dependency block.
///
/// The function is responsible for registering what it produced in the
/// dependency tables.
pub type AssetDeserializeFunction =
    Rc<dyn Fn(&SerializedAsset, &ResolveContext<'_>, &mut Dependency) -> Result<(), ParserError>>;

/// Deserialize functions keyed by asset type.
///
/// A registered function takes precedence over the built-in handling of its
/// type, and is the only way to handle plugin types.
#[derive(Default, Clone)]
pub struct AssetFunctions {
    functions: HashMap<u8, AssetDeserializeFunction>,
}

impl AssetFunctions {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `function` for `asset_type`, replacing any previous one.
    pub fn register(&mut self, asset_type: u8, function: AssetDeserializeFunction) -> &mut Self {
        self.functions.insert(asset_type, function);
        self
    }

    /// Returns the function registered for `asset_type`.
    pub fn get(&self, asset_type: u8) -> Option<&AssetDeserializeFunction> {
        self.functions.get(&asset_type)
    }
}

impl fmt::Debug for AssetFunctions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<_> = self.functions.keys().collect();
        types.sort();
        f.debug_struct("AssetFunctions").field("types", &types).finish()
    }
}

/// Resolves the dependency blocks of one container and the containers nested
/// in it. All of them share one id space.
pub struct AssetResolver {
    functions: Rc<AssetFunctions>,
    dependency: Dependency,
    errors: Vec<ParserError>,
    depth: usize,
}

impl AssetResolver {
    /// Creates a resolver with empty reference tables.
    pub fn new(functions: Rc<AssetFunctions>) -> Self {
        Self::nested(functions, 0)
    }

    fn nested(functions: Rc<AssetFunctions>, depth: usize) -> Self {
        Self {
            functions,
            dependency: Dependency::new(),
            errors: Vec::new(),
            depth,
        }
    }

    /// The reference tables filled so far.
    pub fn dependency(&self) -> &Dependency {
        &self.dependency
    }

    /// Takes the reference tables, leaving empty ones behind.
    pub fn take_dependency(&mut self) -> Dependency {
        std::mem::take(&mut self.dependency)
    }

    /// Takes the errors reported by dependencies so far. None of them is fatal.
    pub fn take_errors(&mut self) -> Vec<ParserError> {
        std::mem::take(&mut self.errors)
    }

    /// Validates the header of `bytes`, resolves its dependency block and
    /// returns its data block.
    pub fn read_container<'d>(
        &mut self,
        filename: &str,
        bytes: &'d [u8],
        kind: ContainerKind,
        context: &ResolveContext<'_>,
    ) -> Result<&'d [u8], ParserError> {
        let container = Container::read(filename, bytes, kind)?;
        self.resolve_block(filename, container.dependencies, context)?;
        Ok(container.data)
    }

    /// Resolves every entry of a dependency block.
    ///
    /// Only an undecodable block is an error. Entries that fail are collected
    /// as non-fatal errors, see [`take_errors`](Self::take_errors).
    pub fn resolve_block(
        &mut self,
        filename: &str,
        block: &[u8],
        context: &ResolveContext<'_>,
    ) -> Result<(), ParserError> {
        if block.is_empty() {
            return Ok(());
        }
        let assets = read_dependency_block(filename, block)?;
        log::debug!("AssetResolver: '{filename}' has {} dependencies", assets.len());

        for asset in assets {
            if let Err(error) = self.resolve_asset(&asset, context) {
                let error = partial_failure(&asset, error);
                log::warn!("AssetResolver: {error}");
                self.errors.push(error);
            }
        }
        Ok(())
    }

    fn resolve_asset(
        &mut self,
        asset: &SerializedAsset,
        context: &ResolveContext<'_>,
    ) -> Result<(), ParserError> {
        if let Some(function) = self.functions.get(asset.asset_type()).cloned() {
            return function(asset, context, &mut self.dependency);
        }

        match asset.asset_type() {
            asset_type::GEOMETRY | asset_type::EMBED_GEOMETRY => {
                self.resolve_geometry(asset, context)
            }
            asset_type::MATERIAL | asset_type::EMBED_MATERIAL => {
                self.resolve_material(asset, context)
            }
            asset_type::TEXTURE | asset_type::EMBED_TEXTURE => self.resolve_texture(asset, context),
            asset_type::EFFECT | asset_type::EMBED_EFFECT => self.resolve_effect(asset, context),
            asset_type::LINKED_ASSET | asset_type::EMBED_LINKED_ASSET => {
                self.resolve_linked_asset(asset, context)
            }
            other => Err(ParserError::UnresolvedDependency {
                name: format!("asset {} of unregistered type {other}", asset.id),
            }),
        }
    }

    /// Returns the name, the path and the bytes of an asset: its content when
    /// embedded, the file at its relative path otherwise.
    fn asset_bytes(
        &self,
        asset: &SerializedAsset,
        embedded_name: impl FnOnce() -> String,
        context: &ResolveContext<'_>,
    ) -> Result<(String, String, Vec<u8>), ParserError> {
        if asset.is_embedded() {
            let name = embedded_name();
            let path = path::join(&context.asset_folder, &name);
            return Ok((name, path, asset.content.clone()));
        }

        let kind = asset_kind(asset.asset_type()).unwrap_or(AssetKind::LinkedAsset);
        let relative = relative_path(asset)?;
        let complete_path = path::join(&context.asset_folder, &relative);
        let bytes = fetch_blocking(kind, &complete_path, context.options)?;
        Ok((relative, complete_path, bytes))
    }

    fn resolve_geometry(
        &mut self,
        asset: &SerializedAsset,
        context: &ResolveContext<'_>,
    ) -> Result<(), ParserError> {
        if self.dependency.reference_exists::<Geometry>(asset.id) {
            return Ok(());
        }
        let (name, complete_path, bytes) =
            self.asset_bytes(asset, || format!("geometry_{}", asset.id), context)?;

        let nested = context.nested(&complete_path);
        let data = self.read_container(&complete_path, &bytes, ContainerKind::Geometry, &nested)?;
        let geometry = geometry::decode_geometry(&name, data)?;
        let geometry = (context.options.geometry_function())(&name, AssetHandle::new(geometry));

        context.library.set_geometry(name, geometry.clone());
        self.dependency.register_reference(asset.id, geometry);
        Ok(())
    }

    fn resolve_material(
        &mut self,
        asset: &SerializedAsset,
        context: &ResolveContext<'_>,
    ) -> Result<(), ParserError> {
        if self.dependency.reference_exists::<Material>(asset.id) {
            return Ok(());
        }
        let (name, complete_path, bytes) =
            self.asset_bytes(asset, || format!("material_{}", asset.id), context)?;

        let nested = context.nested(&complete_path);
        let data = self.read_container(&complete_path, &bytes, ContainerKind::Material, &nested)?;
        let (material, errors) = material::decode_material(&name, data, &self.dependency)?;
        self.errors.extend(errors);
        let material = (context.options.material_function())(&name, AssetHandle::new(material));

        context.library.set_material(name, material.clone());
        self.dependency.register_reference(asset.id, material);
        Ok(())
    }

    fn resolve_texture(
        &mut self,
        asset: &SerializedAsset,
        context: &ResolveContext<'_>,
    ) -> Result<(), ParserError> {
        if self.dependency.reference_exists::<Texture>(asset.id) {
            return Ok(());
        }
        let name = if asset.is_embedded() {
            format!("{}.png", asset.id)
        } else {
            relative_path(asset)?
        };
        if let Some(texture) = context.library.texture(&name) {
            self.dependency.register_reference(asset.id, texture);
            return Ok(());
        }

        let (name, _, bytes) = self.asset_bytes(asset, || name.clone(), context)?;
        let image = match asset.metadata() {
            texture_format::ENCODED => decode_image(&name, &bytes)?,
            texture_format::RAW_RGBA8 => decode_raw_rgba8(&name, bytes)?,
            other => {
                return Err(ParserError::DependencyParsing {
                    kind: AssetKind::Texture,
                    name,
                    reason: format!("unknown texture format {other}"),
                })
            }
        };
        let texture = create_texture(&name, image, context.options)?;

        context.library.set_texture(name, texture.clone());
        self.dependency.register_reference(asset.id, texture);
        Ok(())
    }

    fn resolve_effect(
        &mut self,
        asset: &SerializedAsset,
        context: &ResolveContext<'_>,
    ) -> Result<(), ParserError> {
        if self.dependency.reference_exists::<Effect>(asset.id) {
            return Ok(());
        }
        if !asset.is_embedded() {
            let complete_path = path::join(&context.asset_folder, &relative_path(asset)?);
            if let Some(effect) = context.library.effect(&complete_path) {
                self.dependency.register_reference(asset.id, effect);
                return Ok(());
            }
        }

        let (_, complete_path, bytes) =
            self.asset_bytes(asset, || format!("effect_{}", asset.id), context)?;
        let effect = parse_effect_blocking(&complete_path, &bytes, context)?;
        self.dependency.register_reference(asset.id, effect);
        Ok(())
    }

    fn resolve_linked_asset(
        &mut self,
        asset: &SerializedAsset,
        context: &ResolveContext<'_>,
    ) -> Result<(), ParserError> {
        if self.dependency.reference_exists::<SubScene>(asset.id) {
            return Ok(());
        }
        if self.depth >= MAX_LINK_DEPTH {
            return Err(ParserError::UnresolvedDependency {
                name: format!("linked asset {} nested deeper than {MAX_LINK_DEPTH}", asset.id),
            });
        }
        if !asset.is_embedded() {
            let complete_path = path::join(&context.asset_folder, &relative_path(asset)?);
            if let Some(scene) = context.library.scene(&complete_path) {
                self.dependency.register_reference(asset.id, scene);
                return Ok(());
            }
        }

        let (_, complete_path, bytes) =
            self.asset_bytes(asset, || format!("linked_{}", asset.id), context)?;
        let mut resolver = AssetResolver::nested(self.functions.clone(), self.depth + 1);
        let nested = context.nested(&complete_path);
        let sub_scene = scene::read_sub_scene(&complete_path, &bytes, &mut resolver, &nested)?;
        self.errors.extend(resolver.take_errors());

        let sub_scene = AssetHandle::new(sub_scene);
        context.library.set_scene(complete_path, sub_scene.clone());
        self.dependency.register_reference(asset.id, sub_scene);
        Ok(())
    }
}

/// The steps every container parser shares: read the header, resolve the
/// dependency block, hand the data block to `store`, then report the partial
/// failures and complete.
pub(crate) fn parse_container<F>(
    signals: &ParserSignals,
    functions: &Rc<AssetFunctions>,
    kind: ContainerKind,
    resolved_filename: &str,
    data: &[u8],
    context: &ResolveContext<'_>,
    store: F,
) -> Result<(), ParserError>
where
    F: FnOnce(&mut AssetResolver, &[u8]) -> Result<(), ParserError>,
{
    let mut resolver = AssetResolver::new(functions.clone());
    let payload = resolver.read_container(resolved_filename, data, kind, context)?;
    store(&mut resolver, payload)?;

    for error in resolver.take_errors() {
        signals.error.execute(&error);
    }
    signals.complete.execute(&());
    Ok(())
}

fn asset_kind(asset_type: u8) -> Option<AssetKind> {
    match asset_type {
        asset_type::GEOMETRY | asset_type::EMBED_GEOMETRY => Some(AssetKind::Geometry),
        asset_type::MATERIAL | asset_type::EMBED_MATERIAL => Some(AssetKind::Material),
        asset_type::TEXTURE | asset_type::EMBED_TEXTURE => Some(AssetKind::Texture),
        asset_type::EFFECT | asset_type::EMBED_EFFECT => Some(AssetKind::Effect),
        asset_type::LINKED_ASSET | asset_type::EMBED_LINKED_ASSET => Some(AssetKind::LinkedAsset),
        _ => None,
    }
}

/// Keeps partial failures as they are and turns anything else into a
/// [`ParserError::DependencyParsing`] of the asset.
fn partial_failure(asset: &SerializedAsset, error: ParserError) -> ParserError {
    if !error.is_fatal() {
        return error;
    }
    match asset_kind(asset.asset_type()) {
        Some(kind) => ParserError::DependencyParsing {
            kind,
            name: if asset.is_embedded() {
                format!("#{}", asset.id)
            } else {
                String::from_utf8_lossy(&asset.content).into_owned()
            },
            reason: error.to_string(),
        },
        None => ParserError::UnresolvedDependency {
            name: format!("asset {}: {error}", asset.id),
        },
    }
}

fn relative_path(asset: &SerializedAsset) -> Result<String, ParserError> {
    String::from_utf8(asset.content.clone()).map_err(|e| ParserError::DependencyParsing {
        kind: asset_kind(asset.asset_type()).unwrap_or(AssetKind::LinkedAsset),
        name: format!("#{}", asset.id),
        reason: format!("the path of an external asset is UTF-8: {e}"),
    })
}

fn fetch_blocking(
    kind: AssetKind,
    complete_path: &str,
    options: &Options,
) -> Result<Vec<u8>, ParserError> {
    let uri = (options.uri_function())(complete_path);
    let protocol = (options.protocol_function())(&uri);
    match protocol.fetch_blocking(&FetchRequest::new(uri)) {
        Ok(fetched) => Ok(fetched.data),
        Err(FetchError::NotFound { .. }) => Err(ParserError::MissingDependency {
            kind,
            path: complete_path.to_string(),
        }),
        Err(e) => Err(ParserError::DependencyParsing {
            kind,
            name: complete_path.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn decode_raw_rgba8(name: &str, mut bytes: Vec<u8>) -> Result<RgbaImage, ParserError> {
    let invalid = |reason: &str| ParserError::DependencyParsing {
        kind: AssetKind::Texture,
        name: name.to_string(),
        reason: reason.to_string(),
    };
    if bytes.len() < 8 {
        return Err(invalid("raw textures start with their width and height"));
    }
    let width = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let height = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    let texels = bytes.split_off(8);
    RgbaImage::from_raw(width, height, texels)
        .ok_or_else(|| invalid("texel count does not match the texture size"))
}

/// Parses an effect and waits for it: includes and textures are fetched with a
/// blocking protocol, so the parser finishes before `parse` returns.
fn parse_effect_blocking(
    filename: &str,
    bytes: &[u8],
    context: &ResolveContext<'_>,
) -> Result<AssetHandle<Effect>, ParserError> {
    let mut options = context.options.clone();
    let protocol_function = options.protocol_function().clone();
    options.set_protocol_function(Rc::new(move |filename: &str| -> ProtocolRef {
        Rc::new(BlockingProtocol::new(protocol_function(filename)))
    }));

    let parser = EffectParser::new();
    let failure = Rc::new(RefCell::new(None));
    let _slot = parser.signals().error.connect({
        let failure = failure.clone();
        move |error: &ParserError| {
            failure.borrow_mut().get_or_insert_with(|| error.clone());
        }
    });
    parser.parse(filename, filename, &options, bytes, context.library)?;

    if let Some(error) = failure.borrow_mut().take() {
        return Err(error);
    }
    parser
        .effect()
        .ok_or_else(|| ParserError::UnresolvedDependency {
            name: filename.to_string(),
        })
}
