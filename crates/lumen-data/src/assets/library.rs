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

use super::Assets;
use crate::scene::SubScene;
use lumen_core::asset::AssetHandle;
use lumen_core::device::RenderContext;
use lumen_core::effect::Effect;
use lumen_core::geometry::Geometry;
use lumen_core::material::Material;
use lumen_core::texture::Texture;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Shared ownership of a library, held by the session that created it.
pub type AssetLibraryRef = Rc<AssetLibrary>;

/// The registry every loader and parser writes its results into.
///
/// Assets are keyed by name. Writes are last-write-wins: two loads targeting
/// the same name leave the one that finished last. The library is meant for
/// single-threaded, cooperative use and relies on interior mutability so that
/// parsers holding a shared reference can still register what they produce.
pub struct AssetLibrary {
    context: Rc<dyn RenderContext>,
    geometries: RefCell<Assets<Geometry>>,
    materials: RefCell<Assets<Material>>,
    textures: RefCell<Assets<Texture>>,
    effects: RefCell<Assets<Effect>>,
    scenes: RefCell<Assets<SubScene>>,
    blobs: RefCell<HashMap<String, Rc<[u8]>>>,
}

impl AssetLibrary {
    /// Creates an empty library bound to `context`.
    pub fn new(context: Rc<dyn RenderContext>) -> AssetLibraryRef {
        Rc::new(Self {
            context,
            geometries: RefCell::new(Assets::new()),
            materials: RefCell::new(Assets::new()),
            textures: RefCell::new(Assets::new()),
            effects: RefCell::new(Assets::new()),
            scenes: RefCell::new(Assets::new()),
            blobs: RefCell::new(HashMap::new()),
        })
    }

    /// The device textures are uploaded to.
    pub fn context(&self) -> Rc<dyn RenderContext> {
        self.context.clone()
    }

    /// Returns the geometry registered under `name`.
    pub fn geometry(&self, name: &str) -> Option<AssetHandle<Geometry>> {
        self.geometries.borrow().get(name).cloned()
    }

    /// Registers a geometry under `name`.
    pub fn set_geometry(&self, name: impl Into<String>, geometry: AssetHandle<Geometry>) {
        self.geometries.borrow_mut().insert(name, geometry);
    }

    /// Returns a name `geometry` is registered under.
    pub fn geometry_name(&self, geometry: &AssetHandle<Geometry>) -> Option<String> {
        self.geometries.borrow().name_of(geometry).map(str::to_owned)
    }

    /// Returns the material registered under `name`.
    pub fn material(&self, name: &str) -> Option<AssetHandle<Material>> {
        self.materials.borrow().get(name).cloned()
    }

    /// Registers a material under `name`.
    pub fn set_material(&self, name: impl Into<String>, material: AssetHandle<Material>) {
        self.materials.borrow_mut().insert(name, material);
    }

    /// Returns a name `material` is registered under.
    pub fn material_name(&self, material: &AssetHandle<Material>) -> Option<String> {
        self.materials.borrow().name_of(material).map(str::to_owned)
    }

    /// Returns the texture registered under `name`.
    pub fn texture(&self, name: &str) -> Option<AssetHandle<Texture>> {
        self.textures.borrow().get(name).cloned()
    }

    /// Registers a texture under `name`.
    pub fn set_texture(&self, name: impl Into<String>, texture: AssetHandle<Texture>) {
        self.textures.borrow_mut().insert(name, texture);
    }

    /// Returns a name `texture` is registered under.
    pub fn texture_name(&self, texture: &AssetHandle<Texture>) -> Option<String> {
        self.textures.borrow().name_of(texture).map(str::to_owned)
    }

    /// Returns the effect registered under `name`.
    pub fn effect(&self, name: &str) -> Option<AssetHandle<Effect>> {
        self.effects.borrow().get(name).cloned()
    }

    /// Registers an effect under `name`.
    pub fn set_effect(&self, name: impl Into<String>, effect: AssetHandle<Effect>) {
        self.effects.borrow_mut().insert(name, effect);
    }

    /// Returns a name `effect` is registered under.
    pub fn effect_name(&self, effect: &AssetHandle<Effect>) -> Option<String> {
        self.effects.borrow().name_of(effect).map(str::to_owned)
    }

    /// Returns the scene container registered under `name`.
    pub fn scene(&self, name: &str) -> Option<AssetHandle<SubScene>> {
        self.scenes.borrow().get(name).cloned()
    }

    /// Registers a scene container under `name`.
    pub fn set_scene(&self, name: impl Into<String>, scene: AssetHandle<SubScene>) {
        self.scenes.borrow_mut().insert(name, scene);
    }

    /// Returns a name `scene` is registered under.
    pub fn scene_name(&self, scene: &AssetHandle<SubScene>) -> Option<String> {
        self.scenes.borrow().name_of(scene).map(str::to_owned)
    }

    /// Returns the raw bytes stored under `name`.
    pub fn blob(&self, name: &str) -> Option<Rc<[u8]>> {
        self.blobs.borrow().get(name).cloned()
    }

    /// Stores raw bytes under `name`.
    pub fn set_blob(&self, name: impl Into<String>, data: impl Into<Rc<[u8]>>) {
        self.blobs.borrow_mut().insert(name.into(), data.into());
    }

    /// Returns `true` if raw bytes are stored under `name`.
    pub fn has_blob(&self, name: &str) -> bool {
        self.blobs.borrow().contains_key(name)
    }

    /// Removes the raw bytes stored under `name`.
    pub fn remove_blob(&self, name: &str) -> Option<Rc<[u8]>> {
        self.blobs.borrow_mut().remove(name)
    }

    /// Removes the texture registered under `name` and releases its device
    /// storage.
    pub fn remove_texture(&self, name: &str) -> Option<AssetHandle<Texture>> {
        let texture = self.textures.borrow_mut().remove(name)?;
        if let Some(id) = texture.device_id {
            if let Err(e) = self.context.delete_texture(id) {
                log::warn!("AssetLibrary: failed to release texture '{name}': {e}");
            }
        }
        Some(texture)
    }
}

impl fmt::Debug for AssetLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetLibrary")
            .field("geometries", &self.geometries.borrow().len())
            .field("materials", &self.materials.borrow().len())
            .field("textures", &self.textures.borrow().len())
            .field("effects", &self.effects.borrow().len())
            .field("scenes", &self.scenes.borrow().len())
            .field("blobs", &self.blobs.borrow().len())
            .finish()
    }
}
