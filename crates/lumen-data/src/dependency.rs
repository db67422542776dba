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

//! Reference tables used by the binary serialization format.
//!
//! Writing a container assigns every referenced asset an integer id
//! ([`Dependency::register_dependency`]). Reading it back maps each id to the
//! asset deserialized for it ([`Dependency::register_reference`]), so that two
//! references to the same id resolve to the same instance.

use crate::scene::SubScene;
use lumen_core::asset::{Asset, AssetHandle, AssetIdentity};
use lumen_core::effect::Effect;
use lumen_core::geometry::Geometry;
use lumen_core::material::Material;
use lumen_core::texture::Texture;
use std::collections::HashMap;
use std::fmt;

/// The id ↔ object tables of one asset kind.
pub struct ReferenceTable<A: Asset> {
    dependencies: HashMap<AssetIdentity, (u32, AssetHandle<A>)>,
    references: HashMap<u32, AssetHandle<A>>,
}

impl<A: Asset> ReferenceTable<A> {
    fn new() -> Self {
        Self {
            dependencies: HashMap::new(),
            references: HashMap::new(),
        }
    }

    /// Number of objects registered for serialization.
    pub fn num_dependencies(&self) -> usize {
        self.dependencies.len()
    }

    /// Objects registered for serialization, ordered by id.
    pub fn dependencies(&self) -> Vec<(u32, AssetHandle<A>)> {
        let mut entries: Vec<_> = self
            .dependencies
            .values()
            .map(|(id, handle)| (*id, handle.clone()))
            .collect();
        entries.sort_by_key(|(id, _)| *id);
        entries
    }

    /// Resolved references, ordered by id.
    pub fn references(&self) -> Vec<(u32, AssetHandle<A>)> {
        let mut entries: Vec<_> = self
            .references
            .iter()
            .map(|(id, handle)| (*id, handle.clone()))
            .collect();
        entries.sort_by_key(|(id, _)| *id);
        entries
    }
}

impl<A: Asset> Default for ReferenceTable<A> {
    fn default() -> Self {
        Self::new()
    }
}

/// Selects the [`ReferenceTable`] of an asset kind inside a [`Dependency`].
pub trait DependencyKind: Asset + Sized {
    /// A short kind name, for diagnostics.
    const KIND: &'static str;

    /// Names the reference `id` of this kind in a diagnostic.
    fn describe(id: u32) -> String {
        format!("{} {id}", Self::KIND)
    }

    /// The table of this kind.
    fn table(dependency: &Dependency) -> &ReferenceTable<Self>;

    /// The mutable table of this kind.
    fn table_mut(dependency: &mut Dependency) -> &mut ReferenceTable<Self>;
}

/// Bidirectional reference tables for every serializable asset kind.
///
/// All kinds share one id counter, starting at 1.
pub struct Dependency {
    current_id: u32,
    geometries: ReferenceTable<Geometry>,
    materials: ReferenceTable<Material>,
    textures: ReferenceTable<Texture>,
    effects: ReferenceTable<Effect>,
    sub_scenes: ReferenceTable<SubScene>,
}

impl Dependency {
    /// Creates empty tables.
    pub fn new() -> Self {
        Self {
            current_id: 1,
            geometries: ReferenceTable::new(),
            materials: ReferenceTable::new(),
            textures: ReferenceTable::new(),
            effects: ReferenceTable::new(),
            sub_scenes: ReferenceTable::new(),
        }
    }

    /// Returns `true` if `object` already has an id.
    pub fn has_dependency<A: DependencyKind>(&self, object: &AssetHandle<A>) -> bool {
        A::table(self).dependencies.contains_key(&object.identity())
    }

    /// Returns the id of `object`, assigning the next free one on first use.
    ///
    /// Calling this twice with the same object returns the same id.
    pub fn register_dependency<A: DependencyKind>(&mut self, object: &AssetHandle<A>) -> u32 {
        if let Some((id, _)) = A::table(self).dependencies.get(&object.identity()) {
            return *id;
        }

        let id = self.current_id;
        self.current_id += 1;
        A::table_mut(self)
            .dependencies
            .insert(object.identity(), (id, object.clone()));
        id
    }

    /// Maps `id` to `object`, replacing any previous mapping.
    pub fn register_reference<A: DependencyKind>(&mut self, id: u32, object: AssetHandle<A>) {
        A::table_mut(self).references.insert(id, object);
    }

    /// Returns the object `id` resolved to.
    pub fn reference<A: DependencyKind>(&self, id: u32) -> Option<AssetHandle<A>> {
        A::table(self).references.get(&id).cloned()
    }

    /// Returns `true` if `id` was resolved to an object.
    pub fn reference_exists<A: DependencyKind>(&self, id: u32) -> bool {
        A::table(self).references.contains_key(&id)
    }

    /// The table of one asset kind.
    pub fn table<A: DependencyKind>(&self) -> &ReferenceTable<A> {
        A::table(self)
    }

    /// Returns `true` if nothing was registered for serialization.
    pub fn is_empty(&self) -> bool {
        self.geometries.dependencies.is_empty()
            && self.materials.dependencies.is_empty()
            && self.textures.dependencies.is_empty()
            && self.effects.dependencies.is_empty()
            && self.sub_scenes.dependencies.is_empty()
    }
}

impl Default for Dependency {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependency")
            .field("current_id", &self.current_id)
            .field("geometries", &self.geometries.references.len())
            .field("materials", &self.materials.references.len())
            .field("textures", &self.textures.references.len())
            .field("effects", &self.effects.references.len())
            .field("sub_scenes", &self.sub_scenes.references.len())
            .finish()
    }
}

macro_rules! dependency_kind {
    ($asset:ty, $field:ident, $kind:literal) => {
        impl DependencyKind for $asset {
            const KIND: &'static str = $kind;

            fn table(dependency: &Dependency) -> &ReferenceTable<Self> {
                &dependency.$field
            }

            fn table_mut(dependency: &mut Dependency) -> &mut ReferenceTable<Self> {
                &mut dependency.$field
            }
        }
    };
}

dependency_kind!(Geometry, geometries, "geometry");
dependency_kind!(Material, materials, "material");
dependency_kind!(Texture, textures, "texture");
dependency_kind!(Effect, effects, "effect");
dependency_kind!(SubScene, sub_scenes, "sub-scene");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_dependency_is_idempotent() {
        let mut dependency = Dependency::new();
        let geometry = AssetHandle::new(Geometry::default());

        let first = dependency.register_dependency(&geometry);
        let second = dependency.register_dependency(&geometry.clone());

        assert_eq!(first, second);
        assert!(dependency.has_dependency(&geometry));
        assert_eq!(dependency.table::<Geometry>().num_dependencies(), 1);
    }

    #[test]
    fn distinct_objects_get_distinct_ids_across_kinds() {
        let mut dependency = Dependency::new();
        let a = dependency.register_dependency(&AssetHandle::new(Geometry::default()));
        let b = dependency.register_dependency(&AssetHandle::new(Geometry::default()));
        let c = dependency.register_dependency(&AssetHandle::new(Material::new("m")));

        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
    }

    #[test]
    fn references_resolve_to_the_same_instance() {
        let mut dependency = Dependency::new();
        let material = AssetHandle::new(Material::new("m"));
        dependency.register_reference(7, material.clone());

        let first = dependency.reference::<Material>(7).unwrap();
        let second = dependency.reference::<Material>(7).unwrap();
        assert!(first.ptr_eq(&second));
        assert!(first.ptr_eq(&material));
        assert!(!dependency.reference_exists::<Geometry>(7));
    }

    #[test]
    fn register_reference_is_last_write_wins() {
        let mut dependency = Dependency::new();
        let old = AssetHandle::new(Material::new("old"));
        let new = AssetHandle::new(Material::new("new"));
        dependency.register_reference(3, old);
        dependency.register_reference(3, new.clone());

        assert!(dependency.reference::<Material>(3).unwrap().ptr_eq(&new));
    }

    #[test]
    fn references_are_described_by_kind() {
        assert_eq!(Texture::describe(4), "texture 4");
        assert_eq!(SubScene::describe(9), "sub-scene 9");
    }

    #[test]
    fn dependencies_are_listed_by_id() {
        let mut dependency = Dependency::new();
        let second = AssetHandle::new(Geometry::default());
        let first = AssetHandle::new(Geometry::default());
        dependency.register_dependency(&first);
        dependency.register_dependency(&second);

        let ids: Vec<u32> = dependency
            .table::<Geometry>()
            .dependencies()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
