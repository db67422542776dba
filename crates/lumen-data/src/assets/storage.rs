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

//! A generic, type-safe storage for loaded asset handles.

use lumen_core::asset::{Asset, AssetHandle};
use std::collections::HashMap;

/// An in-memory cache for a specific type of asset `A`, keyed by name.
///
/// Names are whatever the loading pipeline chose: the requested filename for
/// parsed files, generated names such as `geometry_7` for embedded assets.
/// Inserting under an existing name replaces the previous handle.
pub struct Assets<A: Asset> {
    storage: HashMap<String, AssetHandle<A>>,
}

impl<A: Asset> Default for Assets<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Asset> Clone for Assets<A> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
        }
    }
}

impl<A: Asset> Assets<A> {
    /// Creates a new, empty asset storage.
    pub fn new() -> Self {
        Self {
            storage: HashMap::new(),
        }
    }

    /// Inserts an asset handle, replacing any handle stored under the same name.
    ///
    /// # Arguments
    /// * `name` - The name the asset is registered under.
    /// * `handle` - The handle to the asset to be stored.
    pub fn insert(&mut self, name: impl Into<String>, handle: AssetHandle<A>) {
        self.storage.insert(name.into(), handle);
    }

    /// Retrieves the asset handle stored under `name`.
    pub fn get(&self, name: &str) -> Option<&AssetHandle<A>> {
        self.storage.get(name)
    }

    /// Checks if an asset is stored under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.storage.contains_key(name)
    }

    /// Removes and returns the asset stored under `name`.
    pub fn remove(&mut self, name: &str) -> Option<AssetHandle<A>> {
        self.storage.remove(name)
    }

    /// Returns a name under which `handle` is stored.
    ///
    /// When an asset is registered under several names, which one is returned
    /// is unspecified.
    pub fn name_of(&self, handle: &AssetHandle<A>) -> Option<&str> {
        self.storage
            .iter()
            .find(|(_, stored)| stored.ptr_eq(handle))
            .map(|(name, _)| name.as_str())
    }

    /// Number of stored names.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Iterates over every stored name.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.storage.keys().map(String::as_str)
    }
}
