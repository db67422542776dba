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

//! Scene containers as seen by the asset pipeline.
//!
//! The scene graph itself lives outside this workspace. A [`SubScene`] keeps
//! the serialized node data untouched, alongside the [`Dependency`] tables
//! needed to turn the reference ids it contains back into assets.

use crate::dependency::Dependency;
use lumen_core::asset::Asset;

/// A deserialized scene container.
#[derive(Debug, Default)]
pub struct SubScene {
    /// The scene name, usually the file it was read from.
    pub name: String,
    /// The opaque node data block.
    pub payload: Vec<u8>,
    /// The resolved reference tables of the container.
    pub dependency: Dependency,
}

impl Asset for SubScene {}
