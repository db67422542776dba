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

//! The effect model: named techniques made of rendering passes.
//!
//! An [`Effect`] is what the effect parser produces once every shader include
//! and default texture has been resolved. It holds no device resources: shader
//! sources are plain text and textures are shared [`AssetHandle`]s.
//!
//! [`AssetHandle`]: crate::asset::AssetHandle

mod binding;
mod pass;
mod sampler;
mod states;

pub use self::binding::*;
pub use self::pass::*;
pub use self::sampler::*;
pub use self::states::*;

use crate::asset::Asset;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A named list of passes, rendered in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Technique {
    /// The technique name as declared in the document.
    pub name: String,
    /// The passes of the technique.
    pub passes: Vec<Pass>,
}

/// A named collection of techniques.
#[derive(Debug, Clone, Default)]
pub struct Effect {
    name: String,
    techniques: BTreeMap<String, Arc<Technique>>,
}

impl Effect {
    /// The name of the technique used when none is requested.
    pub const DEFAULT_TECHNIQUE: &'static str = "default";

    /// Creates an effect with no technique.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            techniques: BTreeMap::new(),
        }
    }

    /// The effect name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers `technique` under `name`.
    ///
    /// Several names may share one technique; the default alias does.
    pub fn add_technique(&mut self, name: impl Into<String>, technique: Arc<Technique>) {
        self.techniques.insert(name.into(), technique);
    }

    /// Returns the technique registered under `name`.
    pub fn technique(&self, name: &str) -> Option<&Arc<Technique>> {
        self.techniques.get(name)
    }

    /// Returns `true` if a technique is registered under `name`.
    pub fn has_technique(&self, name: &str) -> bool {
        self.techniques.contains_key(name)
    }

    /// Every registered name, aliases included, in lexical order.
    pub fn technique_names(&self) -> impl Iterator<Item = &str> {
        self.techniques.keys().map(String::as_str)
    }

    /// Number of registered names, aliases included.
    pub fn num_techniques(&self) -> usize {
        self.techniques.len()
    }
}

impl Asset for Effect {}
