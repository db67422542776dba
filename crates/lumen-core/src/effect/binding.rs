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

//! Bindings: indirections from effect-declared names to render-time data.

use crate::value::DataValue;
use std::collections::BTreeMap;

/// The data context a binding reads from at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BindingSource {
    /// The drawn surface and its scene node.
    #[default]
    Target,
    /// The renderer drawing the surface.
    Renderer,
    /// The root of the scene.
    Root,
}

impl BindingSource {
    /// Reads a binding source token (`target`, `renderer` or `root`).
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "target" => Some(Self::Target),
            "renderer" => Some(Self::Renderer),
            "root" => Some(Self::Root),
            _ => None,
        }
    }
}

/// Binds an effect-declared name to a property of a data context.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Binding {
    /// The property to read, which may contain `${...}` placeholders.
    pub property_name: String,
    /// Where the property is looked up.
    pub source: BindingSource,
}

impl Binding {
    /// Creates a binding reading from the [`BindingSource::Target`] context.
    pub fn target(property_name: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            source: BindingSource::Target,
        }
    }
}

/// A binding driving a shader macro, optionally clamped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MacroBinding {
    /// The underlying binding.
    pub binding: Binding,
    /// Smallest value the macro may take.
    pub min: Option<i32>,
    /// Largest value the macro may take.
    pub max: Option<i32>,
}

impl From<Binding> for MacroBinding {
    fn from(binding: Binding) -> Self {
        Self {
            binding,
            min: None,
            max: None,
        }
    }
}

/// Named bindings plus the default values used when a binding cannot be read.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingMap<B = Binding> {
    /// Bindings keyed by effect-declared name.
    pub bindings: BTreeMap<String, B>,
    /// Default values keyed by effect-declared name.
    pub default_values: BTreeMap<String, DataValue>,
}

/// Bindings of shader macros.
pub type MacroBindingMap = BindingMap<MacroBinding>;

impl<B> BindingMap<B> {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self {
            bindings: BTreeMap::new(),
            default_values: BTreeMap::new(),
        }
    }

    /// Returns the binding declared for `name`.
    pub fn binding(&self, name: &str) -> Option<&B> {
        self.bindings.get(name)
    }

    /// Returns the default value declared for `name`.
    pub fn default_value(&self, name: &str) -> Option<&DataValue> {
        self.default_values.get(name)
    }

    /// Returns `true` if nothing is bound and no default is set.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty() && self.default_values.is_empty()
    }
}

impl<B> Default for BindingMap<B> {
    fn default() -> Self {
        Self::new()
    }
}
