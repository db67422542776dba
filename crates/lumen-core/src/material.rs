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

//! Materials: named bags of typed properties read by effect bindings.

use crate::asset::Asset;
use crate::value::DataValue;
use std::collections::BTreeMap;

/// A set of named properties provided to effects at render time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Material {
    /// The material name.
    pub name: String,
    properties: BTreeMap<String, DataValue>,
}

impl Material {
    /// Creates an empty material.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Sets a property, replacing any previous value.
    pub fn set(&mut self, property: impl Into<String>, value: DataValue) -> &mut Self {
        self.properties.insert(property.into(), value);
        self
    }

    /// Returns a property.
    pub fn get(&self, property: &str) -> Option<&DataValue> {
        self.properties.get(property)
    }

    /// Returns `true` if the property is set.
    pub fn has_property(&self, property: &str) -> bool {
        self.properties.contains_key(property)
    }

    /// Iterates over every property in lexical order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &DataValue)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Asset for Material {}
