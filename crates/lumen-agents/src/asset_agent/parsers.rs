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
//! The default parser registry of an [`AssetAgent`](super::AssetAgent).

use lumen_io::Options;
use lumen_lanes::asset_lane::serializer::{AssetDeserializeFunction, AssetFunctions};
use lumen_lanes::{EffectParser, GeometryParser, ImageParser, MaterialParser, SceneParser};
use std::rc::Rc;

/// Keeps the custom asset functions and installs every parser on an [`Options`].
///
/// The container parsers share the asset functions.
#[derive(Debug, Default)]
pub(crate) struct ParserRegistry {
    functions: Rc<AssetFunctions>,
}

impl ParserRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a deserialize function for `asset_type`. Parsers installed
    /// afterwards use it.
    pub(crate) fn register_asset_function(
        &mut self,
        asset_type: u8,
        function: AssetDeserializeFunction,
    ) {
        let mut functions = (*self.functions).clone();
        functions.register(asset_type, function);
        self.functions = Rc::new(functions);
    }

    /// Registers the effect, container and image parsers on `options`.
    pub(crate) fn install(&self, options: &mut Options) {
        let functions = &self.functions;
        options
            .register_parser("effect", EffectParser::factory())
            .register_parser("scene", SceneParser::factory_with(functions.clone()))
            .register_parser("geometry", GeometryParser::factory_with(functions.clone()))
            .register_parser("material", MaterialParser::factory_with(functions.clone()));
        for extension in ImageParser::EXTENSIONS {
            options.register_parser(extension, ImageParser::factory());
        }
        log::debug!("ParserRegistry: installed parsers with {:?}", self.functions);
    }
}
