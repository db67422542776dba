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
//! Format lanes of the Lumen asset pipeline.
//!
//! Each parser implements [`lumen_io::AbstractParser`] and is registered on an
//! [`Options`](lumen_io::Options) under the extensions it handles:
//! - [`EffectParser`] reads JSON effect documents and the GLSL they include;
//! - [`ImageParser`] decodes images into device textures;
//! - the [`serializer`](asset_lane::serializer) parsers read binary scene,
//!   geometry and material containers, and their writers produce them.

pub mod asset_lane;

pub use asset_lane::effect::{EffectParser, GlslBlock, GlslBlockList, GlslBlockListRef};
pub use asset_lane::serializer::{
    AssetFunctions, GeometryParser, GeometryWriter, MaterialParser, MaterialWriter, SceneParser,
    SceneWriter, WriterError, WriterOptions,
};
pub use asset_lane::texture::ImageParser;
