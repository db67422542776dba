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
//! The configuration record handed to every loader and parser.

use crate::loader::{Loader, LoaderRef};
use crate::parser::{ParserFactory, ParserRef};
use crate::protocol::{FileProtocol, ProtocolRef};
use crate::settings::LoaderSettings;
use lumen_core::asset::{Asset, AssetHandle};
use lumen_core::device::RenderContext;
use lumen_core::geometry::Geometry;
use lumen_core::material::Material;
use lumen_core::texture::Texture;
use lumen_data::{AssetLibrary, AssetLibraryRef};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Creates the loader used for a filename.
pub type LoaderFunction = Rc<dyn Fn(&str) -> LoaderRef>;

/// Picks the protocol used to fetch a filename.
pub type ProtocolFunction = Rc<dyn Fn(&str) -> ProtocolRef>;

/// Rewrites a filename before it is fetched.
pub type UriFunction = Rc<dyn Fn(&str) -> String>;

/// Post-processes a freshly deserialized asset before it is registered.
pub type AssetFunction<A> = Rc<dyn Fn(&str, AssetHandle<A>) -> AssetHandle<A>>;

/// What a [`Loader`] does with an error reported by its parser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParserErrorPolicy {
    /// Forward the error through the loader's `error` signal.
    #[default]
    Propagate,
    /// Log the error. A fatal error then completes the loader without an asset.
    Swallow,
}

/// Loading options.
///
/// Cloning is cheap: factories and functions are shared, while the parser
/// registry and the path and flag lists are copied so a clone can be adjusted
/// for one nested file without touching its parent.
#[derive(Clone)]
pub struct Options {
    context: Rc<dyn RenderContext>,
    asset_library: Weak<AssetLibrary>,
    parsers: HashMap<String, ParserFactory>,
    include_paths: Vec<String>,
    platforms: Vec<String>,
    user_flags: Vec<String>,
    generate_mipmaps: bool,
    resize_smoothly: bool,
    dispose_texture_after_loading: bool,
    parser_error_policy: ParserErrorPolicy,
    loader_function: LoaderFunction,
    protocol_function: ProtocolFunction,
    uri_function: UriFunction,
    geometry_function: AssetFunction<Geometry>,
    material_function: AssetFunction<Material>,
    texture_function: AssetFunction<Texture>,
}

fn identity<A: Asset>() -> AssetFunction<A> {
    Rc::new(|_: &str, asset: AssetHandle<A>| asset)
}

impl Options {
    /// Creates options that load into `library` and upload through its context.
    ///
    /// The options only hold the library weakly: loads started after the
    /// library is dropped fetch their bytes and then stop.
    pub fn new(library: &AssetLibraryRef) -> Self {
        let file_protocol: ProtocolRef = Rc::new(FileProtocol::new());
        Self {
            context: library.context(),
            asset_library: Rc::downgrade(library),
            parsers: HashMap::new(),
            include_paths: Vec::new(),
            platforms: Vec::new(),
            user_flags: Vec::new(),
            generate_mipmaps: false,
            resize_smoothly: false,
            dispose_texture_after_loading: false,
            parser_error_policy: ParserErrorPolicy::default(),
            loader_function: Rc::new(|_: &str| Loader::create()),
            protocol_function: Rc::new(move |_: &str| file_protocol.clone()),
            uri_function: Rc::new(str::to_string),
            geometry_function: identity(),
            material_function: identity(),
            texture_function: identity(),
        }
    }

    /// The device textures are uploaded to.
    pub fn context(&self) -> &Rc<dyn RenderContext> {
        &self.context
    }

    /// The library results are stored in, if it is still alive.
    pub fn asset_library(&self) -> Option<AssetLibraryRef> {
        self.asset_library.upgrade()
    }

    /// Registers `factory` for files with the given extension.
    pub fn register_parser(&mut self, extension: &str, factory: ParserFactory) -> &mut Self {
        self.parsers.insert(extension.to_ascii_lowercase(), factory);
        self
    }

    /// Removes the parser registered for `extension`.
    pub fn unregister_parser(&mut self, extension: &str) -> &mut Self {
        self.parsers.remove(&extension.to_ascii_lowercase());
        self
    }

    /// Creates a parser for `extension`, if one is registered.
    pub fn parser(&self, extension: &str) -> Option<ParserRef> {
        self.parsers
            .get(&extension.to_ascii_lowercase())
            .map(|factory| factory())
    }

    /// Returns `true` if a parser is registered for `extension`.
    pub fn has_parser(&self, extension: &str) -> bool {
        self.parsers.contains_key(&extension.to_ascii_lowercase())
    }

    /// Include paths, oldest first. Lookups try them newest first.
    pub fn include_paths(&self) -> &[String] {
        &self.include_paths
    }

    /// Appends an include path. Empty paths are ignored.
    pub fn add_include_path(&mut self, path: impl Into<String>) -> &mut Self {
        let path = path.into();
        if !path.is_empty() {
            self.include_paths.push(path);
        }
        self
    }

    /// Removes every include path.
    pub fn clear_include_paths(&mut self) -> &mut Self {
        self.include_paths.clear();
        self
    }

    /// Platform tokens matched by `configuration` filters.
    pub fn platforms(&self) -> &[String] {
        &self.platforms
    }

    /// Adds a platform token.
    pub fn add_platform(&mut self, platform: impl Into<String>) -> &mut Self {
        push_unique(&mut self.platforms, platform.into());
        self
    }

    /// User flags matched by `configuration` filters.
    pub fn user_flags(&self) -> &[String] {
        &self.user_flags
    }

    /// Adds a user flag.
    pub fn add_user_flag(&mut self, flag: impl Into<String>) -> &mut Self {
        push_unique(&mut self.user_flags, flag.into());
        self
    }

    /// Returns `true` if `token` is a platform or a user flag.
    pub fn matches_configuration_token(&self, token: &str) -> bool {
        self.platforms.iter().chain(&self.user_flags).any(|t| t == token)
    }

    /// Whether image parsers build a mip chain.
    pub fn generate_mipmaps(&self) -> bool {
        self.generate_mipmaps
    }

    /// Sets whether image parsers build a mip chain.
    pub fn set_generate_mipmaps(&mut self, value: bool) -> &mut Self {
        self.generate_mipmaps = value;
        self
    }

    /// Whether non-power-of-two images are resized with filtering.
    pub fn resize_smoothly(&self) -> bool {
        self.resize_smoothly
    }

    /// Sets whether non-power-of-two images are resized with filtering.
    pub fn set_resize_smoothly(&mut self, value: bool) -> &mut Self {
        self.resize_smoothly = value;
        self
    }

    /// Whether CPU pixels are dropped once a texture is uploaded.
    pub fn dispose_texture_after_loading(&self) -> bool {
        self.dispose_texture_after_loading
    }

    /// Sets whether CPU pixels are dropped once a texture is uploaded.
    pub fn set_dispose_texture_after_loading(&mut self, value: bool) -> &mut Self {
        self.dispose_texture_after_loading = value;
        self
    }

    /// What loaders do with parser errors.
    pub fn parser_error_policy(&self) -> ParserErrorPolicy {
        self.parser_error_policy
    }

    /// Sets what loaders do with parser errors.
    pub fn set_parser_error_policy(&mut self, policy: ParserErrorPolicy) -> &mut Self {
        self.parser_error_policy = policy;
        self
    }

    /// Creates loaders for nested and batched files.
    pub fn loader_function(&self) -> &LoaderFunction {
        &self.loader_function
    }

    /// Replaces the loader factory.
    pub fn set_loader_function(&mut self, function: LoaderFunction) -> &mut Self {
        self.loader_function = function;
        self
    }

    /// Picks the protocol for a filename.
    pub fn protocol_function(&self) -> &ProtocolFunction {
        &self.protocol_function
    }

    /// Replaces the protocol selector.
    pub fn set_protocol_function(&mut self, function: ProtocolFunction) -> &mut Self {
        self.protocol_function = function;
        self
    }

    /// Makes every file go through `protocol`.
    pub fn set_protocol(&mut self, protocol: ProtocolRef) -> &mut Self {
        self.protocol_function = Rc::new(move |_: &str| protocol.clone());
        self
    }

    /// Rewrites filenames before fetching.
    pub fn uri_function(&self) -> &UriFunction {
        &self.uri_function
    }

    /// Replaces the filename rewriter.
    pub fn set_uri_function(&mut self, function: UriFunction) -> &mut Self {
        self.uri_function = function;
        self
    }

    /// Post-processes deserialized geometries.
    pub fn geometry_function(&self) -> &AssetFunction<Geometry> {
        &self.geometry_function
    }

    /// Replaces the geometry post-processor.
    pub fn set_geometry_function(&mut self, function: AssetFunction<Geometry>) -> &mut Self {
        self.geometry_function = function;
        self
    }

    /// Post-processes deserialized materials.
    pub fn material_function(&self) -> &AssetFunction<Material> {
        &self.material_function
    }

    /// Replaces the material post-processor.
    pub fn set_material_function(&mut self, function: AssetFunction<Material>) -> &mut Self {
        self.material_function = function;
        self
    }

    /// Post-processes loaded textures.
    pub fn texture_function(&self) -> &AssetFunction<Texture> {
        &self.texture_function
    }

    /// Replaces the texture post-processor.
    pub fn set_texture_function(&mut self, function: AssetFunction<Texture>) -> &mut Self {
        self.texture_function = function;
        self
    }

    /// Copies the serializable settings onto these options. Include paths,
    /// platforms and user flags are appended.
    pub fn apply_settings(&mut self, settings: &LoaderSettings) -> &mut Self {
        for path in &settings.include_paths {
            self.add_include_path(path.clone());
        }
        for platform in &settings.platforms {
            self.add_platform(platform.clone());
        }
        for flag in &settings.user_flags {
            self.add_user_flag(flag.clone());
        }
        self.generate_mipmaps = settings.generate_mipmaps;
        self.resize_smoothly = settings.resize_smoothly;
        self.dispose_texture_after_loading = settings.dispose_texture_after_loading;
        self.parser_error_policy = settings.parser_error_policy;
        self
    }
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parsers: Vec<&str> = self.parsers.keys().map(String::as_str).collect();
        parsers.sort_unstable();
        f.debug_struct("Options")
            .field("parsers", &parsers)
            .field("include_paths", &self.include_paths)
            .field("platforms", &self.platforms)
            .field("user_flags", &self.user_flags)
            .field("generate_mipmaps", &self.generate_mipmaps)
            .field("resize_smoothly", &self.resize_smoothly)
            .field(
                "dispose_texture_after_loading",
                &self.dispose_texture_after_loading,
            )
            .field("parser_error_policy", &self.parser_error_policy)
            .finish_non_exhaustive()
    }
}
