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
//! Writing dependency blocks and containers.

use super::container::{Container, ContainerKind};
use super::{
    asset_type, geometry, material, texture_format, write_dependency_block, SerializedAsset,
};
use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use lumen_core::asset::AssetHandle;
use lumen_core::device::TextureFormat;
use lumen_core::effect::Effect;
use lumen_core::geometry::Geometry;
use lumen_core::material::Material;
use lumen_core::texture::Texture;
use lumen_data::{AssetLibrary, Dependency, SubScene};
use lumen_io::{path, AssetKind};
use std::collections::HashSet;
use std::io::Cursor;
use std::path::PathBuf;
use thiserror::Error;

/// An error raised while writing a container.
#[derive(Debug, Error)]
pub enum WriterError {
    /// An external asset file could not be written.
    #[error("Failed to write '{path}': {source}")]
    Io {
        /// The file being written.
        path: String,
        /// The I/O error.
        #[source]
        source: std::io::Error,
    },
    /// An asset could not be encoded.
    #[error("Failed to encode '{name}': {reason}")]
    Encode {
        /// The asset name.
        name: String,
        /// What went wrong.
        reason: String,
    },
    /// An asset that can only be referenced has no name in the library.
    #[error("The {kind} with id {id} is not registered in the asset library")]
    Unnamed {
        /// The kind of the asset.
        kind: AssetKind,
        /// Its id in the dependency tables.
        id: u32,
    },
    /// A texture's CPU copy was disposed after upload.
    #[error("Texture '{name}' has no texels left to write")]
    TextureDisposed {
        /// The texture name.
        name: String,
    },
}

/// How dependencies are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterOptions {
    /// Store geometries, materials and textures inside the container. When
    /// `false` each one is written to its own file in `output_folder` and
    /// referenced by file name.
    pub embed: bool,
    /// The folder external assets are written to.
    pub output_folder: PathBuf,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            embed: true,
            output_folder: PathBuf::from("."),
        }
    }
}

impl WriterOptions {
    fn write_file(&self, name: &str, bytes: &[u8]) -> Result<(), WriterError> {
        let path = self.output_folder.join(name);
        log::debug!("DependencyWriter: writing '{}'", path.display());
        std::fs::write(&path, bytes).map_err(|source| WriterError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Serializes the dependency tables of a container.
pub struct DependencyWriter;

impl DependencyWriter {
    /// Encodes every registered dependency into a dependency block.
    ///
    /// Materials and geometries are encoded first since materials register
    /// the textures they use. Entries are then written in resolution order:
    /// textures and effects, materials, geometries, linked assets. Effects and
    /// linked assets are always referenced by their library name.
    pub fn serialize(
        dependency: &mut Dependency,
        library: &AssetLibrary,
        options: &WriterOptions,
    ) -> Result<Vec<u8>, WriterError> {
        let mut used = HashSet::new();
        let mut materials = Vec::new();
        let registered = dependency.table::<Material>().dependencies();
        for (id, material) in registered {
            let payload = material::encode_material(&material, dependency)?;
            let name = unique_name(
                &mut used,
                library.material_name(&material),
                format!("material_{id}.material"),
            );
            materials.push((id, name, Container::write(ContainerKind::Material, &[], &payload)));
        }
        let mut geometries = Vec::new();
        for (id, geometry) in dependency.table::<Geometry>().dependencies() {
            let (format, payload) = geometry::encode_geometry(&geometry)?;
            let name = unique_name(
                &mut used,
                library.geometry_name(&geometry),
                format!("geometry_{id}.geometry"),
            );
            let container = Container::write(ContainerKind::Geometry, &[], &payload);
            geometries.push((id, name, format, container));
        }

        let mut entries = Vec::new();
        for (id, texture) in dependency.table::<Texture>().dependencies() {
            let bytes = encode_png(&texture)?;
            let name = unique_name(&mut used, library.texture_name(&texture), format!("{id}.png"));
            let metadata = texture_format::ENCODED;
            entries.push(options.entry(asset_type::TEXTURE, metadata, id, &name, bytes)?);
        }
        for (id, effect) in dependency.table::<Effect>().dependencies() {
            let name = library.effect_name(&effect);
            entries.push(reference(asset_type::EFFECT, AssetKind::Effect, id, name)?);
        }
        for (id, name, container) in materials {
            entries.push(options.entry(asset_type::MATERIAL, 0, id, &name, container)?);
        }
        for (id, name, format, container) in geometries {
            let metadata = u16::from(format);
            entries.push(options.entry(asset_type::GEOMETRY, metadata, id, &name, container)?);
        }
        for (id, scene) in dependency.table::<SubScene>().dependencies() {
            let name = library.scene_name(&scene);
            entries.push(reference(asset_type::LINKED_ASSET, AssetKind::LinkedAsset, id, name)?);
        }

        if entries.is_empty() {
            return Ok(Vec::new());
        }
        write_dependency_block(&entries)
    }
}

impl WriterOptions {
    /// An entry for a geometry, material or texture, embedded or written next
    /// to the container. `external_type` is the tag of the external variant.
    fn entry(
        &self,
        external_type: u8,
        metadata: u16,
        id: u32,
        name: &str,
        bytes: Vec<u8>,
    ) -> Result<SerializedAsset, WriterError> {
        if self.embed {
            return Ok(SerializedAsset::new(external_type + 1, metadata, id, bytes));
        }
        self.write_file(name, &bytes)?;
        Ok(SerializedAsset::new(external_type, metadata, id, name.as_bytes().to_vec()))
    }
}

/// The file name of a library name, or `fallback` for unnamed assets and names
/// already taken by another asset of the block.
fn unique_name(used: &mut HashSet<String>, name: Option<String>, fallback: String) -> String {
    let name = match name.map(|name| path::file_name(&name).to_string()) {
        Some(name) if !used.contains(&name) => name,
        _ => fallback,
    };
    used.insert(name.clone());
    name
}

fn reference(
    asset_type: u8,
    kind: AssetKind,
    id: u32,
    name: Option<String>,
) -> Result<SerializedAsset, WriterError> {
    let name = name.ok_or(WriterError::Unnamed { kind, id })?;
    Ok(SerializedAsset::new(asset_type, 0, id, name.into_bytes()))
}

/// Writes a container: its dependency block, then `data`.
pub(crate) fn write_container(
    kind: ContainerKind,
    dependency: &mut Dependency,
    library: &AssetLibrary,
    options: &WriterOptions,
    data: &[u8],
) -> Result<Vec<u8>, WriterError> {
    let block = DependencyWriter::serialize(dependency, library, options)?;
    Ok(Container::write(kind, &block, data))
}

fn encode_png(texture: &AssetHandle<Texture>) -> Result<Vec<u8>, WriterError> {
    let pixels = texture
        .pixels()
        .ok_or_else(|| WriterError::TextureDisposed {
            name: texture.name.clone(),
        })?
        .to_vec();
    let size_mismatch = || WriterError::Encode {
        name: texture.name.clone(),
        reason: "texel count does not match the texture size".to_string(),
    };
    let image = match texture.format {
        TextureFormat::Rgba8Unorm => DynamicImage::ImageRgba8(
            RgbaImage::from_raw(texture.width, texture.height, pixels).ok_or_else(size_mismatch)?,
        ),
        TextureFormat::Rgb8Unorm => DynamicImage::ImageRgb8(
            RgbImage::from_raw(texture.width, texture.height, pixels).ok_or_else(size_mismatch)?,
        ),
    };

    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| WriterError::Encode {
            name: texture.name.clone(),
            reason: e.to_string(),
        })?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colliding_file_names_fall_back_to_the_id() {
        let mut used = HashSet::new();
        let first = unique_name(
            &mut used,
            Some("props/crate.geometry".to_string()),
            "geometry_0.geometry".to_string(),
        );
        let second = unique_name(
            &mut used,
            Some("ruins/crate.geometry".to_string()),
            "geometry_1.geometry".to_string(),
        );
        let unnamed = unique_name(&mut used, None, "geometry_2.geometry".to_string());

        assert_eq!(first, "crate.geometry");
        assert_eq!(second, "geometry_1.geometry");
        assert_eq!(unnamed, "geometry_2.geometry");
    }
}
