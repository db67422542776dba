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
//! The binary asset container.
//!
//! A container is a fixed-size [`ContainerHeader`] followed by two blocks: the
//! dependency block, a counted list of msgpack-encoded [`SerializedAsset`]s,
//! and the data block holding the payload of the container's own asset. Assets reference
//! each other by integer ids; [`AssetResolver`] turns the dependency block back
//! into assets registered in the library and in a [`Dependency`] table.
//!
//! [`Dependency`]: lumen_data::Dependency

mod container;
mod geometry;
mod material;
mod resolver;
mod scene;
mod writer;

pub use container::{Container, ContainerHeader, ContainerKind, Version, MAGIC_BASE};
pub use geometry::{GeometryParser, GeometryWriter};
pub use material::{MaterialParser, MaterialWriter};
pub use resolver::{AssetDeserializeFunction, AssetFunctions, AssetResolver, ResolveContext};
pub use scene::{SceneParser, SceneWriter};
pub use writer::{DependencyWriter, WriterError, WriterOptions};

use lumen_io::ParserError;
use serde::{Deserialize, Serialize};

/// Asset type tags, stored in the low byte of [`SerializedAsset::type_tag`].
///
/// Even values reference an external file by relative path, odd values embed
/// the asset bytes. Tags from [`FIRST_PLUGIN`](asset_type::FIRST_PLUGIN) on
/// are only handled by registered [`AssetFunctions`].
pub mod asset_type {
    pub const GEOMETRY: u8 = 0;
    pub const EMBED_GEOMETRY: u8 = 1;
    pub const MATERIAL: u8 = 2;
    pub const EMBED_MATERIAL: u8 = 3;
    pub const TEXTURE: u8 = 4;
    pub const EMBED_TEXTURE: u8 = 5;
    pub const EFFECT: u8 = 6;
    pub const EMBED_EFFECT: u8 = 7;
    pub const LINKED_ASSET: u8 = 8;
    pub const EMBED_LINKED_ASSET: u8 = 9;
    pub const FIRST_PLUGIN: u8 = 10;

    /// Returns `true` for tags whose content is the asset itself.
    pub fn is_embedded(asset_type: u8) -> bool {
        asset_type < FIRST_PLUGIN && asset_type % 2 == 1
    }
}

/// Texture metadata values, stored in the high bits of the type tag.
pub mod texture_format {
    /// An encoded image file.
    pub const ENCODED: u16 = 0;
    /// Big-endian `width` and `height` followed by RGBA8 texels.
    pub const RAW_RGBA8: u16 = 1;
}

/// One entry of a dependency block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedAsset {
    /// The asset type in bits 0–7, format metadata in bits 16–31.
    pub type_tag: u32,
    /// The id other assets of the container use to reference this one.
    pub id: u32,
    /// The asset bytes when embedded, its relative path otherwise.
    pub content: Vec<u8>,
}

impl SerializedAsset {
    /// Builds an entry from its parts.
    pub fn new(asset_type: u8, metadata: u16, id: u32, content: Vec<u8>) -> Self {
        Self {
            type_tag: u32::from(asset_type) | (u32::from(metadata) << 16),
            id,
            content,
        }
    }

    /// The asset type, see [`asset_type`].
    pub fn asset_type(&self) -> u8 {
        (self.type_tag & 0xFF) as u8
    }

    /// The format metadata.
    pub fn metadata(&self) -> u16 {
        (self.type_tag >> 16) as u16
    }

    /// Returns `true` if the content is the asset itself.
    pub fn is_embedded(&self) -> bool {
        asset_type::is_embedded(self.asset_type())
    }
}

/// Encodes a dependency block: a big-endian `u16` entry count, then each
/// entry as a big-endian `u32` size followed by its msgpack encoding.
pub fn write_dependency_block(assets: &[SerializedAsset]) -> Result<Vec<u8>, WriterError> {
    let count = u16::try_from(assets.len()).map_err(|_| WriterError::Encode {
        name: "dependency block".to_string(),
        reason: format!("{} entries do not fit in one block", assets.len()),
    })?;
    let mut block = count.to_be_bytes().to_vec();
    for asset in assets {
        let entry = rmp_serde::to_vec(asset).map_err(|e| WriterError::Encode {
            name: format!("dependency {}", asset.id),
            reason: e.to_string(),
        })?;
        block.extend_from_slice(&(entry.len() as u32).to_be_bytes());
        block.extend_from_slice(&entry);
    }
    Ok(block)
}

/// Decodes a block written by [`write_dependency_block`].
pub fn read_dependency_block(
    filename: &str,
    block: &[u8],
) -> Result<Vec<SerializedAsset>, ParserError> {
    let invalid = |reason: String| ParserError::InvalidFile {
        filename: filename.to_string(),
        reason,
    };
    let (count, mut rest) = match block {
        [high, low, rest @ ..] => (u16::from_be_bytes([*high, *low]), rest),
        _ => return Err(invalid("truncated dependency block".to_string())),
    };

    let mut assets = Vec::with_capacity(usize::from(count));
    for index in 0..count {
        let truncated = || invalid(format!("dependency entry {index} is truncated"));
        if rest.len() < 4 {
            return Err(truncated());
        }
        let size = u32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]) as usize;
        let entry = rest.get(4..4 + size).ok_or_else(truncated)?;
        let asset = rmp_serde::from_slice(entry)
            .map_err(|e| invalid(format!("undecodable dependency entry {index}: {e}")))?;
        assets.push(asset);
        rest = &rest[4 + size..];
    }
    Ok(assets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_tags_pack_the_metadata_above_the_type() {
        let asset = SerializedAsset::new(asset_type::EMBED_TEXTURE, 1, 7, Vec::new());
        assert_eq!(asset.type_tag, 0x0001_0005);
        assert_eq!(asset.asset_type(), asset_type::EMBED_TEXTURE);
        assert_eq!(asset.metadata(), texture_format::RAW_RGBA8);
        assert!(asset.is_embedded());
        assert!(!SerializedAsset::new(asset_type::EFFECT, 0, 1, Vec::new()).is_embedded());
        assert!(!asset_type::is_embedded(11));
    }

    #[test]
    fn blocks_are_counted_and_size_prefixed() {
        let entries = vec![
            SerializedAsset::new(asset_type::GEOMETRY, 0, 3, b"a.geometry".to_vec()),
            SerializedAsset::new(asset_type::EMBED_TEXTURE, 0, 4, vec![1, 2, 3]),
        ];
        let block = write_dependency_block(&entries).unwrap();

        assert_eq!(&block[..2], &[0, 2]);
        let first_size = u32::from_be_bytes([block[2], block[3], block[4], block[5]]) as usize;
        // fixarray(3): type tag, id, content
        assert_eq!(block[6], 0x93);
        assert_eq!(read_dependency_block("a.scene", &block).unwrap(), entries);
        assert!(6 + first_size < block.len());
    }

    #[test]
    fn truncated_blocks_are_invalid() {
        let entries = vec![SerializedAsset::new(
            asset_type::GEOMETRY,
            0,
            3,
            b"a.geometry".to_vec(),
        )];
        let block = write_dependency_block(&entries).unwrap();

        let error = read_dependency_block("a.scene", &block[..block.len() - 1]).unwrap_err();
        assert_eq!(error.type_tag(), "InvalidFile");
        assert!(read_dependency_block("a.scene", &[0]).is_err());
    }
}
