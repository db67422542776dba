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
//! The fixed-size container header and the block layout that follows it.

use lumen_io::ParserError;
use std::fmt;

/// Magic number shared by every container; the low byte names the kind.
pub const MAGIC_BASE: u32 = 0x4C4D_4E00;

/// What a container holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// A scene: opaque node data plus its dependencies.
    Scene,
    /// A single geometry.
    Geometry,
    /// A single material.
    Material,
    /// A single texture.
    Texture,
}

impl ContainerKind {
    /// The byte stored in the low byte of the magic number.
    pub fn extension_byte(self) -> u8 {
        match self {
            ContainerKind::Scene => b'S',
            ContainerKind::Geometry => b'G',
            ContainerKind::Material => b'M',
            ContainerKind::Texture => b'T',
        }
    }

    /// Reads an extension byte.
    pub fn from_extension_byte(byte: u8) -> Option<Self> {
        match byte {
            b'S' => Some(ContainerKind::Scene),
            b'G' => Some(ContainerKind::Geometry),
            b'M' => Some(ContainerKind::Material),
            b'T' => Some(ContainerKind::Texture),
            _ => None,
        }
    }

    /// The file extension containers of this kind are saved with.
    pub fn file_extension(self) -> &'static str {
        match self {
            ContainerKind::Scene => "scene",
            ContainerKind::Geometry => "geometry",
            ContainerKind::Material => "material",
            ContainerKind::Texture => "texture",
        }
    }
}

/// A container format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u8,
    pub minor: u16,
    pub patch: u8,
}

impl Version {
    /// The version this build writes.
    pub const CURRENT: Version = Version {
        major: 1,
        minor: 0,
        patch: 0,
    };
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// The fixed-size header at the beginning of every container.
///
/// Integers are big-endian. The layout is: magic (4), version major (1),
/// minor (2), patch (1), file size (4), header size (2), dependency block
/// size (4), data block size (4), reserved (8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    pub kind: ContainerKind,
    pub version: Version,
    pub file_size: u32,
    pub header_size: u16,
    pub dependency_size: u32,
    pub data_size: u32,
}

/// A container split into its blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Container<'d> {
    pub header: ContainerHeader,
    pub dependencies: &'d [u8],
    pub data: &'d [u8],
}

// Fixed layout: read and written byte by byte rather than through serde.
impl ContainerHeader {
    /// The total size of the header in bytes.
    pub const SIZE: usize = 4 + 4 + 4 + 2 + 4 + 4 + 8;

    /// Describes a container of `kind` holding the given blocks.
    pub fn new(kind: ContainerKind, dependency_size: u32, data_size: u32) -> Self {
        Self {
            kind,
            version: Version::CURRENT,
            file_size: Self::SIZE as u32 + dependency_size + data_size,
            header_size: Self::SIZE as u16,
            dependency_size,
            data_size,
        }
    }

    /// Encodes the header.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        let magic = MAGIC_BASE | u32::from(self.kind.extension_byte());
        bytes[0..4].copy_from_slice(&magic.to_be_bytes());
        bytes[4] = self.version.major;
        bytes[5..7].copy_from_slice(&self.version.minor.to_be_bytes());
        bytes[7] = self.version.patch;
        bytes[8..12].copy_from_slice(&self.file_size.to_be_bytes());
        bytes[12..14].copy_from_slice(&self.header_size.to_be_bytes());
        bytes[14..18].copy_from_slice(&self.dependency_size.to_be_bytes());
        bytes[18..22].copy_from_slice(&self.data_size.to_be_bytes());
        bytes
    }

    /// Attempts to parse a header from the beginning of `bytes`.
    pub fn from_bytes(filename: &str, bytes: &[u8]) -> Result<Self, ParserError> {
        let invalid = |reason: String| ParserError::InvalidFile {
            filename: filename.to_string(),
            reason,
        };
        if bytes.len() < Self::SIZE {
            return Err(invalid(format!(
                "{} bytes is too short for a container header",
                bytes.len()
            )));
        }

        let magic = read_u32(bytes, 0);
        let kind = match magic & 0xFFFF_FF00 {
            MAGIC_BASE => ContainerKind::from_extension_byte((magic & 0xFF) as u8),
            _ => None,
        }
        .ok_or_else(|| invalid(format!("invalid magic number 0x{magic:08X}")))?;

        let version = Version {
            major: bytes[4],
            minor: u16::from_be_bytes([bytes[5], bytes[6]]),
            patch: bytes[7],
        };
        if version.major != Version::CURRENT.major {
            return Err(ParserError::IncompatibleVersion {
                filename: filename.to_string(),
                found: version.to_string(),
                supported: Version::CURRENT.to_string(),
            });
        }
        if version > Version::CURRENT {
            log::warn!(
                "'{filename}' was written by version {version}, newer than {}",
                Version::CURRENT
            );
        }

        Ok(Self {
            kind,
            version,
            file_size: read_u32(bytes, 8),
            header_size: u16::from_be_bytes([bytes[12], bytes[13]]),
            dependency_size: read_u32(bytes, 14),
            data_size: read_u32(bytes, 18),
        })
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

impl<'d> Container<'d> {
    /// Splits `bytes` into header, dependency block and data block.
    pub fn read(
        filename: &str,
        bytes: &'d [u8],
        expected: ContainerKind,
    ) -> Result<Self, ParserError> {
        let header = ContainerHeader::from_bytes(filename, bytes)?;
        if header.kind != expected {
            return Err(ParserError::InvalidFile {
                filename: filename.to_string(),
                reason: format!(
                    "expected a {} container, found a {} container",
                    expected.file_extension(),
                    header.kind.file_extension()
                ),
            });
        }

        let start = usize::from(header.header_size);
        let middle = start + header.dependency_size as usize;
        let end = middle + header.data_size as usize;
        if start < ContainerHeader::SIZE || end > bytes.len() {
            return Err(ParserError::InvalidFile {
                filename: filename.to_string(),
                reason: format!(
                    "blocks end at byte {end} but the file holds {} bytes",
                    bytes.len()
                ),
            });
        }

        Ok(Self {
            header,
            dependencies: &bytes[start..middle],
            data: &bytes[middle..end],
        })
    }

    /// Concatenates a header and both blocks.
    pub fn write(kind: ContainerKind, dependencies: &[u8], data: &[u8]) -> Vec<u8> {
        let header = ContainerHeader::new(kind, dependencies.len() as u32, data.len() as u32);
        let mut bytes = Vec::with_capacity(header.file_size as usize);
        bytes.extend_from_slice(&header.to_bytes());
        bytes.extend_from_slice(dependencies);
        bytes.extend_from_slice(data);
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout_is_big_endian() {
        let bytes = ContainerHeader::new(ContainerKind::Geometry, 2, 3).to_bytes();
        assert_eq!(bytes.len(), 30);
        assert_eq!(&bytes[0..4], &[0x4C, 0x4D, 0x4E, b'G']);
        assert_eq!(&bytes[4..8], &[1, 0, 0, 0]);
        assert_eq!(&bytes[8..12], &35u32.to_be_bytes());
        assert_eq!(&bytes[12..14], &30u16.to_be_bytes());
    }

    #[test]
    fn containers_split_into_their_blocks() {
        let bytes = Container::write(ContainerKind::Scene, b"deps", b"data!");
        let container = Container::read("a.scene", &bytes, ContainerKind::Scene).unwrap();
        assert_eq!(container.dependencies, b"deps");
        assert_eq!(container.data, b"data!");
        assert_eq!(container.header.file_size as usize, bytes.len());
    }

    #[test]
    fn malformed_headers_are_rejected() {
        let bytes = Container::write(ContainerKind::Scene, b"", b"");
        let error = Container::read("a.geometry", &bytes, ContainerKind::Geometry).unwrap_err();
        assert_eq!(error.type_tag(), "InvalidFile");

        let mut future = bytes.clone();
        future[4] = 2;
        let error = Container::read("a.scene", &future, ContainerKind::Scene).unwrap_err();
        assert_eq!(error.type_tag(), "IncompatibleVersion");

        let error = Container::read("a.scene", &bytes[..10], ContainerKind::Scene).unwrap_err();
        assert_eq!(error.type_tag(), "InvalidFile");

        let mut truncated = Container::write(ContainerKind::Scene, b"", b"payload");
        truncated.pop();
        assert!(Container::read("a.scene", &truncated, ContainerKind::Scene).is_err());
    }
}
