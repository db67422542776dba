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
//! Geometry containers.

use super::container::{Container, ContainerKind};
use super::resolver::{parse_container, AssetFunctions, ResolveContext};
use super::writer::WriterError;
use lumen_core::asset::AssetHandle;
use lumen_core::geometry::{Geometry, IndexBuffer, VertexAttribute, VertexBuffer};
use lumen_data::AssetLibraryRef;
use lumen_io::{AbstractParser, Options, ParserError, ParserFactory, ParserRef, ParserSignals};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Index widths, stored in bits 4–7 of the geometry format byte.
mod index_format {
    pub const U16: u8 = 0;
    pub const U8: u8 = 1;
    pub const U32: u8 = 2;
}

/// The only vertex component type, stored in bits 0–3.
const VERTEX_FORMAT_F32: u8 = 0;

#[derive(Serialize, Deserialize)]
struct VertexBufferPayload {
    data: Vec<f32>,
    /// `(name, size, offset)` of each attribute.
    attributes: Vec<(String, u32, u32)>,
}

#[derive(Serialize, Deserialize)]
struct GeometryPayload {
    name: String,
    format: u8,
    /// Little-endian indices at the width given by `format`.
    indices: Vec<u8>,
    vertex_buffers: Vec<VertexBufferPayload>,
}

/// Encodes the data block of a geometry container and returns it along with
/// its format byte.
///
/// 32-bit buffers keep their width. 16-bit buffers are narrowed to bytes when
/// every index fits.
pub(crate) fn encode_geometry(geometry: &Geometry) -> Result<(u8, Vec<u8>), WriterError> {
    let (index_format, indices) = match &geometry.indices {
        IndexBuffer::U32(indices) => (
            index_format::U32,
            indices.iter().flat_map(|i| i.to_le_bytes()).collect(),
        ),
        IndexBuffer::U16(indices) if indices.iter().all(|&i| i < 256) => {
            (index_format::U8, indices.iter().map(|&i| i as u8).collect())
        }
        IndexBuffer::U16(indices) => (
            index_format::U16,
            indices.iter().flat_map(|i| i.to_le_bytes()).collect(),
        ),
    };
    let format = (index_format << 4) | VERTEX_FORMAT_F32;

    let payload = GeometryPayload {
        name: geometry.name.clone(),
        format,
        indices,
        vertex_buffers: geometry
            .vertex_buffers
            .iter()
            .map(|buffer| VertexBufferPayload {
                data: buffer.data.clone(),
                attributes: buffer
                    .attributes
                    .iter()
                    .map(|a| (a.name.clone(), a.size, a.offset))
                    .collect(),
            })
            .collect(),
    };
    let bytes = rmp_serde::to_vec(&payload).map_err(|e| WriterError::Encode {
        name: geometry.name.clone(),
        reason: e.to_string(),
    })?;
    Ok((format, bytes))
}

/// Decodes the data block of a geometry container.
pub(crate) fn decode_geometry(filename: &str, data: &[u8]) -> Result<Geometry, ParserError> {
    let invalid = |reason: String| ParserError::InvalidFile {
        filename: filename.to_string(),
        reason,
    };
    let payload: GeometryPayload = rmp_serde::from_slice(data)
        .map_err(|e| invalid(format!("undecodable geometry: {e}")))?;

    if payload.format & 0xF != VERTEX_FORMAT_F32 {
        return Err(invalid(format!("unknown vertex format {}", payload.format & 0xF)));
    }
    let bytes = payload.indices;
    let indices = match payload.format >> 4 {
        index_format::U8 => IndexBuffer::U16(bytes.iter().map(|&i| u16::from(i)).collect()),
        index_format::U16 if bytes.len() % 2 == 0 => IndexBuffer::U16(
            bytes
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]))
                .collect(),
        ),
        index_format::U32 if bytes.len() % 4 == 0 => IndexBuffer::U32(
            bytes
                .chunks_exact(4)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        ),
        other => {
            return Err(invalid(format!(
                "{} index bytes do not fit index format {other}",
                bytes.len()
            )))
        }
    };

    Ok(Geometry {
        name: payload.name,
        indices,
        vertex_buffers: payload
            .vertex_buffers
            .into_iter()
            .map(|buffer| VertexBuffer {
                data: buffer.data,
                attributes: buffer
                    .attributes
                    .into_iter()
                    .map(|(name, size, offset)| VertexAttribute { name, size, offset })
                    .collect(),
            })
            .collect(),
    })
}

/// Parses `.geometry` containers.
pub struct GeometryParser {
    signals: ParserSignals,
    functions: Rc<AssetFunctions>,
}

impl GeometryParser {
    /// Creates a parser without custom asset functions.
    pub fn new() -> Rc<Self> {
        Self::with_functions(Rc::default())
    }

    /// Creates a parser resolving dependencies with `functions` first.
    pub fn with_functions(functions: Rc<AssetFunctions>) -> Rc<Self> {
        Rc::new(Self {
            signals: ParserSignals::default(),
            functions,
        })
    }

    /// A factory to register under the `geometry` extension.
    pub fn factory() -> ParserFactory {
        Rc::new(|| -> ParserRef { GeometryParser::new() })
    }

    /// Like [`factory`](Self::factory), with custom asset functions.
    pub fn factory_with(functions: Rc<AssetFunctions>) -> ParserFactory {
        Rc::new(move || -> ParserRef { GeometryParser::with_functions(functions.clone()) })
    }
}

impl AbstractParser for GeometryParser {
    fn parse(
        &self,
        filename: &str,
        resolved_filename: &str,
        options: &Options,
        data: &[u8],
        library: &AssetLibraryRef,
    ) -> Result<(), ParserError> {
        let context = ResolveContext::new(options, library, resolved_filename);
        parse_container(
            &self.signals,
            &self.functions,
            ContainerKind::Geometry,
            resolved_filename,
            data,
            &context,
            |_, payload| {
                let geometry = decode_geometry(resolved_filename, payload)?;
                log::debug!(
                    "GeometryParser: '{filename}' has {} vertices, {} indices",
                    geometry.num_vertices(),
                    geometry.indices.len()
                );
                let geometry = (options.geometry_function())(filename, AssetHandle::new(geometry));
                library.set_geometry(filename, geometry);
                Ok(())
            },
        )
    }

    fn signals(&self) -> &ParserSignals {
        &self.signals
    }
}

/// Writes `.geometry` containers.
pub struct GeometryWriter;

impl GeometryWriter {
    /// Encodes `geometry` as a standalone container.
    pub fn write(geometry: &Geometry) -> Result<Vec<u8>, WriterError> {
        let (_, data) = encode_geometry(geometry)?;
        Ok(Container::write(ContainerKind::Geometry, &[], &data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::device::HeadlessContext;
    use lumen_data::AssetLibrary;

    fn triangle_strip(indices: IndexBuffer) -> Geometry {
        Geometry {
            name: "strip".to_string(),
            indices,
            vertex_buffers: vec![VertexBuffer {
                data: (0..9).map(|v| v as f32).collect(),
                attributes: vec![VertexAttribute {
                    name: "position".to_string(),
                    size: 3,
                    offset: 0,
                }],
            }],
        }
    }

    fn format_of(geometry: &Geometry) -> u8 {
        encode_geometry(geometry).unwrap().0 >> 4
    }

    #[test]
    fn index_width_is_the_narrowest_that_fits() {
        assert_eq!(format_of(&triangle_strip(IndexBuffer::U16(vec![0, 1, 255]))), index_format::U8);
        assert_eq!(
            format_of(&triangle_strip(IndexBuffer::U16(vec![0, 1, 256]))),
            index_format::U16
        );
        assert_eq!(format_of(&triangle_strip(IndexBuffer::U32(vec![0, 1, 2]))), index_format::U32);
    }

    #[test]
    fn index_32bit_serialization() {
        let indices: Vec<u32> = (0..300).map(|i| i * 1000).collect();
        let original = triangle_strip(IndexBuffer::U32(indices));
        let bytes = GeometryWriter::write(&original).unwrap();

        let library = AssetLibrary::new(Rc::new(HeadlessContext::new()));
        let options = Options::new(&library);
        GeometryParser::new()
            .parse("strip.geometry", "strip.geometry", &options, &bytes, &library)
            .unwrap();

        let parsed = library.geometry("strip.geometry").unwrap();
        assert!(parsed.indices.is_32bit());
        assert_eq!(parsed.indices.len(), original.indices.len());
        assert_eq!(parsed.num_vertices(), original.num_vertices());
        for i in 0..original.indices.len() {
            assert_eq!(parsed.indices.get(i), original.indices.get(i));
        }
    }

    #[test]
    fn byte_indices_widen_back_to_16_bits() {
        let original = triangle_strip(IndexBuffer::U16(vec![0, 1, 2]));
        let (_, data) = encode_geometry(&original).unwrap();
        let decoded = decode_geometry("strip", &data).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn truncated_indices_are_rejected() {
        let payload = GeometryPayload {
            name: "broken".to_string(),
            format: index_format::U32 << 4,
            indices: vec![0, 0, 0],
            vertex_buffers: Vec::new(),
        };
        let data = rmp_serde::to_vec(&payload).unwrap();
        assert_eq!(
            decode_geometry("broken", &data).unwrap_err().type_tag(),
            "InvalidFile"
        );
    }
}
