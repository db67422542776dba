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

//! CPU-side geometry: one index buffer and any number of vertex buffers.

use crate::asset::Asset;

/// Triangle indices, stored at the width they were authored with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexBuffer {
    /// 16-bit indices.
    U16(Vec<u16>),
    /// 32-bit indices.
    U32(Vec<u32>),
}

impl IndexBuffer {
    /// Number of indices.
    pub fn len(&self) -> usize {
        match self {
            IndexBuffer::U16(data) => data.len(),
            IndexBuffer::U32(data) => data.len(),
        }
    }

    /// Returns `true` if the buffer holds no index.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the index at `position`, widened to 32 bits.
    pub fn get(&self, position: usize) -> Option<u32> {
        match self {
            IndexBuffer::U16(data) => data.get(position).map(|&i| u32::from(i)),
            IndexBuffer::U32(data) => data.get(position).copied(),
        }
    }

    /// Iterates over every index, widened to 32 bits.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// Returns `true` for 32-bit buffers.
    pub fn is_32bit(&self) -> bool {
        matches!(self, IndexBuffer::U32(_))
    }
}

impl Default for IndexBuffer {
    fn default() -> Self {
        IndexBuffer::U16(Vec::new())
    }
}

/// One named attribute interleaved in a vertex buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexAttribute {
    /// The attribute name, e.g. `position`.
    pub name: String,
    /// Number of float components.
    pub size: u32,
    /// Offset of the first component within a vertex, in floats.
    pub offset: u32,
}

/// Interleaved float vertex data.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VertexBuffer {
    /// The raw components.
    pub data: Vec<f32>,
    /// The attributes stored in each vertex.
    pub attributes: Vec<VertexAttribute>,
}

impl VertexBuffer {
    /// Number of floats per vertex.
    pub fn vertex_size(&self) -> usize {
        self.attributes
            .iter()
            .map(|a| (a.offset + a.size) as usize)
            .max()
            .unwrap_or(0)
    }

    /// Number of vertices in the buffer.
    pub fn num_vertices(&self) -> usize {
        match self.vertex_size() {
            0 => 0,
            size => self.data.len() / size,
        }
    }

    /// Returns the attribute named `name`.
    pub fn attribute(&self, name: &str) -> Option<&VertexAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

/// An indexed triangle mesh.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Geometry {
    /// The geometry name.
    pub name: String,
    /// Triangle indices.
    pub indices: IndexBuffer,
    /// Vertex buffers sharing the same vertex count.
    pub vertex_buffers: Vec<VertexBuffer>,
}

impl Geometry {
    /// Number of vertices, read from the first vertex buffer.
    pub fn num_vertices(&self) -> usize {
        self.vertex_buffers
            .first()
            .map(VertexBuffer::num_vertices)
            .unwrap_or(0)
    }

    /// Returns `true` if one of the vertex buffers declares `name`.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.vertex_buffers.iter().any(|vb| vb.attribute(name).is_some())
    }
}

impl Asset for Geometry {}
