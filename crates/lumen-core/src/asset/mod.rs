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

//! Provides the foundational traits and primitive types for Lumen's asset system.
//!
//! This module defines the "common language" for all asset-related operations.
//! It contains the core contracts that other crates implement or use, but it has
//! no knowledge of how assets are fetched, parsed or stored.
//!
//! The key components are:
//! - The [`Asset`] trait: A marker for all types that can be treated as assets.
//! - The [`AssetHandle`]: a shared handle whose equality is instance identity.

mod handle;

pub use handle::*;

/// A marker trait for types that can be managed by the asset system.
///
/// The supertraits enforce critical safety guarantees:
/// - `Send` + `Sync`: The asset type can be safely shared and sent between threads.
///   Parsed assets may be produced on the I/O side and consumed by a renderer.
/// - `'static`: The asset type does not contain any non-static references, ensuring
///   it can be stored for the lifetime of the application.
///
/// # Examples
///
/// ```
/// use lumen_core::asset::Asset;
///
/// struct Heightmap {
///     samples: Vec<f32>,
/// }
///
/// impl Asset for Heightmap {}
/// ```
pub trait Asset: Send + Sync + 'static {}
