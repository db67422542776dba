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

//! # Lumen Data
//!
//! Storage for resolved assets: the name-keyed [`AssetLibrary`], the
//! id-keyed [`Dependency`] tables of the serialization format, and the
//! [`SubScene`] container type.

pub mod assets;
pub mod dependency;
pub mod scene;

pub use assets::{AssetLibrary, AssetLibraryRef, Assets};
pub use dependency::{Dependency, DependencyKind, ReferenceTable};
pub use scene::SubScene;
