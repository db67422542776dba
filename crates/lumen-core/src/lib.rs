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

//! # Lumen Core
//!
//! Foundational crate containing the asset value types, the typed signal used
//! by the loading pipeline, and the device contract that receives uploads.

pub mod asset;
pub mod device;
pub mod effect;
pub mod event;
pub mod geometry;
pub mod material;
pub mod texture;
pub mod value;

pub use event::{Signal, SignalSlot};
