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

//! Contracts for the device backend that receives uploaded assets.
//!
//! The asset pipeline never records GPU commands. It only needs to create,
//! fill and release texture storage, which is what [`RenderContext`] exposes.
//! Concrete backends live outside this workspace; [`HeadlessContext`] is a
//! recording implementation used by tools and tests.

mod context;
mod error;
mod headless;

pub use self::context::*;
pub use self::error::DeviceError;
pub use self::headless::{DeviceCall, HeadlessContext};
