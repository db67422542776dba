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
//! I/O services for asset loading.
//!
//! Files are fetched by a [`protocol::Protocol`], handed by a [`Loader`] to the
//! [`AbstractParser`] registered for their extension, and grouped into a single
//! operation by a [`BatchLoader`]. Everything runs on one thread: completions
//! are callbacks on [`Signal`](lumen_core::Signal)s, and the threaded protocol
//! only dispatches them when polled.

pub mod batch;
pub mod error;
pub mod loader;
pub mod options;
pub mod parser;
pub mod path;
pub mod protocol;
pub mod settings;

pub use batch::{BatchLoader, BatchSignals};
pub use error::{AssetKind, BatchLoadError, FetchError, LoadError, ParserError};
pub use loader::{AbstractLoader, Loader, LoaderRef, LoaderSignals};
pub use options::{
    AssetFunction, LoaderFunction, Options, ParserErrorPolicy, ProtocolFunction, UriFunction,
};
pub use parser::{AbstractParser, ParserFactory, ParserRef, ParserSignals};
pub use settings::{LoaderSettings, SettingsError};
