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
//! The contract between a loader and the parser it selects for a file.

use crate::error::ParserError;
use crate::options::Options;
use lumen_core::Signal;
use lumen_data::AssetLibraryRef;
use std::rc::Rc;

/// Signals every parser exposes.
#[derive(Default, Debug)]
pub struct ParserSignals {
    /// Fraction of the parser's dependencies resolved so far, in `[0, 1]`.
    pub progress: Signal<f32>,
    /// The parser finished and stored its result in the library.
    pub complete: Signal<()>,
    /// The parser hit an error. When [`ParserError::is_fatal`] is `true` the
    /// parser will not complete.
    pub error: Signal<ParserError>,
}

/// Decodes the bytes of one file into assets stored in an
/// [`AssetLibrary`](lumen_data::AssetLibrary).
///
/// A parse ends in exactly one of three ways:
/// - `parse` returns `Err`, and no signal fires;
/// - the `complete` signal fires, possibly after non-fatal `error`s;
/// - a fatal `error` signal fires.
///
/// `complete` may fire before `parse` returns. Callers connect to the signals
/// first.
pub trait AbstractParser {
    /// Parses `data`, the contents of `resolved_filename`, which was requested
    /// as `filename`. Results are stored in `library` under `filename`.
    fn parse(
        &self,
        filename: &str,
        resolved_filename: &str,
        options: &Options,
        data: &[u8],
        library: &AssetLibraryRef,
    ) -> Result<(), ParserError>;

    /// The parser's signals.
    fn signals(&self) -> &ParserSignals;
}

/// Shared ownership of a parser.
pub type ParserRef = Rc<dyn AbstractParser>;

/// Creates a fresh parser for each file.
pub type ParserFactory = Rc<dyn Fn() -> ParserRef>;
