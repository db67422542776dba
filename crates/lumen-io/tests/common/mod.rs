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
#![allow(dead_code)]

use lumen_core::device::HeadlessContext;
use lumen_data::{AssetLibrary, AssetLibraryRef};
use lumen_io::error::AssetKind;
use lumen_io::protocol::MemoryProtocol;
use lumen_io::{AbstractParser, Options, ParserError, ParserFactory, ParserRef, ParserSignals};
use std::cell::RefCell;
use std::rc::Rc;

pub type Events = Rc<RefCell<Vec<String>>>;

pub fn events() -> Events {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn push(events: &Events, event: impl Into<String>) {
    events.borrow_mut().push(event.into());
}

pub fn library() -> AssetLibraryRef {
    AssetLibrary::new(Rc::new(HeadlessContext::new()))
}

pub fn options_with(library: &AssetLibraryRef, protocol: &Rc<MemoryProtocol>) -> Options {
    let mut options = Options::new(library);
    options.set_protocol(protocol.clone());
    options
}

/// How a [`TextParser`] behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Stores the uppercased text and completes.
    Upper,
    /// Returns an error from `parse`.
    Reject,
    /// Reports a missing dependency, then completes.
    Partial,
}

/// Stores `<filename>.parsed` blobs.
pub struct TextParser {
    mode: Mode,
    signals: ParserSignals,
}

impl TextParser {
    pub fn factory(mode: Mode) -> ParserFactory {
        Rc::new(move || -> ParserRef {
            Rc::new(TextParser {
                mode,
                signals: ParserSignals::default(),
            })
        })
    }
}

impl AbstractParser for TextParser {
    fn parse(
        &self,
        filename: &str,
        resolved_filename: &str,
        _options: &Options,
        data: &[u8],
        library: &AssetLibraryRef,
    ) -> Result<(), ParserError> {
        match self.mode {
            Mode::Reject => {
                return Err(ParserError::InvalidFile {
                    filename: resolved_filename.to_string(),
                    reason: "rejected".to_string(),
                })
            }
            Mode::Partial => self.signals.error.execute(&ParserError::MissingDependency {
                kind: AssetKind::Texture,
                path: "missing.png".to_string(),
            }),
            Mode::Upper => {}
        }
        library.set_blob(format!("{filename}.parsed"), data.to_ascii_uppercase());
        self.signals.complete.execute(&());
        Ok(())
    }

    fn signals(&self) -> &ParserSignals {
        &self.signals
    }
}
