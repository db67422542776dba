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
//! Single-file loading.

use crate::error::{FetchError, LoadError, ParserError};
use crate::options::{Options, ParserErrorPolicy};
use crate::parser::ParserRef;
use crate::path;
use crate::protocol::{FetchRequest, Fetched};
use lumen_core::{Signal, SignalSlot};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Signals every loader exposes.
#[derive(Default, Debug)]
pub struct LoaderSignals {
    /// Fetch progress, in `[0, 1]`.
    pub progress: Signal<f32>,
    /// The file was fetched and its parser, if any, completed.
    pub complete: Signal<()>,
    /// The load failed. When [`LoadError::is_fatal`] is `true` the loader
    /// will not complete.
    pub error: Signal<LoadError>,
}

/// Fetches one file and hands it to the parser registered for its extension.
pub trait AbstractLoader {
    /// Starts loading `filename` with `options`.
    fn load(&self, filename: &str, options: Options);

    /// The requested filename.
    fn filename(&self) -> String;

    /// The path the file was read from, once fetched.
    fn resolved_filename(&self) -> String;

    /// The fetched bytes, once fetched.
    fn data(&self) -> Rc<[u8]>;

    /// The loader's signals.
    fn signals(&self) -> &LoaderSignals;
}

/// Shared ownership of a loader.
pub type LoaderRef = Rc<dyn AbstractLoader>;

#[derive(Default)]
struct LoaderState {
    filename: String,
    resolved_filename: String,
    data: Option<Rc<[u8]>>,
    options: Option<Options>,
    parser: Option<ParserRef>,
    parser_slots: Vec<SignalSlot>,
}

/// The default [`AbstractLoader`].
///
/// The loader holds itself weakly in every callback it hands out. Dropping the
/// last strong reference cancels the load: late fetch results and parser
/// signals are ignored.
pub struct Loader {
    self_ref: Weak<Loader>,
    signals: LoaderSignals,
    state: RefCell<LoaderState>,
}

impl Loader {
    /// Creates an idle loader.
    pub fn new() -> Rc<Self> {
        Rc::new_cyclic(|self_ref| Self {
            self_ref: self_ref.clone(),
            signals: LoaderSignals::default(),
            state: RefCell::new(LoaderState::default()),
        })
    }

    /// Creates an idle loader behind the trait object.
    pub fn create() -> LoaderRef {
        Self::new()
    }

    fn on_fetched(&self, result: Result<Fetched, FetchError>) {
        let fetched = match result {
            Ok(fetched) => fetched,
            Err(source) => {
                let filename = self.filename();
                log::error!("Loader: failed to fetch '{filename}': {source}");
                self.signals
                    .error
                    .execute(&LoadError::Fetch { filename, source });
                return;
            }
        };

        {
            let mut state = self.state.borrow_mut();
            log::debug!(
                "Loader: fetched '{}' from '{}' ({} bytes)",
                state.filename,
                fetched.resolved_filename,
                fetched.data.len()
            );
            state.resolved_filename = fetched.resolved_filename;
            state.data = Some(Rc::from(fetched.data));
        }

        self.signals.progress.execute(&1.0);
        self.process_data();
    }

    fn process_data(&self) {
        let (filename, resolved_filename, data, options) = {
            let state = self.state.borrow();
            let Some(options) = state.options.clone() else {
                return;
            };
            (
                state.filename.clone(),
                state.resolved_filename.clone(),
                state.data.clone().unwrap_or_else(|| Rc::from(Vec::new())),
                options,
            )
        };

        let Some(library) = options.asset_library() else {
            log::debug!("Loader: asset library dropped before '{filename}' was parsed");
            return;
        };

        let parser = path::extension(&filename).and_then(|extension| options.parser(&extension));
        let Some(parser) = parser else {
            log::debug!("Loader: no parser for '{filename}', storing raw bytes");
            library.set_blob(filename, data);
            self.signals.complete.execute(&());
            return;
        };

        let on_complete = {
            let this = self.self_ref.clone();
            parser.signals().complete.connect(move |_| {
                if let Some(this) = this.upgrade() {
                    this.parser_complete_handler();
                }
            })
        };
        let on_error = {
            let this = self.self_ref.clone();
            parser.signals().error.connect(move |error: &ParserError| {
                if let Some(this) = this.upgrade() {
                    let fatal = error.is_fatal();
                    this.parser_error_handler(error.clone(), fatal);
                }
            })
        };
        {
            let mut state = self.state.borrow_mut();
            state.parser = Some(parser.clone());
            state.parser_slots = vec![on_complete, on_error];
        }

        if let Err(error) = parser.parse(&filename, &resolved_filename, &options, &data, &library) {
            self.parser_error_handler(error, true);
        }
    }

    fn parser_complete_handler(&self) {
        let released = self.release_parser();
        self.signals.complete.execute(&());
        drop(released);
    }

    fn parser_error_handler(&self, source: ParserError, fatal: bool) {
        let (filename, policy) = {
            let state = self.state.borrow();
            let policy = state
                .options
                .as_ref()
                .map(Options::parser_error_policy)
                .unwrap_or_default();
            (state.filename.clone(), policy)
        };

        let released = if fatal { self.release_parser() } else { None };

        match policy {
            ParserErrorPolicy::Propagate => {
                self.signals.error.execute(&LoadError::Parse {
                    filename,
                    source,
                    fatal,
                });
            }
            ParserErrorPolicy::Swallow => {
                log::error!("Loader: parser error swallowed for '{filename}': {source}");
                if fatal {
                    self.signals.complete.execute(&());
                }
            }
        }
        drop(released);
    }

    fn release_parser(&self) -> Option<(ParserRef, Vec<SignalSlot>)> {
        let mut state = self.state.borrow_mut();
        let parser = state.parser.take()?;
        Some((parser, std::mem::take(&mut state.parser_slots)))
    }
}

impl AbstractLoader for Loader {
    fn load(&self, filename: &str, options: Options) {
        let uri = (options.uri_function())(filename);
        let protocol = (options.protocol_function())(&uri);
        let request = FetchRequest {
            filename: uri,
            include_paths: options.include_paths().to_vec(),
        };

        {
            let mut state = self.state.borrow_mut();
            state.filename = filename.to_string();
            state.resolved_filename.clear();
            state.data = None;
            state.options = Some(options);
        }

        log::debug!("Loader: loading '{filename}'");
        let this = self.self_ref.clone();
        protocol.fetch(
            request,
            Box::new(move |result| match this.upgrade() {
                Some(this) => this.on_fetched(result),
                None => log::debug!("Loader: dropped before its fetch completed"),
            }),
        );
    }

    fn filename(&self) -> String {
        self.state.borrow().filename.clone()
    }

    fn resolved_filename(&self) -> String {
        self.state.borrow().resolved_filename.clone()
    }

    fn data(&self) -> Rc<[u8]> {
        self.state
            .borrow()
            .data
            .clone()
            .unwrap_or_else(|| Rc::from(Vec::new()))
    }

    fn signals(&self) -> &LoaderSignals {
        &self.signals
    }
}
