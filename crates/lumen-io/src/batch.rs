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
//! Loading a set of files as one operation.

use crate::error::{BatchLoadError, LoadError};
use crate::loader::LoaderRef;
use crate::options::Options;
use lumen_core::{Signal, SignalSlot};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Signals of a [`BatchLoader`].
#[derive(Default, Debug)]
pub struct BatchSignals {
    /// Finished files over files started since the batch was last idle.
    pub progress: Signal<f32>,
    /// Every started file finished and nothing is queued.
    pub complete: Signal<()>,
    /// One file reported an error.
    pub error: Signal<BatchLoadError>,
}

struct QueuedFile {
    filename: String,
    options: Option<Options>,
    loader: Option<LoaderRef>,
}

struct InFlight {
    ticket: u64,
    filename: String,
    // Kept alive until the file finishes.
    _loader: LoaderRef,
    _slots: [SignalSlot; 2],
}

#[derive(Default)]
struct BatchState {
    files_queue: Vec<QueuedFile>,
    loading: Vec<InFlight>,
    // Taken out of the queue by a running pass and not started yet.
    pending: usize,
    next_ticket: u64,
    num_started: usize,
    num_finished: usize,
}

impl BatchState {
    fn is_idle(&self) -> bool {
        self.files_queue.is_empty() && self.loading.is_empty() && self.pending == 0
    }
}

/// Queues files and loads them together.
///
/// Each queued entry is loaded once per [`BatchLoader::load`]: queuing the same
/// filename twice loads it twice, and the file that finishes last wins in the
/// library. A file finishes when its loader completes or reports a fatal
/// error, whichever comes first; `complete` fires once the last started file
/// finishes and the queue is empty.
///
/// Progress reports finished files over files started since the batch was last
/// idle, so it reaches `1.0` exactly when `complete` is about to fire.
pub struct BatchLoader {
    self_ref: Weak<BatchLoader>,
    options: RefCell<Options>,
    signals: BatchSignals,
    state: RefCell<BatchState>,
}

impl BatchLoader {
    /// Creates an empty batch whose files use clones of `options` by default.
    pub fn new(options: Options) -> Rc<Self> {
        Rc::new_cyclic(|self_ref| Self {
            self_ref: self_ref.clone(),
            options: RefCell::new(options),
            signals: BatchSignals::default(),
            state: RefCell::new(BatchState::default()),
        })
    }

    /// The batch's signals.
    pub fn signals(&self) -> &BatchSignals {
        &self.signals
    }

    /// A clone of the default options.
    pub fn options(&self) -> Options {
        self.options.borrow().clone()
    }

    /// Replaces the default options. Files already started keep theirs.
    pub fn set_options(&self, options: Options) {
        *self.options.borrow_mut() = options;
    }

    /// Queues `filename` with the default options and loader.
    pub fn queue(&self, filename: impl Into<String>) -> &Self {
        self.queue_with(filename, None, None)
    }

    /// Queues `filename`, optionally overriding its options and its loader.
    pub fn queue_with(
        &self,
        filename: impl Into<String>,
        options: Option<Options>,
        loader: Option<LoaderRef>,
    ) -> &Self {
        self.state.borrow_mut().files_queue.push(QueuedFile {
            filename: filename.into(),
            options,
            loader,
        });
        self
    }

    /// Number of files waiting for the next [`BatchLoader::load`].
    pub fn num_queued(&self) -> usize {
        self.state.borrow().files_queue.len()
    }

    /// Number of files started and not finished.
    pub fn num_loading(&self) -> usize {
        self.state.borrow().loading.len()
    }

    /// Returns `true` if nothing is queued or loading.
    pub fn is_idle(&self) -> bool {
        self.state.borrow().is_idle()
    }

    /// Starts every file queued before this call.
    ///
    /// Files queued while the pass runs wait for the next call, which may be
    /// made from one of the batch's own callbacks. With nothing queued and
    /// nothing loading, `complete` fires before this returns.
    pub fn load(&self) {
        let snapshot: Vec<QueuedFile> = {
            let mut state = self.state.borrow_mut();
            if state.files_queue.is_empty() {
                if state.is_idle() {
                    drop(state);
                    log::debug!("BatchLoader: nothing to load");
                    self.signals.complete.execute(&());
                }
                return;
            }
            let snapshot: Vec<QueuedFile> = state.files_queue.drain(..).collect();
            state.num_started += snapshot.len();
            state.pending += snapshot.len();
            snapshot
        };

        for entry in snapshot {
            self.start(entry);
        }
    }

    fn start(&self, entry: QueuedFile) {
        let QueuedFile {
            filename,
            options,
            loader,
        } = entry;
        let options = options.unwrap_or_else(|| self.options.borrow().clone());
        let loader = loader.unwrap_or_else(|| (options.loader_function())(&filename));

        let ticket = {
            let mut state = self.state.borrow_mut();
            let ticket = state.next_ticket;
            state.next_ticket += 1;
            ticket
        };

        let on_complete = {
            let this = self.self_ref.clone();
            loader.signals().complete.connect(move |_| {
                if let Some(this) = this.upgrade() {
                    this.finalize(ticket);
                }
            })
        };
        let on_error = {
            let this = self.self_ref.clone();
            loader.signals().error.connect(move |error: &LoadError| {
                if let Some(this) = this.upgrade() {
                    this.loader_error_handler(ticket, error);
                }
            })
        };

        {
            let mut state = self.state.borrow_mut();
            state.pending -= 1;
            state.loading.push(InFlight {
                ticket,
                filename: filename.clone(),
                _loader: loader.clone(),
                _slots: [on_complete, on_error],
            });
        }

        log::debug!("BatchLoader: starting '{filename}'");
        loader.load(&filename, options);
    }

    fn loader_error_handler(&self, ticket: u64, error: &LoadError) {
        let filename = {
            let state = self.state.borrow();
            state
                .loading
                .iter()
                .find(|file| file.ticket == ticket)
                .map(|file| file.filename.clone())
        };
        let Some(filename) = filename else {
            return;
        };

        log::error!("BatchLoader: {error}");
        self.signals.error.execute(&BatchLoadError {
            filename,
            cause: error.clone(),
        });

        if error.is_fatal() {
            self.finalize(ticket);
        }
    }

    fn finalize(&self, ticket: u64) {
        let (finished, progress, done) = {
            let mut state = self.state.borrow_mut();
            let Some(index) = state.loading.iter().position(|file| file.ticket == ticket) else {
                return;
            };
            let finished = state.loading.remove(index);
            state.num_finished += 1;
            let progress = state.num_finished as f32 / state.num_started as f32;
            let done = state.is_idle();
            if done {
                state.num_started = 0;
                state.num_finished = 0;
            }
            (finished, progress, done)
        };

        log::trace!("BatchLoader: '{}' finished", finished.filename);
        self.signals.progress.execute(&progress);

        if done {
            log::info!("BatchLoader: all files loaded");
            self.signals.complete.execute(&());
        }
        drop(finished);
    }
}
