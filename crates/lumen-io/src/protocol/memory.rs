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
use super::{FetchCallback, FetchRequest, Fetched, Protocol};
use crate::error::FetchError;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};

struct PendingFetch {
    filename: String,
    result: Result<Fetched, FetchError>,
    on_complete: FetchCallback,
}

/// Serves files from an in-memory map.
///
/// In deferred mode, fetches are resolved immediately but their callbacks are
/// held until one of the `deliver*` methods is called, which lets callers
/// choose the order in which asynchronous completions arrive.
#[derive(Default)]
pub struct MemoryProtocol {
    files: RefCell<HashMap<String, Vec<u8>>>,
    deferred: bool,
    pending: RefCell<VecDeque<PendingFetch>>,
    num_fetches: Cell<usize>,
}

impl MemoryProtocol {
    /// Creates a protocol that completes fetches before returning.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a protocol that holds completions until delivered.
    pub fn deferred() -> Self {
        Self {
            deferred: true,
            ..Self::default()
        }
    }

    /// Adds or replaces a file.
    pub fn insert(&self, filename: impl Into<String>, data: impl Into<Vec<u8>>) -> &Self {
        self.files.borrow_mut().insert(filename.into(), data.into());
        self
    }

    /// Number of fetches requested so far.
    pub fn num_fetches(&self) -> usize {
        self.num_fetches.get()
    }

    /// Number of completions waiting to be delivered.
    pub fn num_pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// The requested filenames of the waiting completions, oldest first.
    pub fn pending_filenames(&self) -> Vec<String> {
        self.pending
            .borrow()
            .iter()
            .map(|fetch| fetch.filename.clone())
            .collect()
    }

    /// Delivers the oldest waiting completion. Returns `false` if none waits.
    pub fn deliver_next(&self) -> bool {
        let next = self.pending.borrow_mut().pop_front();
        match next {
            Some(fetch) => {
                (fetch.on_complete)(fetch.result);
                true
            }
            None => false,
        }
    }

    /// Delivers the oldest waiting completion for `filename`.
    pub fn deliver(&self, filename: &str) -> bool {
        let next = {
            let mut pending = self.pending.borrow_mut();
            pending
                .iter()
                .position(|fetch| fetch.filename == filename)
                .and_then(|index| pending.remove(index))
        };
        match next {
            Some(fetch) => {
                (fetch.on_complete)(fetch.result);
                true
            }
            None => false,
        }
    }

    /// Delivers completions until none waits, including those queued by the
    /// callbacks themselves. Returns how many were delivered.
    pub fn deliver_all(&self) -> usize {
        let mut delivered = 0;
        while self.deliver_next() {
            delivered += 1;
        }
        delivered
    }

    fn resolve(&self, request: &FetchRequest) -> Result<Fetched, FetchError> {
        let files = self.files.borrow();
        let candidates = request.candidates();
        candidates
            .iter()
            .find_map(|candidate| {
                files.get(candidate).map(|data| Fetched {
                    resolved_filename: candidate.clone(),
                    data: data.clone(),
                })
            })
            .ok_or_else(|| FetchError::NotFound {
                filename: request.filename.clone(),
                tried: candidates.clone(),
            })
    }
}

impl Protocol for MemoryProtocol {
    fn fetch(&self, request: FetchRequest, on_complete: FetchCallback) {
        self.num_fetches.set(self.num_fetches.get() + 1);
        let result = self.resolve(&request);
        if self.deferred {
            self.pending.borrow_mut().push_back(PendingFetch {
                filename: request.filename,
                result,
                on_complete,
            });
        } else {
            on_complete(result);
        }
    }

    fn fetch_blocking(&self, request: &FetchRequest) -> Result<Fetched, FetchError> {
        self.num_fetches.set(self.num_fetches.get() + 1);
        self.resolve(request)
    }
}
