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
//! Protocols turn a filename into bytes.
//!
//! A protocol resolves a [`FetchRequest`] against its include paths, from the
//! most recently added path back to the oldest, then the filename as given.
//! The first candidate that exists wins.
//!
//! Completion is reported through a callback. A protocol may call it before
//! [`Protocol::fetch`] returns ([`FileProtocol`], [`BlockingProtocol`]) or
//! later on the owning thread ([`MemoryProtocol`] in deferred mode,
//! [`ThreadedFileProtocol`] after [`ThreadedFileProtocol::poll`]).

mod blocking;
mod file;
mod memory;
mod threaded;

pub use self::blocking::BlockingProtocol;
pub use self::file::FileProtocol;
pub use self::memory::MemoryProtocol;
pub use self::threaded::ThreadedFileProtocol;

use crate::error::FetchError;
use crate::path;
use std::rc::Rc;

/// A request to fetch the bytes of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// The filename after URI rewriting.
    pub filename: String,
    /// Folders the filename may be relative to, oldest first.
    pub include_paths: Vec<String>,
}

impl FetchRequest {
    /// Creates a request without include paths.
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            include_paths: Vec::new(),
        }
    }

    /// Every path the request may resolve to, in lookup order.
    pub fn candidates(&self) -> Vec<String> {
        if path::is_absolute(&self.filename) {
            return vec![self.filename.clone()];
        }

        let mut candidates: Vec<String> = self
            .include_paths
            .iter()
            .rev()
            .filter(|folder| !folder.is_empty())
            .map(|folder| path::join(folder, &self.filename))
            .collect();
        candidates.push(self.filename.clone());
        candidates.dedup();
        candidates
    }
}

/// The bytes of a fetched file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    /// The candidate path that was read.
    pub resolved_filename: String,
    /// The file contents.
    pub data: Vec<u8>,
}

/// Receives the outcome of a [`Protocol::fetch`].
pub type FetchCallback = Box<dyn FnOnce(Result<Fetched, FetchError>)>;

/// Shared ownership of a protocol.
pub type ProtocolRef = Rc<dyn Protocol>;

/// A source of file contents.
pub trait Protocol {
    /// Fetches the file described by `request` and reports the outcome to
    /// `on_complete`, exactly once.
    fn fetch(&self, request: FetchRequest, on_complete: FetchCallback);

    /// Fetches the file described by `request` before returning.
    fn fetch_blocking(&self, request: &FetchRequest) -> Result<Fetched, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_try_the_newest_include_path_first() {
        let request = FetchRequest {
            filename: "Common.glsl".to_string(),
            include_paths: vec!["effects".to_string(), "effects/lit".to_string()],
        };
        assert_eq!(
            request.candidates(),
            vec![
                "effects/lit/Common.glsl".to_string(),
                "effects/Common.glsl".to_string(),
                "Common.glsl".to_string(),
            ]
        );
    }

    #[test]
    fn absolute_filenames_ignore_include_paths() {
        let request = FetchRequest {
            filename: "/data/Common.glsl".to_string(),
            include_paths: vec!["effects".to_string()],
        };
        assert_eq!(request.candidates(), vec!["/data/Common.glsl".to_string()]);
    }
}
