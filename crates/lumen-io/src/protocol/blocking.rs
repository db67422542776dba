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
use super::{FetchCallback, FetchRequest, Fetched, Protocol, ProtocolRef};
use crate::error::FetchError;

/// Makes any protocol complete synchronously.
///
/// Used where a parser must resolve every dependency before it returns, such
/// as the effects embedded in a serialized container.
pub struct BlockingProtocol {
    inner: ProtocolRef,
}

impl BlockingProtocol {
    /// Wraps `inner`.
    pub fn new(inner: ProtocolRef) -> Self {
        Self { inner }
    }
}

impl Protocol for BlockingProtocol {
    fn fetch(&self, request: FetchRequest, on_complete: FetchCallback) {
        on_complete(self.inner.fetch_blocking(&request));
    }

    fn fetch_blocking(&self, request: &FetchRequest) -> Result<Fetched, FetchError> {
        self.inner.fetch_blocking(request)
    }
}
