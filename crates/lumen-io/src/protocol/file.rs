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
use std::io::ErrorKind;

/// Reads files from the local filesystem on the calling thread.
///
/// [`Protocol::fetch`] completes before it returns.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileProtocol;

impl FileProtocol {
    /// Creates a filesystem protocol.
    pub fn new() -> Self {
        Self
    }

    /// Resolves and reads `request`. Shared with the threaded protocol's worker.
    pub(crate) fn read(request: &FetchRequest) -> Result<Fetched, FetchError> {
        let candidates = request.candidates();
        for candidate in &candidates {
            match std::fs::read(candidate) {
                Ok(data) => {
                    log::trace!("FileProtocol: read {} bytes from '{}'", data.len(), candidate);
                    return Ok(Fetched {
                        resolved_filename: candidate.clone(),
                        data,
                    });
                }
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(FetchError::Io {
                        filename: candidate.clone(),
                        reason: e.to_string(),
                    })
                }
            }
        }

        Err(FetchError::NotFound {
            filename: request.filename.clone(),
            tried: candidates,
        })
    }
}

impl Protocol for FileProtocol {
    fn fetch(&self, request: FetchRequest, on_complete: FetchCallback) {
        on_complete(Self::read(&request));
    }

    fn fetch_blocking(&self, request: &FetchRequest) -> Result<Fetched, FetchError> {
        Self::read(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn resolves_against_include_paths() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::create_dir(dir.path().join("shaders"))?;
        std::fs::write(dir.path().join("shaders/Common.glsl"), b"// common")?;

        let root = dir.path().to_string_lossy().into_owned();
        let request = FetchRequest {
            filename: "Common.glsl".to_string(),
            include_paths: vec![root.clone(), format!("{root}/shaders")],
        };

        let fetched = FileProtocol::new().fetch_blocking(&request)?;
        assert_eq!(fetched.resolved_filename, format!("{root}/shaders/Common.glsl"));
        assert_eq!(fetched.data, b"// common");
        Ok(())
    }

    #[test]
    fn fetch_completes_before_returning() {
        let outcome = Rc::new(RefCell::new(None));
        let sink = outcome.clone();
        FileProtocol::new().fetch(
            FetchRequest::new("does/not/exist.bin"),
            Box::new(move |result| *sink.borrow_mut() = Some(result)),
        );

        let taken = outcome.borrow_mut().take();
        match taken {
            Some(Err(FetchError::NotFound { filename, tried })) => {
                assert_eq!(filename, "does/not/exist.bin");
                assert_eq!(tried, vec!["does/not/exist.bin".to_string()]);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
