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
use super::file::FileProtocol;
use crate::error::FetchError;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

type FetchResult = (u64, Result<Fetched, FetchError>);

/// Reads files on a worker thread.
///
/// Results travel back over a channel and their callbacks run on the thread
/// that owns the protocol, inside [`ThreadedFileProtocol::poll`] or
/// [`ThreadedFileProtocol::wait_idle`]. Nothing happens between polls.
pub struct ThreadedFileProtocol {
    requests: Option<flume::Sender<(u64, FetchRequest)>>,
    results: flume::Receiver<FetchResult>,
    callbacks: RefCell<HashMap<u64, (String, FetchCallback)>>,
    next_id: Cell<u64>,
    worker: Option<JoinHandle<()>>,
}

impl ThreadedFileProtocol {
    /// Spawns the worker thread.
    pub fn new() -> std::io::Result<Self> {
        let (request_tx, request_rx) = flume::unbounded::<(u64, FetchRequest)>();
        let (result_tx, result_rx) = flume::unbounded::<FetchResult>();

        let worker = std::thread::Builder::new()
            .name("lumen-io-fetch".to_string())
            .spawn(move || {
                for (id, request) in request_rx.iter() {
                    let result = FileProtocol::read(&request);
                    if result_tx.send((id, result)).is_err() {
                        break;
                    }
                }
                log::trace!("ThreadedFileProtocol: worker exiting");
            })?;

        Ok(Self {
            requests: Some(request_tx),
            results: result_rx,
            callbacks: RefCell::new(HashMap::new()),
            next_id: Cell::new(0),
            worker: Some(worker),
        })
    }

    /// Number of fetches whose callback has not run yet.
    pub fn num_pending(&self) -> usize {
        self.callbacks.borrow().len()
    }

    /// Runs the callbacks of every fetch that finished. Returns how many ran.
    pub fn poll(&self) -> usize {
        let mut dispatched = 0;
        while let Ok(message) = self.results.try_recv() {
            self.dispatch(message);
            dispatched += 1;
        }
        dispatched
    }

    /// Runs callbacks as fetches finish until none is pending, including
    /// fetches started by the callbacks. Returns `false` on timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.num_pending() > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.results.recv_timeout(remaining) {
                Ok(message) => self.dispatch(message),
                Err(_) => return false,
            }
        }
        true
    }

    fn dispatch(&self, (id, result): FetchResult) {
        let entry = self.callbacks.borrow_mut().remove(&id);
        match entry {
            Some((_, on_complete)) => on_complete(result),
            None => log::warn!("ThreadedFileProtocol: result for unknown request #{id}"),
        }
    }
}

impl Protocol for ThreadedFileProtocol {
    fn fetch(&self, request: FetchRequest, on_complete: FetchCallback) {
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let filename = request.filename.clone();
        let sent = self
            .requests
            .as_ref()
            .is_some_and(|requests| requests.send((id, request)).is_ok());
        if sent {
            self.callbacks
                .borrow_mut()
                .insert(id, (filename, on_complete));
        } else {
            on_complete(Err(FetchError::Disconnected { filename }));
        }
    }

    fn fetch_blocking(&self, request: &FetchRequest) -> Result<Fetched, FetchError> {
        FileProtocol::read(request)
    }
}

impl Drop for ThreadedFileProtocol {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop.
        self.requests = None;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("ThreadedFileProtocol: worker thread panicked");
            }
        }
        let abandoned = self.callbacks.get_mut().len();
        if abandoned > 0 {
            log::debug!("ThreadedFileProtocol: dropped with {abandoned} pending fetches");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn callbacks_run_on_poll() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("data.bin");
        std::fs::write(&file, [1u8, 2, 3])?;

        let protocol = ThreadedFileProtocol::new()?;
        let received = Rc::new(RefCell::new(None));
        let sink = received.clone();
        protocol.fetch(
            FetchRequest::new(file.to_string_lossy().into_owned()),
            Box::new(move |result| *sink.borrow_mut() = Some(result)),
        );

        assert!(received.borrow().is_none());
        assert!(protocol.wait_idle(Duration::from_secs(5)));
        let data = received.borrow_mut().take().map(|r| r.map(|f| f.data));
        assert_eq!(data, Some(Ok(vec![1, 2, 3])));
        Ok(())
    }

    #[test]
    fn missing_files_report_not_found() -> anyhow::Result<()> {
        let protocol = ThreadedFileProtocol::new()?;
        let failed = Rc::new(Cell::new(false));
        let flag = failed.clone();
        protocol.fetch(
            FetchRequest::new("no/such/file.bin"),
            Box::new(move |result| {
                flag.set(matches!(result, Err(FetchError::NotFound { .. })))
            }),
        );
        assert!(protocol.wait_idle(Duration::from_secs(5)));
        assert!(failed.get());
        Ok(())
    }
}
