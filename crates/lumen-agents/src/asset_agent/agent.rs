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
//! The AssetAgent owns one loading session.
//!
//! It holds the [`AssetLibrary`] every parser writes into, the base
//! [`Options`] carrying the default parser registry, and the root
//! [`BatchLoader`]. Parsers and loaders only keep weak references to the
//! library: dropping the agent ends the session and cancels what is in flight.

use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use lumen_core::device::RenderContext;
use lumen_data::{AssetLibrary, AssetLibraryRef};
use lumen_io::protocol::ThreadedFileProtocol;
use lumen_io::{BatchLoader, BatchSignals, LoaderRef, LoaderSettings, Options};
use lumen_lanes::asset_lane::serializer::AssetDeserializeFunction;

use super::parsers::ParserRegistry;

/// A loading session.
pub struct AssetAgent {
    library: AssetLibraryRef,
    batch: Rc<BatchLoader>,
    parsers: ParserRegistry,
    threaded_protocol: Option<Rc<ThreadedFileProtocol>>,
}

impl AssetAgent {
    /// Creates a session uploading textures to `context`, reading files on
    /// the calling thread.
    pub fn new(context: Rc<dyn RenderContext>) -> Self {
        let library = AssetLibrary::new(context);
        let parsers = ParserRegistry::new();
        let mut options = Options::new(&library);
        parsers.install(&mut options);

        Self {
            batch: BatchLoader::new(options),
            library,
            parsers,
            threaded_protocol: None,
        }
    }

    /// Creates a session configured by `settings`.
    pub fn with_settings(
        context: Rc<dyn RenderContext>,
        settings: &LoaderSettings,
    ) -> Result<Self> {
        let mut agent = Self::new(context);
        agent.apply_settings(settings)?;
        Ok(agent)
    }

    /// Applies `settings` to the base options. Files already started keep
    /// their options.
    ///
    /// `threaded_io` switches every later fetch to a worker thread, whose
    /// results are delivered by [`update`](Self::update).
    pub fn apply_settings(&mut self, settings: &LoaderSettings) -> Result<()> {
        let mut options = self.batch.options();
        options.apply_settings(settings);

        if settings.threaded_io && self.threaded_protocol.is_none() {
            let protocol = Rc::new(
                ThreadedFileProtocol::new().context("Failed to spawn the file reading thread")?,
            );
            options.set_protocol(protocol.clone());
            self.threaded_protocol = Some(protocol);
            log::info!("AssetAgent: reading files on a worker thread");
        }

        self.batch.set_options(options);
        Ok(())
    }

    /// Registers a deserialize function for a serialized asset type. It takes
    /// precedence over the built-in handling for files started afterwards.
    pub fn register_asset_function(
        &mut self,
        asset_type: u8,
        function: AssetDeserializeFunction,
    ) {
        self.parsers.register_asset_function(asset_type, function);
        let mut options = self.batch.options();
        self.parsers.install(&mut options);
        self.batch.set_options(options);
    }

    /// The library every load of this session writes into.
    pub fn library(&self) -> &AssetLibraryRef {
        &self.library
    }

    /// A copy of the base options, to customize one file with
    /// [`queue_with`](Self::queue_with).
    pub fn options(&self) -> Options {
        self.batch.options()
    }

    /// The progress, completion and error signals of the session.
    pub fn signals(&self) -> &BatchSignals {
        self.batch.signals()
    }

    /// Queues `filename` for the next [`load`](Self::load).
    pub fn queue(&self, filename: impl Into<String>) -> &Self {
        self.batch.queue(filename);
        self
    }

    /// Queues `filename` with its own options or loader.
    pub fn queue_with(
        &self,
        filename: impl Into<String>,
        options: Option<Options>,
        loader: Option<LoaderRef>,
    ) -> &Self {
        self.batch.queue_with(filename, options, loader);
        self
    }

    /// Starts every queued file.
    ///
    /// With a synchronous protocol the session may complete before this
    /// returns. With threaded I/O completions arrive in [`update`](Self::update).
    pub fn load(&self) {
        log::debug!("AssetAgent: loading {} queued file(s)", self.batch.num_queued());
        self.batch.load();
    }

    /// Delivers the fetches that finished since the last call. Returns how
    /// many were delivered.
    pub fn update(&self) -> usize {
        self.threaded_protocol
            .as_ref()
            .map_or(0, |protocol| protocol.poll())
    }

    /// Delivers fetches until nothing is loading or `timeout` elapses.
    /// Returns `true` if the session is idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        if let Some(protocol) = &self.threaded_protocol {
            protocol.wait_idle(timeout);
        }
        self.batch.is_idle()
    }

    /// Returns `true` if nothing is queued or loading.
    pub fn is_idle(&self) -> bool {
        self.batch.is_idle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::device::HeadlessContext;
    use lumen_io::ParserErrorPolicy;

    #[test]
    fn settings_reach_the_base_options() -> Result<()> {
        let settings = LoaderSettings::from_ron_str(
            r#"(include_paths: ["assets"], platforms: ["linux"], parser_error_policy: Swallow)"#,
        )?;
        let agent = AssetAgent::with_settings(Rc::new(HeadlessContext::new()), &settings)?;

        let options = agent.options();
        assert_eq!(options.include_paths(), ["assets".to_string()]);
        assert!(options.matches_configuration_token("linux"));
        assert_eq!(options.parser_error_policy(), ParserErrorPolicy::Swallow);
        assert!(options.has_parser("effect"));
        Ok(())
    }

    #[test]
    fn an_empty_session_completes_immediately() {
        let agent = AssetAgent::new(Rc::new(HeadlessContext::new()));
        let completed = Rc::new(std::cell::Cell::new(false));
        let flag = completed.clone();
        let _slot = agent.signals().complete.connect(move |_| flag.set(true));

        agent.load();
        assert!(completed.get());
        assert!(agent.is_idle());
        assert_eq!(agent.update(), 0);
    }
}
