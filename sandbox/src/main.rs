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

// Loads asset files the way an application would and reports the result.
// Run with: cargo run -p sandbox -- <files>

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use lumen_agents::AssetAgent;
use lumen_core::device::HeadlessContext;
use lumen_io::{BatchLoadError, LoaderSettings};

/// Loads asset files through a Lumen session.
#[derive(Parser, Debug)]
#[command(name = "sandbox", version, about)]
struct Cli {
    /// Files to load.
    #[arg(required = true)]
    files: Vec<String>,

    /// Folder relative filenames are looked up in. Repeatable.
    #[arg(long = "include", short = 'I')]
    include_paths: Vec<String>,

    /// Platform token matched by effect configurations. Repeatable.
    #[arg(long = "platform")]
    platforms: Vec<String>,

    /// User flag matched by effect configurations. Repeatable.
    #[arg(long = "flag")]
    user_flags: Vec<String>,

    /// RON file with loader settings, applied before the flags above.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Read files on a worker thread.
    #[arg(long)]
    threaded: bool,

    /// Seconds to wait for a threaded session.
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

impl Cli {
    fn settings(&self) -> Result<LoaderSettings> {
        let mut settings = match &self.config {
            Some(path) => LoaderSettings::load(path)
                .with_context(|| format!("Failed to read '{}'", path.display()))?,
            None => LoaderSettings::default(),
        };
        settings.include_paths.extend(self.include_paths.iter().cloned());
        settings.platforms.extend(self.platforms.iter().cloned());
        settings.user_flags.extend(self.user_flags.iter().cloned());
        settings.threaded_io |= self.threaded;
        Ok(settings)
    }
}

fn report(agent: &AssetAgent, filename: &str) {
    let library = agent.library();
    if let Some(effect) = library.effect(filename) {
        let techniques: Vec<_> = effect.technique_names().collect();
        println!("{filename}: effect '{}' with techniques {techniques:?}", effect.name());
    } else if let Some(scene) = library.scene(filename) {
        println!(
            "{filename}: scene with {} bytes of nodes, {:?}",
            scene.payload.len(),
            scene.dependency
        );
    } else if let Some(texture) = library.texture(filename) {
        println!(
            "{filename}: {}x{} texture with {} mip level(s)",
            texture.width,
            texture.height,
            texture.mip_level_count()
        );
    } else if let Some(geometry) = library.geometry(filename) {
        println!(
            "{filename}: geometry with {} vertices and {} indices",
            geometry.num_vertices(),
            geometry.indices.len()
        );
    } else if let Some(material) = library.material(filename) {
        let properties: Vec<_> = material.properties().map(|(name, _)| name).collect();
        println!("{filename}: material '{}' with {properties:?}", material.name);
    } else if let Some(blob) = library.blob(filename) {
        println!("{filename}: {} bytes", blob.len());
    } else {
        println!("{filename}: nothing loaded");
    }
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let settings = cli.settings()?;
    let agent = AssetAgent::with_settings(Rc::new(HeadlessContext::new()), &settings)?;

    let errors = Rc::new(RefCell::new(Vec::new()));
    let _on_error = agent.signals().error.connect({
        let errors = errors.clone();
        move |error: &BatchLoadError| errors.borrow_mut().push(error.to_string())
    });
    let _on_progress = agent
        .signals()
        .progress
        .connect(|progress: &f32| log::info!("sandbox: {:.0}%", progress * 100.0));

    for file in &cli.files {
        agent.queue(file.clone());
    }
    agent.load();
    if !agent.wait_idle(Duration::from_secs(cli.timeout)) {
        bail!("Loading did not finish within {} seconds", cli.timeout);
    }

    for file in &cli.files {
        report(&agent, file);
    }
    let errors = errors.borrow();
    for error in errors.iter() {
        eprintln!("{error}");
    }
    if !errors.is_empty() {
        bail!("{} file(s) failed to load", errors.len());
    }
    Ok(())
}
