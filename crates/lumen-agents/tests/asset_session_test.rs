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

use anyhow::{Context, Result};
use image::{ImageFormat, Rgba, RgbaImage};
use lumen_agents::AssetAgent;
use lumen_core::asset::AssetHandle;
use lumen_core::device::HeadlessContext;
use lumen_core::geometry::{Geometry, IndexBuffer, VertexAttribute, VertexBuffer};
use lumen_core::SignalSlot;
use lumen_data::{AssetLibrary, Dependency};
use lumen_io::{BatchLoadError, LoaderSettings, ParserError};
use lumen_lanes::asset_lane::serializer::{
    asset_type, write_dependency_block, Container, ContainerKind, ResolveContext, SerializedAsset,
};
use lumen_lanes::{SceneWriter, WriterOptions};
use std::cell::RefCell;
use std::io::Cursor;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

type Events = Rc<RefCell<Vec<String>>>;

fn record(agent: &AssetAgent, events: &Events) -> Vec<SignalSlot> {
    let signals = agent.signals();
    let sink = events.clone();
    let on_complete = signals
        .complete
        .connect(move |_| sink.borrow_mut().push("complete".to_string()));
    let sink = events.clone();
    let on_error = signals.error.connect(move |error: &BatchLoadError| {
        sink.borrow_mut()
            .push(format!("error:{}:{}", error.filename, error.cause.type_tag()))
    });
    vec![on_complete, on_error]
}

/// Writes an effect with one include and one texture, and a scene embedding
/// a geometry.
fn write_assets(root: &Path) -> Result<()> {
    let effects = root.join("effects");
    std::fs::create_dir(&effects)?;
    std::fs::write(effects.join("Common.glsl"), "float common;\n")?;

    let mut png = Vec::new();
    RgbaImage::from_pixel(2, 2, Rgba([0, 0, 255, 255]))
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    std::fs::write(effects.join("brick.png"), png)?;

    let effect = r##"{
        "name": "phong",
        "uniforms": { "uDiffuseMap": { "default": "brick.png" } },
        "passes": [{
            "vertexShader": "#pragma include \"Common.glsl\"\nvoid main() {}",
            "fragmentShader": "void main() {}"
        }]
    }"##;
    std::fs::write(effects.join("Phong.effect"), effect)?;

    let geometry = AssetHandle::new(Geometry {
        name: "point".to_string(),
        indices: IndexBuffer::U16(vec![0]),
        vertex_buffers: vec![VertexBuffer {
            data: vec![0.0, 0.0, 0.0],
            attributes: vec![VertexAttribute {
                name: "position".to_string(),
                size: 3,
                offset: 0,
            }],
        }],
    });
    let mut dependency = Dependency::new();
    dependency.register_dependency(&geometry);
    let source = AssetLibrary::new(Rc::new(HeadlessContext::new()));
    let scene = SceneWriter::write(b"nodes", &mut dependency, &source, &WriterOptions::default())?;
    std::fs::write(root.join("level.scene"), scene)?;
    Ok(())
}

fn settings(root: &Path, threaded_io: bool) -> LoaderSettings {
    LoaderSettings {
        include_paths: vec![root.display().to_string()],
        threaded_io,
        ..LoaderSettings::default()
    }
}

fn assert_loaded(agent: &AssetAgent) -> Result<()> {
    let library = agent.library();
    let effect = library
        .effect("effects/Phong.effect")
        .context("effect not loaded")?;
    let pass = &effect.technique("default").context("no default technique")?.passes[0];
    assert!(pass.vertex_shader.source.contains("float common;"));
    assert!(library.texture("brick.png").is_some());

    let scene = library.scene("level.scene").context("scene not loaded")?;
    assert_eq!(scene.payload, b"nodes");
    assert_eq!(scene.dependency.table::<Geometry>().references().len(), 1);
    Ok(())
}

// --- Sessions ---

#[test]
fn a_session_loads_effects_scenes_and_reports_failures() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_assets(dir.path())?;
    let agent = AssetAgent::with_settings(
        Rc::new(HeadlessContext::new()),
        &settings(dir.path(), false),
    )?;

    let log = Rc::new(RefCell::new(Vec::new()));
    let _slots = record(&agent, &log);
    let progress = Rc::new(RefCell::new(Vec::new()));
    let sink = progress.clone();
    let _progress = agent
        .signals()
        .progress
        .connect(move |value: &f32| sink.borrow_mut().push(*value));

    agent
        .queue("effects/Phong.effect")
        .queue("level.scene")
        .queue("missing.png");
    agent.load();

    assert_eq!(
        *log.borrow(),
        vec!["error:missing.png:FetchError", "complete"]
    );
    assert_eq!(progress.borrow().last().copied(), Some(1.0));
    assert!(agent.is_idle());
    assert_loaded(&agent)
}

#[test]
fn threaded_sessions_complete_in_update() -> Result<()> {
    let dir = tempfile::tempdir()?;
    write_assets(dir.path())?;
    let agent = AssetAgent::with_settings(
        Rc::new(HeadlessContext::new()),
        &settings(dir.path(), true),
    )?;

    let log = Rc::new(RefCell::new(Vec::new()));
    let _slots = record(&agent, &log);
    agent.queue("effects/Phong.effect").queue("level.scene");
    agent.load();
    assert!(log.borrow().is_empty());

    assert!(agent.wait_idle(Duration::from_secs(10)));
    assert_eq!(*log.borrow(), vec!["complete"]);
    assert_loaded(&agent)
}

// --- Custom asset functions ---

#[test]
fn asset_functions_serve_plugin_types() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let asset = SerializedAsset::new(asset_type::FIRST_PLUGIN, 0, 3, b"terrain".to_vec());
    let block = write_dependency_block(&[asset])?;
    std::fs::write(
        dir.path().join("world.scene"),
        Container::write(ContainerKind::Scene, &block, b"nodes"),
    )?;

    let mut agent = AssetAgent::with_settings(
        Rc::new(HeadlessContext::new()),
        &settings(dir.path(), false),
    )?;
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    agent.register_asset_function(
        asset_type::FIRST_PLUGIN,
        Rc::new(
            move |asset: &SerializedAsset,
                  _: &ResolveContext<'_>,
                  _: &mut Dependency|
                  -> Result<(), ParserError> {
                sink.borrow_mut().push(asset.id);
                Ok(())
            },
        ),
    );

    let log = Rc::new(RefCell::new(Vec::new()));
    let _slots = record(&agent, &log);
    agent.queue("world.scene").load();

    assert_eq!(*log.borrow(), vec!["complete"]);
    assert_eq!(*seen.borrow(), vec![3]);
    Ok(())
}
