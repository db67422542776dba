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
mod common;

use anyhow::Result;
use common::{events, library, record, register_parsers};
use lumen_core::asset::AssetHandle;
use lumen_core::geometry::{Geometry, IndexBuffer, VertexAttribute, VertexBuffer};
use lumen_core::material::Material;
use lumen_core::value::DataValue;
use lumen_data::{Dependency, SubScene};
use lumen_io::{AbstractLoader, AbstractParser, LoadError, Loader, Options};
use lumen_lanes::{SceneParser, SceneWriter, WriterOptions};
use std::path::Path;

fn triangle() -> AssetHandle<Geometry> {
    AssetHandle::new(Geometry {
        name: "triangle".to_string(),
        indices: IndexBuffer::U16(vec![0, 1, 2]),
        vertex_buffers: vec![VertexBuffer {
            data: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            attributes: vec![VertexAttribute {
                name: "position".to_string(),
                size: 3,
                offset: 0,
            }],
        }],
    })
}

fn external(folder: &Path) -> WriterOptions {
    WriterOptions {
        embed: false,
        output_folder: folder.to_path_buf(),
    }
}

fn path_in(folder: &Path, name: &str) -> String {
    folder.join(name).display().to_string()
}

// --- External dependencies ---

#[test]
fn external_dependencies_are_written_next_to_the_scene() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let source = library();
    let geometry = triangle();
    source.set_geometry("triangle.geometry", geometry.clone());
    let mut material = Material::new("red");
    material.set("diffuseColor", DataValue::Float4([1.0, 0.0, 0.0, 1.0]));
    let material = AssetHandle::new(material);
    source.set_material("red.material", material.clone());

    let mut dependency = Dependency::new();
    let geometry_id = dependency.register_dependency(&geometry);
    let material_id = dependency.register_dependency(&material);
    let bytes = SceneWriter::write(b"nodes", &mut dependency, &source, &external(dir.path()))?;
    let scene_path = path_in(dir.path(), "level.scene");
    std::fs::write(&scene_path, &bytes)?;
    assert!(dir.path().join("triangle.geometry").exists());
    assert!(dir.path().join("red.material").exists());

    let target = library();
    let parser = SceneParser::new();
    let log = events();
    let _slots = record(&*parser, &log);
    parser.parse("level.scene", &scene_path, &Options::new(&target), &bytes, &target)?;

    assert_eq!(*log.borrow(), vec!["complete"]);
    let scene = target.scene("level.scene").expect("scene stored");
    assert_eq!(scene.payload, b"nodes");
    let parsed = scene.dependency.reference::<Geometry>(geometry_id).unwrap();
    assert_eq!(parsed.vertex_buffers, geometry.vertex_buffers);
    assert!(target.geometry("triangle.geometry").is_some());
    let parsed = scene.dependency.reference::<Material>(material_id).unwrap();
    assert_eq!(parsed.get("diffuseColor"), material.get("diffuseColor"));
    Ok(())
}

#[test]
fn a_missing_external_dependency_is_reported_and_the_scene_completes() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let source = library();
    let geometry = triangle();
    source.set_geometry("triangle.geometry", geometry.clone());
    let mut dependency = Dependency::new();
    let geometry_id = dependency.register_dependency(&geometry);
    let bytes = SceneWriter::write(b"nodes", &mut dependency, &source, &external(dir.path()))?;
    std::fs::remove_file(dir.path().join("triangle.geometry"))?;

    let target = library();
    let parser = SceneParser::new();
    let log = events();
    let _slots = record(&*parser, &log);
    let scene_path = path_in(dir.path(), "level.scene");
    parser.parse("level.scene", &scene_path, &Options::new(&target), &bytes, &target)?;

    assert_eq!(
        *log.borrow(),
        vec!["error:MissingGeometryDependency", "complete"]
    );
    let scene = target.scene("level.scene").expect("scene stored");
    assert!(!scene.dependency.reference_exists::<Geometry>(geometry_id));
    Ok(())
}

// --- Linked assets ---

#[test]
fn linked_scenes_are_parsed_once_and_shared() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let source = library();

    let geometry = triangle();
    let mut child_dependency = Dependency::new();
    child_dependency.register_dependency(&geometry);
    let child_bytes = SceneWriter::write(
        b"child",
        &mut child_dependency,
        &source,
        &WriterOptions::default(),
    )?;
    let child_path = path_in(dir.path(), "child.scene");
    std::fs::write(&child_path, &child_bytes)?;

    let child = AssetHandle::new(SubScene {
        name: "child".to_string(),
        ..SubScene::default()
    });
    source.set_scene(child_path.clone(), child.clone());
    let mut dependency = Dependency::new();
    let first = dependency.register_dependency(&child);
    let bytes = SceneWriter::write(b"parent", &mut dependency, &source, &external(dir.path()))?;
    let parent_path = path_in(dir.path(), "parent.scene");
    std::fs::write(&parent_path, &bytes)?;

    let target = library();
    let mut options = Options::new(&target);
    register_parsers(&mut options);
    let loader = Loader::create();
    let log = events();
    let sink = log.clone();
    let _complete = loader
        .signals()
        .complete
        .connect(move |_| sink.borrow_mut().push("complete".to_string()));
    let sink = log.clone();
    let _error = loader.signals().error.connect(move |error: &LoadError| {
        sink.borrow_mut().push(format!("error:{}", error.type_tag()))
    });
    loader.load(&parent_path, options);

    assert_eq!(*log.borrow(), vec!["complete"]);
    let parent = target.scene(&parent_path).expect("parent stored");
    assert_eq!(parent.payload, b"parent");
    let linked = parent.dependency.reference::<SubScene>(first).unwrap();
    assert_eq!(linked.payload, b"child");
    assert!(linked.ptr_eq(&target.scene(&child_path).unwrap()));
    assert_eq!(linked.dependency.table::<Geometry>().references().len(), 1);
    Ok(())
}
