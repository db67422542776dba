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
//! The effect parser.
//!
//! An effect document is JSON: techniques made of passes, each pass holding
//! GLSL sources plus attribute, uniform, macro and state declarations. Shader
//! sources may pull in other files with `#pragma include`, and uniform
//! defaults may name textures. The effect is only built once every such
//! dependency has loaded.

mod document;
mod glsl;
mod values;

pub use glsl::{GlslBlock, GlslBlockList, GlslBlockListRef};

use document::{DocumentReader, PassTemplate};
use lumen_core::asset::AssetHandle;
use lumen_core::effect::{Effect, Pass, Shader, ShaderType, States, Technique};
use lumen_core::value::DataValue;
use lumen_core::SignalSlot;
use lumen_data::{AssetLibrary, AssetLibraryRef};
use lumen_io::{
    path, AbstractParser, LoadError, LoaderRef, Options, ParserError, ParserFactory, ParserRef,
    ParserSignals,
};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::Arc;

/// Upper bound on the dependencies of one effect. Include cycles hit it.
const MAX_DEPENDENCIES: usize = 4096;

struct PendingLoad {
    id: u64,
    loader: LoaderRef,
    _slots: [SignalSlot; 2],
}

#[derive(Default)]
struct EffectState {
    filename: String,
    library: Weak<AssetLibrary>,
    name: String,
    techniques: Vec<(String, Vec<PassTemplate>)>,
    pending: Vec<PendingLoad>,
    effect: Option<AssetHandle<Effect>>,
}

/// Parses `.effect` files into [`Effect`]s.
///
/// The parser counts the dependencies it requests and the ones that finished
/// loading. The effect is built, stored in the library under the requested
/// filename and announced through `complete` once the document is parsed and
/// both counts match. The first dependency that fails ends the parse with a
/// fatal [`ParserError::DependencyLoadFailed`].
pub struct EffectParser {
    self_ref: Weak<EffectParser>,
    signals: ParserSignals,
    include_ids: Cell<u64>,
    load_ids: Cell<u64>,
    num_dependencies: Cell<usize>,
    num_loaded_dependencies: Cell<usize>,
    parsed: Cell<bool>,
    finished: Cell<bool>,
    state: RefCell<EffectState>,
}

impl EffectParser {
    /// Creates an idle parser.
    pub fn new() -> Rc<Self> {
        Rc::new_cyclic(|self_ref| Self {
            self_ref: self_ref.clone(),
            signals: ParserSignals::default(),
            include_ids: Cell::new(0),
            load_ids: Cell::new(0),
            num_dependencies: Cell::new(0),
            num_loaded_dependencies: Cell::new(0),
            parsed: Cell::new(false),
            finished: Cell::new(false),
            state: RefCell::new(EffectState::default()),
        })
    }

    /// A factory to register under the `effect` extension.
    pub fn factory() -> ParserFactory {
        Rc::new(|| -> ParserRef { EffectParser::new() })
    }

    /// The effect, once the parser completed.
    pub fn effect(&self) -> Option<AssetHandle<Effect>> {
        self.state.borrow().effect.clone()
    }

    /// Number of dependencies requested so far.
    pub fn num_dependencies(&self) -> usize {
        self.num_dependencies.get()
    }

    /// Number of dependencies that finished loading.
    pub fn num_loaded_dependencies(&self) -> usize {
        self.num_loaded_dependencies.get()
    }

    // --- Dependencies ---

    fn load_includes(
        &self,
        list: &GlslBlockListRef,
        options: &Options,
        library: &AssetLibraryRef,
    ) {
        let includes = list.borrow().includes();
        for (id, filename) in includes {
            if self.finished.get() {
                return;
            }
            self.load_include(list, id, filename, options, library);
        }
    }

    fn load_include(
        &self,
        list: &GlslBlockListRef,
        id: u64,
        filename: String,
        options: &Options,
        library: &AssetLibraryRef,
    ) {
        if !self.request_dependency() {
            return;
        }
        if let Some(data) = library.blob(&filename) {
            log::trace!("EffectParser: include '{filename}' found in the library");
            self.include_loaded(list, id, &filename, &data, options, library);
            return;
        }

        let list = list.clone();
        let include_options = options.clone();
        let on_complete = {
            let filename = filename.clone();
            move |this: &EffectParser, loader: LoaderRef| {
                let Some(library) = this.state.borrow().library.upgrade() else {
                    return;
                };
                let mut nested_options = include_options.clone();
                nested_options.add_include_path(path::folder(&loader.resolved_filename()));
                this.include_loaded(
                    &list,
                    id,
                    &filename,
                    &loader.data(),
                    &nested_options,
                    &library,
                );
            }
        };
        self.start_load(filename, options, on_complete);
    }

    fn include_loaded(
        &self,
        list: &GlslBlockListRef,
        id: u64,
        filename: &str,
        data: &[u8],
        options: &Options,
        library: &AssetLibraryRef,
    ) {
        let text = match std::str::from_utf8(data) {
            Ok(text) => text,
            Err(e) => {
                return self.fail(ParserError::InvalidFile {
                    filename: filename.to_string(),
                    reason: format!("shader includes are UTF-8 text: {e}"),
                })
            }
        };
        let contents = match GlslBlockList::parse(text, &self.include_ids) {
            Ok(contents) => contents,
            Err(e) => return self.fail(e),
        };
        let nested = contents.includes();
        list.borrow_mut().resolve(id, contents);

        for (nested_id, nested_filename) in nested {
            if self.finished.get() {
                return;
            }
            self.load_include(list, nested_id, nested_filename, options, library);
        }
        self.dependency_loaded();
    }

    fn load_texture(&self, filename: String, options: &Options, library: &AssetLibraryRef) {
        if library.texture(&filename).is_some() {
            log::trace!("EffectParser: texture '{filename}' already loaded");
            return;
        }
        if !self.request_dependency() {
            return;
        }
        self.start_load(filename, options, |this: &EffectParser, _loader: LoaderRef| {
            this.dependency_loaded()
        });
    }

    /// Counts one more dependency. Fails the parse past [`MAX_DEPENDENCIES`].
    fn request_dependency(&self) -> bool {
        let count = self.num_dependencies.get() + 1;
        if count > MAX_DEPENDENCIES {
            let filename = self.state.borrow().filename.clone();
            self.fail(ParserError::InvalidFile {
                filename,
                reason: format!("more than {MAX_DEPENDENCIES} dependencies, include cycle?"),
            });
            return false;
        }
        self.num_dependencies.set(count);
        true
    }

    /// Loads `filename` through the loader function of `options` and runs
    /// `on_complete` once it is done.
    fn start_load<F>(&self, filename: String, options: &Options, on_complete: F)
    where
        F: Fn(&EffectParser, LoaderRef) + 'static,
    {
        let loader = (options.loader_function())(&filename);
        let id = self.load_ids.get();
        self.load_ids.set(id + 1);

        let complete_slot = loader.signals().complete.connect({
            let weak = self.self_ref.clone();
            move |_| {
                let Some(this) = weak.upgrade() else {
                    return;
                };
                let Some(loader) = this.take_pending(id) else {
                    return;
                };
                if !this.finished.get() {
                    on_complete(&*this, loader);
                }
            }
        });
        let error_slot = loader.signals().error.connect({
            let weak = self.self_ref.clone();
            let filename = filename.clone();
            move |error: &LoadError| {
                if let Some(this) = weak.upgrade() {
                    this.dependency_error(id, &filename, error);
                }
            }
        });

        self.state.borrow_mut().pending.push(PendingLoad {
            id,
            loader: loader.clone(),
            _slots: [complete_slot, error_slot],
        });
        loader.load(&filename, options.clone());
    }

    fn take_pending(&self, id: u64) -> Option<LoaderRef> {
        let mut state = self.state.borrow_mut();
        let index = state.pending.iter().position(|pending| pending.id == id)?;
        Some(state.pending.swap_remove(index).loader)
    }

    fn dependency_error(&self, id: u64, dependency: &str, error: &LoadError) {
        if !error.is_fatal() {
            log::warn!("EffectParser: dependency '{dependency}' reported: {error}");
            return;
        }
        self.take_pending(id);
        if self.finished.get() {
            return;
        }
        let filename = self.state.borrow().filename.clone();
        self.fail(ParserError::DependencyLoadFailed {
            filename,
            dependency: dependency.to_string(),
            reason: error.to_string(),
        });
    }

    fn dependency_loaded(&self) {
        let loaded = self.num_loaded_dependencies.get() + 1;
        self.num_loaded_dependencies.set(loaded);
        self.signals
            .progress
            .execute(&(loaded as f32 / self.num_dependencies.get() as f32));
        self.check_complete();
    }

    // --- Completion ---

    fn check_complete(&self) {
        if self.finished.get()
            || !self.parsed.get()
            || self.num_loaded_dependencies.get() != self.num_dependencies.get()
        {
            return;
        }
        self.finished.set(true);
        if let Err(e) = self.finalize() {
            self.fail(e);
        }
    }

    fn finalize(&self) -> Result<(), ParserError> {
        let (filename, library, name, techniques) = {
            let mut state = self.state.borrow_mut();
            (
                state.filename.clone(),
                state.library.clone(),
                std::mem::take(&mut state.name),
                std::mem::take(&mut state.techniques),
            )
        };
        let Some(library) = library.upgrade() else {
            log::debug!("EffectParser: library dropped before '{filename}' completed");
            return Ok(());
        };

        let mut effect = Effect::new(name);
        let mut first = None;
        for (technique_name, templates) in techniques {
            let passes = templates
                .iter()
                .map(|template| build_pass(template, &library))
                .collect::<Result<Vec<_>, _>>()?;
            let technique = Arc::new(Technique {
                name: technique_name.clone(),
                passes,
            });
            first.get_or_insert_with(|| technique.clone());
            effect.add_technique(technique_name, technique);
        }
        if let Some(first) = first {
            if !effect.has_technique(Effect::DEFAULT_TECHNIQUE) {
                effect.add_technique(Effect::DEFAULT_TECHNIQUE, first);
            }
        }

        log::info!(
            "EffectParser: '{filename}' ready with {} technique(s)",
            effect.num_techniques()
        );
        let effect = AssetHandle::new(effect);
        library.set_effect(filename, effect.clone());
        self.state.borrow_mut().effect = Some(effect);
        self.signals.complete.execute(&());
        Ok(())
    }

    fn fail(&self, error: ParserError) {
        self.finished.set(true);
        let pending = std::mem::take(&mut self.state.borrow_mut().pending);
        drop(pending);
        self.signals.error.execute(&error);
    }
}

fn build_shader(kind: ShaderType, list: &GlslBlockListRef) -> Result<Shader, ParserError> {
    let source = list
        .borrow()
        .source()
        .ok_or_else(|| ParserError::UnresolvedDependency {
            name: "#pragma include".to_string(),
        })?;
    Ok(Shader {
        kind,
        source: format!("#define {}\n{source}", kind.stage_define()),
    })
}

fn build_pass(template: &PassTemplate, library: &AssetLibrary) -> Result<Pass, ParserError> {
    let blocks = &template.blocks;

    let mut uniforms = blocks.uniforms.clone();
    for (uniform, filename) in &blocks.textures {
        let texture = library
            .texture(filename)
            .ok_or_else(|| ParserError::InvalidValue {
                property: uniform.clone(),
                reason: format!("'{filename}' did not load as a texture"),
            })?;
        uniforms
            .default_values
            .insert(uniform.clone(), DataValue::Texture(texture));
    }

    let mut states = States::default();
    for (name, value) in &blocks.states.default_values {
        if !states.set(name, value) {
            return Err(ParserError::InvalidValue {
                property: name.clone(),
                reason: format!("a {} does not fit this state", value.type_name()),
            });
        }
    }

    Ok(Pass {
        name: template.name.clone(),
        vertex_shader: build_shader(ShaderType::Vertex, &template.vertex_shader)?,
        fragment_shader: build_shader(ShaderType::Fragment, &template.fragment_shader)?,
        attribute_bindings: blocks.attributes.clone(),
        uniform_bindings: uniforms,
        state_bindings: blocks.states.clone(),
        macro_bindings: blocks.macros.clone(),
        states,
    })
}

impl AbstractParser for EffectParser {
    fn parse(
        &self,
        filename: &str,
        resolved_filename: &str,
        options: &Options,
        data: &[u8],
        library: &AssetLibraryRef,
    ) -> Result<(), ParserError> {
        let root: Value =
            serde_json::from_slice(data).map_err(|e| ParserError::InvalidJson {
                filename: resolved_filename.to_string(),
                diagnostic: e.to_string(),
            })?;
        let document = DocumentReader::new(filename, options, &self.include_ids).read(&root)?;
        log::debug!(
            "EffectParser: '{filename}' declares {} technique(s), {} texture(s)",
            document.techniques.len(),
            document.textures.len()
        );

        {
            let mut state = self.state.borrow_mut();
            state.filename = filename.to_string();
            state.library = Rc::downgrade(library);
            state.name = document.name;
            state.techniques = document.techniques;
        }

        let mut dependency_options = options.clone();
        dependency_options.add_include_path(path::folder(resolved_filename));

        for list in &document.shaders {
            self.load_includes(list, &dependency_options, library);
        }
        for texture in document.textures {
            if self.finished.get() {
                break;
            }
            self.load_texture(texture, &dependency_options, library);
        }

        self.parsed.set(true);
        self.check_complete();
        Ok(())
    }

    fn signals(&self) -> &ParserSignals {
        &self.signals
    }
}
