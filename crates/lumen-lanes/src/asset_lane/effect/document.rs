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
//! Walks an effect document into pass templates.
//!
//! Attribute, uniform, macro and state blocks nest: a technique inherits the
//! blocks declared at the root of the document, and a pass inherits the blocks
//! of its technique. A child scope starts from a copy of its parent's blocks
//! and overrides entries by name.

use super::glsl::{GlslBlockList, GlslBlockListRef};
use super::values::{
    invalid, parse_binding, parse_default_value, parse_macro_binding, parse_sampler_state,
    parse_state_value, DefaultValue,
};
use lumen_core::effect::{sampler_state, BindingMap, Effect, MacroBindingMap, States};
use lumen_core::value::DataValue;
use lumen_io::{Options, ParserError};
use serde_json::{Map, Value};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

const UNIFORM_KEYS: [&str; 2] = ["binding", "default"];

/// The blocks a scope declares or inherits.
#[derive(Debug, Clone, Default)]
pub(crate) struct Blocks {
    pub attributes: BindingMap,
    pub uniforms: BindingMap,
    pub states: BindingMap,
    pub macros: MacroBindingMap,
    /// Texture filenames used as uniform defaults, keyed by uniform.
    pub textures: BTreeMap<String, String>,
}

/// A pass before its includes and default textures are resolved.
#[derive(Debug, Clone)]
pub(crate) struct PassTemplate {
    pub name: String,
    pub vertex_shader: GlslBlockListRef,
    pub fragment_shader: GlslBlockListRef,
    pub blocks: Blocks,
}

struct Scope<'a> {
    parent: Option<&'a Scope<'a>>,
    blocks: Blocks,
    passes: Vec<PassTemplate>,
}

impl<'a> Scope<'a> {
    fn root() -> Self {
        Self {
            parent: None,
            blocks: Blocks::default(),
            passes: Vec::new(),
        }
    }

    fn child(parent: &'a Scope<'a>) -> Self {
        Self {
            parent: Some(parent),
            blocks: parent.blocks.clone(),
            passes: Vec::new(),
        }
    }

    fn find_pass(&self, name: &str) -> Option<&PassTemplate> {
        self.passes
            .iter()
            .find(|pass| pass.name == name)
            .or_else(|| self.parent.and_then(|parent| parent.find_pass(name)))
    }
}

/// Everything an effect document declares.
#[derive(Debug)]
pub(crate) struct EffectDocument {
    pub name: String,
    /// Techniques in declaration order.
    pub techniques: Vec<(String, Vec<PassTemplate>)>,
    /// Every shader block list, for include loading.
    pub shaders: Vec<GlslBlockListRef>,
    /// Every texture named by a uniform default.
    pub textures: BTreeSet<String>,
}

/// Reads one effect document.
pub(crate) struct DocumentReader<'p> {
    filename: &'p str,
    options: &'p Options,
    include_ids: &'p Cell<u64>,
    shaders: Vec<GlslBlockListRef>,
    textures: BTreeSet<String>,
}

impl<'p> DocumentReader<'p> {
    pub fn new(filename: &'p str, options: &'p Options, include_ids: &'p Cell<u64>) -> Self {
        Self {
            filename,
            options,
            include_ids,
            shaders: Vec::new(),
            textures: BTreeSet::new(),
        }
    }

    pub fn read(mut self, root: &Value) -> Result<EffectDocument, ParserError> {
        let object = root.as_object().ok_or_else(|| ParserError::InvalidFile {
            filename: self.filename.to_string(),
            reason: "an effect document is a JSON object".to_string(),
        })?;
        if !self.matches_configuration(object) {
            return Err(ParserError::UnsupportedConfiguration {
                filename: self.filename.to_string(),
            });
        }

        let name = match object.get("name") {
            None => self.filename.to_string(),
            Some(Value::String(name)) => name.clone(),
            Some(other) => return Err(invalid("name", format!("expected a string, found {other}"))),
        };

        let mut scope = Scope::root();
        self.read_blocks(object, &mut scope.blocks)?;
        if let Some(passes) = object.get("passes") {
            scope.passes = self.read_passes(passes, &scope)?;
        }

        let techniques = match object.get("techniques") {
            Some(node) => self.read_techniques(node, &scope)?,
            None if scope.passes.is_empty() => {
                return Err(ParserError::InvalidFile {
                    filename: self.filename.to_string(),
                    reason: "the effect declares neither techniques nor passes".to_string(),
                })
            }
            None => vec![(Self::default_technique(), scope.passes.clone())],
        };
        if techniques.is_empty() {
            return Err(ParserError::UnsupportedConfiguration {
                filename: self.filename.to_string(),
            });
        }

        Ok(EffectDocument {
            name,
            techniques,
            shaders: self.shaders,
            textures: self.textures,
        })
    }

    fn default_technique() -> String {
        Effect::DEFAULT_TECHNIQUE.to_string()
    }

    /// A node without a `configuration` array is always kept. Otherwise one of
    /// its tokens must name a current platform or user flag.
    fn matches_configuration(&self, node: &Map<String, Value>) -> bool {
        match node.get("configuration") {
            Some(Value::Array(tokens)) => tokens
                .iter()
                .filter_map(Value::as_str)
                .any(|token| self.options.matches_configuration_token(token)),
            _ => true,
        }
    }

    fn read_techniques(
        &mut self,
        node: &Value,
        scope: &Scope<'_>,
    ) -> Result<Vec<(String, Vec<PassTemplate>)>, ParserError> {
        let nodes = node
            .as_array()
            .ok_or_else(|| invalid("techniques", "expected an array"))?;

        let mut techniques = Vec::with_capacity(nodes.len());
        for (index, node) in nodes.iter().enumerate() {
            let object = node
                .as_object()
                .ok_or_else(|| invalid("techniques", "techniques are objects"))?;
            let name = match object.get("name").and_then(Value::as_str) {
                Some(name) => name.to_string(),
                None => format!("technique{index}"),
            };
            if !self.matches_configuration(object) {
                log::debug!("EffectParser: skipping technique '{name}' in '{}'", self.filename);
                continue;
            }

            let mut technique_scope = Scope::child(scope);
            self.read_blocks(object, &mut technique_scope.blocks)?;
            let passes = object
                .get("passes")
                .ok_or_else(|| invalid(&name, "a technique needs passes"))?;
            let passes = self.read_passes(passes, &technique_scope)?;
            techniques.push((name, passes));
        }
        Ok(techniques)
    }

    /// Reads a pass list. Strings reference a pass declared earlier in the
    /// same list or in an enclosing scope.
    fn read_passes(
        &mut self,
        node: &Value,
        scope: &Scope<'_>,
    ) -> Result<Vec<PassTemplate>, ParserError> {
        let nodes = node
            .as_array()
            .ok_or_else(|| invalid("passes", "expected an array"))?;

        let mut passes: Vec<PassTemplate> = Vec::with_capacity(nodes.len());
        for (index, node) in nodes.iter().enumerate() {
            match node {
                Value::String(name) => {
                    let pass = passes
                        .iter()
                        .find(|pass| &pass.name == name)
                        .or_else(|| scope.find_pass(name))
                        .cloned()
                        .ok_or_else(|| ParserError::UndefinedPass { name: name.clone() })?;
                    passes.push(pass);
                }
                Value::Object(object) => {
                    if !self.matches_configuration(object) {
                        continue;
                    }
                    let pass = self.read_pass(object, scope, index)?;
                    passes.push(pass);
                }
                other => {
                    return Err(invalid(
                        "passes",
                        format!("expected a pass object or name, found {other}"),
                    ))
                }
            }
        }
        Ok(passes)
    }

    fn read_pass(
        &mut self,
        object: &Map<String, Value>,
        scope: &Scope<'_>,
        index: usize,
    ) -> Result<PassTemplate, ParserError> {
        let name = match object.get("name").and_then(Value::as_str) {
            Some(name) => name.to_string(),
            None => format!("pass{index}"),
        };
        let mut pass_scope = Scope::child(scope);
        self.read_blocks(object, &mut pass_scope.blocks)?;

        Ok(PassTemplate {
            vertex_shader: self.read_shader(object, "vertexShader")?,
            fragment_shader: self.read_shader(object, "fragmentShader")?,
            name,
            blocks: pass_scope.blocks,
        })
    }

    fn read_shader(
        &mut self,
        object: &Map<String, Value>,
        key: &str,
    ) -> Result<GlslBlockListRef, ParserError> {
        let source = match object.get(key) {
            Some(Value::String(source)) => source,
            Some(other) => return Err(invalid(key, format!("expected GLSL source, found {other}"))),
            None => return Err(invalid(key, "a pass needs both shaders")),
        };
        let list = Rc::new(RefCell::new(GlslBlockList::parse(source, self.include_ids)?));
        self.shaders.push(list.clone());
        Ok(list)
    }

    fn read_blocks(
        &mut self,
        object: &Map<String, Value>,
        blocks: &mut Blocks,
    ) -> Result<(), ParserError> {
        if let Some(entries) = entries(object, "attributes")? {
            for (name, node) in entries {
                read_attribute(name, node, &mut blocks.attributes)?;
            }
        }
        if let Some(entries) = entries(object, "uniforms")? {
            for (name, node) in entries {
                self.read_uniform(name, node, blocks)?;
            }
        }
        if let Some(entries) = entries(object, "macros")? {
            for (name, node) in entries {
                read_macro(name, node, &mut blocks.macros)?;
            }
        }
        if let Some(entries) = entries(object, "states")? {
            for (name, node) in entries {
                read_state(name, node, &mut blocks.states)?;
            }
        }
        Ok(())
    }

    fn read_uniform(
        &mut self,
        name: &str,
        node: &Value,
        blocks: &mut Blocks,
    ) -> Result<(), ParserError> {
        let object = match node {
            Value::String(_) => {
                blocks.uniforms.bindings.insert(name.to_string(), parse_binding(name, node)?);
                return Ok(());
            }
            Value::Object(object) if object.contains_key("property") => {
                blocks.uniforms.bindings.insert(name.to_string(), parse_binding(name, node)?);
                return Ok(());
            }
            Value::Object(object) => object,
            _ => {
                let value = parse_default_value(name, node, false)?;
                self.set_uniform_default(name, value, blocks);
                return Ok(());
            }
        };

        let known =
            |key: &str| UNIFORM_KEYS.contains(&key) || sampler_state::NAMES.contains(&key);
        if object.is_empty() {
            return Err(invalid(name, "empty uniform declaration"));
        }
        if let Some(key) = object.keys().find(|key| !known(key.as_str())) {
            return Err(invalid(name, format!("unexpected key '{key}'")));
        }

        if let Some(binding) = object.get("binding") {
            blocks.uniforms.bindings.insert(name.to_string(), parse_binding(name, binding)?);
        }
        if let Some(default) = object.get("default") {
            let value = parse_default_value(name, default, true)?;
            self.set_uniform_default(name, value, blocks);
        }
        for state in sampler_state::NAMES {
            if let Some(node) = object.get(state) {
                blocks.uniforms.default_values.insert(
                    sampler_state::uniform_property(name, state),
                    parse_sampler_state(name, state, node)?,
                );
            }
        }
        Ok(())
    }

    fn set_uniform_default(&mut self, name: &str, value: DefaultValue, blocks: &mut Blocks) {
        match value {
            DefaultValue::Value(value) => {
                blocks.textures.remove(name);
                blocks.uniforms.default_values.insert(name.to_string(), value);
            }
            DefaultValue::Texture(filename) => {
                blocks.uniforms.default_values.remove(name);
                self.textures.insert(filename.clone());
                blocks.textures.insert(name.to_string(), filename);
            }
        }
    }
}

fn entries<'v>(
    object: &'v Map<String, Value>,
    key: &str,
) -> Result<Option<&'v Map<String, Value>>, ParserError> {
    match object.get(key) {
        None => Ok(None),
        Some(Value::Object(entries)) => Ok(Some(entries)),
        Some(other) => Err(invalid(key, format!("expected an object, found {other}"))),
    }
}

/// Splits an entry object into its `binding` and `default` nodes.
fn binding_and_default<'v>(
    name: &str,
    object: &'v Map<String, Value>,
) -> Result<(Option<&'v Value>, Option<&'v Value>), ParserError> {
    if object.is_empty() {
        return Err(invalid(name, "empty declaration"));
    }
    if let Some(key) = object.keys().find(|key| !UNIFORM_KEYS.contains(&key.as_str())) {
        return Err(invalid(name, format!("unexpected key '{key}'")));
    }
    Ok((object.get("binding"), object.get("default")))
}

fn read_attribute(
    name: &str,
    node: &Value,
    attributes: &mut BindingMap,
) -> Result<(), ParserError> {
    match node {
        Value::String(_) => {
            attributes.bindings.insert(name.to_string(), parse_binding(name, node)?);
        }
        Value::Object(object) if object.contains_key("property") => {
            attributes.bindings.insert(name.to_string(), parse_binding(name, node)?);
        }
        Value::Object(object) => {
            let (binding, default) = binding_and_default(name, object)?;
            if let Some(binding) = binding {
                attributes.bindings.insert(name.to_string(), parse_binding(name, binding)?);
            }
            if let Some(default) = default {
                attributes
                    .default_values
                    .insert(name.to_string(), plain_default(name, default)?);
            }
        }
        _ => {
            attributes
                .default_values
                .insert(name.to_string(), plain_default(name, node)?);
        }
    }
    Ok(())
}

fn read_macro(name: &str, node: &Value, macros: &mut MacroBindingMap) -> Result<(), ParserError> {
    match node {
        Value::String(_) => {
            macros.bindings.insert(name.to_string(), parse_macro_binding(name, node)?);
        }
        Value::Object(object) if object.contains_key("property") => {
            macros.bindings.insert(name.to_string(), parse_macro_binding(name, node)?);
        }
        Value::Object(object) => {
            let (binding, default) = binding_and_default(name, object)?;
            if let Some(binding) = binding {
                macros.bindings.insert(name.to_string(), parse_macro_binding(name, binding)?);
            }
            if let Some(default) = default {
                macros
                    .default_values
                    .insert(name.to_string(), plain_default(name, default)?);
            }
        }
        _ => {
            macros
                .default_values
                .insert(name.to_string(), plain_default(name, node)?);
        }
    }
    Ok(())
}

fn read_state(name: &str, node: &Value, states: &mut BindingMap) -> Result<(), ParserError> {
    if !States::is_state_name(name) {
        return Err(ParserError::UnknownState {
            name: name.to_string(),
        });
    }
    match node {
        Value::Object(object) => {
            let (binding, default) = binding_and_default(name, object)?;
            if let Some(binding) = binding {
                states.bindings.insert(name.to_string(), parse_binding(name, binding)?);
            }
            if let Some(default) = default {
                states
                    .default_values
                    .insert(name.to_string(), parse_state_value(name, default)?);
            }
        }
        _ => {
            states
                .default_values
                .insert(name.to_string(), parse_state_value(name, node)?);
        }
    }
    Ok(())
}

fn plain_default(name: &str, node: &Value) -> Result<DataValue, ParserError> {
    match parse_default_value(name, node, false)? {
        DefaultValue::Value(value) => Ok(value),
        DefaultValue::Texture(_) => Err(invalid(name, "textures are only uniform defaults")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::device::HeadlessContext;
    use lumen_core::effect::{BindingSource, CompareMode};
    use lumen_data::{AssetLibrary, AssetLibraryRef};
    use serde_json::json;

    fn read(options: &Options, document: Value) -> Result<EffectDocument, ParserError> {
        let ids = Cell::new(0);
        DocumentReader::new("test.effect", options, &ids).read(&document)
    }

    fn options() -> (AssetLibraryRef, Options) {
        let library = AssetLibrary::new(Rc::new(HeadlessContext::new()));
        let options = Options::new(&library);
        (library, options)
    }

    fn pass(source: &str) -> Value {
        json!({ "vertexShader": source, "fragmentShader": source })
    }

    // --- Scopes ---

    #[test]
    fn passes_inherit_and_override_enclosing_blocks() {
        let (_library, options) = options();
        let document = read(
            &options,
            json!({
                "uniforms": { "uColor": [1.0, 0.0, 0.0, 1.0], "uSize": 2 },
                "states": { "depthFunc": "less" },
                "techniques": [{
                    "name": "t",
                    "uniforms": { "uSize": 3 },
                    "passes": [{
                        "vertexShader": "v", "fragmentShader": "f",
                        "states": { "depthFunc": "always" },
                        "uniforms": { "uColor": { "property": "diffuseColor", "source": "target" } }
                    }]
                }]
            }),
        )
        .unwrap();

        let blocks = &document.techniques[0].1[0].blocks;
        assert_eq!(blocks.uniforms.default_values["uSize"], DataValue::Int(3));
        assert_eq!(
            blocks.uniforms.default_values["uColor"],
            DataValue::Float4([1.0, 0.0, 0.0, 1.0])
        );
        assert_eq!(blocks.uniforms.bindings["uColor"].source, BindingSource::Target);
        assert_eq!(
            blocks.states.default_values["depthFunc"],
            DataValue::Compare(CompareMode::Always)
        );
        assert_eq!(document.shaders.len(), 2);
    }

    #[test]
    fn global_passes_become_the_default_technique() {
        let (_library, options) = options();
        let document = read(&options, json!({ "passes": [pass("a"), pass("b")] })).unwrap();

        assert_eq!(document.name, "test.effect");
        assert_eq!(document.techniques.len(), 1);
        assert_eq!(document.techniques[0].0, "default");
        let names: Vec<_> = document.techniques[0].1.iter().map(|p| p.name.clone()).collect();
        assert_eq!(names, ["pass0", "pass1"]);
    }

    #[test]
    fn pass_references_walk_the_enclosing_scopes() {
        let (_library, options) = options();
        let mut shadow = pass("shadow");
        shadow["name"] = json!("shadow");
        let document = read(
            &options,
            json!({
                "passes": [shadow],
                "techniques": [{ "name": "t", "passes": ["shadow", "shadow"] }]
            }),
        )
        .unwrap();
        assert_eq!(document.techniques[0].1.len(), 2);

        let error = read(
            &options,
            json!({ "techniques": [{ "passes": ["missing"] }] }),
        )
        .unwrap_err();
        assert_eq!(error, ParserError::UndefinedPass { name: "missing".to_string() });
    }

    #[test]
    fn passes_of_sibling_techniques_are_not_visible() {
        let (_library, options) = options();
        let mut shared = pass("p");
        shared["name"] = json!("p");
        let error = read(
            &options,
            json!({
                "techniques": [
                    { "name": "a", "passes": [shared] },
                    { "name": "b", "passes": ["p"] }
                ]
            }),
        )
        .unwrap_err();
        assert_eq!(error, ParserError::UndefinedPass { name: "p".to_string() });
    }

    // --- Configuration ---

    #[test]
    fn configuration_filters_techniques_and_passes() {
        let (_library, mut options) = options();
        options.add_platform("android");
        let document = read(
            &options,
            json!({
                "techniques": [
                    { "name": "ios", "configuration": ["ios"], "passes": [pass("a")] },
                    { "name": "mobile", "configuration": ["ios", "android"], "passes": [
                        pass("b"),
                        { "vertexShader": "c", "fragmentShader": "c", "configuration": ["ios"] }
                    ] }
                ]
            }),
        )
        .unwrap();

        assert_eq!(document.techniques.len(), 1);
        assert_eq!(document.techniques[0].0, "mobile");
        assert_eq!(document.techniques[0].1.len(), 1);
    }

    #[test]
    fn excluded_documents_are_unsupported() {
        let (_library, mut options) = options();
        options.add_platform("android");
        let error = read(
            &options,
            json!({ "configuration": ["ios"], "passes": [pass("a")] }),
        )
        .unwrap_err();
        assert_eq!(error.type_tag(), "UnsupportedConfiguration");
    }

    // --- Declarations ---

    #[test]
    fn texture_defaults_are_collected() {
        let (_library, options) = options();
        let document = read(
            &options,
            json!({
                "uniforms": {
                    "uDiffuseMap": { "default": "brick.png", "wrapMode": "clamp" }
                },
                "passes": [pass("a")]
            }),
        )
        .unwrap();

        let blocks = &document.techniques[0].1[0].blocks;
        assert_eq!(blocks.textures["uDiffuseMap"], "brick.png");
        assert!(blocks
            .uniforms
            .default_values
            .contains_key("uDiffuseMap.wrapMode"));
        assert!(document.textures.contains("brick.png"));
    }

    #[test]
    fn malformed_declarations_are_reported() {
        let (_library, options) = options();
        let cases = [
            json!({ "states": { "stencilTest": true }, "passes": [pass("a")] }),
            json!({ "uniforms": { "u": { "bogus": 1 } }, "passes": [pass("a")] }),
            json!({ "passes": [{ "vertexShader": "v" }] }),
            json!({ "passes": "a" }),
            json!({}),
            json!([1, 2]),
        ];
        let tags: Vec<_> = cases
            .into_iter()
            .map(|case| read(&options, case).unwrap_err().type_tag())
            .collect();
        assert_eq!(
            tags,
            [
                "UnknownState",
                "InvalidValue",
                "InvalidValue",
                "InvalidValue",
                "InvalidFile",
                "InvalidFile"
            ]
        );
    }
}
