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

use super::{BindingMap, MacroBindingMap, States};

/// The pipeline stage a shader runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderType {
    /// Runs once per vertex.
    Vertex,
    /// Runs once per fragment.
    Fragment,
}

impl ShaderType {
    /// The macro defined at the top of every shader of this stage.
    pub fn stage_define(&self) -> &'static str {
        match self {
            ShaderType::Vertex => "VERTEX_SHADER",
            ShaderType::Fragment => "FRAGMENT_SHADER",
        }
    }
}

/// A shader with every include expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shader {
    /// The stage of the shader.
    pub kind: ShaderType,
    /// Final GLSL source, starting with the stage define.
    pub source: String,
}

/// One rendering pass: a shader program with its bindings and fixed states.
#[derive(Debug, Clone, PartialEq)]
pub struct Pass {
    /// The pass name, generated when the document does not provide one.
    pub name: String,
    /// The vertex stage.
    pub vertex_shader: Shader,
    /// The fragment stage.
    pub fragment_shader: Shader,
    /// Vertex attribute bindings.
    pub attribute_bindings: BindingMap,
    /// Uniform bindings. Texture uniforms carry their sampler states as
    /// `<uniform>.<state>` defaults.
    pub uniform_bindings: BindingMap,
    /// Render state bindings, keyed by state name.
    pub state_bindings: BindingMap,
    /// Shader macro bindings.
    pub macro_bindings: MacroBindingMap,
    /// Render states resolved from the state defaults.
    pub states: States,
}
