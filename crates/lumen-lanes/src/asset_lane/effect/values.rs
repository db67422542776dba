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
//! Readers for the leaf nodes of an effect document: bindings, default values
//! and render state values.

use lumen_core::effect::{
    priority, sampler_state, Binding, BindingSource, BlendFactor, Blending, CompareMode,
    MacroBinding, MipFilter, StencilOperation, States, TextureFilter, TriangleCulling, WrapMode,
};
use lumen_core::value::DataValue;
use lumen_io::ParserError;
use serde_json::Value;

/// A default value as written in the document.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DefaultValue {
    /// A literal value.
    Value(DataValue),
    /// A texture filename, loaded as a dependency of the effect.
    Texture(String),
}

pub(crate) fn invalid(property: &str, reason: impl Into<String>) -> ParserError {
    ParserError::InvalidValue {
        property: property.to_string(),
        reason: reason.into(),
    }
}

/// Reads a binding: a property name, or `{ "property": ..., "source": ... }`.
pub(crate) fn parse_binding(property: &str, node: &Value) -> Result<Binding, ParserError> {
    match node {
        Value::String(name) => Ok(Binding::target(name.as_str())),
        Value::Object(map) => {
            let name = map
                .get("property")
                .and_then(Value::as_str)
                .ok_or_else(|| invalid(property, "binding objects need a 'property' string"))?;
            let source = match map.get("source") {
                None => BindingSource::Target,
                Some(Value::String(token)) => BindingSource::from_token(token).ok_or_else(|| {
                    invalid(property, format!("unknown binding source '{token}'"))
                })?,
                Some(other) => {
                    return Err(invalid(
                        property,
                        format!("binding source must be a string, found {other}"),
                    ))
                }
            };
            Ok(Binding {
                property_name: name.to_string(),
                source,
            })
        }
        other => Err(invalid(property, format!("expected a binding, found {other}"))),
    }
}

/// Reads a macro binding, which may carry `min` and `max` bounds.
pub(crate) fn parse_macro_binding(
    property: &str,
    node: &Value,
) -> Result<MacroBinding, ParserError> {
    let mut binding = MacroBinding::from(parse_binding(property, node)?);
    if let Value::Object(map) = node {
        binding.min = map.get("min").map(|v| parse_i32(property, v)).transpose()?;
        binding.max = map.get("max").map(|v| parse_i32(property, v)).transpose()?;
    }
    Ok(binding)
}

fn parse_i32(property: &str, node: &Value) -> Result<i32, ParserError> {
    node.as_i64()
        .and_then(|v| i32::try_from(v).ok())
        .ok_or_else(|| invalid(property, format!("expected an integer, found {node}")))
}

fn parse_f32(property: &str, node: &Value) -> Result<f32, ParserError> {
    node.as_f64()
        .map(|v| v as f32)
        .ok_or_else(|| invalid(property, format!("expected a number, found {node}")))
}

fn is_integer(node: &Value) -> bool {
    node.as_i64().is_some_and(|v| i32::try_from(v).is_ok())
}

/// Reads the default value of a uniform, macro or attribute.
///
/// Booleans become integers. Any non-integer number turns a vector into a
/// float vector, and sixteen numbers make a matrix. Strings name textures and
/// are only accepted when `allow_texture` is set.
pub(crate) fn parse_default_value(
    property: &str,
    node: &Value,
    allow_texture: bool,
) -> Result<DefaultValue, ParserError> {
    let value = match node {
        Value::Bool(b) => DataValue::Int(i32::from(*b)),
        Value::Number(_) if is_integer(node) => DataValue::Int(parse_i32(property, node)?),
        Value::Number(_) => DataValue::Float(parse_f32(property, node)?),
        Value::String(filename) if allow_texture => {
            return Ok(DefaultValue::Texture(filename.clone()))
        }
        Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_boolean) => {
            let ints: Vec<i32> = items
                .iter()
                .map(|item| i32::from(item.as_bool() == Some(true)))
                .collect();
            DataValue::int_vector(&ints)
                .ok_or_else(|| invalid(property, "boolean vectors have 1 to 4 components"))?
        }
        Value::Array(items) if items.iter().all(is_integer) && items.len() != 16 => {
            let ints = items
                .iter()
                .map(|item| parse_i32(property, item))
                .collect::<Result<Vec<_>, _>>()?;
            DataValue::int_vector(&ints)
                .ok_or_else(|| invalid(property, "vectors have 1 to 4 components"))?
        }
        Value::Array(items) => {
            let floats = items
                .iter()
                .map(|item| parse_f32(property, item))
                .collect::<Result<Vec<_>, _>>()?;
            DataValue::float_vector(&floats).ok_or_else(|| {
                invalid(property, "vectors have 1 to 4 components, matrices 16")
            })?
        }
        other => {
            return Err(invalid(
                property,
                format!("unsupported default value {other}"),
            ))
        }
    };
    Ok(DefaultValue::Value(value))
}

/// Reads one sampler state of a texture uniform.
pub(crate) fn parse_sampler_state(
    uniform: &str,
    state: &str,
    node: &Value,
) -> Result<DataValue, ParserError> {
    let property = sampler_state::uniform_property(uniform, state);
    let token = node
        .as_str()
        .ok_or_else(|| invalid(&property, format!("expected a string, found {node}")))?;
    let value = match state {
        sampler_state::WRAP_MODE => WrapMode::from_token(token).map(DataValue::WrapMode),
        sampler_state::TEXTURE_FILTER => {
            TextureFilter::from_token(token).map(DataValue::TextureFilter)
        }
        sampler_state::MIP_FILTER => MipFilter::from_token(token).map(DataValue::MipFilter),
        _ => None,
    };
    value.ok_or_else(|| invalid(&property, format!("unknown value '{token}'")))
}

fn parse_token<T>(
    state: &str,
    node: &Value,
    from_token: impl Fn(&str) -> Option<T>,
) -> Result<T, ParserError> {
    let token = node
        .as_str()
        .ok_or_else(|| invalid(state, format!("expected a string, found {node}")))?;
    from_token(token).ok_or_else(|| invalid(state, format!("unknown value '{token}'")))
}

fn parse_bool(state: &str, node: &Value) -> Result<bool, ParserError> {
    node.as_bool()
        .ok_or_else(|| invalid(state, format!("expected a boolean, found {node}")))
}

fn parse_blend_mode(state: &str, node: &Value) -> Result<Blending, ParserError> {
    match node {
        Value::String(mode) => Blending::from_mode_name(mode)
            .ok_or_else(|| invalid(state, format!("unknown blend mode '{mode}'"))),
        Value::Array(factors) if factors.len() == 2 => Ok(Blending {
            source: parse_token(state, &factors[0], BlendFactor::from_token)?,
            destination: parse_token(state, &factors[1], BlendFactor::from_token)?,
        }),
        other => Err(invalid(
            state,
            format!("expected a blend mode or a [source, destination] pair, found {other}"),
        )),
    }
}

fn parse_priority(state: &str, node: &Value) -> Result<f32, ParserError> {
    let level = |name: &Value| parse_token(state, name, priority::from_name);
    match node {
        Value::Number(_) => parse_f32(state, node),
        Value::String(_) => level(node),
        Value::Array(items) if items.len() == 2 => {
            Ok(level(&items[0])? + parse_f32(state, &items[1])?)
        }
        other => Err(invalid(
            state,
            format!("expected a number, a priority name or [name, offset], found {other}"),
        )),
    }
}

fn parse_scissor_box(state: &str, node: &Value) -> Result<[i32; 4], ParserError> {
    let items = node
        .as_array()
        .filter(|items| items.len() == 4)
        .ok_or_else(|| invalid(state, format!("expected [x, y, width, height], found {node}")))?;
    let mut scissor_box = [0; 4];
    for (slot, item) in scissor_box.iter_mut().zip(items) {
        *slot = parse_i32(state, item)?;
    }
    Ok(scissor_box)
}

/// Reads the value of one render state. `state` must be a recognized state
/// name.
pub(crate) fn parse_state_value(state: &str, node: &Value) -> Result<DataValue, ParserError> {
    let value = match state {
        States::PROPERTY_BLEND_MODE => DataValue::Blending(parse_blend_mode(state, node)?),
        States::PROPERTY_COLOR_MASK | States::PROPERTY_DEPTH_MASK | States::PROPERTY_ZSORTED => {
            DataValue::Bool(parse_bool(state, node)?)
        }
        States::PROPERTY_DEPTH_FUNCTION | States::PROPERTY_STENCIL_FUNCTION => {
            DataValue::Compare(parse_token(state, node, CompareMode::from_token)?)
        }
        States::PROPERTY_TRIANGLE_CULLING => {
            DataValue::Culling(parse_token(state, node, TriangleCulling::from_token)?)
        }
        States::PROPERTY_STENCIL_REFERENCE => DataValue::Int(parse_i32(state, node)?),
        States::PROPERTY_STENCIL_MASK => {
            let mask = parse_i32(state, node)?;
            if mask < 0 {
                return Err(invalid(state, "stencil masks are not negative"));
            }
            DataValue::Int(mask)
        }
        States::PROPERTY_STENCIL_FAIL_OPERATION
        | States::PROPERTY_STENCIL_Z_FAIL_OPERATION
        | States::PROPERTY_STENCIL_Z_PASS_OPERATION => {
            DataValue::Stencil(parse_token(state, node, StencilOperation::from_token)?)
        }
        States::PROPERTY_SCISSOR_BOX => DataValue::Int4(parse_scissor_box(state, node)?),
        States::PROPERTY_PRIORITY => DataValue::Float(parse_priority(state, node)?),
        _ => {
            return Err(ParserError::UnknownState {
                name: state.to_string(),
            })
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn value(node: Value) -> DataValue {
        match parse_default_value("p", &node, false) {
            Ok(DefaultValue::Value(value)) => value,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn default_values_follow_the_json_shape() {
        assert_eq!(value(json!(true)), DataValue::Int(1));
        assert_eq!(value(json!([true, false, true])), DataValue::Int3([1, 0, 1]));
        assert_eq!(value(json!(42)), DataValue::Int(42));
        assert_eq!(value(json!([1, 2])), DataValue::Int2([1, 2]));
        assert_eq!(value(json!(42.24)), DataValue::Float(42.24));
        assert_eq!(value(json!([1, 2.5])), DataValue::Float2([1.0, 2.5]));
        assert!(matches!(value(Value::from(vec![0; 16])), DataValue::Mat4(_)));
    }

    #[test]
    fn texture_defaults_are_only_read_where_allowed() {
        assert_eq!(
            parse_default_value("uDiffuseMap", &json!("brick.png"), true),
            Ok(DefaultValue::Texture("brick.png".to_string()))
        );
        assert!(parse_default_value("MACRO", &json!("brick.png"), false).is_err());
        assert!(parse_default_value("p", &json!({"x": 1}), true).is_err());
        assert!(parse_default_value("p", &json!([1, 2, 3, 4, 5]), true).is_err());
    }

    #[test]
    fn bindings_default_to_the_target_source() {
        let binding = parse_binding("uColor", &json!("material[${materialUuid}].diffuseColor"))
            .unwrap();
        assert_eq!(binding.source, BindingSource::Target);

        let binding =
            parse_binding("uView", &json!({"property": "camera.view", "source": "renderer"}))
                .unwrap();
        assert_eq!(binding.property_name, "camera.view");
        assert_eq!(binding.source, BindingSource::Renderer);

        assert!(parse_binding("uView", &json!({"property": "x", "source": "moon"})).is_err());
        assert!(parse_binding("uView", &json!(3)).is_err());
    }

    #[test]
    fn macro_bindings_carry_bounds() {
        let binding = parse_macro_binding(
            "NUM_LIGHTS",
            &json!({"property": "lights.length", "min": 0, "max": 8}),
        )
        .unwrap();
        assert_eq!((binding.min, binding.max), (Some(0), Some(8)));
    }

    #[test]
    fn state_values() {
        assert_eq!(
            parse_state_value("priority", &json!(["opaque", 42])),
            Ok(DataValue::Float(2042.0))
        );
        assert_eq!(
            parse_state_value("priority", &json!(42)),
            Ok(DataValue::Float(42.0))
        );
        assert_eq!(
            parse_state_value("blendMode", &json!("additive")),
            Ok(DataValue::Blending(Blending::ADDITIVE))
        );
        assert_eq!(
            parse_state_value("blendMode", &json!(["src_color", "src_alpha_saturate"])),
            Ok(DataValue::Blending(Blending {
                source: BlendFactor::SrcColor,
                destination: BlendFactor::SrcAlphaSaturate,
            }))
        );
        assert_eq!(
            parse_state_value("depthFunc", &json!("greater_equal")),
            Ok(DataValue::Compare(CompareMode::GreaterEqual))
        );
        assert_eq!(
            parse_state_value("scissorBox", &json!([0, 0, 640, 480])),
            Ok(DataValue::Int4([0, 0, 640, 480]))
        );
        assert!(parse_state_value("depthFunc", &json!("sometimes")).is_err());
        assert_eq!(
            parse_state_value("stencilTest", &json!(true)).map_err(|e| e.type_tag()),
            Err("UnknownState")
        );
    }

    #[test]
    fn sampler_states_are_named_after_their_uniform() {
        assert_eq!(
            parse_sampler_state("uDiffuseMap", "wrapMode", &json!("repeat")),
            Ok(DataValue::WrapMode(WrapMode::Repeat))
        );
        let error = parse_sampler_state("uDiffuseMap", "mipFilter", &json!("cubic")).unwrap_err();
        assert!(error.to_string().contains("uDiffuseMap.mipFilter"));
    }
}
