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

//! Fixed-function render states and the token tables used to read them.
//!
//! Every lookup table in this module is a `match` over string literals, so the
//! tables are immutable and shared by every parsing session.

use crate::value::DataValue;
use serde::{Deserialize, Serialize};

/// A multiplier applied to a color during blending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlendFactor {
    /// `0.0`
    Zero,
    /// `1.0`
    One,
    /// The source color.
    SrcColor,
    /// `1.0 - source color`.
    OneMinusSrcColor,
    /// The source alpha.
    SrcAlpha,
    /// `1.0 - source alpha`.
    OneMinusSrcAlpha,
    /// The destination alpha.
    DstAlpha,
    /// `1.0 - destination alpha`.
    OneMinusDstAlpha,
    /// The destination color.
    DstColor,
    /// `1.0 - destination color`.
    OneMinusDstColor,
    /// `min(source alpha, 1.0 - destination alpha)`. Only valid as a source factor.
    SrcAlphaSaturate,
}

impl BlendFactor {
    /// Reads a blend factor token such as `"src_alpha"`.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "zero" => Some(Self::Zero),
            "one" => Some(Self::One),
            "src_color" => Some(Self::SrcColor),
            "one_minus_src_color" => Some(Self::OneMinusSrcColor),
            "src_alpha" => Some(Self::SrcAlpha),
            "one_minus_src_alpha" => Some(Self::OneMinusSrcAlpha),
            "dst_alpha" => Some(Self::DstAlpha),
            "one_minus_dst_alpha" => Some(Self::OneMinusDstAlpha),
            "dst_color" => Some(Self::DstColor),
            "one_minus_dst_color" => Some(Self::OneMinusDstColor),
            "src_alpha_saturate" => Some(Self::SrcAlphaSaturate),
            _ => None,
        }
    }
}

/// A source/destination blend factor pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Blending {
    /// Factor applied to the incoming fragment.
    pub source: BlendFactor,
    /// Factor applied to the color already in the target.
    pub destination: BlendFactor,
}

impl Blending {
    /// Opaque rendering: `ONE, ZERO`.
    pub const DEFAULT: Blending = Blending {
        source: BlendFactor::One,
        destination: BlendFactor::Zero,
    };
    /// Alpha blending: `SRC_ALPHA, ONE_MINUS_SRC_ALPHA`.
    pub const ALPHA: Blending = Blending {
        source: BlendFactor::SrcAlpha,
        destination: BlendFactor::OneMinusSrcAlpha,
    };
    /// Additive blending: `SRC_ALPHA, ONE`.
    pub const ADDITIVE: Blending = Blending {
        source: BlendFactor::SrcAlpha,
        destination: BlendFactor::One,
    };

    /// Reads a combined blend mode name (`default`, `alpha` or `additive`).
    pub fn from_mode_name(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::DEFAULT),
            "alpha" => Some(Self::ALPHA),
            "additive" => Some(Self::ADDITIVE),
            _ => None,
        }
    }
}

impl Default for Blending {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Comparison function used by depth and stencil tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CompareMode {
    /// The test always passes.
    #[default]
    Always,
    /// Passes if the new value is equal to the existing value.
    Equal,
    /// Passes if the new value is greater than the existing value.
    Greater,
    /// Passes if the new value is greater than or equal to the existing value.
    GreaterEqual,
    /// Passes if the new value is less than the existing value.
    Less,
    /// Passes if the new value is less than or equal to the existing value.
    LessEqual,
    /// The test never passes.
    Never,
    /// Passes if the new value is not equal to the existing value.
    NotEqual,
}

impl CompareMode {
    /// Reads a comparison token such as `"less_equal"`.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "always" => Some(Self::Always),
            "equal" => Some(Self::Equal),
            "greater" => Some(Self::Greater),
            "greater_equal" => Some(Self::GreaterEqual),
            "less" => Some(Self::Less),
            "less_equal" => Some(Self::LessEqual),
            "never" => Some(Self::Never),
            "not_equal" => Some(Self::NotEqual),
            _ => None,
        }
    }
}

/// Operation applied to the stencil buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StencilOperation {
    /// Keep the current value.
    #[default]
    Keep,
    /// Set the value to `0`.
    Zero,
    /// Replace the value with the reference value.
    Replace,
    /// Increment, clamping to the maximum.
    Incr,
    /// Increment, wrapping to zero.
    IncrWrap,
    /// Decrement, clamping to zero.
    Decr,
    /// Decrement, wrapping to the maximum.
    DecrWrap,
    /// Bitwise invert the value.
    Invert,
}

impl StencilOperation {
    /// Reads a stencil operation token such as `"incr_wrap"`.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "keep" => Some(Self::Keep),
            "zero" => Some(Self::Zero),
            "replace" => Some(Self::Replace),
            "incr" => Some(Self::Incr),
            "incr_wrap" => Some(Self::IncrWrap),
            "decr" => Some(Self::Decr),
            "decr_wrap" => Some(Self::DecrWrap),
            "invert" => Some(Self::Invert),
            _ => None,
        }
    }
}

/// Which triangle faces are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TriangleCulling {
    /// Nothing is culled.
    None,
    /// Front faces are culled.
    Front,
    /// Back faces are culled.
    #[default]
    Back,
    /// Every face is culled.
    Both,
}

impl TriangleCulling {
    /// Reads a culling token such as `"back"`.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "none" => Some(Self::None),
            "front" => Some(Self::Front),
            "back" => Some(Self::Back),
            "both" => Some(Self::Both),
            _ => None,
        }
    }
}

/// Named render priority levels. Higher priorities are drawn first.
pub mod priority {
    /// Drawn before everything else.
    pub const FIRST: f32 = 4000.0;
    /// Sky boxes and other backdrops.
    pub const BACKGROUND: f32 = 3000.0;
    /// Opaque geometry.
    pub const OPAQUE: f32 = 2000.0;
    /// Blended geometry.
    pub const TRANSPARENT: f32 = 1000.0;
    /// Drawn after everything else.
    pub const LAST: f32 = 0.0;

    /// Reads a named priority level.
    pub fn from_name(name: &str) -> Option<f32> {
        match name {
            "first" => Some(FIRST),
            "background" => Some(BACKGROUND),
            "opaque" => Some(OPAQUE),
            "transparent" => Some(TRANSPARENT),
            "last" => Some(LAST),
            _ => None,
        }
    }
}

/// The fixed-function state of one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct States {
    /// Draw order key, see [`priority`].
    pub priority: f32,
    /// Whether surfaces using the pass are sorted back to front.
    pub z_sorted: bool,
    /// Color blending factors.
    pub blending: Blending,
    /// Whether color writes are enabled.
    pub color_mask: bool,
    /// Whether depth writes are enabled.
    pub depth_mask: bool,
    /// Depth test function.
    pub depth_function: CompareMode,
    /// Discarded triangle faces.
    pub triangle_culling: TriangleCulling,
    /// Stencil test function.
    pub stencil_function: CompareMode,
    /// Stencil reference value.
    pub stencil_reference: i32,
    /// Stencil read/write mask.
    pub stencil_mask: u32,
    /// Applied when the stencil test fails.
    pub stencil_fail_operation: StencilOperation,
    /// Applied when the stencil test passes and the depth test fails.
    pub stencil_z_fail_operation: StencilOperation,
    /// Applied when both tests pass.
    pub stencil_z_pass_operation: StencilOperation,
    /// `[x, y, width, height]`; a negative size disables the scissor test.
    pub scissor_box: [i32; 4],
}

impl States {
    pub const PROPERTY_BLEND_MODE: &'static str = "blendMode";
    pub const PROPERTY_COLOR_MASK: &'static str = "colorMask";
    pub const PROPERTY_DEPTH_MASK: &'static str = "depthMask";
    pub const PROPERTY_DEPTH_FUNCTION: &'static str = "depthFunc";
    pub const PROPERTY_TRIANGLE_CULLING: &'static str = "triangleCulling";
    pub const PROPERTY_STENCIL_FUNCTION: &'static str = "stencilFunc";
    pub const PROPERTY_STENCIL_REFERENCE: &'static str = "stencilRef";
    pub const PROPERTY_STENCIL_MASK: &'static str = "stencilMask";
    pub const PROPERTY_STENCIL_FAIL_OPERATION: &'static str = "stencilFailOp";
    pub const PROPERTY_STENCIL_Z_FAIL_OPERATION: &'static str = "stencilZFailOp";
    pub const PROPERTY_STENCIL_Z_PASS_OPERATION: &'static str = "stencilZPassOp";
    pub const PROPERTY_SCISSOR_BOX: &'static str = "scissorBox";
    pub const PROPERTY_PRIORITY: &'static str = "priority";
    pub const PROPERTY_ZSORTED: &'static str = "zSort";

    /// Every recognized state name, in declaration order.
    pub const PROPERTY_NAMES: [&'static str; 14] = [
        Self::PROPERTY_BLEND_MODE,
        Self::PROPERTY_COLOR_MASK,
        Self::PROPERTY_DEPTH_MASK,
        Self::PROPERTY_DEPTH_FUNCTION,
        Self::PROPERTY_TRIANGLE_CULLING,
        Self::PROPERTY_STENCIL_FUNCTION,
        Self::PROPERTY_STENCIL_REFERENCE,
        Self::PROPERTY_STENCIL_MASK,
        Self::PROPERTY_STENCIL_FAIL_OPERATION,
        Self::PROPERTY_STENCIL_Z_FAIL_OPERATION,
        Self::PROPERTY_STENCIL_Z_PASS_OPERATION,
        Self::PROPERTY_SCISSOR_BOX,
        Self::PROPERTY_PRIORITY,
        Self::PROPERTY_ZSORTED,
    ];

    pub const DEFAULT_PRIORITY: f32 = priority::OPAQUE;
    pub const DEFAULT_ZSORTED: bool = false;
    pub const DEFAULT_BLENDING: Blending = Blending::DEFAULT;
    pub const DEFAULT_COLOR_MASK: bool = true;
    pub const DEFAULT_DEPTH_MASK: bool = true;
    pub const DEFAULT_DEPTH_FUNCTION: CompareMode = CompareMode::Less;
    pub const DEFAULT_TRIANGLE_CULLING: TriangleCulling = TriangleCulling::Back;
    pub const DEFAULT_STENCIL_FUNCTION: CompareMode = CompareMode::Always;
    pub const DEFAULT_STENCIL_REFERENCE: i32 = 0;
    pub const DEFAULT_STENCIL_MASK: u32 = 1;
    pub const DEFAULT_STENCIL_OPERATION: StencilOperation = StencilOperation::Keep;
    pub const DEFAULT_SCISSOR_BOX: [i32; 4] = [0, 0, -1, -1];

    /// Returns `true` if `name` is one of the recognized state names.
    pub fn is_state_name(name: &str) -> bool {
        Self::PROPERTY_NAMES.contains(&name)
    }

    /// Returns the default value of a state, as stored in a binding map.
    pub fn default_value(name: &str) -> Option<DataValue> {
        let defaults = States::default();
        defaults.get(name)
    }

    /// Reads one state as a [`DataValue`].
    pub fn get(&self, name: &str) -> Option<DataValue> {
        let value = match name {
            Self::PROPERTY_BLEND_MODE => DataValue::Blending(self.blending),
            Self::PROPERTY_COLOR_MASK => DataValue::Bool(self.color_mask),
            Self::PROPERTY_DEPTH_MASK => DataValue::Bool(self.depth_mask),
            Self::PROPERTY_DEPTH_FUNCTION => DataValue::Compare(self.depth_function),
            Self::PROPERTY_TRIANGLE_CULLING => DataValue::Culling(self.triangle_culling),
            Self::PROPERTY_STENCIL_FUNCTION => DataValue::Compare(self.stencil_function),
            Self::PROPERTY_STENCIL_REFERENCE => DataValue::Int(self.stencil_reference),
            Self::PROPERTY_STENCIL_MASK => DataValue::Int(self.stencil_mask as i32),
            Self::PROPERTY_STENCIL_FAIL_OPERATION => {
                DataValue::Stencil(self.stencil_fail_operation)
            }
            Self::PROPERTY_STENCIL_Z_FAIL_OPERATION => {
                DataValue::Stencil(self.stencil_z_fail_operation)
            }
            Self::PROPERTY_STENCIL_Z_PASS_OPERATION => {
                DataValue::Stencil(self.stencil_z_pass_operation)
            }
            Self::PROPERTY_SCISSOR_BOX => DataValue::Int4(self.scissor_box),
            Self::PROPERTY_PRIORITY => DataValue::Float(self.priority),
            Self::PROPERTY_ZSORTED => DataValue::Bool(self.z_sorted),
            _ => return None,
        };
        Some(value)
    }

    /// Writes one state from a [`DataValue`].
    ///
    /// Returns `false`, leaving the states untouched, if the name is unknown
    /// or the value has the wrong type for that state.
    pub fn set(&mut self, name: &str, value: &DataValue) -> bool {
        match (name, value) {
            (Self::PROPERTY_BLEND_MODE, DataValue::Blending(v)) => self.blending = *v,
            (Self::PROPERTY_COLOR_MASK, DataValue::Bool(v)) => self.color_mask = *v,
            (Self::PROPERTY_DEPTH_MASK, DataValue::Bool(v)) => self.depth_mask = *v,
            (Self::PROPERTY_DEPTH_FUNCTION, DataValue::Compare(v)) => self.depth_function = *v,
            (Self::PROPERTY_TRIANGLE_CULLING, DataValue::Culling(v)) => {
                self.triangle_culling = *v
            }
            (Self::PROPERTY_STENCIL_FUNCTION, DataValue::Compare(v)) => {
                self.stencil_function = *v
            }
            (Self::PROPERTY_STENCIL_REFERENCE, DataValue::Int(v)) => self.stencil_reference = *v,
            (Self::PROPERTY_STENCIL_MASK, DataValue::Int(v)) => self.stencil_mask = *v as u32,
            (Self::PROPERTY_STENCIL_FAIL_OPERATION, DataValue::Stencil(v)) => {
                self.stencil_fail_operation = *v
            }
            (Self::PROPERTY_STENCIL_Z_FAIL_OPERATION, DataValue::Stencil(v)) => {
                self.stencil_z_fail_operation = *v
            }
            (Self::PROPERTY_STENCIL_Z_PASS_OPERATION, DataValue::Stencil(v)) => {
                self.stencil_z_pass_operation = *v
            }
            (Self::PROPERTY_SCISSOR_BOX, DataValue::Int4(v)) => self.scissor_box = *v,
            (Self::PROPERTY_PRIORITY, DataValue::Float(v)) => self.priority = *v,
            (Self::PROPERTY_ZSORTED, DataValue::Bool(v)) => self.z_sorted = *v,
            _ => return false,
        }
        true
    }
}

impl Default for States {
    fn default() -> Self {
        Self {
            priority: Self::DEFAULT_PRIORITY,
            z_sorted: Self::DEFAULT_ZSORTED,
            blending: Self::DEFAULT_BLENDING,
            color_mask: Self::DEFAULT_COLOR_MASK,
            depth_mask: Self::DEFAULT_DEPTH_MASK,
            depth_function: Self::DEFAULT_DEPTH_FUNCTION,
            triangle_culling: Self::DEFAULT_TRIANGLE_CULLING,
            stencil_function: Self::DEFAULT_STENCIL_FUNCTION,
            stencil_reference: Self::DEFAULT_STENCIL_REFERENCE,
            stencil_mask: Self::DEFAULT_STENCIL_MASK,
            stencil_fail_operation: Self::DEFAULT_STENCIL_OPERATION,
            stencil_z_fail_operation: Self::DEFAULT_STENCIL_OPERATION,
            stencil_z_pass_operation: Self::DEFAULT_STENCIL_OPERATION,
            scissor_box: Self::DEFAULT_SCISSOR_BOX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn there_are_exactly_fourteen_states() {
        let mut names = States::PROPERTY_NAMES.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 14);
        assert!(States::is_state_name("zSort"));
        assert!(!States::is_state_name("zsort"));
        assert!(!States::is_state_name("target"));
    }

    #[test]
    fn every_state_round_trips_through_data_values() {
        let defaults = States::default();
        for name in States::PROPERTY_NAMES {
            let value = defaults.get(name).unwrap();
            let mut states = States::default();
            assert!(states.set(name, &value), "state {name} rejected its own default");
            assert_eq!(states, defaults);
        }
    }

    #[test]
    fn mistyped_values_are_rejected() {
        let mut states = States::default();
        assert!(!states.set(States::PROPERTY_PRIORITY, &DataValue::Bool(true)));
        assert!(!states.set("unknown", &DataValue::Float(1.0)));
        assert_eq!(states, States::default());
    }

    #[test]
    fn blend_mode_names() {
        assert_eq!(Blending::from_mode_name("alpha"), Some(Blending::ALPHA));
        assert_eq!(
            Blending::from_mode_name("additive").map(|b| b.destination),
            Some(BlendFactor::One)
        );
        assert_eq!(Blending::from_mode_name("multiply"), None);
    }

    #[test]
    fn priority_levels_are_ordered() {
        assert_eq!(priority::from_name("transparent"), Some(1000.0));
        assert!(priority::FIRST > priority::BACKGROUND);
        assert!(priority::OPAQUE > priority::TRANSPARENT);
        assert_eq!(priority::from_name("middle"), None);
    }
}
