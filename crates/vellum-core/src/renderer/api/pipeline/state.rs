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

//! Fixed-function state configurations carried by configuration commands.

use super::enums::*;

/// Blending state for one draw buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendingConfig {
    /// Source factor for the color channels.
    pub src_rgb: BlendFactor,
    /// Destination factor for the color channels.
    pub dst_rgb: BlendFactor,
    /// Equation combining the color channels.
    pub rgb_operation: BlendOperation,
    /// Source factor for the alpha channel.
    pub src_alpha: BlendFactor,
    /// Destination factor for the alpha channel.
    pub dst_alpha: BlendFactor,
    /// Equation combining the alpha channel.
    pub alpha_operation: BlendOperation,
    /// The constant blend color, RGBA.
    pub constant: [f32; 4],
    /// If `false`, blending is disabled for the draw buffer.
    pub enabled: bool,
}

impl Default for BlendingConfig {
    fn default() -> Self {
        Self::ALPHA
    }
}

impl BlendingConfig {
    const fn with(
        src_rgb: BlendFactor,
        dst_rgb: BlendFactor,
        rgb_operation: BlendOperation,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    ) -> Self {
        Self {
            src_rgb,
            dst_rgb,
            rgb_operation,
            src_alpha,
            dst_alpha,
            alpha_operation: BlendOperation::Add,
            constant: [1.0; 4],
            enabled: true,
        }
    }

    /// Blending switched off.
    pub const DISABLED: Self = Self {
        enabled: false,
        ..Self::ALPHA
    };

    /// Standard "over" alpha blending.
    pub const ALPHA: Self = Self::with(
        BlendFactor::SrcAlpha,
        BlendFactor::OneMinusSrcAlpha,
        BlendOperation::Add,
        BlendFactor::SrcAlpha,
        BlendFactor::OneMinusSrcAlpha,
    );

    /// The source replaces the destination.
    pub const OVERWRITE: Self = Self::with(
        BlendFactor::One,
        BlendFactor::Zero,
        BlendOperation::Add,
        BlendFactor::One,
        BlendFactor::Zero,
    );

    /// `src + dst` on color.
    pub const ADDITIVE: Self = Self::with(
        BlendFactor::One,
        BlendFactor::One,
        BlendOperation::Add,
        BlendFactor::SrcAlpha,
        BlendFactor::OneMinusSrcAlpha,
    );

    /// `dst - src` on color.
    pub const SUBTRACTIVE: Self = Self::with(
        BlendFactor::One,
        BlendFactor::One,
        BlendOperation::ReverseSubtract,
        BlendFactor::SrcAlpha,
        BlendFactor::OneMinusSrcAlpha,
    );

    /// `src * dst` on color.
    pub const MULTIPLY: Self = Self::with(
        BlendFactor::DstColor,
        BlendFactor::Zero,
        BlendOperation::Add,
        BlendFactor::SrcAlpha,
        BlendFactor::OneMinusSrcAlpha,
    );

    /// `min(src, dst)` on color.
    pub const DARKEN: Self = Self::with(
        BlendFactor::One,
        BlendFactor::One,
        BlendOperation::Min,
        BlendFactor::SrcAlpha,
        BlendFactor::OneMinusSrcAlpha,
    );

    /// `max(src, dst)` on color.
    pub const LIGHTEN: Self = Self::with(
        BlendFactor::One,
        BlendFactor::One,
        BlendOperation::Max,
        BlendFactor::SrcAlpha,
        BlendFactor::OneMinusSrcAlpha,
    );
}

/// Stencil test and write state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilConfig {
    /// The comparison against the reference value.
    pub test: CompareFunction,
    /// Applied when the stencil test fails.
    pub stencil_fail: StencilOperation,
    /// Applied when the stencil test passes but the depth test fails.
    pub depth_fail: StencilOperation,
    /// Applied when both tests pass.
    pub pixel_pass: StencilOperation,
    /// The reference value.
    pub reference: i32,
    /// Mask applied to both sides of the comparison.
    pub test_mask: i32,
    /// Mask applied to stencil writes.
    pub write_mask: i32,
    /// If `false`, stencil testing is disabled.
    pub enabled: bool,
}

impl Default for StencilConfig {
    fn default() -> Self {
        Self {
            test: CompareFunction::Always,
            stencil_fail: StencilOperation::Keep,
            depth_fail: StencilOperation::Keep,
            pixel_pass: StencilOperation::Keep,
            reference: 0,
            test_mask: i32::MAX,
            write_mask: i32::MAX,
            enabled: true,
        }
    }
}

impl StencilConfig {
    /// Stencil testing switched off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Depth test state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthTestConfig {
    /// The comparison against the stored depth.
    pub test: CompareFunction,
    /// If `true`, passing fragments write their depth.
    pub write: bool,
    /// If `false`, depth testing is disabled.
    pub enabled: bool,
}

impl Default for DepthTestConfig {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl DepthTestConfig {
    /// Depth testing switched off.
    pub const DISABLED: Self = Self {
        test: CompareFunction::Less,
        write: true,
        enabled: false,
    };

    /// Nearer fragments win and write their depth.
    pub const NORMAL: Self = Self {
        test: CompareFunction::Less,
        write: true,
        enabled: true,
    };

    /// Nearer fragments win without writing depth.
    pub const NORMAL_NO_WRITE: Self = Self {
        test: CompareFunction::Less,
        write: false,
        enabled: true,
    };

    /// Every fragment passes and writes its depth.
    pub const WRITE_UNCONDITIONALLY: Self = Self {
        test: CompareFunction::Always,
        write: true,
        enabled: true,
    };
}

/// Scissor rectangle state. The default rectangle covers everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScissorConfig {
    /// Left edge in window coordinates.
    pub left: i32,
    /// Bottom edge in window coordinates.
    pub bottom: i32,
    /// Width of the rectangle.
    pub width: i32,
    /// Height of the rectangle.
    pub height: i32,
    /// If `false`, scissor testing is disabled.
    pub enabled: bool,
}

impl Default for ScissorConfig {
    fn default() -> Self {
        Self {
            left: i32::MIN,
            bottom: i32::MIN,
            width: i32::MAX,
            height: i32::MAX,
            enabled: true,
        }
    }
}

impl ScissorConfig {
    /// Scissor testing switched off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// The values written by a window clear.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearValues {
    /// Clear color, RGBA.
    pub color: [f32; 4],
    /// Clear depth.
    pub depth: f64,
    /// Clear stencil value.
    pub stencil: i32,
}

impl Default for ClearValues {
    fn default() -> Self {
        Self {
            color: [0.0, 0.0, 0.0, 1.0],
            depth: 1.0,
            stencil: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blending_presets() {
        assert!(!BlendingConfig::DISABLED.enabled);
        assert_eq!(BlendingConfig::default(), BlendingConfig::ALPHA);
        assert_eq!(BlendingConfig::OVERWRITE.dst_alpha, BlendFactor::Zero);
        assert_eq!(
            BlendingConfig::SUBTRACTIVE.rgb_operation,
            BlendOperation::ReverseSubtract
        );
        assert_eq!(BlendingConfig::MULTIPLY.src_rgb, BlendFactor::DstColor);
        assert_eq!(BlendingConfig::ADDITIVE.constant, [1.0; 4]);
    }

    #[test]
    fn test_stencil_defaults() {
        let config = StencilConfig::default();
        assert_eq!(config.test, CompareFunction::Always);
        assert_eq!(config.test_mask, i32::MAX);
        assert!(config.enabled);
        assert!(!StencilConfig::disabled().enabled);
    }

    #[test]
    fn test_depth_presets() {
        assert_eq!(DepthTestConfig::default(), DepthTestConfig::NORMAL);
        assert!(!DepthTestConfig::NORMAL_NO_WRITE.write);
        assert_eq!(
            DepthTestConfig::WRITE_UNCONDITIONALLY.test,
            CompareFunction::Always
        );
    }

    #[test]
    fn test_scissor_default_covers_everything() {
        let config = ScissorConfig::default();
        assert_eq!(config.left, i32::MIN);
        assert_eq!(config.height, i32::MAX);
    }

    #[test]
    fn test_clear_defaults() {
        let values = ClearValues::default();
        assert_eq!(values.color, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(values.depth, 1.0);
    }
}
