//! Conversion and import settings.
//!
//! [`ImportSettings`] is what a user edits (and what presets store as JSON).
//! [`ConversionConfig`] is the resolved, immutable form the conversion
//! pipeline consumes.

use rip_math::{axis_conversion, mirror_x, Axis, Mat3, OrientationError};
use serde::{Deserialize, Serialize};

/// Affine remap `value * multiplier + offset` for one axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisScale {
    pub multiplier: f32,
    pub offset: f32,
}

impl AxisScale {
    pub const IDENTITY: AxisScale = AxisScale {
        multiplier: 1.0,
        offset: 0.0,
    };

    pub fn new(multiplier: f32, offset: f32) -> Self {
        Self { multiplier, offset }
    }

    pub fn apply(&self, value: f32) -> f32 {
        value * self.multiplier + self.offset
    }
}

impl Default for AxisScale {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Parameters of one conversion run.
#[derive(Clone, Debug, PartialEq)]
pub struct ConversionConfig {
    /// Axis remap (and optional mirror) applied to positions and normals
    pub orientation: Mat3,

    /// Explicit winding flip, combined with the orientation's handedness
    pub flip_winding: bool,

    /// Emit custom normals when the capture has them
    pub use_normals: bool,

    /// Emit blend weight groups when the capture has them
    pub use_weights: bool,

    /// Divisor for integer-encoded normal components
    pub normal_int_divisor: u32,

    /// Per-axis remap of raw normals, applied before `orientation`
    pub normal_scale: [AxisScale; 3],

    /// Divisor for integer-encoded UV components
    pub uv_int_divisor: u32,

    /// Per-axis remap of UVs
    pub uv_scale: [AxisScale; 2],
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            orientation: Mat3::IDENTITY,
            flip_winding: false,
            use_normals: true,
            use_weights: true,
            normal_int_divisor: 255,
            normal_scale: [AxisScale::IDENTITY; 3],
            uv_int_divisor: 255,
            uv_scale: [AxisScale::IDENTITY; 2],
        }
    }
}

/// Resolved import options: conversion parameters plus the driver switches.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportOptions {
    pub conversion: ConversionConfig,

    /// Scan the shader listings and drop attributes the program ignores
    pub use_shaders: bool,

    /// Skip captures that have no (sampled) textures
    pub skip_untextured: bool,
}

/// User-facing import settings, serializable as a JSON preset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// Source forward axis
    pub axis_forward: Axis,

    /// Source up axis
    pub axis_up: Axis,

    /// Mirror the model along X after the axis conversion
    pub flip_x_axis: bool,

    /// Invert triangle winding (on top of any mirroring)
    pub flip_winding: bool,

    pub use_normals: bool,

    /// Divide integer normals by this value
    pub normal_int: u32,
    pub normal_mul: [f32; 3],
    pub normal_add: [f32; 3],

    /// Divide integer UVs by this value
    pub uv_int: u32,
    pub uv_mul: [f32; 2],
    pub uv_add: [f32; 2],

    /// Additionally apply a `1 - v` transform
    pub uv_flip_y: bool,

    pub use_weights: bool,
    pub use_shaders: bool,
    pub skip_untextured: bool,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            axis_forward: Axis::NegZ,
            axis_up: Axis::Y,
            flip_x_axis: false,
            flip_winding: false,
            use_normals: true,
            normal_int: 255,
            normal_mul: [1.0; 3],
            normal_add: [0.0; 3],
            uv_int: 255,
            uv_mul: [1.0; 2],
            uv_add: [0.0; 2],
            uv_flip_y: false,
            use_weights: true,
            use_shaders: false,
            skip_untextured: false,
        }
    }
}

impl ImportSettings {
    /// Orientation matrix implied by the axis settings.
    pub fn orientation(&self) -> Result<Mat3, OrientationError> {
        let matrix = axis_conversion(self.axis_forward, self.axis_up)?;
        Ok(if self.flip_x_axis {
            mirror_x() * matrix
        } else {
            matrix
        })
    }

    /// Remap for UV axis `i`, folding in the vertical flip.
    pub fn uv_scale(&self, i: usize) -> AxisScale {
        if self.uv_flip_y && i == 1 {
            AxisScale::new(-self.uv_mul[i], 1.0 - self.uv_add[i])
        } else {
            AxisScale::new(self.uv_mul[i], self.uv_add[i])
        }
    }

    /// Resolve into the options the import driver consumes.
    ///
    /// Zero divisors are raised to 1.
    pub fn to_options(&self) -> Result<ImportOptions, OrientationError> {
        let conversion = ConversionConfig {
            orientation: self.orientation()?,
            flip_winding: self.flip_winding,
            use_normals: self.use_normals,
            use_weights: self.use_weights,
            normal_int_divisor: self.normal_int.max(1),
            normal_scale: std::array::from_fn(|i| {
                AxisScale::new(self.normal_mul[i], self.normal_add[i])
            }),
            uv_int_divisor: self.uv_int.max(1),
            uv_scale: std::array::from_fn(|i| self.uv_scale(i)),
        };

        Ok(ImportOptions {
            conversion,
            use_shaders: self.use_shaders,
            skip_untextured: self.skip_untextured,
        })
    }
}
