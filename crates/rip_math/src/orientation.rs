// Orientation utilities for Mat3
//
// Captures come out of the GPU in whatever axis convention the game used.
// These helpers build the 3x3 remap into a Z-up, Y-forward frame and answer
// whether a given matrix mirrors space (which flips triangle winding).

use std::fmt;
use std::str::FromStr;

use glam::{Mat3, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when building an orientation matrix.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrientationError {
    #[error("Forward axis {forward} and up axis {up} lie on the same axis")]
    SameAxis { forward: Axis, up: Axis },

    #[error("Unknown axis name: {0:?} (expected X, Y, Z, -X, -Y or -Z)")]
    UnknownAxis(String),
}

/// A signed coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    #[serde(rename = "X")]
    X,
    #[serde(rename = "Y")]
    Y,
    #[serde(rename = "Z")]
    Z,
    #[serde(rename = "-X")]
    NegX,
    #[serde(rename = "-Y")]
    NegY,
    #[serde(rename = "-Z")]
    NegZ,
}

impl Axis {
    /// Unit vector pointing along this axis.
    pub fn vector(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
            Axis::NegX => Vec3::NEG_X,
            Axis::NegY => Vec3::NEG_Y,
            Axis::NegZ => Vec3::NEG_Z,
        }
    }

    /// Index of the underlying axis, ignoring sign (0=X, 1=Y, 2=Z).
    pub fn index(self) -> usize {
        match self {
            Axis::X | Axis::NegX => 0,
            Axis::Y | Axis::NegY => 1,
            Axis::Z | Axis::NegZ => 2,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
            Axis::NegX => "-X",
            Axis::NegY => "-Y",
            Axis::NegZ => "-Z",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Axis {
    type Err = OrientationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "X" => Ok(Axis::X),
            "Y" => Ok(Axis::Y),
            "Z" => Ok(Axis::Z),
            "-X" => Ok(Axis::NegX),
            "-Y" => Ok(Axis::NegY),
            "-Z" => Ok(Axis::NegZ),
            _ => Err(OrientationError::UnknownAxis(s.to_string())),
        }
    }
}

/// Build the matrix that maps a source frame onto the Z-up, Y-forward frame.
///
/// The returned matrix sends `forward` to +Y, `up` to +Z and
/// `forward x up` to +X. Forward and up must lie on different axes.
pub fn axis_conversion(forward: Axis, up: Axis) -> Result<Mat3, OrientationError> {
    if forward.index() == up.index() {
        return Err(OrientationError::SameAxis { forward, up });
    }

    let f = forward.vector();
    let u = up.vector();
    let r = f.cross(u);

    // Rows of the result are the source basis vectors, so the basis is
    // orthonormal and the inverse is the transpose.
    Ok(Mat3::from_cols(r, f, u).transpose())
}

/// Mirror along the X axis.
pub fn mirror_x() -> Mat3 {
    Mat3::from_diagonal(Vec3::new(-1.0, 1.0, 1.0))
}

/// Extension trait for Mat3 with helpers used during mesh conversion.
pub trait Mat3Ext {
    /// True if the matrix reverses handedness (negative determinant).
    fn is_mirroring(&self) -> bool;

    /// Apply the matrix to every vector in a slice.
    fn transform_all(&self, vectors: &[Vec3]) -> Vec<Vec3>;
}

impl Mat3Ext for Mat3 {
    fn is_mirroring(&self) -> bool {
        self.determinant() < 0.0
    }

    fn transform_all(&self, vectors: &[Vec3]) -> Vec<Vec3> {
        vectors.iter().map(|&v| *self * v).collect()
    }
}
