//! Quaternion rotations and rigid point-set transforms

use nalgebra::{Unit, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Axes shorter than this are treated as zero-length
const AXIS_EPSILON: f64 = 1e-12;

/// Errors raised when building rotations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Rotation axis {0:?} has zero length")]
    DegenerateAxis(Vector3<f64>),
}

/// A unit rotation quaternion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    quaternion: UnitQuaternion<f64>,
}

impl Default for Rotation {
    fn default() -> Self {
        Self::identity()
    }
}

impl Rotation {
    /// The rotation that leaves every point in place
    pub fn identity() -> Self {
        Self {
            quaternion: UnitQuaternion::identity(),
        }
    }

    /// Rotation by `angle` radians about the direction of `axis`.
    ///
    /// Only the direction of `axis` matters. A zero-length axis has no
    /// direction and is rejected.
    pub fn from_angle_axis(angle: f64, axis: &Vector3<f64>) -> Result<Self, MathError> {
        let unit_axis =
            Unit::try_new(*axis, AXIS_EPSILON).ok_or(MathError::DegenerateAxis(*axis))?;

        Ok(Self {
            quaternion: UnitQuaternion::from_axis_angle(&unit_axis, angle),
        })
    }

    /// Overwrite this rotation in place
    pub fn set_angle_axis(&mut self, angle: f64, axis: &Vector3<f64>) -> Result<(), MathError> {
        *self = Self::from_angle_axis(angle, axis)?;
        Ok(())
    }

    /// Rotate a vector about the origin
    pub fn rotate(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.quaternion.transform_vector(v)
    }
}

/// Rigidly rotate `points` about `pivot`.
///
/// Each point is moved so that `pivot` sits at the origin, rotated, then
/// moved back.
pub fn transform(
    pivot: &Vector3<f64>,
    rotation: &Rotation,
    points: &[Vector3<f64>],
) -> Vec<Vector3<f64>> {
    points
        .iter()
        .map(|p| rotation.rotate(&(p - pivot)) + pivot)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn assert_vec_eq(a: &Vector3<f64>, b: &Vector3<f64>) {
        assert!((a - b).norm() < 1e-9, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_quarter_turn_about_z() {
        let rotation = Rotation::from_angle_axis(FRAC_PI_2, &Vector3::z()).unwrap();
        assert_vec_eq(&rotation.rotate(&Vector3::x()), &Vector3::y());
    }

    #[test]
    fn test_axis_magnitude_is_ignored() {
        let short = Rotation::from_angle_axis(0.7, &Vector3::new(0.0, 1.0, 1.0)).unwrap();
        let long = Rotation::from_angle_axis(0.7, &Vector3::new(0.0, 25.0, 25.0)).unwrap();
        let p = Vector3::new(1.0, -2.0, 3.0);
        assert_vec_eq(&short.rotate(&p), &long.rotate(&p));
    }

    #[test]
    fn test_zero_axis_is_rejected() {
        let result = Rotation::from_angle_axis(1.0, &Vector3::zeros());
        assert_eq!(result, Err(MathError::DegenerateAxis(Vector3::zeros())));
    }

    #[test]
    fn test_set_angle_axis_overwrites() {
        let mut rotation = Rotation::identity();
        rotation.set_angle_axis(PI, &Vector3::x()).unwrap();
        assert_vec_eq(&rotation.rotate(&Vector3::y()), &-Vector3::y());
    }

    #[test]
    fn test_transform_about_pivot() {
        let pivot = Vector3::new(1.0, 1.0, 0.0);
        let rotation = Rotation::from_angle_axis(PI, &Vector3::z()).unwrap();
        let moved = transform(&pivot, &rotation, &[Vector3::new(2.0, 1.0, 0.0), pivot]);

        assert_vec_eq(&moved[0], &Vector3::new(0.0, 1.0, 0.0));
        // The pivot itself never moves
        assert_vec_eq(&moved[1], &pivot);
    }
}
