//! Placing decals on whatever a ray hits.
//!
//! A [`Positioner`] owns at most one decal instance and, every tick, asks its [`RaySource`] for
//! a query ray, casts it into the scene and moves the instance onto the hit surface. The
//! decal's backward axis (`+Z`) ends up along the surface normal, so it faces away from the
//! surface and stays upright relative to the query source's up vector.
//!
//! Two ray sources ship with the crate:
//!
//! - [`TrackedRay`] follows a pose (a weapon muzzle, a flashlight) with a local offset.
//! - [`PointerRay`] unprojects the live cursor through a camera.
//!
//! Anything else is a closure returning an [`Aim`].

mod positioner;
mod source;

use glam::{Mat3, Quat, Vec3};

use crate::scene::Hit;

pub use positioner::{Positioner, PositionerSettings};
pub use source::{Aim, Camera, PointerRay, RaySource, TrackedRay, View};

/// The result of one placement query.
///
/// Produced fresh on every query and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Vec3,
    pub orientation: Quat,
    pub valid: bool,
}

impl Placement {
    /// Placement on a hit surface. The orientation looks into the surface (`-normal`) with `up`
    /// as the up reference.
    pub fn from_hit(hit: &Hit, up: Vec3) -> Self {
        Self {
            position: hit.point,
            orientation: look_rotation(-hit.normal, up),
            valid: true,
        }
    }

    /// A placement for a query that found nothing.
    pub const fn invalid() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            valid: false,
        }
    }
}

/// Rotation whose local forward (`-Z`) points along `forward` and whose local up (`+Y`) is as
/// close to `up` as possible.
///
/// When `up` is parallel to `forward` any perpendicular up is used, so the result is always a
/// unit quaternion.
pub fn look_rotation(forward: Vec3, up: Vec3) -> Quat {
    let back = (-forward).normalize_or(Vec3::Z);
    let mut up = up;
    if up.cross(back).length_squared() <= 1e-8 {
        up = back.any_orthonormal_vector();
    }
    let right = up.cross(back).normalize();
    let up = back.cross(right);
    Quat::from_mat3(&Mat3::from_cols(right, up, back))
}

/// A position and rotation in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// A pose at `translation` looking along `forward`.
    pub fn looking_to(translation: Vec3, forward: Vec3, up: Vec3) -> Self {
        Self::new(translation, look_rotation(forward, up))
    }

    /// Local `-Z` in world space.
    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Local `+Y` in world space.
    #[inline]
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Transform a point from this pose's local frame to world space.
    #[inline]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.translation + self.rotation * point
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backward_axis_follows_the_normal() {
        let normals = [
            Vec3::Y,
            Vec3::X,
            Vec3::NEG_Z,
            Vec3::new(1.0, 2.0, -0.5).normalize(),
        ];
        for normal in normals {
            let rotation = look_rotation(-normal, Vec3::Y);
            assert!(rotation.is_normalized());
            assert!(
                (rotation * Vec3::Z).abs_diff_eq(normal, 1e-5),
                "normal {normal:?}"
            );
        }
    }

    #[test]
    fn up_reference_is_respected_when_possible() {
        // A wall facing +X seen with world up keeps the decal upright.
        let rotation = look_rotation(Vec3::NEG_X, Vec3::Y);
        assert!((rotation * Vec3::Y).abs_diff_eq(Vec3::Y, 1e-5));
        assert!((rotation * Vec3::X).abs_diff_eq(Vec3::NEG_Z, 1e-5));
    }

    #[test]
    fn parallel_up_falls_back_to_any_perpendicular() {
        let rotation = look_rotation(Vec3::NEG_Y, Vec3::Y);
        assert!(rotation.is_normalized());
        assert!((rotation * Vec3::Z).abs_diff_eq(Vec3::Y, 1e-5));
        assert!((rotation * Vec3::Y).dot(Vec3::Y).abs() < 1e-5);
    }

    #[test]
    fn placement_from_hit() {
        let hit = Hit {
            point: Vec3::new(1.0, 0.0, 3.0),
            normal: Vec3::Y,
            distance: 2.0,
        };

        let placement = Placement::from_hit(&hit, Vec3::NEG_Z);

        assert!(placement.valid);
        assert_eq!(placement.position, hit.point);
        assert!((placement.orientation * Vec3::Z).abs_diff_eq(Vec3::Y, 1e-5));
        assert!(!Placement::invalid().valid);
    }

    #[test]
    fn pose_axes() {
        let pose = Pose::looking_to(Vec3::ONE, Vec3::X, Vec3::Y);
        assert!(pose.forward().abs_diff_eq(Vec3::X, 1e-5));
        assert!(pose.up().abs_diff_eq(Vec3::Y, 1e-5));
        assert!(pose
            .transform_point(Vec3::NEG_Z)
            .abs_diff_eq(Vec3::new(2.0, 1.0, 1.0), 1e-5));
    }
}
