//! Ray queries against scene geometry.
//!
//! Positioners do not know what the scene is made of. They ask a [`SceneQuery`] for the nearest
//! hit along a ray, filtered by a [`LayerMask`] and bounded by a distance. Physics engines,
//! BVHs or the bundled [`Shapes`] can all answer that question.

mod shapes;

use glam::Vec3;

pub use shapes::{Shape, Shapes};

/// A half-line with a normalized direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Construct a ray. `direction` is normalized; a zero direction yields `None`.
    pub fn new(origin: Vec3, direction: Vec3) -> Option<Self> {
        let direction = direction.try_normalize()?;
        Some(Self { origin, direction })
    }

    /// Point at `distance` along the ray.
    #[inline]
    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

/// The nearest intersection of a ray with scene geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub point: Vec3,
    /// Unit surface normal facing the ray origin's side.
    pub normal: Vec3,
    pub distance: f32,
}

/// A 32-bit collision layer filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const ALL: Self = Self(u32::MAX);
    pub const NONE: Self = Self(0);

    /// A mask containing just layer `n` (0..32).
    #[inline]
    pub const fn layer(n: u8) -> Self {
        Self(1 << (n & 31))
    }

    /// Combine two masks.
    #[inline]
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether the masks share at least one layer.
    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Casts rays against scene geometry.
pub trait SceneQuery {
    /// Return the nearest hit along `ray` within `max_distance` on any layer in `layers`.
    fn cast(&self, ray: Ray, max_distance: f32, layers: LayerMask) -> Option<Hit>;
}

impl<F> SceneQuery for F
where
    F: Fn(Ray, f32, LayerMask) -> Option<Hit>,
{
    fn cast(&self, ray: Ray, max_distance: f32, layers: LayerMask) -> Option<Hit> {
        self(ray, max_distance, layers)
    }
}
