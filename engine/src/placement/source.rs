use glam::{Quat, Vec2, Vec3};

use super::Pose;
use crate::scene::Ray;

/// One tick's query: where to cast, how far, and which way is up for the decal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aim {
    pub ray: Ray,
    pub max_distance: f32,
    pub up: Vec3,
}

/// Supplies the query ray for a [`Positioner`](super::Positioner), once per tick.
///
/// Returning `None` skips the tick without touching the decal (no pointer, no camera, ...).
pub trait RaySource {
    fn aim(&mut self) -> Option<Aim>;
}

impl<F> RaySource for F
where
    F: FnMut() -> Option<Aim>,
{
    fn aim(&mut self) -> Option<Aim> {
        self()
    }
}

/// Casts from a tracked pose: origin is the pose plus `offset` in the pose's frame, direction is
/// the pose's forward turned by `rotation_offset`, up is the pose's up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedRay {
    /// The pose being followed. Update it every tick before the positioner runs.
    pub target: Pose,
    pub offset: Vec3,
    pub rotation_offset: Quat,
    pub cast_length: f32,
}

impl TrackedRay {
    pub fn new(target: Pose) -> Self {
        Self {
            target,
            ..Default::default()
        }
    }
}

impl Default for TrackedRay {
    fn default() -> Self {
        Self {
            target: Pose::IDENTITY,
            offset: Vec3::ZERO,
            rotation_offset: Quat::IDENTITY,
            cast_length: 10.0,
        }
    }
}

impl RaySource for TrackedRay {
    fn aim(&mut self) -> Option<Aim> {
        let origin = self.target.transform_point(self.offset);
        let direction = self.target.rotation * self.rotation_offset * Vec3::NEG_Z;
        Some(Aim {
            ray: Ray::new(origin, direction)?,
            max_distance: self.cast_length,
            up: self.target.up(),
        })
    }
}

/// A perspective camera able to turn viewport coordinates into world rays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub pose: Pose,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Viewport size in pixels.
    pub viewport: Vec2,
    pub near: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            pose: Pose::IDENTITY,
            fov_y: std::f32::consts::FRAC_PI_3,
            viewport: Vec2::new(1280.0, 720.0),
            near: 0.1,
        }
    }
}

impl Camera {
    /// Ray from the near plane through viewport position `cursor` (pixels, origin top-left).
    ///
    /// Returns `None` for an empty viewport.
    pub fn viewport_to_world(&self, cursor: Vec2) -> Option<Ray> {
        if self.viewport.x <= 0.0 || self.viewport.y <= 0.0 {
            return None;
        }
        let ndc = Vec2::new(
            2.0 * cursor.x / self.viewport.x - 1.0,
            1.0 - 2.0 * cursor.y / self.viewport.y,
        );
        let half_height = (self.fov_y * 0.5).tan();
        let aspect = self.viewport.x / self.viewport.y;
        let local = Vec3::new(ndc.x * half_height * aspect, ndc.y * half_height, -1.0);
        let direction = self.pose.rotation * local;
        Ray::new(self.pose.translation + direction * self.near, direction)
    }
}

/// The host's view of the pointer: where the cursor is right now and which camera is primary.
pub trait View {
    /// Cursor position in viewport pixels, or `None` when there is no pointer.
    fn cursor(&self) -> Option<Vec2>;

    /// The camera used when the [`PointerRay`] has none designated.
    fn primary_camera(&self) -> Option<Camera> {
        None
    }
}

/// Casts through the live cursor position using the designated camera, or the view's primary
/// camera when none is designated. Up is the camera's up.
#[derive(Debug, Clone)]
pub struct PointerRay<V> {
    pub view: V,
    pub camera: Option<Camera>,
    pub max_distance: f32,
}

impl<V: View> PointerRay<V> {
    pub fn new(view: V) -> Self {
        Self {
            view,
            camera: None,
            max_distance: 100.0,
        }
    }

    /// Designate the camera to cast through.
    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.camera = Some(camera);
        self
    }
}

impl<V: View> RaySource for PointerRay<V> {
    fn aim(&mut self) -> Option<Aim> {
        let camera = self.camera.or_else(|| self.view.primary_camera())?;
        let cursor = self.view.cursor()?;
        Some(Aim {
            ray: camera.viewport_to_world(cursor)?,
            max_distance: self.max_distance,
            up: camera.pose.up(),
        })
    }
}
