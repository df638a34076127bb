//! Surface-conforming decal placement and timed per-instance effects.
//!
//! The crate is split into a handful of small layers:
//!
//! - [`core`]: step clock, fixed-period intervals, the simulation loop, logging and errors.
//! - [`pool`]: the instance pool contract decals are drawn from, plus an in-memory pool.
//! - [`scene`]: the ray query contract against scene geometry, plus a primitive scene.
//! - [`placement`]: positioners that keep a decal glued to whatever a ray hits.
//! - [`modifier`]: timed effects (fade, cull) and the tiered [`Scheduler`] driving them.
//!
//! # Usage
//!
//! ```rust,ignore
//! use rusty_decals::prelude::*;
//!
//! let mut pool = MemoryPool::new();
//! let mut scheduler = Scheduler::new();
//! let scene = Shapes::new().with(Shape::plane(Vec3::ZERO, Vec3::Y), LayerMask::layer(0));
//!
//! let mut positioner = Positioner::new(
//!     PositionerSettings { template: Some(TemplateId(0)), ..Default::default() },
//!     TrackedRay::default(),
//! );
//! positioner.enable(&mut pool, Some(&mut scheduler))?;
//!
//! let mut time = Time::new();
//! loop {
//!     time = time.next();
//!     scheduler.update(&time, &mut pool)?;
//!     positioner.tick(&scene, &mut pool, Some(&mut scheduler))?;
//! }
//! ```

pub mod core;
pub mod modifier;
pub mod placement;
pub mod pool;
pub mod scene;

pub use crate::core::{Error, Result};
pub use modifier::Scheduler;

/// Commonly used types, re-exported for convenience.
pub mod prelude {
    pub use crate::core::{Cancel, Error, Interval, Pacing, Result, SimLoop, Time};
    pub use crate::modifier::{
        Commands, Context, Cull, CullAction, CullSettings, Curve, Fade, FadeSettings, Lifecycle,
        Modifier, ModifierKey, Scheduler, Tier, Wrap,
    };
    pub use crate::placement::{
        Aim, Camera, Placement, PointerRay, Pose, Positioner, PositionerSettings, RaySource,
        TrackedRay, View,
    };
    pub use crate::pool::{
        InstanceHandle, InstancePool, MemoryPool, Property, PropertyValue, TemplateId,
    };
    pub use crate::scene::{Hit, LayerMask, Ray, SceneQuery, Shape, Shapes};
    pub use glam::{Quat, Vec2, Vec3, Vec4};
}
