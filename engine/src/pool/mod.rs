//! The decal instance pool contract.
//!
//! Decal render instances are owned by an external pool that recycles them instead of creating
//! and destroying one per effect. The decal core only ever talks to the pool through
//! [`InstancePool`] and holds non-owning [`InstanceHandle`]s.
//!
//! [`MemoryPool`] is a plain in-memory implementation that records what the core asked for. It
//! is what the tests, the demo and the benches run against.

mod memory;

use glam::{Quat, Vec3, Vec4};

use crate::core::Result;

pub use memory::{Instance, MemoryPool};

/// Identifies a decal template (mesh + material setup) the pool knows how to instantiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TemplateId(pub u32);

/// A non-owning handle to a pooled decal instance.
///
/// Handles carry a generation so a handle kept past `release` is detected as stale once the slot
/// is handed out again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceHandle {
    index: u32,
    generation: u32,
}

impl InstanceHandle {
    /// Construct a handle from a slot index and generation.
    #[inline]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index of the instance if it were to live in indexable storage (e.g. Vec)
    #[inline]
    pub fn index(&self) -> usize {
        self.index as usize
    }

    /// Generation of the slot this handle was issued for.
    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// A visual property a modifier can push to an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    Opacity,
    Tint,
}

/// Value written to a [`Property`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyValue {
    Scalar(f32),
    Color(Vec4),
}

/// Operations the decal core needs from the owner of decal instances.
pub trait InstancePool {
    /// Hand out an instance of `template`. New instances start inactive.
    fn acquire(&mut self, template: TemplateId) -> Result<InstanceHandle>;

    /// Show or hide an instance. Hidden instances keep their transform and properties.
    fn set_active(&mut self, handle: InstanceHandle, active: bool) -> Result<()>;

    /// Whether the instance is currently shown.
    fn is_active(&self, handle: InstanceHandle) -> Result<bool>;

    /// Place an instance in the world.
    fn set_transform(
        &mut self,
        handle: InstanceHandle,
        position: Vec3,
        orientation: Quat,
    ) -> Result<()>;

    /// Push a visual property to an instance.
    fn set_property(
        &mut self,
        handle: InstanceHandle,
        property: Property,
        value: PropertyValue,
    ) -> Result<()>;

    /// Give the instance back to the pool. The handle is stale afterwards.
    fn release(&mut self, handle: InstanceHandle) -> Result<()>;
}
