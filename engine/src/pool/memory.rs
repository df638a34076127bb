use glam::{Quat, Vec3, Vec4};
use log::trace;

use super::{InstanceHandle, InstancePool, Property, PropertyValue, TemplateId};
use crate::core::{Error, Result};

/// State of one pooled decal instance as last set by the decal core.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub template: TemplateId,
    pub active: bool,
    pub position: Vec3,
    pub orientation: Quat,
    pub opacity: f32,
    pub tint: Vec4,
}

impl Instance {
    fn new(template: TemplateId) -> Self {
        Self {
            template,
            active: false,
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            opacity: 1.0,
            tint: Vec4::ONE,
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    instance: Option<Instance>,
}

/// An in-memory [`InstancePool`].
///
/// Released slots go on a free list and are reused with a bumped generation, so a handle kept
/// past `release` reports [`Error::UnknownInstance`] instead of touching the new occupant.
#[derive(Debug, Default)]
pub struct MemoryPool {
    slots: Vec<Slot>,
    free: Vec<u32>,
    capacity: Option<usize>,
}

impl MemoryPool {
    /// Construct an unbounded pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a pool that holds at most `capacity` live instances.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            capacity: Some(capacity),
        }
    }

    /// Look up a live instance.
    pub fn get(&self, handle: InstanceHandle) -> Option<&Instance> {
        self.slots
            .get(handle.index())
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.instance.as_ref())
    }

    /// Number of instances currently handed out.
    pub fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Number of handed-out instances that are shown.
    pub fn visible(&self) -> usize {
        self.slots
            .iter()
            .filter_map(|slot| slot.instance.as_ref())
            .filter(|instance| instance.active)
            .count()
    }

    fn get_mut(&mut self, handle: InstanceHandle) -> Result<&mut Instance> {
        self.slots
            .get_mut(handle.index())
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.instance.as_mut())
            .ok_or(Error::UnknownInstance(handle))
    }
}

impl InstancePool for MemoryPool {
    fn acquire(&mut self, template: TemplateId) -> Result<InstanceHandle> {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.instance = Some(Instance::new(template));
            trace!("Reusing instance slot {index} for {template:?}");
            return Ok(InstanceHandle::new(index, slot.generation));
        }
        if self.capacity.is_some_and(|capacity| self.slots.len() >= capacity) {
            return Err(Error::PoolExhausted(template));
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            instance: Some(Instance::new(template)),
        });
        Ok(InstanceHandle::new(index, 0))
    }

    fn set_active(&mut self, handle: InstanceHandle, active: bool) -> Result<()> {
        self.get_mut(handle)?.active = active;
        Ok(())
    }

    fn is_active(&self, handle: InstanceHandle) -> Result<bool> {
        self.get(handle)
            .map(|instance| instance.active)
            .ok_or(Error::UnknownInstance(handle))
    }

    fn set_transform(
        &mut self,
        handle: InstanceHandle,
        position: Vec3,
        orientation: Quat,
    ) -> Result<()> {
        let instance = self.get_mut(handle)?;
        instance.position = position;
        instance.orientation = orientation;
        Ok(())
    }

    fn set_property(
        &mut self,
        handle: InstanceHandle,
        property: Property,
        value: PropertyValue,
    ) -> Result<()> {
        let instance = self.get_mut(handle)?;
        match (property, value) {
            (Property::Opacity, PropertyValue::Scalar(opacity)) => instance.opacity = opacity,
            (Property::Opacity, PropertyValue::Color(color)) => instance.opacity = color.w,
            (Property::Tint, PropertyValue::Color(color)) => instance.tint = color,
            (Property::Tint, PropertyValue::Scalar(scale)) => {
                instance.tint = Vec4::new(scale, scale, scale, instance.tint.w)
            }
        }
        Ok(())
    }

    fn release(&mut self, handle: InstanceHandle) -> Result<()> {
        self.get_mut(handle)?;
        let slot = &mut self.slots[handle.index()];
        slot.instance = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index() as u32);
        trace!("Released instance {handle:?}");
        Ok(())
    }
}
