use std::time::Duration;

use glam::Vec4;
use log::debug;

use super::{Context, Curve, Modifier, Wrap};
use crate::core::{Error, Result};
use crate::pool::{InstanceHandle, InstancePool, Property, PropertyValue};

#[derive(Debug, Clone, PartialEq)]
pub struct FadeSettings {
    /// Property value over time, in seconds since the fade started.
    pub curve: Curve,
    pub wrap: Wrap,
    /// `Opacity` receives the sample as a scalar, `Tint` as a grey colour with full alpha.
    pub property: Property,
}

impl Default for FadeSettings {
    fn default() -> Self {
        Self {
            curve: Curve::linear(1.0, 0.0, 1.0),
            wrap: Wrap::Clamp,
            property: Property::Opacity,
        }
    }
}

/// Drives one visual property of an instance along a [`Curve`].
///
/// Time advances by the delta of each perform, so the fade runs at the same speed whatever tier
/// it is on; a slower tier just samples it more coarsely. A clamped fade deactivates itself once
/// it has pushed its final value. A fade whose instance was released stops quietly.
#[derive(Debug, Clone)]
pub struct Fade {
    instance: InstanceHandle,
    settings: FadeSettings,
    elapsed: Duration,
}

impl Fade {
    pub fn new(instance: InstanceHandle, settings: FadeSettings) -> Self {
        Self {
            instance,
            settings,
            elapsed: Duration::ZERO,
        }
    }

    pub fn settings(&self) -> &FadeSettings {
        &self.settings
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// The value the fade pushes at its current time.
    pub fn value(&self) -> f32 {
        self.settings
            .curve
            .sample_wrapped(self.elapsed.as_secs_f32(), self.settings.wrap)
    }

    /// Whether a clamped fade has reached the end of its curve. Wrapping fades never finish.
    pub fn is_finished(&self) -> bool {
        self.settings.wrap == Wrap::Clamp && self.elapsed.as_secs_f32() >= self.settings.curve.end()
    }

    /// Start over from the beginning of the curve.
    pub fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }

    fn push(&self, pool: &mut dyn InstancePool) -> Result<()> {
        let value = self.value();
        let value = match self.settings.property {
            Property::Opacity => PropertyValue::Scalar(value),
            Property::Tint => PropertyValue::Color(Vec4::new(value, value, value, 1.0)),
        };
        pool.set_property(self.instance, self.settings.property, value)
    }
}

impl Modifier for Fade {
    fn instance(&self) -> InstanceHandle {
        self.instance
    }

    fn name(&self) -> &'static str {
        "fade"
    }

    fn setup(&mut self, pool: &mut dyn InstancePool) -> Result<()> {
        self.push(pool)
    }

    fn perform(&mut self, ctx: &mut Context<'_>) -> Result<()> {
        self.elapsed += ctx.delta();
        match self.push(ctx.pool) {
            Err(Error::UnknownInstance(handle)) if handle == self.instance => {
                debug!("Fade lost its instance {handle:?}, stopping");
                ctx.deactivate_self();
                return Ok(());
            }
            result => result?,
        }
        if self.is_finished() {
            ctx.deactivate_self();
        }
        Ok(())
    }
}
