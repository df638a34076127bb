use glam::Vec3;
use log::{debug, warn};

use super::{Placement, RaySource};
use crate::core::Result;
use crate::modifier::Scheduler;
use crate::pool::{InstanceHandle, InstancePool, TemplateId};
use crate::scene::{LayerMask, Ray, SceneQuery};

/// Configuration shared by every positioner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionerSettings {
    /// Template the decal instance is acquired from. Without one the positioner never places.
    pub template: Option<TemplateId>,
    /// Layers the query ray collides with.
    pub layers: LayerMask,
    /// Keep the decal visible at its last placement when a query misses.
    pub always_visible: bool,
}

impl Default for PositionerSettings {
    fn default() -> Self {
        Self {
            template: None,
            layers: LayerMask::ALL,
            always_visible: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Ready,
    /// No template was configured. Reported once, never retried.
    Inert,
}

/// Keeps one decal instance glued to whatever its [`RaySource`] points at.
///
/// The instance is acquired lazily the first time the positioner is enabled (or first hits)
/// and is only ever hidden afterwards, never released: the positioner reuses it across
/// enable/disable cycles.
///
/// Every method that can show or hide the instance takes an optional [`Scheduler`]. When given,
/// the modifiers bound to the instance follow its visibility: hiding deactivates them, showing
/// activates them again.
pub struct Positioner<S> {
    settings: PositionerSettings,
    source: S,
    active: Option<InstanceHandle>,
    enabled: bool,
    status: Status,
}

impl<S: RaySource> Positioner<S> {
    pub fn new(settings: PositionerSettings, source: S) -> Self {
        Self {
            settings,
            source,
            active: None,
            enabled: false,
            status: Status::Ready,
        }
    }

    /// The decal instance managed by this positioner, if one was acquired.
    #[inline]
    pub fn active(&self) -> Option<InstanceHandle> {
        self.active
    }

    #[inline]
    pub fn settings(&self) -> &PositionerSettings {
        &self.settings
    }

    /// Change the layer filter.
    pub fn set_layers(&mut self, layers: LayerMask) {
        self.settings.layers = layers;
    }

    /// Change whether misses keep the decal visible.
    pub fn set_always_visible(&mut self, always_visible: bool) {
        self.settings.always_visible = always_visible;
    }

    #[inline]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Mutable access to the ray source, e.g. to move a tracked pose before the tick.
    #[inline]
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether the positioner gave up for lack of a template.
    #[inline]
    pub fn is_inert(&self) -> bool {
        self.status == Status::Inert
    }

    /// Enable the positioner, acquiring its instance on first use and showing it.
    pub fn enable(
        &mut self,
        pool: &mut dyn InstancePool,
        modifiers: Option<&mut Scheduler>,
    ) -> Result<()> {
        if self.enabled {
            return Ok(());
        }
        self.enabled = true;
        let Some(template) = self.template() else {
            return Ok(());
        };
        let handle = self.ensure_instance(template, pool)?;
        set_visible(handle, true, pool, modifiers)
    }

    /// Disable the positioner and hide its instance. The instance is kept for the next `enable`.
    pub fn disable(
        &mut self,
        pool: &mut dyn InstancePool,
        modifiers: Option<&mut Scheduler>,
    ) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        self.enabled = false;
        match self.active {
            Some(handle) => set_visible(handle, false, pool, modifiers),
            None => Ok(()),
        }
    }

    /// Run one tick: ask the source where to aim and reproject onto the scene.
    ///
    /// Disabled or inert positioners, and ticks where the source has no aim, leave the decal
    /// untouched and report an invalid placement.
    pub fn tick(
        &mut self,
        scene: &dyn SceneQuery,
        pool: &mut dyn InstancePool,
        modifiers: Option<&mut Scheduler>,
    ) -> Result<Placement> {
        if !self.enabled || self.is_inert() {
            return Ok(Placement::invalid());
        }
        let Some(aim) = self.source.aim() else {
            return Ok(Placement::invalid());
        };
        self.reproject(aim.ray, aim.max_distance, aim.up, scene, pool, modifiers)
    }

    /// Cast `ray` into the scene and move the decal onto the hit.
    ///
    /// On a hit the instance is shown (acquired first if needed) and fully overwritten with the
    /// new placement. On a miss it is hidden, unless `always_visible` is set, in which case its
    /// last transform is left as is.
    pub fn reproject(
        &mut self,
        ray: Ray,
        max_distance: f32,
        up: Vec3,
        scene: &dyn SceneQuery,
        pool: &mut dyn InstancePool,
        modifiers: Option<&mut Scheduler>,
    ) -> Result<Placement> {
        let Some(template) = self.template() else {
            return Ok(Placement::invalid());
        };
        match scene.cast(ray, max_distance, self.settings.layers) {
            Some(hit) => {
                let placement = Placement::from_hit(&hit, up);
                let handle = self.ensure_instance(template, pool)?;
                pool.set_transform(handle, placement.position, placement.orientation)?;
                set_visible(handle, true, pool, modifiers)?;
                Ok(placement)
            }
            None => {
                if !self.settings.always_visible
                    && let Some(handle) = self.active
                {
                    set_visible(handle, false, pool, modifiers)?;
                }
                Ok(Placement::invalid())
            }
        }
    }

    fn ensure_instance(
        &mut self,
        template: TemplateId,
        pool: &mut dyn InstancePool,
    ) -> Result<InstanceHandle> {
        if let Some(handle) = self.active {
            return Ok(handle);
        }
        let handle = pool.acquire(template)?;
        debug!("Acquired decal instance {handle:?} from {template:?}");
        self.active = Some(handle);
        Ok(handle)
    }

    /// The configured template, or `None` once the positioner is inert. The first lookup that
    /// finds no template reports it and turns the positioner inert for good.
    fn template(&mut self) -> Option<TemplateId> {
        if self.is_inert() {
            return None;
        }
        match self.settings.template {
            Some(template) => Some(template),
            None => {
                warn!("Decal positioner has no template configured, placement disabled");
                self.status = Status::Inert;
                None
            }
        }
    }
}

/// Show or hide `handle`. Its modifiers are only toggled when the visibility actually changes.
fn set_visible(
    handle: InstanceHandle,
    visible: bool,
    pool: &mut dyn InstancePool,
    modifiers: Option<&mut Scheduler>,
) -> Result<()> {
    let was_visible = pool.is_active(handle)?;
    pool.set_active(handle, visible)?;
    if was_visible == visible {
        return Ok(());
    }
    if let Some(scheduler) = modifiers {
        let toggled = scheduler.set_instance_active(handle, visible, pool)?;
        if toggled > 0 {
            debug!("Decal {handle:?} visible={visible}, toggled {toggled} modifiers");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::{Fade, FadeSettings, Tier};
    use crate::placement::{Aim, Pose, TrackedRay};
    use crate::pool::MemoryPool;
    use crate::scene::{Hit, Shape, Shapes};
    use log::{Level, LevelFilter, Log, Metadata, Record};
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::sync::Once;
    use std::time::Duration;

    const SCORCH: TemplateId = TemplateId(3);

    fn settings(always_visible: bool) -> PositionerSettings {
        PositionerSettings {
            template: Some(SCORCH),
            always_visible,
            ..Default::default()
        }
    }

    fn looking_down() -> TrackedRay {
        TrackedRay {
            target: Pose::looking_to(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y, Vec3::NEG_Z),
            ..Default::default()
        }
    }

    /// A scene that answers from a script, one answer per cast.
    struct Scripted(RefCell<VecDeque<Option<Hit>>>);

    impl Scripted {
        fn new(answers: impl IntoIterator<Item = Option<Hit>>) -> Self {
            Self(RefCell::new(answers.into_iter().collect()))
        }
    }

    impl SceneQuery for Scripted {
        fn cast(&self, _: Ray, _: f32, _: LayerMask) -> Option<Hit> {
            self.0.borrow_mut().pop_front().flatten()
        }
    }

    thread_local! {
        static WARNINGS: Cell<usize> = const { Cell::new(0) };
    }

    /// Counts warnings per test thread, so parallel tests don't see each other's records.
    struct WarnCounter;

    impl Log for WarnCounter {
        fn enabled(&self, metadata: &Metadata) -> bool {
            metadata.level() <= Level::Warn
        }

        fn log(&self, record: &Record) {
            if record.level() == Level::Warn {
                WARNINGS.with(|count| count.set(count.get() + 1));
            }
        }

        fn flush(&self) {}
    }

    /// Warnings logged so far on this thread.
    fn warnings() -> usize {
        static LOGGER: WarnCounter = WarnCounter;
        static INSTALL: Once = Once::new();
        INSTALL.call_once(|| {
            if log::set_logger(&LOGGER).is_ok() {
                log::set_max_level(LevelFilter::Warn);
            }
        });
        WARNINGS.with(Cell::get)
    }

    fn hit(point: Vec3, normal: Vec3) -> Option<Hit> {
        Some(Hit {
            point,
            normal,
            distance: 1.0,
        })
    }

    #[test]
    fn enable_acquires_lazily_and_reuses() {
        // Given
        let mut pool = MemoryPool::new();
        let mut positioner = Positioner::new(settings(false), looking_down());
        assert!(positioner.active().is_none());

        // When
        positioner.enable(&mut pool, None).unwrap();
        let first = positioner.active().unwrap();
        positioner.disable(&mut pool, None).unwrap();

        // Then - hidden, not released
        assert!(!pool.is_active(first).unwrap());
        assert_eq!(pool.live(), 1);

        // When
        positioner.enable(&mut pool, None).unwrap();

        // Then - same instance shown again
        assert_eq!(positioner.active(), Some(first));
        assert!(pool.is_active(first).unwrap());
        assert_eq!(pool.live(), 1);
    }

    #[test]
    fn hit_places_the_decal_facing_out_of_the_surface() {
        let mut pool = MemoryPool::new();
        let scene = Shapes::new().with(Shape::plane(Vec3::ZERO, Vec3::Y), LayerMask::ALL);
        let mut positioner = Positioner::new(settings(false), looking_down());
        positioner.enable(&mut pool, None).unwrap();

        let placement = positioner.tick(&scene, &mut pool, None).unwrap();

        assert!(placement.valid);
        let instance = pool.get(positioner.active().unwrap()).unwrap();
        assert!(instance.active);
        assert!(instance.position.abs_diff_eq(Vec3::ZERO, 1e-5));
        assert!((instance.orientation * Vec3::Z).abs_diff_eq(Vec3::Y, 1e-5));
    }

    #[test]
    fn reproject_backward_axis_equals_the_normal() {
        let mut pool = MemoryPool::new();
        let normal = Vec3::new(0.3, 0.9, -0.2).normalize();
        let scene = Scripted::new([hit(Vec3::new(2.0, 0.0, 1.0), normal)]);
        let mut positioner = Positioner::new(settings(false), looking_down());
        let ray = Ray::new(Vec3::Y, Vec3::NEG_Y).unwrap();

        let placement = positioner
            .reproject(ray, 10.0, Vec3::Y, &scene, &mut pool, None)
            .unwrap();

        assert!((placement.orientation * Vec3::Z).abs_diff_eq(normal, 1e-5));
        assert!(pool.is_active(positioner.active().unwrap()).unwrap());
    }

    #[test]
    fn miss_hides_the_decal() {
        let mut pool = MemoryPool::new();
        let scene = Scripted::new([hit(Vec3::ZERO, Vec3::Y), None]);
        let mut positioner = Positioner::new(settings(false), looking_down());
        positioner.enable(&mut pool, None).unwrap();

        assert!(positioner.tick(&scene, &mut pool, None).unwrap().valid);
        let placement = positioner.tick(&scene, &mut pool, None).unwrap();

        assert!(!placement.valid);
        assert!(!pool.is_active(positioner.active().unwrap()).unwrap());
    }

    #[test]
    fn always_visible_keeps_the_last_transform_through_misses() {
        // Given - hit, miss, hit
        let mut pool = MemoryPool::new();
        let first = Vec3::new(1.0, 0.0, 0.0);
        let third = Vec3::new(3.0, 0.0, 0.0);
        let scene = Scripted::new([hit(first, Vec3::Y), None, hit(third, Vec3::X)]);
        let mut positioner = Positioner::new(settings(true), looking_down());
        positioner.enable(&mut pool, None).unwrap();
        let handle = positioner.active().unwrap();

        // When - tick 1
        positioner.tick(&scene, &mut pool, None).unwrap();
        let after_first = pool.get(handle).unwrap().clone();

        // Then
        assert!(after_first.active);
        assert_eq!(after_first.position, first);

        // When - tick 2 misses
        positioner.tick(&scene, &mut pool, None).unwrap();

        // Then - still shown, transform from tick 1 untouched
        assert_eq!(pool.get(handle).unwrap(), &after_first);

        // When - tick 3
        positioner.tick(&scene, &mut pool, None).unwrap();

        // Then
        let instance = pool.get(handle).unwrap();
        assert!(instance.active);
        assert_eq!(instance.position, third);
        assert!((instance.orientation * Vec3::Z).abs_diff_eq(Vec3::X, 1e-5));
    }

    #[test]
    fn missing_template_makes_the_positioner_inert_for_good() {
        // Given
        let mut pool = MemoryPool::new();
        let scene = Shapes::new().with(Shape::plane(Vec3::ZERO, Vec3::Y), LayerMask::ALL);
        let mut positioner = Positioner::new(PositionerSettings::default(), looking_down());

        let before = warnings();

        // When
        positioner.enable(&mut pool, None).unwrap();
        let placement = positioner.tick(&scene, &mut pool, None).unwrap();

        // Then
        assert!(positioner.is_inert());
        assert!(!placement.valid);
        assert!(positioner.active().is_none());
        assert_eq!(pool.live(), 0);
        assert_eq!(warnings() - before, 1);

        // When - keep driving it every way there is
        for _ in 0..3 {
            positioner.tick(&scene, &mut pool, None).unwrap();
        }
        let ray = Ray::new(Vec3::Y, Vec3::NEG_Y).unwrap();
        positioner
            .reproject(ray, 10.0, Vec3::Y, &scene, &mut pool, None)
            .unwrap();
        positioner.disable(&mut pool, None).unwrap();
        positioner.enable(&mut pool, None).unwrap();

        // Then - reported exactly once
        assert_eq!(warnings() - before, 1);
        assert_eq!(pool.live(), 0);
    }

    #[test]
    fn hiding_the_decal_pauses_its_modifiers() {
        // Given - a placed decal with a fade on it
        let mut pool = MemoryPool::new();
        let mut scheduler = Scheduler::new();
        let scene = Scripted::new([hit(Vec3::ZERO, Vec3::Y), None, hit(Vec3::X, Vec3::Y)]);
        let mut positioner = Positioner::new(settings(false), looking_down());
        positioner.enable(&mut pool, Some(&mut scheduler)).unwrap();
        positioner.tick(&scene, &mut pool, Some(&mut scheduler)).unwrap();
        let decal = positioner.active().unwrap();
        let fade = scheduler
            .spawn(Fade::new(decal, FadeSettings::default()), Tier::EveryStep, &mut pool)
            .unwrap();

        // When - the next cast misses
        positioner.tick(&scene, &mut pool, Some(&mut scheduler)).unwrap();
        let performed = scheduler.step(Duration::from_millis(16), &mut pool).unwrap();

        // Then
        assert!(!pool.is_active(decal).unwrap());
        assert!(!scheduler.is_registered(fade));
        assert_eq!(performed, 0);

        // When - and the one after hits again
        positioner.tick(&scene, &mut pool, Some(&mut scheduler)).unwrap();
        let performed = scheduler.step(Duration::from_millis(16), &mut pool).unwrap();

        // Then
        assert!(pool.is_active(decal).unwrap());
        assert!(scheduler.is_registered(fade));
        assert_eq!(performed, 1);
    }

    #[test]
    fn disable_and_enable_carry_the_modifiers_along() {
        let mut pool = MemoryPool::new();
        let mut scheduler = Scheduler::new();
        let mut positioner = Positioner::new(settings(false), looking_down());
        positioner.enable(&mut pool, Some(&mut scheduler)).unwrap();
        let decal = positioner.active().unwrap();
        let fade = scheduler
            .spawn(Fade::new(decal, FadeSettings::default()), Tier::TenHz, &mut pool)
            .unwrap();

        positioner.disable(&mut pool, Some(&mut scheduler)).unwrap();
        assert!(!scheduler.is_registered(fade));

        positioner.enable(&mut pool, Some(&mut scheduler)).unwrap();
        assert!(scheduler.is_registered(fade));
        assert_eq!(scheduler.roster(Tier::TenHz), &[fade]);
    }

    #[test]
    fn without_a_scheduler_modifiers_are_left_alone() {
        let mut pool = MemoryPool::new();
        let mut scheduler = Scheduler::new();
        let mut positioner = Positioner::new(settings(false), looking_down());
        positioner.enable(&mut pool, None).unwrap();
        let decal = positioner.active().unwrap();
        let fade = scheduler
            .spawn(Fade::new(decal, FadeSettings::default()), Tier::EveryStep, &mut pool)
            .unwrap();

        positioner.disable(&mut pool, None).unwrap();

        assert!(!pool.is_active(decal).unwrap());
        assert!(scheduler.is_registered(fade));
    }

    #[test]
    fn disabled_positioner_does_not_query() {
        let mut pool = MemoryPool::new();
        let scene = Scripted::new([hit(Vec3::ZERO, Vec3::Y)]);
        let mut positioner = Positioner::new(settings(false), looking_down());

        let placement = positioner.tick(&scene, &mut pool, None).unwrap();

        assert!(!placement.valid);
        assert_eq!(scene.0.borrow().len(), 1);
    }

    #[test]
    fn layer_filter_is_forwarded_to_the_scene() {
        let mut pool = MemoryPool::new();
        let scene = Shapes::new().with(Shape::plane(Vec3::ZERO, Vec3::Y), LayerMask::layer(2));
        let mut positioner = Positioner::new(
            PositionerSettings {
                layers: LayerMask::layer(1),
                ..settings(false)
            },
            looking_down(),
        );
        positioner.enable(&mut pool, None).unwrap();

        assert!(!positioner.tick(&scene, &mut pool, None).unwrap().valid);

        positioner.set_layers(LayerMask::layer(2));
        assert!(positioner.tick(&scene, &mut pool, None).unwrap().valid);
    }

    #[test]
    fn closure_sources_drive_the_positioner() {
        let mut pool = MemoryPool::new();
        let scene = Shapes::new().with(Shape::plane(Vec3::ZERO, Vec3::Y), LayerMask::ALL);
        let mut x = 0.0;
        let mut positioner = Positioner::new(settings(false), move || {
            x += 1.0;
            Some(Aim {
                ray: Ray::new(Vec3::new(x, 2.0, 0.0), Vec3::NEG_Y)?,
                max_distance: 5.0,
                up: Vec3::NEG_Z,
            })
        });
        positioner.enable(&mut pool, None).unwrap();

        positioner.tick(&scene, &mut pool, None).unwrap();
        let placement = positioner.tick(&scene, &mut pool, None).unwrap();

        assert!(placement.position.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-5));
        assert!((placement.orientation * Vec3::Y).abs_diff_eq(Vec3::NEG_Z, 1e-5));
    }
}
