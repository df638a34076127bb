//! The tiered modifier scheduler.
//!
//! The [`Scheduler`] owns every modifier in a generational arena and keeps three ordered
//! rosters, one per [`Tier`]. A modifier's key sits in at most one roster: the one matching the
//! tier stored next to it. Registration only ever inserts into that roster and a tier change
//! moves the key in a single `&mut self` call, so no pass can observe a modifier in two tiers.
//!
//! # Passes
//!
//! - `EveryStep` runs from [`Scheduler::step`], once per call, with the step delta.
//! - `TenHz` and `OneHz` each own an [`Interval`] fed by [`Scheduler::advance`]. Every whole
//!   period accumulated fires one pass, with the period as delta. A long step fires several.
//!
//! Within a pass modifiers run in roster order, which is registration order; a tier change
//! appends to the end of the destination roster. No ordering is promised across tiers.
//!
//! # Cancellation
//!
//! Both periodic passes hold a clone of the scheduler's [`Cancel`] flag. Once it is raised
//! (through [`Scheduler::shutdown`] or any clone handed out by [`Scheduler::cancel_handle`]) no
//! further pass starts. A pass already running finishes.
//!
//! # Thread Safety
//!
//! The scheduler is meant to be owned by the thread running the simulation. Modifiers are not
//! required to be `Send`.

use std::time::Duration;

use fixedbitset::FixedBitSet;
use log::{info, trace};

use super::{
    Command, Commands, Context, Lifecycle, Modifier, ONE_HZ_PERIOD, TEN_HZ_PERIOD, Tier,
};
use crate::core::{Cancel, Interval, Result, Time};
use crate::pool::{InstanceHandle, InstancePool};

/// Identifies a modifier owned by a [`Scheduler`].
///
/// Keys carry a generation; a key kept past [`Scheduler::remove`] no longer matches anything and
/// every operation on it is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModifierKey {
    index: u32,
    generation: u32,
}

impl ModifierKey {
    #[inline]
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index as usize
    }

    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

struct Entry {
    modifier: Box<dyn Modifier>,
    tier: Tier,
    set_up: bool,
}

#[derive(Default)]
struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

fn entry_of(slots: &[Slot], key: ModifierKey) -> Option<&Entry> {
    slots
        .get(key.index())
        .filter(|slot| slot.generation == key.generation)
        .and_then(|slot| slot.entry.as_ref())
}

fn entry_of_mut(slots: &mut [Slot], key: ModifierKey) -> Option<&mut Entry> {
    slots
        .get_mut(key.index())
        .filter(|slot| slot.generation == key.generation)
        .and_then(|slot| slot.entry.as_mut())
}

/// Registered keys of one tier, in registration order.
#[derive(Default)]
struct Roster {
    order: Vec<ModifierKey>,
    members: FixedBitSet,
}

impl Roster {
    #[inline]
    fn contains(&self, key: ModifierKey) -> bool {
        self.members.contains(key.index())
    }

    /// Append `key`. Returns `false` if it was already present.
    fn insert(&mut self, key: ModifierKey) -> bool {
        if self.contains(key) {
            return false;
        }
        if key.index() >= self.members.len() {
            self.members.grow(key.index() + 1);
        }
        self.members.insert(key.index());
        self.order.push(key);
        true
    }

    /// Remove `key`, keeping the order of the rest. Returns `false` if it was absent.
    fn remove(&mut self, key: ModifierKey) -> bool {
        if !self.contains(key) {
            return false;
        }
        self.members.set(key.index(), false);
        if let Some(position) = self.order.iter().position(|member| *member == key) {
            self.order.remove(position);
        }
        true
    }
}

/// A timed tier's repeating pass.
struct Periodic {
    tier: Tier,
    interval: Interval,
    cancel: Cancel,
}

impl Periodic {
    fn new(tier: Tier, period: Duration, cancel: Cancel) -> Self {
        Self {
            tier,
            interval: Interval::new(period),
            cancel,
        }
    }
}

/// Registry and driver of modifiers, partitioned by [`Tier`].
///
/// Construct one at application start and pass it by `&mut` to whatever spawns modifiers.
///
/// # Example
///
/// ```rust,ignore
/// let mut scheduler = Scheduler::new();
/// let fade = scheduler.insert(Fade::new(instance, FadeSettings::default()), Tier::TenHz);
/// scheduler.activate(fade, &mut pool)?;
///
/// let mut time = Time::new();
/// loop {
///     time = time.next();
///     scheduler.update(&time, &mut pool)?;
/// }
/// ```
pub struct Scheduler {
    slots: Vec<Slot>,
    free: Vec<u32>,
    rosters: [Roster; 3],
    periodic: [Periodic; 2],
    commands: Commands,
    cancel: Cancel,
    scratch: Vec<ModifierKey>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Construct a scheduler with its own cancellation flag.
    pub fn new() -> Self {
        Self::with_cancel(Cancel::new())
    }

    /// Construct a scheduler whose periodic passes stop when `cancel` is raised. Share the flag
    /// with the simulation loop to tie both lifecycles together.
    pub fn with_cancel(cancel: Cancel) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            rosters: Default::default(),
            periodic: [
                Periodic::new(Tier::TenHz, TEN_HZ_PERIOD, cancel.clone()),
                Periodic::new(Tier::OneHz, ONE_HZ_PERIOD, cancel.clone()),
            ],
            commands: Commands::new(),
            cancel,
            scratch: Vec::new(),
        }
    }

    /// Take ownership of a modifier. It starts [`Lifecycle::Inactive`] on `tier`.
    pub fn insert(&mut self, modifier: impl Modifier + 'static, tier: Tier) -> ModifierKey {
        let entry = Entry {
            modifier: Box::new(modifier),
            tier,
            set_up: false,
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            return ModifierKey::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            entry: Some(entry),
        });
        ModifierKey::new(index, 0)
    }

    /// Insert a modifier and activate it right away.
    pub fn spawn(
        &mut self,
        modifier: impl Modifier + 'static,
        tier: Tier,
        pool: &mut dyn InstancePool,
    ) -> Result<ModifierKey> {
        let key = self.insert(modifier, tier);
        self.activate(key, pool)?;
        Ok(key)
    }

    /// Deregister and drop a modifier, handing it back. Stale keys return `None`.
    pub fn remove(&mut self, key: ModifierKey) -> Option<Box<dyn Modifier>> {
        self.deregister(key);
        let slot = self
            .slots
            .get_mut(key.index())
            .filter(|slot| slot.generation == key.generation)?;
        let entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(key.index);
        trace!("Removed modifier {} ({key:?})", entry.modifier.name());
        Some(entry.modifier)
    }

    /// Whether `key` names a modifier owned by this scheduler.
    #[inline]
    pub fn contains(&self, key: ModifierKey) -> bool {
        entry_of(&self.slots, key).is_some()
    }

    /// Borrow a modifier.
    pub fn get(&self, key: ModifierKey) -> Option<&dyn Modifier> {
        entry_of(&self.slots, key).map(|entry| entry.modifier.as_ref())
    }

    /// Number of modifiers owned, active or not.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Activate a modifier: run its `setup` hook if it never ran, then register it on its tier.
    ///
    /// Returns `Ok(false)` for stale keys and modifiers that are already active. A failing
    /// `setup` leaves the modifier inactive and propagates the error; the next activation retries.
    pub fn activate(&mut self, key: ModifierKey, pool: &mut dyn InstancePool) -> Result<bool> {
        let Some(entry) = entry_of_mut(&mut self.slots, key) else {
            return Ok(false);
        };
        let roster = &mut self.rosters[entry.tier.index()];
        if roster.contains(key) {
            return Ok(false);
        }
        if !entry.set_up {
            entry.modifier.setup(pool)?;
            entry.set_up = true;
        }
        roster.insert(key);
        trace!("Activated modifier {} ({key:?}) on {:?}", entry.modifier.name(), entry.tier);
        Ok(true)
    }

    /// Deactivate a modifier: deregister it. Its internal state is kept for a later
    /// [`Scheduler::activate`]. Returns `false` if it was not active.
    pub fn deactivate(&mut self, key: ModifierKey) -> bool {
        self.deregister(key)
    }

    /// Add a modifier to its tier's roster without running `setup`. Idempotent: returns `false`
    /// if it was already registered or the key is stale.
    pub fn register(&mut self, key: ModifierKey) -> bool {
        let Some(entry) = entry_of(&self.slots, key) else {
            return false;
        };
        let inserted = self.rosters[entry.tier.index()].insert(key);
        if inserted {
            trace!("Registered {key:?} on {:?}", entry.tier);
        }
        inserted
    }

    /// Remove a modifier from its tier's roster. Idempotent: returns `false` if it was not
    /// registered or the key is stale.
    pub fn deregister(&mut self, key: ModifierKey) -> bool {
        let Some(entry) = entry_of(&self.slots, key) else {
            return false;
        };
        let removed = self.rosters[entry.tier.index()].remove(key);
        if removed {
            trace!("Deregistered {key:?} from {:?}", entry.tier);
        }
        removed
    }

    /// Move a modifier to another tier. A registered modifier leaves the old roster and is
    /// appended to the new one in the same call; an inactive one just has its tier updated.
    /// Returns `false` for stale keys.
    pub fn set_tier(&mut self, key: ModifierKey, tier: Tier) -> bool {
        let Some(entry) = entry_of_mut(&mut self.slots, key) else {
            return false;
        };
        let previous = std::mem::replace(&mut entry.tier, tier);
        if previous != tier && self.rosters[previous.index()].remove(key) {
            self.rosters[tier.index()].insert(key);
            trace!("Moved {key:?} from {previous:?} to {tier:?}");
        }
        true
    }

    /// The tier a modifier is assigned to.
    pub fn tier(&self, key: ModifierKey) -> Option<Tier> {
        entry_of(&self.slots, key).map(|entry| entry.tier)
    }

    /// Whether a modifier is active (registered) or not.
    pub fn lifecycle(&self, key: ModifierKey) -> Option<Lifecycle> {
        self.contains(key).then(|| {
            if self.is_registered(key) {
                Lifecycle::Active
            } else {
                Lifecycle::Inactive
            }
        })
    }

    /// Whether a modifier sits in a roster.
    pub fn is_registered(&self, key: ModifierKey) -> bool {
        self.membership_count(key) > 0
    }

    /// Number of rosters holding `key`. Always `0` or `1`.
    pub fn membership_count(&self, key: ModifierKey) -> usize {
        if !self.contains(key) {
            return 0;
        }
        self.rosters
            .iter()
            .filter(|roster| roster.contains(key))
            .count()
    }

    /// Number of modifiers registered on `tier`.
    pub fn roster_len(&self, tier: Tier) -> usize {
        self.rosters[tier.index()].order.len()
    }

    /// Registered keys of `tier`, in invocation order.
    pub fn roster(&self, tier: Tier) -> &[ModifierKey] {
        &self.rosters[tier.index()].order
    }

    /// Activate or deactivate every modifier bound to `instance`. Returns how many changed state.
    pub fn set_instance_active(
        &mut self,
        instance: InstanceHandle,
        active: bool,
        pool: &mut dyn InstancePool,
    ) -> Result<usize> {
        let mut keys = std::mem::take(&mut self.scratch);
        keys.extend(self.slots.iter().enumerate().filter_map(|(index, slot)| {
            let entry = slot.entry.as_ref()?;
            (entry.modifier.instance() == instance)
                .then(|| ModifierKey::new(index as u32, slot.generation))
        }));
        let changed = keys.iter().try_fold(0, |changed, &key| -> Result<usize> {
            let toggled = if active {
                self.activate(key, pool)?
            } else {
                self.deactivate(key)
            };
            Ok(changed + usize::from(toggled))
        });
        keys.clear();
        self.scratch = keys;
        changed
    }

    /// Run the `EveryStep` pass once. Returns how many modifiers were performed.
    pub fn step(&mut self, delta: Duration, pool: &mut dyn InstancePool) -> Result<usize> {
        if self.is_shut_down() {
            return Ok(0);
        }
        self.run_pass(Tier::EveryStep, delta, pool)
    }

    /// Feed `delta` to the timed tiers and run every pass that came due. Returns how many
    /// modifiers were performed across all passes.
    pub fn advance(&mut self, delta: Duration, pool: &mut dyn InstancePool) -> Result<usize> {
        let mut performed = 0;
        for index in 0..self.periodic.len() {
            self.periodic[index].interval.accumulate(delta);
            loop {
                let periodic = &mut self.periodic[index];
                if periodic.cancel.is_cancelled() || !periodic.interval.consume() {
                    break;
                }
                let (tier, period) = (periodic.tier, periodic.interval.period());
                performed += self.run_pass(tier, period, pool)?;
            }
        }
        Ok(performed)
    }

    /// One simulation step: the `EveryStep` pass followed by the timed tiers.
    pub fn update(&mut self, time: &Time, pool: &mut dyn InstancePool) -> Result<usize> {
        let stepped = self.step(time.delta, pool)?;
        Ok(stepped + self.advance(time.delta, pool)?)
    }

    /// Stop issuing passes. Modifiers stay registered but are never performed again.
    pub fn shutdown(&mut self) {
        if !self.cancel.is_cancelled() {
            info!("Shutting down modifier scheduler with {} modifiers", self.len());
            self.cancel.cancel();
        }
    }

    /// A clone of the flag that stops this scheduler.
    pub fn cancel_handle(&self) -> Cancel {
        self.cancel.clone()
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    fn run_pass(
        &mut self,
        tier: Tier,
        delta: Duration,
        pool: &mut dyn InstancePool,
    ) -> Result<usize> {
        let roster = &self.rosters[tier.index()];
        let mut performed = 0;
        let mut outcome = Ok(());
        for &key in &roster.order {
            let Some(entry) = entry_of_mut(&mut self.slots, key) else {
                continue;
            };
            let mut ctx = Context::new(key, tier, delta, pool, &mut self.commands);
            if let Err(error) = entry.modifier.perform(&mut ctx) {
                outcome = Err(error);
                break;
            }
            performed += 1;
        }
        let applied = self.apply_commands(pool);
        outcome?;
        applied?;
        Ok(performed)
    }

    fn apply_commands(&mut self, pool: &mut dyn InstancePool) -> Result<()> {
        if self.commands.is_empty() {
            return Ok(());
        }
        let mut queue = self.commands.take();
        let mut outcome = Ok(());
        for command in queue.drain(..) {
            let applied = match command {
                Command::Activate(key) => self.activate(key, pool).map(|_| ()),
                Command::Deactivate(key) => {
                    self.deactivate(key);
                    Ok(())
                }
                Command::SetTier(key, tier) => {
                    self.set_tier(key, tier);
                    Ok(())
                }
                Command::Remove(key) => {
                    self.remove(key);
                    Ok(())
                }
            };
            if outcome.is_ok() {
                outcome = applied;
            }
        }
        self.commands.restore(queue);
        outcome
    }
}
