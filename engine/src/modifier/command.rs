//! Deferred scheduler changes issued from inside [`Modifier::perform`](super::Modifier::perform).
//!
//! A modifier cannot touch the scheduler while a pass is iterating it. Instead it pushes
//! [`Command`]s, which the scheduler applies in issue order right after the pass. The buffer is
//! owned by the scheduler and reused, so steady-state passes do not allocate.

use super::{ModifierKey, Tier};

/// A deferred scheduler change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Run `setup` and register the modifier.
    Activate(ModifierKey),
    /// Deregister the modifier. Its state is kept.
    Deactivate(ModifierKey),
    /// Move the modifier to another tier.
    SetTier(ModifierKey, Tier),
    /// Deregister and drop the modifier.
    Remove(ModifierKey),
}

/// Buffer of deferred commands.
#[derive(Debug, Default)]
pub struct Commands {
    queue: Vec<Command>,
}

impl Commands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a command.
    #[inline]
    pub fn push(&mut self, command: Command) {
        self.queue.push(command);
    }

    pub fn activate(&mut self, key: ModifierKey) {
        self.push(Command::Activate(key));
    }

    pub fn deactivate(&mut self, key: ModifierKey) {
        self.push(Command::Deactivate(key));
    }

    pub fn set_tier(&mut self, key: ModifierKey, tier: Tier) {
        self.push(Command::SetTier(key, tier));
    }

    pub fn remove(&mut self, key: ModifierKey) {
        self.push(Command::Remove(key));
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Take the queued commands out, leaving an empty buffer that keeps nothing allocated.
    /// Hand the vector back with [`Commands::restore`] to reuse its capacity.
    pub(crate) fn take(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.queue)
    }

    /// Return a drained vector so its capacity is reused by the next pass.
    pub(crate) fn restore(&mut self, mut queue: Vec<Command>) {
        queue.clear();
        if self.queue.is_empty() {
            self.queue = queue;
        }
    }
}
