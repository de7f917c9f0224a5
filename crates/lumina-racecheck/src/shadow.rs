//! Per-byte shadow state machine
//!
//! Every byte of tracked device memory carries a `ShadowByte` recording which
//! entity last touched it and which access classes are still permissible
//! without racing. Accesses fall into three tiers:
//!
//! 1. **Work-item access**: a specific work-item touched the byte
//!    non-atomically.
//! 2. **Work-group access**: the access is attributed to a whole group
//!    (async copies); there is no work-item identity.
//! 3. **Atomic access**: a work-item access under the atomic memory model.
//!
//! The permission bits degrade monotonically between synchronization points:
//! a load clears `can_write` and `can_atomic`, a store clears all three, an
//! atomic clears `can_read` and `can_write`. Barriers restore them through
//! [`ShadowByte::synchronize`].

use lumina_device_api::{InstructionRef, RaceKind};

/// Non-atomic access class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Load,
    Store,
}

/// The entity performing an access, as the state machine sees it
///
/// `work_item` is `None` for group-uniform accesses; `work_group` is always
/// present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub work_item: Option<u64>,
    pub work_group: u64,
    pub instruction: Option<InstructionRef>,
}

/// Shadow state of one byte of tracked memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowByte {
    /// Access site recorded for diagnostics
    pub instruction: Option<InstructionRef>,
    /// Last work-item that claimed this byte
    pub work_item: Option<u64>,
    /// Last work-group that claimed this byte
    pub work_group: Option<u64>,
    /// Whether `work_item` is the authoritative identity
    pub was_work_item: bool,
    /// A non-atomic read is still race-free
    pub can_read: bool,
    /// A non-atomic write is still race-free
    pub can_write: bool,
    /// An atomic access is still race-free
    pub can_atomic: bool,
}

impl ShadowByte {
    /// State of a freshly allocated (or fully synchronized) byte
    pub const fn new() -> Self {
        Self {
            instruction: None,
            work_item: None,
            work_group: None,
            was_work_item: false,
            can_read: true,
            can_write: true,
            can_atomic: true,
        }
    }

    /// Whether `actor` is the entity already recorded on this byte
    ///
    /// If the recorded state came from a work-item, identities compare by
    /// work-item index; otherwise by work-group index. A group-uniform actor
    /// never matches recorded work-item state (its `work_item` is `None`).
    fn same_entity(&self, actor: &Actor) -> bool {
        if self.was_work_item {
            self.work_item == actor.work_item
        } else {
            self.work_group == Some(actor.work_group)
        }
    }

    /// Classify a non-atomic access against the current state
    ///
    /// Returns the race kind to report, or `None` if the access is
    /// compatible. `uniform` marks a store byte whose value equals the
    /// current memory content while the uniform-write filter is enabled;
    /// such a byte never conflicts.
    ///
    /// A write-write race requires the prior conflicting operation to have
    /// been a store: `can_read` cleared by it, and `can_atomic` cleared too
    /// (an atomic clears `can_read` but leaves `can_atomic` set, and a
    /// store racing with an atomic is a read-write race). Everything else
    /// reports as read-write.
    pub fn race_with(&self, kind: AccessKind, actor: &Actor, uniform: bool) -> Option<RaceKind> {
        let conflict = match kind {
            AccessKind::Load => !self.can_read,
            AccessKind::Store => !self.can_write && !uniform,
        };
        if !conflict || self.same_entity(actor) {
            return None;
        }
        if kind == AccessKind::Load || self.can_read || self.can_atomic {
            Some(RaceKind::ReadWrite)
        } else {
            Some(RaceKind::WriteWrite)
        }
    }

    /// Apply a non-atomic access to the state
    ///
    /// The recorded actor is only overwritten when this operation is at
    /// least as strong as the recorded one: stores always take attribution,
    /// loads only while the byte was still writable (a prior writer keeps
    /// attribution over later readers).
    pub fn apply(&mut self, kind: AccessKind, actor: &Actor) {
        let take_attribution = kind == AccessKind::Store || self.can_write;

        self.can_atomic = false;
        self.can_read &= kind == AccessKind::Load;
        self.can_write = false;

        if take_attribution {
            self.work_group = Some(actor.work_group);
            if let Some(work_item) = actor.work_item {
                self.instruction = actor.instruction;
                self.work_item = Some(work_item);
                self.was_work_item = true;
            }
        }
    }

    /// Classify an atomic access against the current state
    ///
    /// Atomics race with any prior non-atomic access (`can_atomic` cleared)
    /// by a different work-item. Only the recorded work-item participates in
    /// the same-entity test; state recorded by a group-uniform access has no
    /// work-item and therefore conflicts.
    pub fn atomic_race_with(&self, work_item: u64) -> Option<RaceKind> {
        if !self.can_atomic && self.work_item != Some(work_item) {
            Some(RaceKind::ReadWrite)
        } else {
            None
        }
    }

    /// Apply an atomic access to the state
    ///
    /// Atomics remain compatible with each other, so `can_atomic` is left
    /// alone. The first atomic to touch a byte with no authoritative
    /// work-item claims it.
    pub fn apply_atomic(&mut self, work_item: u64, instruction: Option<InstructionRef>) {
        self.can_read = false;
        self.can_write = false;
        if !self.was_work_item {
            self.instruction = instruction;
            self.work_item = Some(work_item);
            self.was_work_item = true;
        }
    }

    /// Apply barrier semantics to the state
    ///
    /// A group-scoped synchronize (`work_group_only`) drops work-item
    /// identity but keeps the group claim and the read/write restrictions:
    /// a barrier inside one group must not license other groups to touch the
    /// byte. A full synchronize resets everything.
    // TODO: revisit the unconditional can_atomic reset; an atomic vs
    // non-atomic conflict spanning a group-scoped barrier is currently not
    // re-checked.
    pub fn synchronize(&mut self, work_group_only: bool) {
        self.can_atomic = true;
        self.work_item = None;
        self.was_work_item = false;
        if !work_group_only {
            self.work_group = None;
            self.can_read = true;
            self.can_write = true;
        }
    }
}

impl Default for ShadowByte {
    fn default() -> Self {
        Self::new()
    }
}

// ================================================================================================
// Tests
// ================================================================================================
