//! Plugin trait: the event surface the interpreter drives
//!
//! The interpreter executes kernels as a deterministic, single-threaded
//! cooperative simulation and notifies plugins of memory and synchronization
//! events in its chosen execution order. Every handler runs to completion
//! before the next event is delivered, so plugins need no internal locking.
//!
//! All handlers default to no-ops; a plugin implements only the events it
//! cares about.

use crate::address::DeviceAddress;
use crate::invocation::{KernelInvocation, WorkGroupView, WorkItemView};
use crate::memory::DeviceMemory;

/// The entity an access is attributed to
///
/// Most loads and stores come from a specific work-item. Group-collective
/// operations (async copies) are attributed to the whole work-group and
/// carry no work-item identity.
#[derive(Debug, Clone, Copy)]
pub enum AccessOrigin<'a> {
    WorkItem(&'a WorkItemView),
    WorkGroup(&'a WorkGroupView),
}

impl<'a> AccessOrigin<'a> {
    /// Global work-item index, if this access has one
    pub fn work_item_index(&self) -> Option<u64> {
        match self {
            AccessOrigin::WorkItem(wi) => Some(wi.global_index),
            AccessOrigin::WorkGroup(_) => None,
        }
    }

    /// Work-group index (always available)
    pub fn work_group_index(&self) -> u64 {
        match self {
            AccessOrigin::WorkItem(wi) => wi.group_index,
            AccessOrigin::WorkGroup(wg) => wg.group_index,
        }
    }

    /// Instruction being executed, if the origin is a work-item
    pub fn instruction(&self) -> Option<crate::invocation::InstructionRef> {
        match self {
            AccessOrigin::WorkItem(wi) => wi.instruction,
            AccessOrigin::WorkGroup(_) => None,
        }
    }
}

/// Atomic read-modify-write operation tag
///
/// Carried on atomic events for attribution and logging; the memory model
/// treats all atomic operations alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum AtomicOp {
    Add,
    Sub,
    And,
    Or,
    Xor,
    Min,
    Max,
    Exchange,
    CompareExchange,
    Increment,
    Decrement,
}

impl std::fmt::Display for AtomicOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AtomicOp::Add => write!(f, "add"),
            AtomicOp::Sub => write!(f, "sub"),
            AtomicOp::And => write!(f, "and"),
            AtomicOp::Or => write!(f, "or"),
            AtomicOp::Xor => write!(f, "xor"),
            AtomicOp::Min => write!(f, "min"),
            AtomicOp::Max => write!(f, "max"),
            AtomicOp::Exchange => write!(f, "xchg"),
            AtomicOp::CompareExchange => write!(f, "cmpxchg"),
            AtomicOp::Increment => write!(f, "inc"),
            AtomicOp::Decrement => write!(f, "dec"),
        }
    }
}

/// Memory-fence selection bits for a work-group barrier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct BarrierFlags(pub u32);

impl BarrierFlags {
    /// Fence the group's local memory
    pub const LOCAL_MEM_FENCE: BarrierFlags = BarrierFlags(1 << 0);
    /// Fence global memory
    pub const GLOBAL_MEM_FENCE: BarrierFlags = BarrierFlags(1 << 1);

    /// Whether every bit of `other` is set in `self`
    pub const fn contains(self, other: BarrierFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for BarrierFlags {
    type Output = BarrierFlags;

    fn bitor(self, rhs: BarrierFlags) -> BarrierFlags {
        BarrierFlags(self.0 | rhs.0)
    }
}

/// Interpreter event surface
///
/// Handlers receive borrowed descriptors valid only for the duration of the
/// call. Event order follows the simulated execution order; in particular all
/// accesses of one work-item between two barriers of its group arrive
/// contiguously with respect to those barriers.
pub trait Plugin {
    /// A kernel invocation is starting
    fn kernel_begin(&mut self, invocation: &KernelInvocation) {
        let _ = invocation;
    }

    /// The current kernel invocation finished
    fn kernel_end(&mut self, invocation: &KernelInvocation) {
        let _ = invocation;
    }

    /// `size` bytes were allocated in `memory` at `address`
    fn memory_allocated(&mut self, memory: &dyn DeviceMemory, address: DeviceAddress, size: u64) {
        let _ = (memory, address, size);
    }

    /// The allocation at `address` was released
    fn memory_deallocated(&mut self, memory: &dyn DeviceMemory, address: DeviceAddress) {
        let _ = (memory, address);
    }

    /// Non-atomic load of `size` bytes
    fn memory_load(
        &mut self,
        memory: &dyn DeviceMemory,
        origin: AccessOrigin<'_>,
        address: DeviceAddress,
        size: u64,
    ) {
        let _ = (memory, origin, address, size);
    }

    /// Non-atomic store of `data` (`data.len()` bytes)
    fn memory_store(
        &mut self,
        memory: &dyn DeviceMemory,
        origin: AccessOrigin<'_>,
        address: DeviceAddress,
        data: &[u8],
    ) {
        let _ = (memory, origin, address, data);
    }

    /// Atomic read-modify-write of `size` bytes by a work-item
    fn memory_atomic(
        &mut self,
        memory: &dyn DeviceMemory,
        work_item: &WorkItemView,
        op: AtomicOp,
        address: DeviceAddress,
        size: u64,
    ) {
        let _ = (memory, work_item, op, address, size);
    }

    /// A work-group hit a barrier with the given fence flags
    fn work_group_barrier(&mut self, group: &WorkGroupView, flags: BarrierFlags) {
        let _ = (group, flags);
    }
}
