//! Kernel invocation and execution-entity descriptors
//!
//! One `KernelInvocation` describes one launch: the kernel's name, its global
//! NDRange and the work-group (local) size. Work-item and work-group views
//! are the per-event snapshots of whichever entity performed an access; the
//! interpreter owns them and plugins borrow them for the duration of the
//! event.

use tracing::debug;

use crate::dim::Dim3;
use crate::memory::MemoryId;

/// Opaque handle to one instruction site inside a kernel
///
/// Plugins carry this through their own state purely for attribution; the
/// interpreter knows how to map it back to source. A value of `0` is legal
/// and meaningful (first site), so absence is modelled with `Option`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct InstructionRef(pub u64);

/// One launch of a kernel
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct KernelInvocation {
    /// Kernel name, as the host program knows it
    pub name: String,
    /// Global NDRange extents
    pub global_size: Dim3,
    /// Work-group extents
    pub local_size: Dim3,
}

impl KernelInvocation {
    /// Create a new invocation descriptor
    ///
    /// The local size is expected to divide the global size along every
    /// axis. Launches that violate this are accepted with a `debug!` note;
    /// [`KernelInvocation::num_groups`] then saturates rather than reporting
    /// zero groups.
    pub fn new(name: impl Into<String>, global_size: Dim3, local_size: Dim3) -> Self {
        let invocation = Self {
            name: name.into(),
            global_size,
            local_size,
        };
        if !invocation.local_divides_global() {
            debug!(
                kernel = %invocation.name,
                %global_size,
                %local_size,
                "local size does not divide global size, group count will saturate"
            );
        }
        invocation
    }

    /// Whether the local size evenly divides the global size on every axis
    fn local_divides_global(&self) -> bool {
        self.global_size.x % self.local_size.x.max(1) == 0
            && self.global_size.y % self.local_size.y.max(1) == 0
            && self.global_size.z % self.local_size.z.max(1) == 0
    }

    /// Number of work-groups along each axis
    ///
    /// Degenerate local extents count as 1 and the quotient saturates to at
    /// least one group per axis, so a malformed launch never divides by zero
    /// or reports an empty grid.
    pub fn num_groups(&self) -> Dim3 {
        Dim3 {
            x: (self.global_size.x / self.local_size.x.max(1)).max(1),
            y: (self.global_size.y / self.local_size.y.max(1)).max(1),
            z: (self.global_size.z / self.local_size.z.max(1)).max(1),
        }
    }
}

/// Snapshot of the work-item performing an access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkItemView {
    /// Linearized global index of this work-item
    pub global_index: u64,
    /// Linearized index of the work-group this item belongs to
    pub group_index: u64,
    /// Instruction the work-item is currently executing, if known
    pub instruction: Option<InstructionRef>,
}

/// Snapshot of the work-group performing (or containing) an access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkGroupView {
    /// Linearized group index
    pub group_index: u64,
    /// Memory instance backing this group's local memory
    pub local_memory: MemoryId,
}
