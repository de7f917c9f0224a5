//! Memory instance handles and the plugin-facing access seam
//!
//! The interpreter simulates several memory instances at once: one global
//! memory, one constant memory, and one local memory per live work-group.
//! Buffer ids are only unique *within* an instance, so anything keying state
//! by allocation must key by `(MemoryId, buffer id)`, never by address space
//! alone.

use crate::address::{AddressSpace, DeviceAddress};

/// Handle identifying one memory instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct MemoryId(pub u64);

impl MemoryId {
    /// Create a new handle
    pub const fn new(id: u64) -> Self {
        MemoryId(id)
    }

    /// Get the internal id
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for MemoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mem{}", self.0)
    }
}

/// Read-only view of a simulated memory instance
///
/// The interpreter implements this over whatever storage it uses; plugins
/// only ever read. The view handed to an event handler is valid for that
/// event only.
pub trait DeviceMemory {
    /// Which memory instance this is
    fn id(&self) -> MemoryId;

    /// Address space of every allocation in this instance
    fn address_space(&self) -> AddressSpace;

    /// Current content at `address`, or `None` if the range is not mapped
    ///
    /// Returns the `size` bytes starting at the address's offset within its
    /// buffer. Used by analyses that compare stored values against what is
    /// already in memory.
    fn bytes(&self, address: DeviceAddress, size: usize) -> Option<&[u8]>;
}
