//! Internal fault taxonomy
//!
//! Race reports are not errors; they flow out through the message sink.
//! `ShadowFault` covers contract violations by the interpreter (events for
//! memory the detector was never told about). Faults are logged and the
//! offending access dropped; they never propagate to the host.

use lumina_device_api::MemoryId;

/// Result type for shadow-store operations
pub type Result<T> = std::result::Result<T, ShadowFault>;

/// Contract violations observed while resolving an access
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ShadowFault {
    /// No allocation event was ever seen for this key
    #[error("access to unknown region {memory} buffer {buffer_id}")]
    UnknownRegion { memory: MemoryId, buffer_id: u64 },

    /// Access begins past the end of the region
    #[error("access at offset {offset} starts past region size {region_size}")]
    OutOfBounds { offset: u64, region_size: u64 },
}
