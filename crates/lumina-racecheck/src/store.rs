//! Shadow store: region bookkeeping for tracked memory
//!
//! One `Region` per live allocation, keyed by `(MemoryId, buffer id)`. The
//! key carries the memory *instance* because per-group local memories are
//! separate instances whose buffer ids may collide; the address space alone
//! cannot tell them apart. Each region owns a contiguous shadow array, one
//! [`ShadowByte`] per byte of the allocation.

use std::collections::HashMap;

use lumina_device_api::{AddressSpace, DeviceAddress, MemoryId};
use tracing::{debug, warn};

use crate::error::{Result, ShadowFault};
use crate::shadow::ShadowByte;

/// Shadow state of one allocation
#[derive(Debug)]
struct Region {
    space: AddressSpace,
    shadow: Vec<ShadowByte>,
}

/// Mutable view of the shadow bytes covered by one access
#[derive(Debug, PartialEq)]
pub struct AccessSpan<'a> {
    /// Address space the region lives in
    pub space: AddressSpace,
    /// Shadow bytes from the access offset, clamped to the region end
    pub bytes: &'a mut [ShadowByte],
}

/// Mapping from `(memory instance, buffer id)` to shadow regions
#[derive(Debug, Default)]
pub struct ShadowStore {
    regions: HashMap<(MemoryId, u64), Region>,
}

impl ShadowStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live regions
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Recorded size of a region, if it is live
    pub fn region_size(&self, memory: MemoryId, buffer_id: u64) -> Option<usize> {
        self.regions.get(&(memory, buffer_id)).map(|r| r.shadow.len())
    }

    /// Insert a fresh all-initial region for an allocation
    ///
    /// Private allocations are silently ignored. An existing region under
    /// the same key is a caller contract violation; the new region replaces
    /// it, matching the interpreter's view that the allocation was recycled.
    pub fn create(&mut self, memory: MemoryId, space: AddressSpace, buffer_id: u64, size: usize) {
        if !space.is_tracked() {
            return;
        }
        let region = Region {
            space,
            shadow: vec![ShadowByte::new(); size],
        };
        if self.regions.insert((memory, buffer_id), region).is_some() {
            debug!(%memory, buffer_id, size, "allocation overwrote a live shadow region");
        }
    }

    /// Remove the region for a released allocation
    pub fn destroy(&mut self, memory: MemoryId, buffer_id: u64) {
        if self.regions.remove(&(memory, buffer_id)).is_none() {
            debug!(%memory, buffer_id, "deallocation of unknown shadow region");
        }
    }

    /// Resolve an access to the shadow bytes it covers
    ///
    /// The span starts at the address's offset and is truncated to the
    /// region end when the access runs past it. Unknown keys and accesses
    /// starting past the end are faults; the caller drops the access.
    pub fn access(
        &mut self,
        memory: MemoryId,
        address: DeviceAddress,
        size: usize,
    ) -> Result<AccessSpan<'_>> {
        let buffer_id = address.buffer_id();
        let region = self
            .regions
            .get_mut(&(memory, buffer_id))
            .ok_or(ShadowFault::UnknownRegion { memory, buffer_id })?;

        let offset = address.byte_offset() as usize;
        let region_size = region.shadow.len();
        if offset >= region_size {
            return Err(ShadowFault::OutOfBounds {
                offset: offset as u64,
                region_size: region_size as u64,
            });
        }

        let end = region_size.min(offset + size);
        if end < offset + size {
            warn!(
                %memory,
                buffer_id,
                offset,
                size,
                region_size,
                "access past region end, truncating"
            );
        }

        Ok(AccessSpan {
            space: region.space,
            bytes: &mut region.shadow[offset..end],
        })
    }

    /// Apply barrier semantics to every byte of every region in `space`
    pub fn synchronize_space(&mut self, space: AddressSpace, work_group_only: bool) {
        for region in self.regions.values_mut().filter(|r| r.space == space) {
            for byte in &mut region.shadow {
                byte.synchronize(work_group_only);
            }
        }
    }

    /// Apply barrier semantics to every byte of one memory instance
    pub fn synchronize_instance(&mut self, memory: MemoryId, work_group_only: bool) {
        for ((id, _), region) in &mut self.regions {
            if *id == memory {
                for byte in &mut region.shadow {
                    byte.synchronize(work_group_only);
                }
            }
        }
    }

    /// Iterate shadow bytes of a region, for assertions and sweeps
    #[cfg(test)]
    fn region_bytes(&self, memory: MemoryId, buffer_id: u64) -> Option<&[ShadowByte]> {
        self.regions.get(&(memory, buffer_id)).map(|r| r.shadow.as_slice())
    }
}

// ================================================================================================
// Tests
// ================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shadow::{AccessKind, Actor};

    const MEM: MemoryId = MemoryId::new(0);

    fn actor(index: u64) -> Actor {
        Actor {
            work_item: Some(index),
            work_group: 0,
            instruction: None,
        }
    }

    #[test]
    fn test_create_access_destroy_lifecycle() {
        let mut store = ShadowStore::new();
        store.create(MEM, AddressSpace::Global, 1, 16);
        assert_eq!(store.region_size(MEM, 1), Some(16));

        let span = store.access(MEM, DeviceAddress::compose(1, 4), 4).unwrap();
        assert_eq!(span.bytes.len(), 4);
        assert_eq!(span.space, AddressSpace::Global);

        store.destroy(MEM, 1);
        assert_eq!(store.region_count(), 0);
        assert_eq!(
            store.access(MEM, DeviceAddress::compose(1, 0), 1),
            Err(ShadowFault::UnknownRegion { memory: MEM, buffer_id: 1 })
        );
    }

    #[test]
    fn test_access_unknown_region_faults() {
        let mut store = ShadowStore::new();
        let err = store.access(MEM, DeviceAddress::compose(9, 0), 1).unwrap_err();
        assert_eq!(err, ShadowFault::UnknownRegion { memory: MEM, buffer_id: 9 });
    }

    #[test]
    fn test_access_past_end_truncates() {
        let mut store = ShadowStore::new();
        store.create(MEM, AddressSpace::Global, 1, 8);
        let span = store.access(MEM, DeviceAddress::compose(1, 6), 8).unwrap();
        assert_eq!(span.bytes.len(), 2);
    }

    #[test]
    fn test_access_starting_past_end_faults() {
        let mut store = ShadowStore::new();
        store.create(MEM, AddressSpace::Global, 1, 8);
        let err = store.access(MEM, DeviceAddress::compose(1, 8), 1).unwrap_err();
        assert_eq!(err, ShadowFault::OutOfBounds { offset: 8, region_size: 8 });
    }

    #[test]
    fn test_full_region_span_visits_every_byte() {
        let mut store = ShadowStore::new();
        store.create(MEM, AddressSpace::Global, 2, 32);
        let span = store.access(MEM, DeviceAddress::compose(2, 0), 32).unwrap();
        assert_eq!(span.bytes.len(), 32);
    }

    #[test]
    fn test_double_create_replaces_region() {
        let mut store = ShadowStore::new();
        store.create(MEM, AddressSpace::Global, 1, 8);
        {
            let span = store.access(MEM, DeviceAddress::compose(1, 0), 1).unwrap();
            span.bytes[0].apply(AccessKind::Store, &actor(0));
        }
        store.create(MEM, AddressSpace::Global, 1, 4);
        assert_eq!(store.region_size(MEM, 1), Some(4));
        let bytes = store.region_bytes(MEM, 1).unwrap();
        assert!(bytes.iter().all(|b| *b == ShadowByte::new()));
    }

    #[test]
    fn test_same_buffer_id_different_instances_are_distinct() {
        let other = MemoryId::new(7);
        let mut store = ShadowStore::new();
        store.create(MEM, AddressSpace::Local, 1, 4);
        store.create(other, AddressSpace::Local, 1, 4);
        assert_eq!(store.region_count(), 2);

        {
            let span = store.access(MEM, DeviceAddress::compose(1, 0), 1).unwrap();
            span.bytes[0].apply(AccessKind::Store, &actor(0));
        }
        let untouched = store.region_bytes(other, 1).unwrap();
        assert_eq!(untouched[0], ShadowByte::new());
    }

    #[test]
    fn test_synchronize_space_resets_matching_regions_only() {
        let mut store = ShadowStore::new();
        store.create(MEM, AddressSpace::Global, 1, 2);
        store.create(MEM, AddressSpace::Local, 2, 2);
        for buffer in [1, 2] {
            let span = store.access(MEM, DeviceAddress::compose(buffer, 0), 2).unwrap();
            for byte in span.bytes.iter_mut() {
                byte.apply(AccessKind::Store, &actor(0));
            }
        }

        store.synchronize_space(AddressSpace::Global, false);

        let global = store.region_bytes(MEM, 1).unwrap();
        assert!(global.iter().all(|b| *b == ShadowByte::new()));
        let local = store.region_bytes(MEM, 2).unwrap();
        assert!(local.iter().all(|b| !b.can_write));
    }

    #[test]
    fn test_synchronize_instance_scoped_to_memory_id() {
        let other = MemoryId::new(3);
        let mut store = ShadowStore::new();
        store.create(MEM, AddressSpace::Local, 1, 1);
        store.create(other, AddressSpace::Local, 1, 1);
        for id in [MEM, other] {
            let span = store.access(id, DeviceAddress::compose(1, 0), 1).unwrap();
            span.bytes[0].apply(AccessKind::Store, &actor(0));
        }

        store.synchronize_instance(MEM, false);

        assert_eq!(store.region_bytes(MEM, 1).unwrap()[0], ShadowByte::new());
        assert!(!store.region_bytes(other, 1).unwrap()[0].can_write);
    }
}
