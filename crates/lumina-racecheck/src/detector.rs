//! The race detector plugin
//!
//! Routes interpreter events into the shadow state machine and drives the
//! synchronization sweeps. The detector owns its shadow store outright and
//! assumes single-threaded event delivery; the only shared resource is the
//! outbound message sink.
//!
//! At most one diagnostic is emitted per access: the first racing byte in
//! the range wins and the remaining bytes only update state.

use lumina_device_api::{
    AccessOrigin, AddressSpace, AtomicOp, BarrierFlags, DeviceAddress, DeviceMemory,
    KernelInvocation, MessageSink, Plugin, WorkGroupView, WorkItemView,
};
use tracing::{trace, warn};

use crate::config::DetectorConfig;
use crate::report;
use crate::shadow::{AccessKind, Actor};
use crate::store::ShadowStore;

/// Shadow-memory data-race detector
///
/// Construct one per device, register it as a plugin, and read races from
/// the sink. Races are reported and execution continues; the detector never
/// aborts the simulation.
#[derive(Debug)]
pub struct RaceDetector<S> {
    config: DetectorConfig,
    sink: S,
    store: ShadowStore,
    invocation: Option<KernelInvocation>,
}

impl<S: MessageSink> RaceDetector<S> {
    /// Create a detector configured from the process environment
    pub fn new(sink: S) -> Self {
        Self::with_config(DetectorConfig::from_env(), sink)
    }

    /// Create a detector with an explicit configuration
    pub fn with_config(config: DetectorConfig, sink: S) -> Self {
        Self {
            config,
            sink,
            store: ShadowStore::new(),
            invocation: None,
        }
    }

    /// The configuration this detector was built with
    pub fn config(&self) -> DetectorConfig {
        self.config
    }

    /// The sink diagnostics are emitted into
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Number of regions currently tracked
    pub fn tracked_regions(&self) -> usize {
        self.store.region_count()
    }

    /// Shared path for non-atomic loads and stores
    ///
    /// `store_data` is `Some` for stores; its length is the access size.
    fn register_access(
        &mut self,
        memory: &dyn DeviceMemory,
        origin: AccessOrigin<'_>,
        address: DeviceAddress,
        size: u64,
        store_data: Option<&[u8]>,
    ) {
        let Some(invocation) = self.invocation.as_ref() else {
            return;
        };
        if !memory.address_space().is_tracked() {
            return;
        }
        let size = size as usize;
        if size == 0 {
            return;
        }

        let kind = if store_data.is_some() {
            AccessKind::Store
        } else {
            AccessKind::Load
        };
        let actor = Actor {
            work_item: origin.work_item_index(),
            work_group: origin.work_group_index(),
            instruction: origin.instruction(),
        };

        // The uniform-write filter compares against what is in memory right
        // now, before the store lands.
        let current = match store_data {
            Some(_) if self.config.allow_uniform_writes => memory.bytes(address, size),
            _ => None,
        };

        let span = match self.store.access(memory.id(), address, size) {
            Ok(span) => span,
            Err(fault) => {
                warn!(%fault, %address, "dropping access");
                return;
            }
        };

        let mut reported = false;
        for (index, byte) in span.bytes.iter_mut().enumerate() {
            if !reported {
                let uniform = match (current, store_data) {
                    (Some(current), Some(data)) => {
                        current.get(index).is_some() && current.get(index) == data.get(index)
                    }
                    _ => false,
                };
                if let Some(race) = byte.race_with(kind, &actor, uniform) {
                    self.sink.emit(report::compose(
                        race,
                        span.space,
                        address.offset_by(index as u64),
                        invocation,
                        &actor,
                        byte,
                    ));
                    reported = true;
                    if kind == AccessKind::Load {
                        // A racing load does not downgrade the byte further
                        continue;
                    }
                }
            }
            byte.apply(kind, &actor);
        }
    }

    fn register_atomic(
        &mut self,
        memory: &dyn DeviceMemory,
        work_item: &WorkItemView,
        op: AtomicOp,
        address: DeviceAddress,
        size: u64,
    ) {
        let Some(invocation) = self.invocation.as_ref() else {
            return;
        };
        if !memory.address_space().is_tracked() {
            return;
        }
        if size == 0 {
            return;
        }
        trace!(%op, %address, size, work_item = work_item.global_index, "atomic access");

        let span = match self.store.access(memory.id(), address, size as usize) {
            Ok(span) => span,
            Err(fault) => {
                warn!(%fault, %address, "dropping atomic access");
                return;
            }
        };
        let actor = Actor {
            work_item: Some(work_item.global_index),
            work_group: work_item.group_index,
            instruction: work_item.instruction,
        };

        let mut reported = false;
        for (index, byte) in span.bytes.iter_mut().enumerate() {
            if !reported {
                if let Some(race) = byte.atomic_race_with(work_item.global_index) {
                    self.sink.emit(report::compose(
                        race,
                        span.space,
                        address.offset_by(index as u64),
                        invocation,
                        &actor,
                        byte,
                    ));
                    reported = true;
                }
            }
            byte.apply_atomic(work_item.global_index, work_item.instruction);
        }
    }
}

impl<S: MessageSink> Plugin for RaceDetector<S> {
    fn kernel_begin(&mut self, invocation: &KernelInvocation) {
        self.invocation = Some(invocation.clone());
    }

    fn kernel_end(&mut self, _invocation: &KernelInvocation) {
        // Full reset of global memory: the next kernel starts clean
        self.store.synchronize_space(AddressSpace::Global, false);
        self.invocation = None;
    }

    fn memory_allocated(&mut self, memory: &dyn DeviceMemory, address: DeviceAddress, size: u64) {
        if !memory.address_space().is_tracked() {
            return;
        }
        self.store.create(
            memory.id(),
            memory.address_space(),
            address.buffer_id(),
            size as usize,
        );
    }

    fn memory_deallocated(&mut self, memory: &dyn DeviceMemory, address: DeviceAddress) {
        if !memory.address_space().is_tracked() {
            return;
        }
        self.store.destroy(memory.id(), address.buffer_id());
    }

    fn memory_load(
        &mut self,
        memory: &dyn DeviceMemory,
        origin: AccessOrigin<'_>,
        address: DeviceAddress,
        size: u64,
    ) {
        self.register_access(memory, origin, address, size, None);
    }

    fn memory_store(
        &mut self,
        memory: &dyn DeviceMemory,
        origin: AccessOrigin<'_>,
        address: DeviceAddress,
        data: &[u8],
    ) {
        self.register_access(memory, origin, address, data.len() as u64, Some(data));
    }

    fn memory_atomic(
        &mut self,
        memory: &dyn DeviceMemory,
        work_item: &WorkItemView,
        op: AtomicOp,
        address: DeviceAddress,
        size: u64,
    ) {
        self.register_atomic(memory, work_item, op, address, size);
    }

    fn work_group_barrier(&mut self, group: &WorkGroupView, flags: BarrierFlags) {
        // A local fence fully resets the group's own local memory; a global
        // fence only drops work-item identity so distinct groups still race
        // on global bytes across the barrier.
        if flags.contains(BarrierFlags::LOCAL_MEM_FENCE) {
            self.store.synchronize_instance(group.local_memory, false);
        }
        if flags.contains(BarrierFlags::GLOBAL_MEM_FENCE) {
            self.store.synchronize_space(AddressSpace::Global, true);
        }
    }
}

// ================================================================================================
// Tests
// ================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_device_api::{BufferedSink, Dim3, MemoryId};

    struct FixedMemory {
        id: MemoryId,
        space: AddressSpace,
        content: Vec<u8>,
    }

    impl DeviceMemory for FixedMemory {
        fn id(&self) -> MemoryId {
            self.id
        }

        fn address_space(&self) -> AddressSpace {
            self.space
        }

        fn bytes(&self, address: DeviceAddress, size: usize) -> Option<&[u8]> {
            let offset = address.byte_offset() as usize;
            self.content.get(offset..offset + size)
        }
    }

    fn global_memory(size: usize) -> FixedMemory {
        FixedMemory {
            id: MemoryId::new(0),
            space: AddressSpace::Global,
            content: vec![0; size],
        }
    }

    fn work_item(global_index: u64, group_index: u64) -> WorkItemView {
        WorkItemView {
            global_index,
            group_index,
            instruction: None,
        }
    }

    fn detector() -> RaceDetector<BufferedSink> {
        RaceDetector::with_config(DetectorConfig::default(), BufferedSink::new())
    }

    #[test]
    fn test_private_allocations_not_tracked() {
        let mut det = detector();
        let private = FixedMemory {
            id: MemoryId::new(1),
            space: AddressSpace::Private,
            content: vec![0; 16],
        };
        det.memory_allocated(&private, DeviceAddress::compose(1, 0), 16);
        assert_eq!(det.tracked_regions(), 0);
    }

    #[test]
    fn test_accesses_outside_kernel_ignored() {
        let mut det = detector();
        let mem = global_memory(16);
        det.memory_allocated(&mem, DeviceAddress::compose(1, 0), 16);
        let wi = work_item(0, 0);
        det.memory_store(&mem, AccessOrigin::WorkItem(&wi), DeviceAddress::compose(1, 0), &[1]);
        assert!(det.sink().is_empty());
    }

    #[test]
    fn test_unknown_region_access_dropped() {
        let mut det = detector();
        let mem = global_memory(16);
        det.kernel_begin(&KernelInvocation::new("k", Dim3::linear(2), Dim3::linear(2)));
        let wi = work_item(0, 0);
        // No allocation event: the access must not panic or report
        det.memory_store(&mem, AccessOrigin::WorkItem(&wi), DeviceAddress::compose(1, 0), &[1]);
        assert!(det.sink().is_empty());
    }

    #[test]
    fn test_zero_size_access_is_noop() {
        let mut det = detector();
        let mem = global_memory(16);
        det.memory_allocated(&mem, DeviceAddress::compose(1, 0), 16);
        det.kernel_begin(&KernelInvocation::new("k", Dim3::linear(2), Dim3::linear(2)));
        let wi = work_item(0, 0);
        det.memory_store(&mem, AccessOrigin::WorkItem(&wi), DeviceAddress::compose(1, 0), &[]);
        det.memory_load(&mem, AccessOrigin::WorkItem(&wi), DeviceAddress::compose(1, 0), 0);
        assert!(det.sink().is_empty());
        assert_eq!(det.tracked_regions(), 1);
    }

    #[test]
    fn test_kernel_end_resets_global_state() {
        let mut det = detector();
        let mem = global_memory(16);
        det.memory_allocated(&mem, DeviceAddress::compose(1, 0), 16);
        let inv = KernelInvocation::new("k", Dim3::linear(4), Dim3::linear(2));

        det.kernel_begin(&inv);
        let first = work_item(0, 0);
        det.memory_store(&mem, AccessOrigin::WorkItem(&first), DeviceAddress::compose(1, 0), &[1]);
        det.kernel_end(&inv);

        det.kernel_begin(&inv);
        let second = work_item(2, 1);
        det.memory_store(&mem, AccessOrigin::WorkItem(&second), DeviceAddress::compose(1, 0), &[2]);
        assert!(det.sink().is_empty());
    }
}
