//! Race classification and diagnostic composition
//!
//! Turns a racing byte plus its ambient context (invocation, accessing
//! actor, recorded prior state) into the structured [`Diagnostic`] the sink
//! carries. Linear indices are decomposed back into 3-D coordinates here so
//! the host never needs the launch geometry to render a report.

use lumina_device_api::{
    AddressSpace, DeviceAddress, Diagnostic, Dim3, EntityCoords, KernelInvocation, RaceKind,
    Severity,
};

use crate::shadow::{Actor, ShadowByte};

/// Coordinates of a work-item given its linear global index
fn work_item_coords(global_index: u64, invocation: &KernelInvocation) -> EntityCoords {
    let global = Dim3::decompose(global_index, invocation.global_size);
    EntityCoords::WorkItem {
        global,
        local: global.rem(invocation.local_size),
        group: global.div(invocation.local_size),
    }
}

/// Coordinates of the entity recorded on a shadow byte
///
/// A recorded work-item wins over the group claim even when a group-scoped
/// barrier has since demoted it to non-authoritative; only a byte with no
/// identity at all renders as unknown.
fn prior_entity(prior: &ShadowByte, invocation: &KernelInvocation) -> EntityCoords {
    if let Some(work_item) = prior.work_item {
        work_item_coords(work_item, invocation)
    } else if let Some(work_group) = prior.work_group {
        EntityCoords::WorkGroup {
            group: Dim3::decompose(work_group, invocation.num_groups()),
        }
    } else {
        EntityCoords::Unknown
    }
}

/// Coordinates of the accessing actor
fn current_entity(actor: &Actor, invocation: &KernelInvocation) -> EntityCoords {
    match actor.work_item {
        Some(work_item) => work_item_coords(work_item, invocation),
        None => EntityCoords::WorkGroup {
            group: Dim3::decompose(actor.work_group, invocation.num_groups()),
        },
    }
}

/// Compose the diagnostic for one detected race
pub(crate) fn compose(
    kind: RaceKind,
    space: AddressSpace,
    address: DeviceAddress,
    invocation: &KernelInvocation,
    actor: &Actor,
    prior: &ShadowByte,
) -> Diagnostic {
    Diagnostic {
        severity: Severity::Error,
        kind,
        address_space: space,
        address,
        kernel: invocation.name.clone(),
        current_entity: current_entity(actor, invocation),
        current_instruction: actor.instruction,
        prior_entity: prior_entity(prior, invocation),
        prior_instruction: prior.instruction,
    }
}
