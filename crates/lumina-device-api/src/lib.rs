//! Contract types shared between the Lumina device interpreter and its plugins
//!
//! This crate provides:
//! - **Address model**: address spaces and the buffer/offset bit-split
//! - **Launch descriptors**: kernel invocations, work-item and work-group views
//! - **Memory access seam**: the `DeviceMemory` trait plugins read through
//! - **Plugin trait**: the event surface the interpreter drives
//! - **Diagnostics**: structured messages and the sink plugins emit into
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  Device Interpreter                      │
//! │        (kernel scheduling, memory simulation)            │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │ events (Plugin trait)
//!                       ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                      Plugins                             │
//! │   race checking, instruction counting, profiling, ...    │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │ Diagnostic (MessageSink trait)
//!                       ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                   Host message sink                      │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The interpreter delivers events serialized in its simulated execution
//! order; plugins may assume single-threaded delivery and hold no locks of
//! their own. Everything a plugin borrows from an event (memory views,
//! invocation descriptors) is valid for the duration of that event only.

pub mod address;
pub mod dim;
pub mod invocation;
pub mod memory;
pub mod message;
pub mod plugin;

pub use address::{AddressSpace, DeviceAddress, BUFFER_BITS, OFFSET_BITS};
pub use dim::Dim3;
pub use invocation::{InstructionRef, KernelInvocation, WorkGroupView, WorkItemView};
pub use memory::{DeviceMemory, MemoryId};
pub use message::{BufferedSink, Diagnostic, EntityCoords, MessageSink, RaceKind, Severity};
pub use plugin::{AccessOrigin, AtomicOp, BarrierFlags, Plugin};
