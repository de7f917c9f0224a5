//! Structured diagnostics and the outbound message sink
//!
//! Plugins do not render text; they emit `Diagnostic` values into whatever
//! `MessageSink` the host wires up. The host decides whether that becomes
//! terminal output, a JSON stream, or a test assertion. `BufferedSink` is the
//! collector used by tests and by hosts that batch reports.

use std::fmt;

use parking_lot::Mutex;

use crate::address::{AddressSpace, DeviceAddress};
use crate::dim::Dim3;
use crate::invocation::InstructionRef;

/// Severity of an emitted diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Classification of a detected data race
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum RaceKind {
    /// A read and a write touched the same byte without synchronization
    ReadWrite,
    /// Two writes touched the same byte without synchronization
    WriteWrite,
}

impl fmt::Display for RaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RaceKind::ReadWrite => write!(f, "Read-write"),
            RaceKind::WriteWrite => write!(f, "Write-write"),
        }
    }
}

/// Coordinates of one entity involved in a race
///
/// Work-items get the full global/local/group triple; accesses attributed to
/// a whole work-group (async copies and the like) only have group
/// coordinates; state recorded before any attribution renders as unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum EntityCoords {
    WorkItem { global: Dim3, local: Dim3, group: Dim3 },
    WorkGroup { group: Dim3 },
    Unknown,
}

impl fmt::Display for EntityCoords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityCoords::WorkItem { global, local, group } => {
                write!(f, "Global{global} Local{local} Group{group}")
            }
            EntityCoords::WorkGroup { group } => write!(f, "Group{group}"),
            EntityCoords::Unknown => write!(f, "(unknown)"),
        }
    }
}

/// One structured race report
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: RaceKind,
    /// Address space the racing byte lives in
    pub address_space: AddressSpace,
    /// Absolute device address of the racing byte
    pub address: DeviceAddress,
    /// Kernel the race was observed in
    pub kernel: String,
    /// The entity whose access triggered the report
    pub current_entity: EntityCoords,
    /// Instruction the triggering entity was executing, if known
    pub current_instruction: Option<InstructionRef>,
    /// The previously recorded entity on the racing byte
    pub prior_entity: EntityCoords,
    /// Instruction recorded for the prior entity, if known
    pub prior_instruction: Option<InstructionRef>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} data race at {} memory address {} in kernel '{}': {} vs {}",
            self.kind, self.address_space, self.address, self.kernel, self.current_entity, self.prior_entity
        )
    }
}

/// Outbound seam plugins emit diagnostics through
pub trait MessageSink {
    /// Deliver one diagnostic; append-only, never fails
    fn emit(&self, diagnostic: Diagnostic);
}

/// Sink that buffers every diagnostic in memory
///
/// # Example
///
/// ```
/// use lumina_device_api::{BufferedSink, MessageSink};
///
/// let sink = BufferedSink::new();
/// assert!(sink.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct BufferedSink {
    messages: Mutex<Vec<Diagnostic>>,
}

impl BufferedSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of buffered diagnostics
    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    /// Whether nothing has been emitted yet
    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }

    /// Drain and return everything buffered so far
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.messages.lock())
    }

    /// Clone of the current buffer, leaving it in place
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.messages.lock().clone()
    }
}

impl MessageSink for BufferedSink {
    fn emit(&self, diagnostic: Diagnostic) {
        self.messages.lock().push(diagnostic);
    }
}

impl<S: MessageSink + ?Sized> MessageSink for &S {
    fn emit(&self, diagnostic: Diagnostic) {
        (**self).emit(diagnostic);
    }
}

impl<S: MessageSink + ?Sized> MessageSink for std::sync::Arc<S> {
    fn emit(&self, diagnostic: Diagnostic) {
        (**self).emit(diagnostic);
    }
}

// ================================================================================================
// Tests
// ================================================================================================
