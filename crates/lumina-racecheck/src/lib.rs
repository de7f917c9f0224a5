//! Shadow-memory data-race detector for the Lumina device interpreter
//!
//! This crate provides:
//! - **Shadow state machine**: per-byte tracking of the last accessing
//!   entity and the access classes that remain race-free
//! - **Shadow store**: one shadow array per live allocation, keyed by
//!   memory instance and buffer id
//! - **Race classifier**: structured diagnostics with 3-D entity coordinates
//! - **Synchronization engine**: barrier and kernel-end sweeps
//!
//! # Architecture
//!
//! ```text
//! interpreter event
//!        │
//!        ▼
//! ┌──────────────┐   (MemoryId, buffer id)   ┌──────────────┐
//! │ RaceDetector │ ─────────────────────────▶ │ ShadowStore  │
//! │  (Plugin)    │                            │  Region[]    │
//! └──────┬───────┘                            └──────┬───────┘
//!        │ per-byte transitions                      │
//!        ▼                                           ▼
//! ┌──────────────┐        on conflict         ┌──────────────┐
//! │  ShadowByte  │ ─────────────────────────▶ │  Diagnostic  │
//! │ state machine│                            │   → sink     │
//! └──────────────┘                            └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use lumina_device_api::{BufferedSink, Dim3, KernelInvocation, Plugin};
//! use lumina_racecheck::{DetectorConfig, RaceDetector};
//!
//! let sink = BufferedSink::new();
//! let mut detector = RaceDetector::with_config(DetectorConfig::default(), &sink);
//! detector.kernel_begin(&KernelInvocation::new("vecadd", Dim3::linear(4), Dim3::linear(2)));
//! // ... deliver memory and barrier events, then kernel_end ...
//! for report in sink.take() {
//!     eprintln!("{report}");
//! }
//! ```
//!
//! The detector assumes single-threaded event delivery in the interpreter's
//! simulated execution order and never aborts the run; races flow out
//! through the sink as `Error`-severity diagnostics.

pub mod config;
pub mod detector;
pub mod error;
pub mod report;
pub mod shadow;
pub mod store;

pub use config::{DetectorConfig, UNIFORM_WRITES_ENV};
pub use detector::RaceDetector;
pub use error::ShadowFault;
pub use shadow::{AccessKind, Actor, ShadowByte};
pub use store::ShadowStore;
