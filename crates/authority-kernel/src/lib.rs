//! # authority-kernel: functional core of the state authority
//!
//! The kernel is the pure, deterministic heart of the orchestrator. It
//! receives commands and status updates and produces new state plus
//! effects for the runtime to execute.
//!
//! ## Key principles
//!
//! - **No I/O**: the kernel never touches disk, network, or the clock.
//! - **No randomness**: same input always produces the same output.
//! - **Pure functions**: `apply_command(state, cmd) -> Result<(state, effects), Rejection>`.
//!
//! ## Architecture
//!
//! - [`domain`]: RunSpec, Instance, FrameworkRegistration value types.
//! - [`command`]: commands submitted via `CommandRequest`.
//! - [`effects`]: effects for the runtime to execute.
//! - [`delta`]: durable state deltas written to the persistence journal.
//! - [`state`]: the in-memory snapshot and its invariants.
//! - [`kernel`]: `apply_command` / `apply_status_update` / `apply_framework_event`.

pub mod command;
pub mod delta;
pub mod domain;
pub mod effects;
pub mod kernel;
pub mod state;

#[cfg(test)]
mod tests;

pub use command::Command;
pub use delta::JournalDelta;
pub use domain::{Constraint, FrameworkRegistration, Instance, ResourceRequirements, RunSpec};
pub use effects::{Effect, NotifyEvent};
pub use kernel::{apply_command, apply_framework_event, apply_status_update};
pub use state::State;
