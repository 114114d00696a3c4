//! Profile switch orchestration for Orbit.
//!
//! Ties the registry, the vault, and a provider's live auth together:
//!
//! - [`Orchestrator::add_profile`] / [`Orchestrator::remove_profile`]
//! - [`Orchestrator::switch_to`] changes the active profile, confirming live
//!   auth before the registry moves and rolling back when it cannot.
//! - [`Orchestrator::run_as`] runs the provider CLI once as another profile
//!   and always restores live auth afterwards.
//! - [`Orchestrator::exec_current`] runs the provider CLI as the active
//!   profile, falling back to token injection.

mod error;
pub mod orchestrator;
pub mod runner;
pub mod slot;

#[cfg(test)]
mod testing;

pub use error::{Result, SwitchError};
pub use orchestrator::{
    AddOutcome, AuthCheck, ExecMode, Orchestrator, RemoveOutcome, RunOutcome, SwitchOutcome,
    SwitchPhase, TokenOrigin,
};
pub use runner::{CommandRunner, Invocation, ProcessRunner};
