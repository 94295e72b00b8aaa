//! Mission module
//!
//! Autonomous routines are built as a `MissionGraph`: an ordered list of steps, each step being
//! a set of primitives started together. The graph is built once, with the alliance already
//! resolved, from the named primitives in the `Catalog`, and then run cycle by cycle by a
//! `MissionRunner`.
//!
//! A step is finished when all of its blocking primitives are finished. Background primitives
//! are started with their step but keep running into the following steps, and must finish before
//! the mission completes. Any primitive failure aborts the mission, there are no retries.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod catalog;
mod compose;
pub mod missions;
mod params;
mod primitive;
mod runner;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use catalog::*;
pub use compose::*;
pub use params::*;
pub use primitive::*;
pub use runner::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised while building a mission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MissionBuildError {
    #[error("No arm position named \"{0}\" in the catalog")]
    UnknownPosition(String),

    #[error("No drive leg named \"{0}\" is available")]
    UnknownDriveLeg(String),
}

/// Why a running mission was aborted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MissionAbortError {
    #[error("Primitive {primitive} in step {step} failed: {cause}")]
    PrimitiveFailed {
        step: usize,
        primitive: String,
        cause: AbortCause,
    },

    #[error("Mission interrupted")]
    Interrupted,

    #[error("Mission stopped by emergency stop")]
    EmergencyStop,
}
