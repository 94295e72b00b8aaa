//! Aim assist module
//!
//! Turns the offsets reported by the vision sensor into a positional bias added onto aim assisted
//! targets. The bias is held for a short time after each fresh sample and then decays to zero so
//! that a target lost from view doesn't leave the arm offset indefinitely.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors reported by aim assist.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum AimAssistError {
    /// Not fatal, the bias is zero while vision is stale.
    #[error("Vision data is stale, last fresh sample {0:?} s ago")]
    StaleVision(Option<f64>),

    #[error("Vision sample contains non-finite values")]
    InvalidSample,
}
