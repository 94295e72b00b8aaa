//! Parameters structure for AimAssist

use serde::{Deserialize, Serialize};

/// Parameters for aim assist.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Params {
    /// Time after a fresh sample for which the full bias is applied.
    ///
    /// Units: seconds
    pub hold_time_s: f64,

    /// Time after a fresh sample at which the bias reaches zero.
    ///
    /// Units: seconds
    pub stale_timeout_s: f64,

    /// Maximum magnitude of the bias on each axis.
    ///
    /// Units: inches
    pub max_bias_in: f64,

    /// Gain applied to the raw vision offsets.
    pub gain: f64,
}
