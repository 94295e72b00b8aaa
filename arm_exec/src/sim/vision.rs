//! Scripted vision sensor

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::mech_if::VisionIf;
use comms_if::eqpt::vision::TargetOffset;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A period in which the sensor sees a target at a constant offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionWindow {
    /// Units: seconds
    pub start_s: f64,

    /// Units: seconds
    pub end_s: f64,

    /// Time between samples.
    ///
    /// Units: seconds
    pub period_s: f64,

    /// Units: inches
    pub lateral_bias_in: f64,

    /// Units: inches
    pub vertical_bias_in: f64,
}

#[derive(Debug, Clone, Default)]
pub struct SimVision {
    windows: Vec<VisionWindow>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimVision {
    pub fn new(windows: Vec<VisionWindow>) -> Self {
        Self { windows }
    }
}

impl VisionIf for SimVision {
    fn get_target_offset(&mut self, now_s: f64) -> Option<TargetOffset> {
        let w = self
            .windows
            .iter()
            .find(|w| now_s >= w.start_s && now_s < w.end_s)?;

        // Samples are only produced on the window's period, between them the last one repeats
        let timestamp_s = if w.period_s > 0.0 {
            w.start_s + ((now_s - w.start_s) / w.period_s).floor() * w.period_s
        } else {
            now_s
        };

        Some(TargetOffset {
            lateral_bias_in: w.lateral_bias_in,
            vertical_bias_in: w.vertical_bias_in,
            timestamp_s,
        })
    }
}
