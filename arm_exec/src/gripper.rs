//! # Gripper
//!
//! The gripper is a two state (open/closed) mechanism with no position feedback, so a change of
//! state is assumed complete once the actuation time has elapsed.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::info;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the gripper.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct GripperParams {
    /// Time taken for the gripper to fully open or close.
    ///
    /// Units: seconds
    pub actuation_time_s: f64,

    /// State of the gripper at power on, the robot starts holding a game piece.
    pub start_closed: bool,
}

#[derive(Debug, Clone)]
pub struct Gripper {
    params: GripperParams,

    closed: bool,

    /// Time of the last change of state
    changed_s: Option<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Gripper {
    pub fn new(params: GripperParams) -> Self {
        Self {
            closed: params.start_closed,
            params,
            changed_s: None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Command the gripper open or closed. Commanding the current state does nothing.
    pub fn command(&mut self, close: bool, now_s: f64) {
        if close != self.closed {
            info!("Gripper {}", if close { "closing" } else { "opening" });
            self.closed = close;
            self.changed_s = Some(now_s);
        }
    }

    pub fn toggle(&mut self, now_s: f64) {
        self.command(!self.closed, now_s)
    }

    /// True once the last commanded change has had time to complete.
    pub fn is_settled(&self, now_s: f64) -> bool {
        match self.changed_s {
            Some(t) => now_s - t >= self.params.actuation_time_s,
            None => true,
        }
    }
}
