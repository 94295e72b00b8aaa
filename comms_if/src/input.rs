//! # Operator input
//!
//! The operator's controller is sampled once per cycle into an `OperatorInput`. Mapping from a
//! physical device onto this structure is handled outside of the arm software.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of buttons available on the operator's controller.
pub const NUM_BUTTONS: usize = 12;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// A single sample of the operator's controller.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperatorInput {
    /// Lateral stick axis, normalised to [-1, 1]
    pub lateral: f64,

    /// Vertical stick axis, normalised to [-1, 1]
    pub vertical: f64,

    /// Button states, indexed from zero
    pub buttons: [bool; NUM_BUTTONS],
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl OperatorInput {
    /// Returns true if the given button is held. Out of range buttons are never held.
    pub fn is_pressed(&self, button: usize) -> bool {
        self.buttons.get(button).copied().unwrap_or(false)
    }

    /// Returns an input with only the given button held.
    pub fn with_button(button: usize) -> Self {
        let mut input = Self::default();
        if let Some(b) = input.buttons.get_mut(button) {
            *b = true;
        }
        input
    }
}
