//! # PID controller
//!
//! The controller is ticked with an explicit delta time so that behaviour is identical whether
//! the loop runs in real time or faster than real time in simulation.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;
use util::maths::clamp_sym;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A PID controller
#[derive(Debug, Serialize, Clone)]
pub struct PidController {
    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Dervative gain
    k_d: f64,

    /// Anti-windup limit on the integral accumulation
    integral_limit: f64,

    /// Limit on the magnitude of the output
    output_limit: f64,

    /// Previous error
    prev_error: Option<f64>,

    /// The integral accumulation
    integral: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidController {
    /// Create a new controller with the given gains and limits.
    pub fn new(k_p: f64, k_i: f64, k_d: f64, integral_limit: f64, output_limit: f64) -> Self {
        Self {
            k_p,
            k_i,
            k_d,
            integral_limit,
            output_limit,
            prev_error: None,
            integral: 0f64,
        }
    }

    /// Get the value of the controller for the given error over a cycle of `dt` seconds.
    ///
    /// A non-positive `dt` accumulates no integral and produces no derivative term.
    pub fn get(&mut self, error: f64, dt: f64) -> f64 {
        if dt > 0.0 {
            self.integral = clamp_sym(self.integral + error * dt, self.integral_limit);
        }

        // No derivative on the first sample after a reset
        let deriv = match self.prev_error {
            Some(e) if dt > 0.0 => (error - e) / dt,
            _ => 0f64,
        };

        let out = self.k_p * error + self.k_i * self.integral + self.k_d * deriv;

        self.prev_error = Some(error);

        clamp_sym(out, self.output_limit)
    }

    /// Clear the integral and derivative history.
    pub fn reset(&mut self) {
        self.integral = 0f64;
        self.prev_error = None;
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }
}
