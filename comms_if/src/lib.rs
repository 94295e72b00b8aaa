//! # Communications interface crate.
//!
//! Provides the data types exchanged between the arm software and the things around it: the
//! mechanism and vision equipment, the operator's input device, and the commands used to select
//! an autonomous routine.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Commands which select and configure autonomous behaviour
pub mod tc;

/// Readings and demands for equipment (like mechanisms)
pub mod eqpt;

/// Operator input device sampling
pub mod input;
