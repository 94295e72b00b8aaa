//! # Telecommand module
//!
//! Commands used to select what the arm does during a match.

pub mod auto;
