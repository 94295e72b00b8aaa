//! # Equipment interfaces

pub mod mech;
pub mod vision;
