//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::{Float, FloatConst};

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float
{
    target_range.0
        + ((value - source_range.0)
        * (target_range.1 - target_range.0)
        / (source_range.1 - source_range.0))
}

/// Clamp a value into the symmetric range `[-limit, limit]`.
///
/// A negative limit is treated as its magnitude.
pub fn clamp_sym<T>(value: T, limit: T) -> T
where
    T: Float
{
    let limit = limit.abs();
    value.max(-limit).min(limit)
}

/// Return the angle equivalent to `angle` (modulo 2pi) which is closest to `reference`.
///
/// Used to unwrap the output of `atan2` so that a joint is never asked to spin the long way
/// round.
pub fn wrap_near<T>(angle: T, reference: T) -> T
where
    T: Float + FloatConst
{
    let tau_t = T::PI() + T::PI();

    angle + tau_t * ((reference - angle) / tau_t).round()
}
