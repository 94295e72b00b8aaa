//! Forward and inverse kinematics of the arm
//!
//! The arm is modelled as a turret yawing about the vertical axis, carrying a planar two link
//! arm (shoulder and forearm). Forward kinematics works out the planar reach `r` and height of
//! the gripper, then rotates the reach about the turret axis. Inverse kinematics runs the same
//! steps backwards, producing up to four candidate solutions (turret facing or flipped away from
//! the target, elbow up or down) and picking the one closest to where the arm already is.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::mech::JointId;
use log::trace;
use std::f64::consts::{PI, TAU};
use util::maths::{clamp_sym, wrap_near};

use super::{CartesianCoords, JointAngles, KinematicsError, Params, RangeViolation};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Planar reach below which a target is considered to be on the turret axis.
const ON_AXIS_LIMIT_IN: f64 = 1e-9;

/// Slack allowed when checking reach and joint limits, absorbs rounding error.
const LIMIT_EPSILON: f64 = 1e-9;

/// Number of full turret turns either side of the nearest yaw considered by inverse kinematics.
const YAW_TURNS: i32 = 2;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Converts between Cartesian gripper coordinates and joint angles.
///
/// The converter is pure, it never holds or mutates any joint state.
#[derive(Debug, Clone)]
pub struct KinematicsConverter {
    params: Params,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl KinematicsConverter {
    pub fn new(params: Params) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Coordinates of the stowed starting pose.
    pub fn starting_coords(&self) -> CartesianCoords {
        CartesianCoords::from(self.params.starting_coords_in)
    }

    /// Clamp an angle into the mechanical range of the joint.
    pub fn clamp_to_range(&self, joint: JointId, angle_rad: f64) -> f64 {
        let (min, max) = self.params.range_of(joint);
        angle_rad.max(min).min(max)
    }

    /// Returns true if the angle lies within the mechanical range of the joint.
    pub fn in_range(&self, joint: JointId, angle_rad: f64) -> bool {
        let (min, max) = self.params.range_of(joint);
        angle_rad >= min - LIMIT_EPSILON && angle_rad <= max + LIMIT_EPSILON
    }

    /// Compute the gripper coordinates for the given joint angles.
    pub fn forward(&self, angles: &JointAngles) -> CartesianCoords {
        let yaw = angles[JointId::Turret.index()];
        let shoulder = angles[JointId::Shoulder.index()];
        let elbow_abs = shoulder + angles[JointId::Elbow.index()];

        let l1 = self.params.shoulder_length_in;
        let l2 = self.params.forearm_length_in;

        let reach = l1 * shoulder.cos() + l2 * elbow_abs.cos();
        let height = self.params.base_height_in + l1 * shoulder.sin() + l2 * elbow_abs.sin();

        CartesianCoords::new(reach * yaw.sin(), height, reach * yaw.cos())
    }

    /// Compute the joint angles which place the gripper at `target`.
    ///
    /// Of all the solutions which respect the joint limits the one with the smallest total
    /// angular displacement from `current` is returned. The turret angle is unwrapped to the
    /// equivalent angle nearest its current value.
    pub fn inverse(
        &self,
        target: &CartesianCoords,
        current: &JointAngles,
    ) -> Result<JointAngles, KinematicsError> {
        let out_of_range = |reason| KinematicsError::OutOfRange {
            target_in: [target.x, target.y, target.z],
            reason,
        };

        if !target.iter().all(|v| v.is_finite()) || !current.iter().all(|v| v.is_finite()) {
            return Err(out_of_range(RangeViolation::NonFinite));
        }

        let l1 = self.params.shoulder_length_in;
        let l2 = self.params.forearm_length_in;

        let height = target.y - self.params.base_height_in;
        let planar = target.x.hypot(target.z);
        let dist_sq = planar * planar + height * height;
        let dist = dist_sq.sqrt();

        if dist > l1 + l2 + LIMIT_EPSILON {
            return Err(out_of_range(RangeViolation::TooFar));
        }
        if dist < (l1 - l2).abs() - LIMIT_EPSILON {
            return Err(out_of_range(RangeViolation::TooClose));
        }

        let current_yaw = current[JointId::Turret.index()];
        let current_shoulder = current[JointId::Shoulder.index()];

        // Turret candidates as (yaw, signed planar reach). Every full turn equivalent of the
        // facing and flipped yaws is tried, the joint limits below keep the reachable ones.
        let mut yaws = Vec::with_capacity(2 * (2 * YAW_TURNS as usize + 1));
        if planar < ON_AXIS_LIMIT_IN {
            yaws.push((current_yaw, 0.0));
        } else {
            let facing = target.x.atan2(target.z);
            for (base, reach) in [(facing, planar), (facing + PI, -planar)] {
                let nearest = wrap_near(base, current_yaw);
                for turn in -YAW_TURNS..=YAW_TURNS {
                    yaws.push((nearest + TAU * f64::from(turn), reach));
                }
            }
        }

        let cos_elbow = clamp_sym((dist_sq - l1 * l1 - l2 * l2) / (2.0 * l1 * l2), 1.0);
        let elbow_mag = cos_elbow.acos();

        let mut best: Option<(f64, JointAngles)> = None;

        for &(yaw, reach) in yaws.iter() {
            for elbow in [-elbow_mag, elbow_mag] {
                let shoulder = height.atan2(reach)
                    - (l2 * elbow.sin()).atan2(l1 + l2 * elbow.cos());
                let candidate = [yaw, wrap_near(shoulder, current_shoulder), elbow];

                if !JointId::ALL
                    .iter()
                    .all(|j| self.in_range(*j, candidate[j.index()]))
                {
                    trace!("IK candidate {:?} rejected by joint limits", candidate);
                    continue;
                }

                let cost: f64 = candidate
                    .iter()
                    .zip(current.iter())
                    .map(|(c, a)| (c - a).abs())
                    .sum();

                match best {
                    Some((best_cost, _)) if best_cost <= cost => (),
                    _ => best = Some((cost, candidate)),
                }
            }
        }

        match best {
            Some((_, mut angles)) => {
                // Pull solutions sitting on a limit back inside it
                for j in JointId::ALL.iter() {
                    angles[j.index()] = self.clamp_to_range(*j, angles[j.index()]);
                }
                Ok(angles)
            }
            None => Err(out_of_range(RangeViolation::JointLimits)),
        }
    }

    /// Move the nudge joint directly, bypassing inverse kinematics.
    ///
    /// `axis_delta` is the operator's axis deflection, clamped to [-1, 1]. The returned angle is
    /// clamped to the joint's mechanical range.
    pub fn relative_joint_nudge(&self, axis_delta: f64, current_angle_rad: f64, dt_s: f64) -> f64 {
        let axis = if axis_delta.is_finite() {
            clamp_sym(axis_delta, 1.0)
        } else {
            0.0
        };

        self.clamp_to_range(
            self.params.nudge_joint,
            current_angle_rad + axis * self.params.max_nudge_rate_rads * dt_s,
        )
    }
}
