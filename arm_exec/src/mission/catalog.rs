//! Catalog of named primitives
//!
//! The catalog is built once for the match with the alliance already chosen. Arm positions are
//! authored for the blue alliance and mirrored on the lateral axis for red, drive legs are picked
//! by appending the alliance name.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::{MissionBuildError, Params, Primitive};
use crate::{
    arm_ctrl::CartesianCoords,
    mech_if::TrajectorySource,
    motion_seq::{self, Target},
};
use comms_if::{eqpt::mech::JointId, tc::auto::Alliance};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Facts about the match which don't change once it has started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchContext {
    pub alliance: Alliance,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    params: Params,
    seq_params: motion_seq::Params,
    ctx: MatchContext,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A primitive described by name, as used in parameter files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PrimitiveDef {
    ArmTo {
        position: String,
        #[serde(default)]
        aim_assisted: bool,
    },
    Gripper {
        close: bool,
    },
    Calibrate,
    Wait {
        duration_s: f64,
    },
    Drive {
        leg: String,
    },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Catalog {
    pub fn new(params: Params, seq_params: motion_seq::Params, ctx: MatchContext) -> Self {
        Self {
            params,
            seq_params,
            ctx,
        }
    }

    pub fn context(&self) -> &MatchContext {
        &self.ctx
    }

    /// Coordinates of a named position for this alliance.
    pub fn position(&self, name: &str) -> Result<CartesianCoords, MissionBuildError> {
        let pos = self
            .params
            .positions
            .get(name)
            .ok_or_else(|| MissionBuildError::UnknownPosition(name.to_string()))?;

        Ok(self.mirror(CartesianCoords::from(pos.coords_in)))
    }

    /// Autonomous move to a named position.
    pub fn arm_to(&self, name: &str) -> Result<Primitive, MissionBuildError> {
        self.arm_to_with(name, false)
    }

    /// Autonomous move to a named position, optionally corrected by the aim assist.
    pub fn arm_to_with(
        &self,
        name: &str,
        aim_assisted: bool,
    ) -> Result<Primitive, MissionBuildError> {
        let pos = self
            .params
            .positions
            .get(name)
            .ok_or_else(|| MissionBuildError::UnknownPosition(name.to_string()))?;
        let coords = self.mirror(CartesianCoords::from(pos.coords_in));

        let target = Target::new(coords, &self.seq_params)
            .with_steps(
                pos.lateral_step_in.unwrap_or(self.seq_params.lateral_step_in),
                pos.vertical_step_in
                    .unwrap_or(self.seq_params.vertical_step_in),
            )
            .with_timeout(self.params.arm_move_timeout_s)
            .with_aim_assist(aim_assisted || pos.aim_assisted);

        Ok(Primitive::arm_move(format!("arm_to({})", name), target))
    }

    /// Autonomous move to coordinates authored for the blue alliance.
    pub fn arm_to_coords(&self, name: &str, coords_in: CartesianCoords) -> Primitive {
        let target = Target::new(self.mirror(coords_in), &self.seq_params)
            .with_timeout(self.params.arm_move_timeout_s);
        Primitive::arm_move(name, target)
    }

    pub fn gripper(&self, close: bool) -> Primitive {
        Primitive::gripper(
            if close {
                "gripper(close)"
            } else {
                "gripper(open)"
            },
            close,
        )
    }

    /// Calibrate every joint.
    pub fn calibrate(&self) -> Primitive {
        Primitive::calibrate("calibrate", JointId::ALL.to_vec())
    }

    pub fn wait(&self, duration_s: f64) -> Primitive {
        Primitive::wait(format!("wait({:.2})", duration_s), duration_s)
    }

    /// Drive leg for this alliance, `base` is the leg name without the alliance suffix.
    pub fn drive(
        &self,
        base: &str,
        trajectories: &dyn TrajectorySource,
    ) -> Result<Primitive, MissionBuildError> {
        self.drive_shared(
            &format!("{}{}", base, self.ctx.alliance.suffix()),
            trajectories,
        )
    }

    /// Drive leg used by both alliances.
    pub fn drive_shared(
        &self,
        name: &str,
        trajectories: &dyn TrajectorySource,
    ) -> Result<Primitive, MissionBuildError> {
        trajectories
            .get(name)
            .map(Primitive::drive)
            .ok_or_else(|| MissionBuildError::UnknownDriveLeg(name.to_string()))
    }

    /// Build a primitive from its description.
    pub fn build(
        &self,
        def: &PrimitiveDef,
        trajectories: &dyn TrajectorySource,
    ) -> Result<Primitive, MissionBuildError> {
        match def {
            PrimitiveDef::ArmTo {
                position,
                aim_assisted,
            } => self.arm_to_with(position, *aim_assisted),
            PrimitiveDef::Gripper { close } => Ok(self.gripper(*close)),
            PrimitiveDef::Calibrate => Ok(self.calibrate()),
            PrimitiveDef::Wait { duration_s } => Ok(self.wait(*duration_s)),
            PrimitiveDef::Drive { leg } => self.drive(leg, trajectories),
        }
    }

    fn mirror(&self, coords_in: CartesianCoords) -> CartesianCoords {
        let mut c = coords_in;
        c.x *= self.ctx.alliance.lateral_sign();
        c
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        mech_if::{Completable, DriveError, DriveStatus},
        mission::PrimitiveKind,
        test_params,
    };

    struct Leg(String);

    impl Completable for Leg {
        fn name(&self) -> &str {
            &self.0
        }
        fn start(&mut self, _: f64) -> Result<(), DriveError> {
            Ok(())
        }
        fn tick(&mut self, _: f64) -> DriveStatus {
            DriveStatus::Finished
        }
        fn cancel(&mut self) {}
    }

    struct Legs;

    impl TrajectorySource for Legs {
        fn get(&self, name: &str) -> Option<Box<dyn Completable>> {
            match name {
                "DriveOutOfCommunityBlue" | "DriveOutOfCommunityRed" | "BalanceChargeStation" => {
                    Some(Box::new(Leg(name.to_string())))
                }
                _ => None,
            }
        }
    }

    fn catalog(alliance: Alliance) -> Catalog {
        let params = test_params::load();
        Catalog::new(params.mission, params.motion_seq, MatchContext { alliance })
    }

    #[test]
    fn test_red_mirrors_lateral_axis() {
        let blue = catalog(Alliance::Blue).position("top_right").unwrap();
        let red = catalog(Alliance::Red).position("top_right").unwrap();

        assert_eq!(red.x, -blue.x);
        assert_eq!(red.y, blue.y);
        assert_eq!(red.z, blue.z);
    }

    #[test]
    fn test_drive_leg_suffix() {
        let red = catalog(Alliance::Red);
        assert_eq!(
            red.drive("DriveOutOfCommunity", &Legs).unwrap().name(),
            "DriveOutOfCommunityRed"
        );
        assert_eq!(
            red.drive_shared("BalanceChargeStation", &Legs)
                .unwrap()
                .name(),
            "BalanceChargeStation"
        );
        assert_eq!(
            red.drive("NoSuchLeg", &Legs).unwrap_err(),
            MissionBuildError::UnknownDriveLeg("NoSuchLegRed".into())
        );
    }

    #[test]
    fn test_position_steps_and_timeout() {
        let params = test_params::load();
        let c = catalog(Alliance::Blue);
        let p = c.arm_to("starting").unwrap();
        let pos = &params.mission.positions["starting"];

        match p.kind() {
            PrimitiveKind::ArmMove { target, .. } => {
                assert_eq!(
                    target.lateral_step_in,
                    pos.lateral_step_in.unwrap_or(params.motion_seq.lateral_step_in)
                );
                assert_eq!(target.timeout_s, Some(params.mission.arm_move_timeout_s));
            }
            _ => panic!("Expected an arm move"),
        }

        assert_eq!(
            c.arm_to("nowhere").unwrap_err(),
            MissionBuildError::UnknownPosition("nowhere".into())
        );
    }

    #[test]
    fn test_build_from_description() {
        let c = catalog(Alliance::Blue);
        let def: PrimitiveDef =
            serde_json::from_str(r#"{"type": "arm_to", "position": "top_center"}"#).unwrap();
        assert_eq!(c.build(&def, &Legs).unwrap().name(), "arm_to(top_center)");

        let def = PrimitiveDef::Gripper { close: true };
        assert_eq!(c.build(&def, &Legs).unwrap().name(), "gripper(close)");
    }
}
