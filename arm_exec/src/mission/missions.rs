//! Named autonomous missions
//!
//! Each function builds the graph for one mission from the catalog. The functions hold no state,
//! the same catalog and trajectories always produce the same graph.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::{
    parallel, parallel_background, sequence, sequence_all, Catalog, MissionBuildError,
    MissionGraph,
};
use crate::mech_if::TrajectorySource;
use comms_if::tc::auto::MissionName;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Build the graph for a named mission.
pub fn build(
    name: MissionName,
    catalog: &Catalog,
    trajectories: &dyn TrajectorySource,
) -> Result<MissionGraph, MissionBuildError> {
    match name {
        MissionName::Default => Ok(MissionGraph::empty()),
        MissionName::Taxi => taxi(catalog, trajectories),
        MissionName::Balance => balance(catalog, trajectories),
        MissionName::PlaceCone => place_cone(catalog),
        MissionName::PlaceConeThenTaxi => place_cone_then_taxi(catalog, trajectories),
        MissionName::PlaceConeThenBalance => place_cone_then_balance(catalog, trajectories),
        MissionName::Pickup => pickup(catalog),
        MissionName::DoublePlacement => double_placement(catalog, trajectories),
    }
}

/// Drive out of the community.
pub fn taxi(
    catalog: &Catalog,
    trajectories: &dyn TrajectorySource,
) -> Result<MissionGraph, MissionBuildError> {
    Ok(catalog.drive("DriveOutOfCommunity", trajectories)?.into())
}

/// Drive over the charge station while calibrating, then back onto it and balance.
pub fn balance(
    catalog: &Catalog,
    trajectories: &dyn TrajectorySource,
) -> Result<MissionGraph, MissionBuildError> {
    Ok(sequence(
        balance_approach(catalog, trajectories)?,
        balance_finish(catalog, trajectories)?,
    ))
}

/// Place the held cone on the top right node and return.
pub fn place_cone(catalog: &Catalog) -> Result<MissionGraph, MissionBuildError> {
    Ok(sequence_all(vec![
        catalog.arm_to("top_right")?,
        catalog.gripper(false),
        catalog.arm_to("starting")?,
    ]))
}

/// Place the cone, then leave the community with the arm stowing on the way.
pub fn place_cone_then_taxi(
    catalog: &Catalog,
    trajectories: &dyn TrajectorySource,
) -> Result<MissionGraph, MissionBuildError> {
    Ok(sequence_all(vec![
        sequence(catalog.arm_to("top_right")?, catalog.gripper(false)),
        parallel_background(
            catalog.drive("DriveOutOfCommunity", trajectories)?,
            catalog.arm_to("starting")?,
        ),
    ]))
}

/// Calibrate on the way over the charge station, place the cone from the far side, then
/// balance.
pub fn place_cone_then_balance(
    catalog: &Catalog,
    trajectories: &dyn TrajectorySource,
) -> Result<MissionGraph, MissionBuildError> {
    Ok(sequence_all(vec![
        balance_approach(catalog, trajectories)?,
        place_cone(catalog)?,
        balance_finish(catalog, trajectories)?,
    ]))
}

/// Pick up a piece from the floor and return to the starting position.
pub fn pickup(catalog: &Catalog) -> Result<MissionGraph, MissionBuildError> {
    Ok(sequence_all(vec![
        catalog.gripper(false),
        catalog.arm_to("pickup_x35")?,
        catalog.gripper(true),
        catalog.arm_to("starting")?,
    ]))
}

/// Place the cone, fetch a cube and place it on the top centre node.
pub fn double_placement(
    catalog: &Catalog,
    trajectories: &dyn TrajectorySource,
) -> Result<MissionGraph, MissionBuildError> {
    Ok(sequence_all(vec![
        place_cone(catalog)?,
        catalog.drive("DriveBackwardsToCube", trajectories)?.into(),
        sequence_all(vec![
            catalog.gripper(false),
            catalog.arm_to("pickup_x30")?,
            catalog.gripper(true),
        ]),
        parallel(
            catalog.arm_to("starting")?,
            catalog.drive("DriveForwardsToGrid", trajectories)?,
        ),
        sequence_all(vec![
            catalog.arm_to("top_center")?,
            catalog.gripper(false),
            catalog.arm_to("starting")?,
        ]),
    ]))
}

fn balance_approach(
    catalog: &Catalog,
    trajectories: &dyn TrajectorySource,
) -> Result<MissionGraph, MissionBuildError> {
    Ok(parallel(
        catalog.calibrate(),
        catalog.drive("DriveForwardOverChargeStation", trajectories)?,
    ))
}

fn balance_finish(
    catalog: &Catalog,
    trajectories: &dyn TrajectorySource,
) -> Result<MissionGraph, MissionBuildError> {
    Ok(sequence(
        catalog.drive("DriveBackwardsOntoChargeStation", trajectories)?,
        catalog.drive_shared("BalanceChargeStation", trajectories)?,
    ))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        mech_if::{Completable, DriveError, DriveStatus},
        mission::MatchContext,
        test_params,
    };
    use comms_if::tc::auto::Alliance;

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

    /// Every leg exists.
    struct AnyLeg;

    impl TrajectorySource for AnyLeg {
        fn get(&self, name: &str) -> Option<Box<dyn Completable>> {
            Some(Box::new(Leg(name.to_string())))
        }
    }

    /// No leg exists.
    struct NoLegs;

    impl TrajectorySource for NoLegs {
        fn get(&self, _: &str) -> Option<Box<dyn Completable>> {
            None
        }
    }

    fn catalog(alliance: Alliance) -> Catalog {
        let params = test_params::load();
        Catalog::new(params.mission, params.motion_seq, MatchContext { alliance })
    }

    #[test]
    fn test_all_missions_build() {
        for alliance in [Alliance::Red, Alliance::Blue] {
            for name in MissionName::ALL {
                build(name, &catalog(alliance), &AnyLeg).unwrap();
            }
        }
    }

    #[test]
    fn test_balance_shape() {
        let graph = balance(&catalog(Alliance::Red), &AnyLeg).unwrap();
        assert_eq!(
            graph.describe(),
            vec![
                vec![
                    "calibrate".to_string(),
                    "DriveForwardOverChargeStationRed".to_string()
                ],
                vec!["DriveBackwardsOntoChargeStationRed".to_string()],
                vec!["BalanceChargeStation".to_string()],
            ]
        );
    }

    #[test]
    fn test_place_then_taxi_stows_in_background() {
        let graph = place_cone_then_taxi(&catalog(Alliance::Blue), &AnyLeg).unwrap();
        let last = &graph.steps()[graph.num_steps() - 1];
        assert_eq!(last.blocking()[0].name(), "DriveOutOfCommunityBlue");
        assert_eq!(last.background()[0].name(), "arm_to(starting)");
    }

    #[test]
    fn test_missing_leg_fails_build() {
        assert_eq!(
            build(MissionName::Taxi, &catalog(Alliance::Blue), &NoLegs).unwrap_err(),
            MissionBuildError::UnknownDriveLeg("DriveOutOfCommunityBlue".into())
        );
        assert!(build(MissionName::Pickup, &catalog(Alliance::Blue), &NoLegs).is_ok());
        assert!(build(MissionName::Default, &catalog(Alliance::Blue), &NoLegs)
            .unwrap()
            .is_empty());
    }
}
