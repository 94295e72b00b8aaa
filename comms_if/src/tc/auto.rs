//! # Autonomy Telecommands
//!
//! Selection of the autonomous routine and the alliance it is played for.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use structopt::StructOpt;
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// The autonomous routine to run and which side of the field it runs for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, StructOpt)]
pub struct AutoSelection {
    /// The mission to run when autonomous starts.
    #[structopt(short, long, default_value = "default")]
    pub mission: MissionName,

    /// The alliance the robot is playing for, `red` or `blue`.
    #[structopt(short, long, default_value = "blue")]
    pub alliance: Alliance,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The side of the field the robot is playing for.
///
/// Routines are authored for the blue side, red routines are mirrored from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Alliance {
    Red,
    Blue,
}

/// An autonomous routine which can be run by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionName {
    /// Do nothing.
    Default,

    /// Drive out of the starting zone.
    Taxi,

    /// Drive over the charge station then back onto it and balance.
    Balance,

    /// Place the preloaded cone on the top row.
    PlaceCone,

    /// Place the preloaded cone then drive out of the starting zone.
    PlaceConeThenTaxi,

    /// Place the preloaded cone then balance on the charge station.
    PlaceConeThenBalance,

    /// Pick up a game piece from the floor and return to the starting pose.
    Pickup,

    /// Place the preloaded cone, collect a cube and place that too.
    DoublePlacement,
}

/// An error parsing an alliance or mission name.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AutoParseError {
    #[error("\"{0}\" is not an alliance, expected red or blue")]
    UnknownAlliance(String),

    #[error("\"{0}\" is not a known mission")]
    UnknownMission(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Default for AutoSelection {
    fn default() -> Self {
        Self {
            mission: MissionName::Default,
            alliance: Alliance::Blue,
        }
    }
}

impl Alliance {
    /// Suffix used to select alliance specific resources, such as drive trajectories.
    pub fn suffix(self) -> &'static str {
        match self {
            Alliance::Red => "Red",
            Alliance::Blue => "Blue",
        }
    }

    /// Sign to apply to lateral quantities authored for the blue side.
    pub fn lateral_sign(self) -> f64 {
        match self {
            Alliance::Red => -1.0,
            Alliance::Blue => 1.0,
        }
    }
}

impl fmt::Display for Alliance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.suffix())
    }
}

impl FromStr for Alliance {
    type Err = AutoParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "red" => Ok(Alliance::Red),
            "blue" => Ok(Alliance::Blue),
            _ => Err(AutoParseError::UnknownAlliance(s.to_string())),
        }
    }
}

impl MissionName {
    /// All mission names.
    pub const ALL: [MissionName; 8] = [
        MissionName::Default,
        MissionName::Taxi,
        MissionName::Balance,
        MissionName::PlaceCone,
        MissionName::PlaceConeThenTaxi,
        MissionName::PlaceConeThenBalance,
        MissionName::Pickup,
        MissionName::DoublePlacement,
    ];

    /// The name used on the command line and in parameter files.
    pub fn as_str(self) -> &'static str {
        match self {
            MissionName::Default => "default",
            MissionName::Taxi => "taxi",
            MissionName::Balance => "balance",
            MissionName::PlaceCone => "place_cone",
            MissionName::PlaceConeThenTaxi => "place_cone_then_taxi",
            MissionName::PlaceConeThenBalance => "place_cone_then_balance",
            MissionName::Pickup => "pickup",
            MissionName::DoublePlacement => "double_placement",
        }
    }
}

impl fmt::Display for MissionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MissionName {
    type Err = AutoParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase().replace('-', "_");
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == lower)
            .ok_or_else(|| AutoParseError::UnknownMission(s.to_string()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_mission_name_round_trip() {
        for m in MissionName::ALL.iter() {
            assert_eq!(m.as_str().parse::<MissionName>(), Ok(*m));
        }
        assert_eq!("place-cone".parse::<MissionName>(), Ok(MissionName::PlaceCone));
        assert!("dance".parse::<MissionName>().is_err());
    }

    #[test]
    fn test_alliance() {
        assert_eq!("RED".parse::<Alliance>(), Ok(Alliance::Red));
        assert_eq!(Alliance::Red.lateral_sign(), -1.0);
        assert_eq!(Alliance::Blue.suffix(), "Blue");
    }

    #[test]
    fn test_selection_from_args() {
        let sel = AutoSelection::from_iter(&["arm_exec", "--mission", "pickup", "-a", "red"]);
        assert_eq!(sel.mission, MissionName::Pickup);
        assert_eq!(sel.alliance, Alliance::Red);

        let sel = AutoSelection::from_iter(&["arm_exec"]);
        assert_eq!(sel, AutoSelection::default());
    }

    #[test]
    fn test_mission_name_serde() {
        let s = serde_json::to_string(&MissionName::PlaceConeThenTaxi).unwrap();
        assert_eq!(s, "\"place_cone_then_taxi\"");
    }
}
