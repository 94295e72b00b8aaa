//! Simulated drive legs

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::info;
use serde::{Deserialize, Serialize};

use crate::mech_if::{Completable, DriveError, DriveStatus, TrajectorySource};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveLegParams {
    pub name: String,

    /// Units: seconds
    pub duration_s: f64,

    /// If true the leg fails instead of finishing.
    #[serde(default)]
    pub fail: bool,
}

/// A drive leg which takes a fixed time.
#[derive(Debug, Clone)]
pub struct TimedDrive {
    params: DriveLegParams,
    start_s: Option<f64>,
}

/// Provides the configured drive legs by name.
#[derive(Debug, Clone, Default)]
pub struct SimTrajectories {
    legs: Vec<DriveLegParams>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TimedDrive {
    pub fn new(params: DriveLegParams) -> Self {
        Self {
            params,
            start_s: None,
        }
    }
}

impl Completable for TimedDrive {
    fn name(&self) -> &str {
        &self.params.name
    }

    fn start(&mut self, now_s: f64) -> Result<(), DriveError> {
        if self.start_s.is_some() {
            return Err(DriveError::StartRejected(
                self.params.name.clone(),
                "already started".into(),
            ));
        }
        info!(
            "Drive leg {} started, {:.2} s",
            self.params.name, self.params.duration_s
        );
        self.start_s = Some(now_s);
        Ok(())
    }

    fn tick(&mut self, now_s: f64) -> DriveStatus {
        let start_s = match self.start_s {
            Some(t) => t,
            None => {
                return DriveStatus::Failed(DriveError::Failed(
                    self.params.name.clone(),
                    "not started".into(),
                ))
            }
        };

        if now_s - start_s < self.params.duration_s {
            DriveStatus::Running
        } else if self.params.fail {
            DriveStatus::Failed(DriveError::Failed(
                self.params.name.clone(),
                "lost the path".into(),
            ))
        } else {
            DriveStatus::Finished
        }
    }

    fn cancel(&mut self) {
        info!("Drive leg {} cancelled", self.params.name);
    }
}

impl SimTrajectories {
    pub fn new(legs: Vec<DriveLegParams>) -> Self {
        Self { legs }
    }
}

impl TrajectorySource for SimTrajectories {
    fn get(&self, name: &str) -> Option<Box<dyn Completable>> {
        self.legs
            .iter()
            .find(|l| l.name == name)
            .map(|l| Box::new(TimedDrive::new(l.clone())) as Box<dyn Completable>)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_timed_leg() {
        let traj = SimTrajectories::new(vec![
            DriveLegParams {
                name: "TaxiBlue".into(),
                duration_s: 1.0,
                fail: false,
            },
            DriveLegParams {
                name: "TaxiRed".into(),
                duration_s: 1.0,
                fail: true,
            },
        ]);
        assert!(traj.get("Taxi").is_none());

        let mut leg = traj.get("TaxiBlue").unwrap();
        assert!(leg.start(2.0).is_ok());
        assert!(leg.start(2.0).is_err());
        assert_eq!(leg.tick(2.5), DriveStatus::Running);
        assert_eq!(leg.tick(3.0), DriveStatus::Finished);

        let mut leg = traj.get("TaxiRed").unwrap();
        leg.start(0.0).unwrap();
        assert!(matches!(leg.tick(1.0), DriveStatus::Failed(_)));
    }
}
