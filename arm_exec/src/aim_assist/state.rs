//! Implementations for the AimAssist state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, warn};
use serde::Serialize;

// Internal
use super::{AimAssistError, Params};
use comms_if::eqpt::vision::TargetOffset;
use util::{
    maths::{clamp_sym, lin_map},
    module::State,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Aim assist module state
#[derive(Debug, Default, Clone)]
pub struct AimAssist {
    pub(crate) params: Params,

    pub(crate) report: StatusReport,

    /// The last accepted sample and the time at which it was accepted
    last_sample: Option<(TargetOffset, f64)>,

    stale: bool,
}

/// Input data to aim assist.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputData {
    /// This cycle's sample from the vision sensor, if any
    pub sample: Option<TargetOffset>,

    pub now_s: f64,
}

/// The bias to add onto aim assisted targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AimBias {
    /// Added to the x axis
    pub lateral_in: f64,

    /// Added to the y axis
    pub vertical_in: f64,
}

/// Status report for aim assist processing.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatusReport {
    /// True if a fresh sample was accepted this cycle
    pub fresh_sample: bool,

    /// Time since the last fresh sample
    pub sample_age_s: Option<f64>,

    /// Fraction of the full bias being applied
    pub decay_factor: f64,

    /// Set while vision is stale
    #[serde(skip)]
    pub stale: Option<AimAssistError>,

    /// Set if this cycle's sample was discarded
    #[serde(skip)]
    pub invalid_sample: Option<AimAssistError>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for AimAssist {
    type InitData = Params;
    type InitError = std::convert::Infallible;

    type InputData = InputData;
    type OutputData = AimBias;
    type StatusReport = StatusReport;
    type ProcError = AimAssistError;

    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        self.params = init_data;
        self.last_sample = None;
        self.stale = true;
        self.report = StatusReport::default();
        Ok(())
    }

    /// Perform cyclic processing of aim assist.
    ///
    /// A sample is fresh only if its timestamp is newer than the last accepted sample. Samples
    /// containing non-finite values are discarded and flagged in the report, the bias from the
    /// last accepted sample carries on decaying as if no sample had arrived.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        self.report = StatusReport::default();

        let sample = match input_data.sample {
            Some(s)
                if !(s.lateral_bias_in.is_finite()
                    && s.vertical_bias_in.is_finite()
                    && s.timestamp_s.is_finite()) =>
            {
                warn!("{}, discarding {:?}", AimAssistError::InvalidSample, s);
                self.report.invalid_sample = Some(AimAssistError::InvalidSample);
                None
            }
            s => s,
        };

        if let Some(sample) = sample {
            let is_newer = match self.last_sample {
                Some((last, _)) => sample.timestamp_s > last.timestamp_s,
                None => true,
            };

            if is_newer {
                self.last_sample = Some((sample, input_data.now_s));
                self.report.fresh_sample = true;
            }
        }

        let (bias, age_s) = match self.last_sample {
            Some((sample, accepted_s)) => {
                let age_s = input_data.now_s - accepted_s;
                let factor = self.decay_factor(age_s);
                self.report.decay_factor = factor;

                let bias = if factor > 0.0 {
                    AimBias {
                        lateral_in: clamp_sym(
                            self.params.gain * sample.lateral_bias_in,
                            self.params.max_bias_in,
                        ) * factor,
                        vertical_in: clamp_sym(
                            self.params.gain * sample.vertical_bias_in,
                            self.params.max_bias_in,
                        ) * factor,
                    }
                } else {
                    AimBias::default()
                };

                (bias, Some(age_s))
            }
            None => (AimBias::default(), None),
        };
        self.report.sample_age_s = age_s;

        let stale = self.report.decay_factor <= 0.0;
        if stale && !self.stale {
            warn!("{}", AimAssistError::StaleVision(age_s));
        } else if !stale && self.stale {
            info!("Vision target acquired");
        }
        self.stale = stale;

        if stale {
            self.report.stale = Some(AimAssistError::StaleVision(age_s));
        }

        Ok((bias, self.report))
    }
}

impl AimAssist {
    pub fn new(params: Params) -> Self {
        let mut aim = Self::default();
        // Infallible
        let _ = aim.init(params);
        aim
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Fraction of the full bias to apply for a sample of the given age.
    ///
    /// One until the hold time, then falls linearly to exactly zero at the stale timeout.
    fn decay_factor(&self, age_s: f64) -> f64 {
        if age_s >= self.params.stale_timeout_s {
            0.0
        } else if age_s <= self.params.hold_time_s {
            1.0
        } else {
            lin_map(
                (self.params.hold_time_s, self.params.stale_timeout_s),
                (1.0, 0.0),
                age_s,
            )
            .max(0.0)
            .min(1.0)
        }
    }
}
