//! # Teleoperation
//!
//! Maps the operator's controller onto arm actions through a binding table loaded once at
//! start up. Button actions fire on the press edge. A button bound to a primitive runs it only
//! while the button is held, and any stick input takes control back from it.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    mech_if::TrajectorySource,
    mission::{Catalog, Primitive, PrimitiveCtx, PrimitiveDef},
};
use comms_if::{
    eqpt::mech::JointId,
    input::{OperatorInput, NUM_BUTTONS},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for teleoperation.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TeleopParams {
    /// Stick inputs smaller than this are ignored.
    pub deadband: f64,

    pub bindings: Vec<Binding>,
}

/// Binds a button to an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub button: usize,
    pub action: TeleopAction,
}

#[derive(Debug)]
pub struct Teleop {
    params: TeleopParams,

    prev_buttons: [bool; NUM_BUTTONS],

    /// Primitive run by a held button
    held: Option<Held>,
}

#[derive(Debug)]
struct Held {
    button: usize,
    primitive: Primitive,
}

/// Status report for teleop processing.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusReport {
    /// Actions fired this cycle
    pub fired: Vec<TeleopAction>,

    /// New angle commanded to the nudge joint this cycle
    pub nudge_rad: Option<f64>,

    /// Name of the primitive being run by a held button
    pub running: Option<String>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Actions which can be bound to a button.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeleopAction {
    Calibrate,
    EmergencyStop,
    ClearEmergencyStop,
    ToggleGripper,

    /// Run a catalog primitive while the button is held.
    Run(PrimitiveDef),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Teleop {
    pub fn new(params: TeleopParams) -> Self {
        for b in params.bindings.iter() {
            if b.button >= NUM_BUTTONS {
                warn!(
                    "Binding for {:?} uses button {} which doesn't exist",
                    b.action, b.button
                );
            }
        }

        Self {
            params,
            prev_buttons: [false; NUM_BUTTONS],
            held: None,
        }
    }

    /// Name of the primitive currently run by a held button.
    pub fn running(&self) -> Option<&str> {
        self.held.as_ref().map(|h| h.primitive.name())
    }

    /// Process one sample of operator input, before the motion sequencer runs.
    ///
    /// While `enabled` is false (autonomous mode) only the emergency stop bindings are
    /// honoured.
    pub fn handle(
        &mut self,
        input: &OperatorInput,
        enabled: bool,
        ctx: &mut PrimitiveCtx,
        catalog: &Catalog,
        trajectories: &dyn TrajectorySource,
        dt_s: f64,
    ) -> StatusReport {
        let mut report = StatusReport::default();

        // ---- BUTTONS ----

        let mut pressed = Vec::new();
        for binding in self.params.bindings.iter() {
            let b = binding.button;
            if input.is_pressed(b) && !self.prev_buttons.get(b).copied().unwrap_or(false) {
                pressed.push(binding.clone());
            }
        }
        self.prev_buttons = input.buttons;

        for binding in pressed {
            let allowed = matches!(
                binding.action,
                TeleopAction::EmergencyStop | TeleopAction::ClearEmergencyStop
            ) || enabled;
            if !allowed {
                debug!("Ignoring {:?} outside of teleop", binding.action);
                continue;
            }

            info!("Button {} fired {:?}", binding.button, binding.action);
            self.fire(&binding, ctx, catalog, trajectories);
            report.fired.push(binding.action);
        }

        // ---- HELD PRIMITIVE ----

        let axis_active = input.lateral.abs() > self.params.deadband
            || input.vertical.abs() > self.params.deadband;

        if let Some(mut held) = self.held.take() {
            if !enabled || !input.is_pressed(held.button) {
                debug!("Teleop {} released", held.primitive.name());
                held.primitive.cancel(ctx);
            } else if axis_active {
                info!("Teleop {} interrupted by stick input", held.primitive.name());
                held.primitive.cancel(ctx);
            } else if held.primitive.is_running() {
                if let Some(id) = held.primitive.target_id() {
                    ctx.arm.seq.refresh(id);
                }
                self.held = Some(held);
            }
        }

        // ---- NUDGE ----

        if enabled
            && input.lateral.abs() > self.params.deadband
            && ctx.arm.seq.active().is_none()
            && !ctx.arm.is_emergency_stopped()
        {
            let joint = ctx.arm.kin.params().nudge_joint;
            let current = {
                let j = ctx.arm.joints.get(joint);
                j.target().unwrap_or(j.state().angle_rad)
            };
            let new = ctx.arm.kin.relative_joint_nudge(input.lateral, current, dt_s);

            match ctx.arm.joints.get_mut(joint).set_target(new) {
                Ok(a) => report.nudge_rad = Some(a),
                Err(e) => debug!("Nudge rejected: {}", e),
            }
        }

        report.running = self.running().map(String::from);
        report
    }

    /// Poll the held primitive, after the motion sequencer has run.
    pub fn tick_primitive(&mut self, ctx: &mut PrimitiveCtx) {
        if let Some(mut held) = self.held.take() {
            held.primitive.tick(ctx);
            if held.primitive.is_running() {
                self.held = Some(held);
            }
        }
    }

    /// Stop any primitive run by a held button.
    pub fn cancel(&mut self, ctx: &mut PrimitiveCtx) {
        if let Some(mut held) = self.held.take() {
            held.primitive.cancel(ctx);
        }
    }

    fn fire(
        &mut self,
        binding: &Binding,
        ctx: &mut PrimitiveCtx,
        catalog: &Catalog,
        trajectories: &dyn TrajectorySource,
    ) {
        match binding.action {
            TeleopAction::Calibrate => {
                self.cancel(ctx);
                ctx.arm.request_calibration(&JointId::ALL, ctx.now_s);
            }
            TeleopAction::EmergencyStop => {
                self.cancel(ctx);
                ctx.arm.emergency_stop();
            }
            TeleopAction::ClearEmergencyStop => ctx.arm.clear_emergency_stop(),
            TeleopAction::ToggleGripper => {
                if !ctx.arm.is_emergency_stopped() {
                    ctx.arm.gripper.toggle(ctx.now_s);
                }
            }
            TeleopAction::Run(ref def) => {
                let mut primitive = match catalog.build(def, trajectories) {
                    Ok(p) => p.into_teleop(),
                    Err(e) => {
                        warn!("Cannot run {:?}: {}", def, e);
                        return;
                    }
                };

                self.cancel(ctx);
                primitive.start(ctx);
                if primitive.is_running() {
                    self.held = Some(Held {
                        button: binding.button,
                        primitive,
                    });
                }
            }
        }
    }
}
