//! Input to motion mapping.
//!
//! Pure functions from one [`InputSnapshot`] to the relative moves of one
//! tick. No bus access happens here.

use servo_common::control::ControlConfig;
use servo_common::input::InputSnapshot;

/// Relative moves decided for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickPlan {
    /// Delta applied to every coupled actuator.
    pub coupled: Option<i64>,
    /// Delta applied to the stepped actuator.
    pub stepped: Option<i64>,
}

impl TickPlan {
    /// True if nothing moves this tick.
    pub fn is_idle(&self) -> bool {
        self.coupled.is_none() && self.stepped.is_none()
    }
}

/// Coupled-axis value after inversion, clamped into `[-1, 1]`.
#[inline]
pub fn axis_value(snapshot: &InputSnapshot, config: &ControlConfig) -> f64 {
    let raw = snapshot.axis(config.axis);
    if config.invert_axis { -raw } else { raw }
}

/// Delta for the coupled actuators, or `None` inside the dead zone.
///
/// `|a| <= dead_zone` is dead; otherwise `round(a * increment)`, rounding
/// half away from zero.
#[inline]
pub fn coupled_delta(snapshot: &InputSnapshot, config: &ControlConfig) -> Option<i64> {
    let a = axis_value(snapshot, config);
    if a.abs() <= config.dead_zone {
        return None;
    }
    let delta = (a * config.position_increment as f64).round() as i64;
    // a tiny deflection can still round to nothing
    (delta != 0).then_some(delta)
}

/// Delta for the stepped actuator. Decrement wins when both are pressed.
#[inline]
pub fn stepped_delta(snapshot: &InputSnapshot, config: &ControlConfig) -> Option<i64> {
    let step = config.position_increment as i64;
    if snapshot.button(config.decrement_button) {
        Some(-step)
    } else if snapshot.button(config.increment_button) {
        Some(step)
    } else {
        None
    }
}

/// Full plan for one tick.
pub fn plan(snapshot: &InputSnapshot, config: &ControlConfig) -> TickPlan {
    TickPlan {
        coupled: coupled_delta(snapshot, config),
        stepped: stepped_delta(snapshot, config),
    }
}
