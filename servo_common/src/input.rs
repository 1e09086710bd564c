//! Human-interface input snapshot and source trait.
//!
//! The control loop never talks to a device directly: it polls an
//! [`InputSource`] once per tick and receives a normalized [`InputSnapshot`].

use crate::consts::{MAX_INPUT_AXES, MAX_INPUT_BUTTONS};
use thiserror::Error;

/// Normalized input state sampled for one tick.
///
/// Fixed-size so sampling never allocates. Out-of-range indices read as
/// neutral (`0.0` / `false`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputSnapshot {
    axes: [f64; MAX_INPUT_AXES],
    buttons: [bool; MAX_INPUT_BUTTONS],
}

impl Default for InputSnapshot {
    fn default() -> Self {
        Self {
            axes: [0.0; MAX_INPUT_AXES],
            buttons: [false; MAX_INPUT_BUTTONS],
        }
    }
}

impl InputSnapshot {
    /// Neutral snapshot: all axes centered, no buttons pressed.
    pub fn neutral() -> Self {
        Self::default()
    }

    /// Builder: set axis `index` to `value`.
    pub fn with_axis(mut self, index: usize, value: f64) -> Self {
        self.set_axis(index, value);
        self
    }

    /// Builder: set button `index`.
    pub fn with_button(mut self, index: usize, pressed: bool) -> Self {
        self.set_button(index, pressed);
        self
    }

    /// Set axis `index`; ignored if out of range.
    pub fn set_axis(&mut self, index: usize, value: f64) {
        if let Some(slot) = self.axes.get_mut(index) {
            *slot = value;
        }
    }

    /// Set button `index`; ignored if out of range.
    pub fn set_button(&mut self, index: usize, pressed: bool) {
        if let Some(slot) = self.buttons.get_mut(index) {
            *slot = pressed;
        }
    }

    /// Axis value clamped into `[-1.0, 1.0]`. Non-finite values read as 0.
    pub fn axis(&self, index: usize) -> f64 {
        match self.axes.get(index) {
            Some(v) if v.is_finite() => v.clamp(-1.0, 1.0),
            _ => 0.0,
        }
    }

    /// Button state.
    pub fn button(&self, index: usize) -> bool {
        self.buttons.get(index).copied().unwrap_or(false)
    }

    /// True if every axis is centered and no button is pressed.
    pub fn is_neutral(&self) -> bool {
        (0..MAX_INPUT_AXES).all(|i| self.axis(i) == 0.0) && !self.buttons.iter().any(|b| *b)
    }
}

/// Input source failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InputError {
    /// The device went away; the loop stops.
    #[error("Input device disconnected: {0}")]
    Disconnected(String),

    /// A finite input source has no more snapshots; the loop stops.
    #[error("Input exhausted")]
    Exhausted,

    /// Transient backend failure; the tick is skipped.
    #[error("Input backend error: {0}")]
    Backend(String),
}

impl InputError {
    /// True if the loop should stop instead of skipping the tick.
    pub fn is_terminal(&self) -> bool {
        matches!(self, InputError::Disconnected(_) | InputError::Exhausted)
    }
}

/// Source of input snapshots, polled once per control tick.
///
/// Polled only from the control loop thread, so implementations need not
/// be `Send`.
pub trait InputSource {
    /// Returns the source's identifier (e.g., "gamepad", "script").
    fn name(&self) -> &'static str;

    /// Pump pending device events and return the current state.
    fn poll(&mut self) -> Result<InputSnapshot, InputError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_snapshot() {
        let snap = InputSnapshot::neutral();
        assert!(snap.is_neutral());
        assert_eq!(snap.axis(0), 0.0);
        assert!(!snap.button(4));
    }

    #[test]
    fn axis_is_clamped() {
        let snap = InputSnapshot::neutral().with_axis(0, 1.7).with_axis(1, -3.0);
        assert_eq!(snap.axis(0), 1.0);
        assert_eq!(snap.axis(1), -1.0);
    }

    #[test]
    fn non_finite_axis_reads_zero() {
        let snap = InputSnapshot::neutral()
            .with_axis(0, f64::NAN)
            .with_axis(1, f64::INFINITY);
        assert_eq!(snap.axis(0), 0.0);
        assert_eq!(snap.axis(1), 0.0);
    }

    #[test]
    fn out_of_range_indices_are_neutral() {
        let snap = InputSnapshot::neutral()
            .with_axis(MAX_INPUT_AXES, 0.9)
            .with_button(MAX_INPUT_BUTTONS, true);
        assert!(snap.is_neutral());
        assert_eq!(snap.axis(MAX_INPUT_AXES + 3), 0.0);
        assert!(!snap.button(MAX_INPUT_BUTTONS + 3));
    }

    #[test]
    fn buttons() {
        let snap = InputSnapshot::neutral().with_button(5, true);
        assert!(snap.button(5));
        assert!(!snap.button(4));
        assert!(!snap.is_neutral());
    }

    #[test]
    fn terminal_errors() {
        assert!(InputError::Exhausted.is_terminal());
        assert!(InputError::Disconnected("pad".into()).is_terminal());
        assert!(!InputError::Backend("busy".into()).is_terminal());
    }
}
