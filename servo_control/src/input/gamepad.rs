//! Physical gamepad input via `gilrs`.
//!
//! Axis and button indices follow the common Xbox-style layout:
//! axes 0/1 left stick, 2 left trigger, 3/4 right stick, 5 right trigger,
//! 6/7 d-pad; buttons 0..=3 face buttons, 4/5 bumpers, 6/7 select/start.

use gilrs::{Axis, Button, EventType, GamepadId, Gilrs};
use servo_common::input::{InputError, InputSnapshot, InputSource};
use tracing::{info, warn};

const AXES: [Axis; 8] = [
    Axis::LeftStickX,
    Axis::LeftStickY,
    Axis::LeftZ,
    Axis::RightStickX,
    Axis::RightStickY,
    Axis::RightZ,
    Axis::DPadX,
    Axis::DPadY,
];

const BUTTONS: [Button; 17] = [
    Button::South,
    Button::East,
    Button::West,
    Button::North,
    Button::LeftTrigger,
    Button::RightTrigger,
    Button::Select,
    Button::Start,
    Button::Mode,
    Button::LeftThumb,
    Button::RightThumb,
    Button::LeftTrigger2,
    Button::RightTrigger2,
    Button::DPadUp,
    Button::DPadDown,
    Button::DPadLeft,
    Button::DPadRight,
];

/// First connected gamepad.
///
/// Losing the gamepad ends the loop.
pub struct GamepadInput {
    gilrs: Gilrs,
    id: GamepadId,
}

impl GamepadInput {
    /// Open the gamepad subsystem and bind to the first connected pad.
    ///
    /// # Errors
    /// `Backend` if gilrs cannot start, `Disconnected` if no pad is present.
    pub fn open() -> Result<Self, InputError> {
        let gilrs = Gilrs::new().map_err(|e| InputError::Backend(e.to_string()))?;
        let (id, pad) = gilrs
            .gamepads()
            .next()
            .ok_or_else(|| InputError::Disconnected("no gamepad connected".to_string()))?;
        info!("Using gamepad '{}' ({:?})", pad.name(), pad.power_info());
        Ok(Self { gilrs, id })
    }
}

impl InputSource for GamepadInput {
    fn name(&self) -> &'static str {
        "gamepad"
    }

    fn poll(&mut self) -> Result<InputSnapshot, InputError> {
        while let Some(event) = self.gilrs.next_event() {
            if event.id == self.id && event.event == EventType::Disconnected {
                warn!("Gamepad disconnected");
                return Err(InputError::Disconnected("gamepad".to_string()));
            }
        }

        let pad = self
            .gilrs
            .connected_gamepad(self.id)
            .ok_or_else(|| InputError::Disconnected("gamepad".to_string()))?;

        let mut snapshot = InputSnapshot::neutral();
        for (index, axis) in AXES.iter().enumerate() {
            snapshot.set_axis(index, pad.value(*axis) as f64);
        }
        for (index, button) in BUTTONS.iter().enumerate() {
            snapshot.set_button(index, pad.is_pressed(*button));
        }
        Ok(snapshot)
    }
}
