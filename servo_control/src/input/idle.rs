use servo_common::input::{InputError, InputSnapshot, InputSource};

/// Input source that never deflects anything.
///
/// Useful for bring-up: the actuators are configured and held, and the
/// loop runs until interrupted.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdleInput;

impl InputSource for IdleInput {
    fn name(&self) -> &'static str {
        "idle"
    }

    fn poll(&mut self) -> Result<InputSnapshot, InputError> {
        Ok(InputSnapshot::neutral())
    }
}
