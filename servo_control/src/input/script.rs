//! Scripted input replay.
//!
//! # TOML Example
//!
//! ```toml
//! # hold the stick half right for 20 ticks, then step the stepped actuator up
//! [[steps]]
//! ticks = 20
//! axes = [-0.5]
//!
//! [[steps]]
//! ticks = 5
//! buttons = [5]
//! ```

use serde::{Deserialize, Serialize};
use servo_common::config::{ConfigError, ConfigLoader};
use servo_common::consts::{MAX_INPUT_AXES, MAX_INPUT_BUTTONS};
use servo_common::input::{InputError, InputSnapshot, InputSource};
use std::path::Path;
use tracing::debug;

fn default_ticks() -> u32 {
    1
}

/// One held input state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScriptStep {
    /// Number of polls this state is reported for.
    #[serde(default = "default_ticks")]
    pub ticks: u32,

    /// Raw axis values by index; missing axes are centered.
    #[serde(default)]
    pub axes: Vec<f64>,

    /// Indices of pressed buttons.
    #[serde(default)]
    pub buttons: Vec<usize>,
}

impl ScriptStep {
    /// Snapshot reported while this step is active.
    pub fn snapshot(&self) -> InputSnapshot {
        let mut snapshot = InputSnapshot::neutral();
        for (index, value) in self.axes.iter().enumerate() {
            snapshot.set_axis(index, *value);
        }
        for &index in &self.buttons {
            snapshot.set_button(index, true);
        }
        snapshot
    }
}

/// A complete input script.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InputScript {
    /// Start over after the last step instead of ending.
    #[serde(default)]
    pub repeat: bool,

    /// Steps in playback order.
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
}

impl InputScript {
    /// Load and validate a script file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let script = Self::load(path)?;
        script.validate()?;
        Ok(script)
    }

    /// Validate indices against the snapshot size.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (n, step) in self.steps.iter().enumerate() {
            if step.axes.len() > MAX_INPUT_AXES {
                return Err(ConfigError::ValidationError(format!(
                    "script step {n}: {} axes exceed {}",
                    step.axes.len(),
                    MAX_INPUT_AXES
                )));
            }
            if let Some(b) = step.buttons.iter().find(|&&b| b >= MAX_INPUT_BUTTONS) {
                return Err(ConfigError::ValidationError(format!(
                    "script step {n}: button {b} out of range (max {})",
                    MAX_INPUT_BUTTONS - 1
                )));
            }
        }
        if self.repeat && self.total_ticks() == 0 {
            return Err(ConfigError::ValidationError(
                "repeating script must contain at least one tick".to_string(),
            ));
        }
        Ok(())
    }

    /// Sum of all step durations.
    pub fn total_ticks(&self) -> u64 {
        self.steps.iter().map(|s| s.ticks as u64).sum()
    }
}

/// Replays an [`InputScript`], one poll per tick.
///
/// Reports [`InputError::Exhausted`] once a non-repeating script ends.
#[derive(Debug, Clone)]
pub struct ScriptedInput {
    script: InputScript,
    step: usize,
    remaining: u32,
}

impl ScriptedInput {
    /// Start playback at the first step.
    pub fn new(script: InputScript) -> Self {
        let remaining = script.steps.first().map_or(0, |s| s.ticks);
        Self {
            script,
            step: 0,
            remaining,
        }
    }

    /// Load a script file and start playback.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        InputScript::from_file(path).map(Self::new)
    }

    /// Build from a list of steps, played once.
    pub fn from_steps(steps: Vec<ScriptStep>) -> Self {
        Self::new(InputScript {
            repeat: false,
            steps,
        })
    }

    fn advance(&mut self) -> bool {
        while self.remaining == 0 {
            self.step += 1;
            if self.step >= self.script.steps.len() {
                if !self.script.repeat || self.script.total_ticks() == 0 {
                    return false;
                }
                debug!("Input script restarting");
                self.step = 0;
            }
            self.remaining = self.script.steps[self.step].ticks;
        }
        true
    }
}

impl InputSource for ScriptedInput {
    fn name(&self) -> &'static str {
        "script"
    }

    fn poll(&mut self) -> Result<InputSnapshot, InputError> {
        if self.step >= self.script.steps.len() || !self.advance() {
            return Err(InputError::Exhausted);
        }
        self.remaining -= 1;
        Ok(self.script.steps[self.step].snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn step(ticks: u32, axes: Vec<f64>, buttons: Vec<usize>) -> ScriptStep {
        ScriptStep {
            ticks,
            axes,
            buttons,
        }
    }

    #[test]
    fn plays_steps_in_order_then_ends() {
        let mut input = ScriptedInput::from_steps(vec![
            step(2, vec![0.5], vec![]),
            step(1, vec![], vec![4]),
        ]);
        assert_eq!(input.poll().unwrap().axis(0), 0.5);
        assert_eq!(input.poll().unwrap().axis(0), 0.5);
        let third = input.poll().unwrap();
        assert!(third.button(4));
        assert_eq!(third.axis(0), 0.0);
        assert_eq!(input.poll(), Err(InputError::Exhausted));
        assert_eq!(input.poll(), Err(InputError::Exhausted));
    }

    #[test]
    fn zero_tick_steps_are_skipped() {
        let mut input = ScriptedInput::from_steps(vec![
            step(0, vec![0.9], vec![]),
            step(1, vec![], vec![5]),
        ]);
        assert!(input.poll().unwrap().button(5));
        assert_eq!(input.poll(), Err(InputError::Exhausted));
    }

    #[test]
    fn empty_script_is_exhausted() {
        let mut input = ScriptedInput::new(InputScript::default());
        assert_eq!(input.poll(), Err(InputError::Exhausted));
    }

    #[test]
    fn repeating_script_wraps() {
        let mut input = ScriptedInput::new(InputScript {
            repeat: true,
            steps: vec![step(1, vec![], vec![4]), step(1, vec![], vec![5])],
        });
        let pressed: Vec<bool> = (0..4).map(|_| input.poll().unwrap().button(4)).collect();
        assert_eq!(pressed, vec![true, false, true, false]);
    }

    #[test]
    fn loads_from_toml_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[[steps]]
ticks = 3
axes = [-0.5, 0.0]

[[steps]]
buttons = [4, 5]
"#
        )
        .unwrap();

        let script = InputScript::from_file(file.path()).unwrap();
        assert_eq!(script.total_ticks(), 4);
        assert_eq!(script.steps[1].ticks, 1);
        assert!(!script.repeat);
    }

    #[test]
    fn out_of_range_button_rejected() {
        let script = InputScript {
            repeat: false,
            steps: vec![step(1, vec![], vec![MAX_INPUT_BUTTONS])],
        };
        assert!(matches!(
            script.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            ScriptedInput::from_file(Path::new("/nonexistent/script.toml")),
            Err(ConfigError::FileNotFound)
        ));
    }
}
