//! Per-actuator register protocol client.
//!
//! An [`ActuatorController`] owns the id of one device on the bus, a shared
//! handle to the bus transport and a mutex that serializes every register
//! transaction issued for that device. Controllers on the same bus do not
//! share a lock; the transport serializes access to the medium itself.

use parking_lot::Mutex;
use servo_common::hal::consts::{TORQUE_DISABLE, TORQUE_ENABLE};
use servo_common::prelude::*;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Last known present position of an actuator.
///
/// "Never read" and "last read failed" are distinct states; neither carries
/// a number that could be mistaken for a real position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresentPosition {
    /// No read has happened yet.
    #[default]
    NotRead,
    /// The most recent read failed.
    Unavailable,
    /// Value of the most recent successful read.
    Known(i32),
}

impl PresentPosition {
    /// The position if the last read succeeded.
    pub fn known(self) -> Option<i32> {
        match self {
            PresentPosition::Known(pos) => Some(pos),
            _ => None,
        }
    }
}

/// Host-side view of one actuator, updated after every transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActuatorState {
    /// Bus attachment held.
    pub attached: bool,
    /// Torque enable as last written successfully.
    pub torque_enabled: bool,
    /// Operating mode as last written successfully.
    pub operating_mode: Option<OperatingMode>,
    /// Profile velocity as last written successfully.
    pub profile_velocity: Option<u32>,
    /// Profile acceleration as last written successfully.
    pub profile_acceleration: Option<u32>,
    /// Last goal position written (always within bounds).
    pub goal_position: Option<i32>,
    /// Most recent present position read.
    pub present_position: PresentPosition,
    /// Register transactions issued.
    pub transactions: u64,
    /// Register transactions that failed.
    pub failures: u64,
}

/// One step of the fixed startup sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupStep {
    /// Torque off so the operating mode can be written.
    DisableTorque,
    /// Operating mode register.
    OperatingMode,
    /// Profile velocity register.
    ProfileVelocity,
    /// Profile acceleration register.
    ProfileAcceleration,
    /// Torque on.
    EnableTorque,
}

impl fmt::Display for StartupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StartupStep::DisableTorque => "disable torque",
            StartupStep::OperatingMode => "set operating mode",
            StartupStep::ProfileVelocity => "set profile velocity",
            StartupStep::ProfileAcceleration => "set profile acceleration",
            StartupStep::EnableTorque => "enable torque",
        };
        f.write_str(text)
    }
}

/// Failure of a relative move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    /// Present position could not be read; nothing was written.
    #[error("present position unavailable: {0}")]
    PresentUnavailable(CommError),

    /// Present position read, but the goal write failed.
    #[error("goal position {goal} not written: {source}")]
    WriteFailed {
        /// Clamped goal that was attempted.
        goal: i32,
        /// Transaction failure.
        source: CommError,
    },
}

/// A relative move that reached the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    /// Present position the move was based on.
    pub from: i32,
    /// Unclamped target (`from + delta`).
    pub requested: i64,
    /// Goal actually written.
    pub goal: i32,
}

/// Serialized register access for one actuator.
pub struct ActuatorController {
    id: u8,
    name: String,
    transport: Arc<dyn RegisterTransport>,
    state: Mutex<ActuatorState>,
}

impl fmt::Debug for ActuatorController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActuatorController")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("transport", &self.transport.name())
            .finish()
    }
}

impl ActuatorController {
    /// Attach to the bus for `config.id`.
    ///
    /// No register is touched; see [`ActuatorController::configure`].
    ///
    /// # Errors
    /// Returns `HalError::SetupFailed` if the transport cannot attach.
    pub fn attach(
        config: &ActuatorConfig,
        transport: Arc<dyn RegisterTransport>,
    ) -> Result<Self, HalError> {
        transport.attach(config.id)?;
        info!(
            "Actuator {} (id {}) attached via {}",
            config.name,
            config.id,
            transport.name()
        );
        Ok(Self {
            id: config.id,
            name: config.name.clone(),
            transport,
            state: Mutex::new(ActuatorState {
                attached: true,
                ..ActuatorState::default()
            }),
        })
    }

    /// Bus id.
    pub fn id(&self) -> u8 {
        self.id
    }

    /// Configured name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Snapshot of the host-side state.
    pub fn state(&self) -> ActuatorState {
        self.state.lock().clone()
    }

    /// Run the fixed startup sequence: disable torque, set operating mode,
    /// set profile velocity, set profile acceleration, enable torque.
    ///
    /// Every step is attempted; failures are logged and returned.
    pub fn configure(&self, startup: &StartupConfig) -> Vec<(StartupStep, CommError)> {
        let steps = [
            (StartupStep::DisableTorque, self.disable_torque()),
            (
                StartupStep::OperatingMode,
                self.set_operating_mode(startup.operating_mode),
            ),
            (
                StartupStep::ProfileVelocity,
                self.set_profile_velocity(startup.profile_velocity),
            ),
            (
                StartupStep::ProfileAcceleration,
                self.set_profile_acceleration(startup.profile_acceleration),
            ),
            (StartupStep::EnableTorque, self.enable_torque()),
        ];

        let failures: Vec<(StartupStep, CommError)> = steps
            .into_iter()
            .filter_map(|(step, result)| result.err().map(|e| (step, e)))
            .collect();

        for (step, err) in &failures {
            warn!("Actuator {} (id {}): {} failed: {}", self.name, self.id, step, err);
        }
        if failures.is_empty() {
            info!(
                "Actuator {} configured: mode={:?}, velocity={}, acceleration={}",
                self.name, startup.operating_mode, startup.profile_velocity, startup.profile_acceleration
            );
        }
        failures
    }

    /// Turn torque on.
    pub fn enable_torque(&self) -> Result<(), CommError> {
        self.write_torque(true)
    }

    /// Turn torque off.
    pub fn disable_torque(&self) -> Result<(), CommError> {
        self.write_torque(false)
    }

    fn write_torque(&self, enabled: bool) -> Result<(), CommError> {
        let mut state = self.state.lock();
        let value = if enabled { TORQUE_ENABLE } else { TORQUE_DISABLE };
        let result = self
            .transport
            .write_u8(self.id, Register::TorqueEnable.address(), value)
            .into_result();
        record(&mut state, &result);
        if result.is_ok() {
            state.torque_enabled = enabled;
        }
        result
    }

    /// Write the operating mode. The device only accepts it with torque off.
    pub fn set_operating_mode(&self, mode: OperatingMode) -> Result<(), CommError> {
        let mut state = self.state.lock();
        let result = self
            .transport
            .write_u8(self.id, Register::OperatingMode.address(), mode.code())
            .into_result();
        record(&mut state, &result);
        if result.is_ok() {
            state.operating_mode = Some(mode);
        }
        result
    }

    /// Write the profile velocity register. No clamping.
    pub fn set_profile_velocity(&self, velocity: u32) -> Result<(), CommError> {
        let mut state = self.state.lock();
        let result = self
            .transport
            .write_u32(self.id, Register::ProfileVelocity.address(), velocity)
            .into_result();
        record(&mut state, &result);
        if result.is_ok() {
            state.profile_velocity = Some(velocity);
        }
        result
    }

    /// Write the profile acceleration register. No clamping.
    pub fn set_profile_acceleration(&self, acceleration: u32) -> Result<(), CommError> {
        let mut state = self.state.lock();
        let result = self
            .transport
            .write_u32(self.id, Register::ProfileAcceleration.address(), acceleration)
            .into_result();
        record(&mut state, &result);
        if result.is_ok() {
            state.profile_acceleration = Some(acceleration);
        }
        result
    }

    /// Clamp `requested` into the position bounds and write it as the goal.
    ///
    /// Returns the value written. Does not wait for motion.
    pub fn set_goal_position(&self, requested: i64) -> Result<i32, CommError> {
        let mut state = self.state.lock();
        self.write_goal(&mut state, requested)
    }

    /// Read the present position, sign-extended from the raw register.
    ///
    /// A failed transaction yields `Err` and marks the position
    /// [`PresentPosition::Unavailable`]; no placeholder value is produced.
    pub fn get_present_position(&self) -> Result<i32, CommError> {
        let mut state = self.state.lock();
        self.read_present(&mut state)
    }

    /// Read the present position, add `delta` and write the clamped sum as
    /// the goal, all under one lock acquisition.
    ///
    /// Nothing is written when the read fails.
    pub fn move_by(&self, delta: i64) -> Result<Move, MoveError> {
        let mut state = self.state.lock();
        let from = self
            .read_present(&mut state)
            .map_err(MoveError::PresentUnavailable)?;
        let requested = from as i64 + delta;
        let goal = self
            .write_goal(&mut state, requested)
            .map_err(|source| MoveError::WriteFailed {
                goal: clamp_goal_position(requested),
                source,
            })?;
        debug!(
            "Actuator {}: {} {:+} -> goal {}",
            self.name, from, delta, goal
        );
        Ok(Move {
            from,
            requested,
            goal,
        })
    }

    /// Disable torque and release the bus attachment.
    ///
    /// Idempotent: a released controller returns `Ok(())` without touching
    /// the bus. The attachment is released even if the torque write fails.
    ///
    /// # Errors
    /// Returns `HalError::ShutdownFailed` if torque could not be disabled or
    /// the transport refused to detach.
    pub fn release(&self) -> Result<(), HalError> {
        let mut state = self.state.lock();
        if !state.attached {
            debug!("Actuator {} already released", self.name);
            return Ok(());
        }

        let torque = self
            .transport
            .write_u8(self.id, Register::TorqueEnable.address(), TORQUE_DISABLE)
            .into_result();
        record(&mut state, &torque);
        if torque.is_ok() {
            state.torque_enabled = false;
        }

        state.attached = false;
        let detach = self.transport.detach(self.id);

        match (torque, detach) {
            (Ok(()), Ok(())) => {}
            (Err(e), Ok(())) => {
                return Err(HalError::ShutdownFailed(format!(
                    "actuator {} (id {}): torque disable failed: {}",
                    self.name, self.id, e
                )));
            }
            (Ok(()), Err(e)) => return Err(e),
            (Err(torque_err), Err(detach_err)) => {
                return Err(HalError::ShutdownFailed(format!(
                    "actuator {} (id {}): torque disable failed: {}; detach failed: {}",
                    self.name, self.id, torque_err, detach_err
                )));
            }
        }
        info!("Actuator {} (id {}) released", self.name, self.id);
        Ok(())
    }

    fn write_goal(&self, state: &mut ActuatorState, requested: i64) -> Result<i32, CommError> {
        let goal = clamp_goal_position(requested);
        let result = self
            .transport
            .write_u32(self.id, Register::GoalPosition.address(), encode_position(goal))
            .into_result();
        record(state, &result);
        result?;
        state.goal_position = Some(goal);
        Ok(goal)
    }

    fn read_present(&self, state: &mut ActuatorState) -> Result<i32, CommError> {
        let result = self
            .transport
            .read_u32(self.id, Register::PresentPosition.address())
            .into_result()
            .map(decode_position);
        record(state, &result);
        state.present_position = match result {
            Ok(pos) => PresentPosition::Known(pos),
            Err(_) => PresentPosition::Unavailable,
        };
        result
    }
}

fn record<T>(state: &mut ActuatorState, result: &Result<T, CommError>) {
    state.transactions += 1;
    if result.is_err() {
        state.failures += 1;
    }
}
