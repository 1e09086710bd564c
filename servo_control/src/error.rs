//! Binary-level error aggregation.

use servo_common::config::ConfigError;
use servo_common::hal::transport::HalError;
use servo_common::input::InputError;
use thiserror::Error;

/// Anything that can stop the control binary before or around the loop.
#[derive(Debug, Error)]
pub enum ControlError {
    /// Configuration or input script could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Transport or actuator setup failed.
    #[error(transparent)]
    Hal(#[from] HalError),

    /// Input source could not be opened.
    #[error(transparent)]
    Input(#[from] InputError),

    /// Requested input backend is not available in this build.
    #[error("input backend '{0}' not available (rebuild with the matching feature)")]
    Unsupported(&'static str),

    /// Signal handler installation failed.
    #[error("failed to install signal handler: {0}")]
    Signal(String),
}
