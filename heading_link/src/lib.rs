//! Robot transports implementing [`heading_traits::RobotLink`].
//!
//! - [`SimulatedLink`] logs commands and answers like the firmware does.
//! - [`HttpLink`] (feature `http`) issues `GET {base}/{COMMAND}?leftSpeed=..&rightSpeed=..`.
pub mod error;
#[cfg(feature = "http")]
pub mod http;

pub use error::LinkError;
#[cfg(feature = "http")]
pub use http::HttpLink;

use heading_traits::{BoxError, RobotLink};

/// Env var naming a command the simulated robot should fail on (e.g. `FORWARD`).
pub const SIM_FAIL_ENV: &str = "HEADING_SIM_FAIL";

/// One command as seen by the simulated robot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentCommand {
    pub command: String,
    pub left: u8,
    pub right: u8,
}

/// Simulated robot link
#[derive(Debug, Default)]
pub struct SimulatedLink {
    fail_on: Option<String>,
    history: Vec<SentCommand>,
}

impl SimulatedLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every send of `command` with a transport error.
    pub fn failing_on(command: impl Into<String>) -> Self {
        Self {
            fail_on: Some(command.into().to_ascii_uppercase()),
            history: Vec::new(),
        }
    }

    /// Build from the environment, honouring [`SIM_FAIL_ENV`].
    pub fn from_env() -> Self {
        match std::env::var(SIM_FAIL_ENV) {
            Ok(cmd) if !cmd.trim().is_empty() => Self::failing_on(cmd.trim()),
            _ => Self::new(),
        }
    }

    pub fn history(&self) -> &[SentCommand] {
        &self.history
    }
}

impl RobotLink for SimulatedLink {
    fn send(&mut self, command: &str, left_speed: u8, right_speed: u8) -> Result<String, BoxError> {
        self.history.push(SentCommand {
            command: command.to_string(),
            left: left_speed,
            right: right_speed,
        });
        if self.fail_on.as_deref() == Some(command) {
            tracing::warn!(command, "simulated transport failure");
            return Err(Box::new(LinkError::Transport(format!(
                "simulated failure for {command}"
            ))));
        }
        tracing::info!(command, left_speed, right_speed, "robot command (simulated)");
        Ok(format!("OK {command}"))
    }
}
