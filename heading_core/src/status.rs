//! Navigation state, per-call status, and run telemetry.

use std::fmt;

use crate::error::NavError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavState {
    Idle,
    Detecting,
    Approaching,
    Aligning,
    Fault,
}

impl NavState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Detecting => "detecting",
            Self::Approaching => "approaching",
            Self::Aligning => "aligning",
            Self::Fault => "fault",
        }
    }

    /// States in which a motion command may still be running on the robot.
    pub const fn in_motion(self) -> bool {
        matches!(self, Self::Approaching | Self::Aligning)
    }
}

impl fmt::Display for NavState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a single navigator call did.
#[derive(Debug, Clone, PartialEq)]
pub enum NavStatus {
    Unchanged,
    Entered(NavState),
    /// Entered `Fault`; the navigator stays there until `start()` or `reset()`.
    Faulted(NavError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavStats {
    pub cycles_completed: u64,
    pub commands_issued: u64,
    pub dispatch_ok: u64,
    pub dispatch_failures: u64,
    pub last_reply: Option<String>,
    pub frames_dropped: u64,
}
