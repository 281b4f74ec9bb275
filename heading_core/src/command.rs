//! Motor commands and their outcomes.

use std::fmt;
use std::str::FromStr;

use heading_traits::RobotLink;

use crate::drive::DriveConfig;
use crate::error::DispatchError;
use crate::link_error::map_link_error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Forward,
    Backward,
    Left,
    Right,
    Stop,
}

impl CommandKind {
    pub const ALL: [Self; 5] = [
        Self::Forward,
        Self::Backward,
        Self::Left,
        Self::Right,
        Self::Stop,
    ];

    /// Path segment understood by the robot firmware.
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Forward => "FORWARD",
            Self::Backward => "BACKWARD",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Stop => "STOP",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for CommandKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.wire_name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown command {s:?} (expected FORWARD|BACKWARD|LEFT|RIGHT|STOP)"))
    }
}

/// One motor command. Powers are always within 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobotCommand {
    kind: CommandKind,
    left: u8,
    right: u8,
}

impl RobotCommand {
    /// Powers above 100 are clamped.
    pub fn new(kind: CommandKind, left: u8, right: u8) -> Self {
        Self {
            kind,
            left: left.min(100),
            right: right.min(100),
        }
    }

    pub const fn stop() -> Self {
        Self {
            kind: CommandKind::Stop,
            left: 0,
            right: 0,
        }
    }

    pub fn forward(drive: &DriveConfig) -> Self {
        Self::new(CommandKind::Forward, drive.move_left, drive.move_right)
    }

    pub fn rotate_left(drive: &DriveConfig) -> Self {
        Self::new(CommandKind::Left, drive.rotate_left, drive.rotate_right)
    }

    /// Operator command with powers taken from settings.
    ///
    /// Right swaps the rotate powers so the same pair spins the other way.
    pub fn manual(kind: CommandKind, drive: &DriveConfig) -> Self {
        match kind {
            CommandKind::Forward | CommandKind::Backward => {
                Self::new(kind, drive.move_left, drive.move_right)
            }
            CommandKind::Left => Self::rotate_left(drive),
            CommandKind::Right => Self::new(kind, drive.rotate_right, drive.rotate_left),
            CommandKind::Stop => Self::stop(),
        }
    }

    pub const fn kind(&self) -> CommandKind {
        self.kind
    }
    pub const fn left(&self) -> u8 {
        self.left
    }
    pub const fn right(&self) -> u8 {
        self.right
    }
}

impl fmt::Display for RobotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}, {})", self.kind, self.left, self.right)
    }
}

/// Result of exactly one send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Ok { body: String },
    Failed(DispatchError),
}

impl CommandOutcome {
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }
}

/// Send `cmd` once over `link`. No retries.
pub fn send_once<L: RobotLink + ?Sized>(link: &mut L, cmd: &RobotCommand) -> CommandOutcome {
    match link.send(cmd.kind.wire_name(), cmd.left, cmd.right) {
        Ok(body) if body.is_empty() => {
            CommandOutcome::Failed(DispatchError::BadResponse("empty body".into()))
        }
        Ok(body) => CommandOutcome::Ok { body },
        Err(e) => CommandOutcome::Failed(map_link_error(&*e)),
    }
}
