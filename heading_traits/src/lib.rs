pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// Error type carried across collaborator boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Transport that delivers one motor command to the robot and returns its
/// textual acknowledgement.
///
/// `command` is the wire name (`FORWARD`, `STOP`, ...); speeds are already
/// clamped to 0..=100 by the caller.
pub trait RobotLink {
    fn send(&mut self, command: &str, left_speed: u8, right_speed: u8) -> Result<String, BoxError>;
}

/// Key-value source of tunable drive parameters.
///
/// Implementations use interior mutability so a single provider can be shared
/// between the operator surface and the navigation loop.
pub trait ConfigProvider {
    fn get(&self, key: &str) -> Option<f64>;
    fn set(&self, key: &str, value: f64) -> Result<(), BoxError>;
}

/// One marker as reported by the vision engine.
///
/// `pose` is a column-major 4x4 transform (`pose[column][row]`); the
/// translation lives in column 3. Either field may be missing when the engine
/// hands back a partially decoded candidate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawMarker {
    pub id: Option<i64>,
    pub pose: Option<[[f64; 4]; 4]>,
}

/// Producer of per-frame marker detections.
pub trait MarkerSource {
    /// Decode the next frame.
    ///
    /// `Ok(None)` means the source is exhausted; `Err` is a per-frame decode
    /// failure and the caller skips that frame.
    fn detect(&mut self) -> Result<Option<Vec<RawMarker>>, BoxError>;
}
