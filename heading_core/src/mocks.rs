//! Test and helper doubles for heading_core

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, RwLock};

use heading_traits::{BoxError, ConfigProvider, MarkerSource, RawMarker, RobotLink};

use crate::command::{CommandKind, RobotCommand};
use crate::dispatcher::Dispatch;

/// Plain in-memory provider; unset keys read as absent.
#[derive(Debug, Default)]
pub struct FixedProvider {
    values: RwLock<HashMap<String, f64>>,
}

impl FixedProvider {
    pub fn new(pairs: &[(&str, f64)]) -> Self {
        Self {
            values: RwLock::new(pairs.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()),
        }
    }
}

impl ConfigProvider for FixedProvider {
    fn get(&self, key: &str) -> Option<f64> {
        self.values.read().ok().and_then(|m| m.get(key).copied())
    }

    fn set(&self, key: &str, value: f64) -> Result<(), BoxError> {
        self.values
            .write()
            .map_err(|_| "provider lock poisoned")?
            .insert(key.to_string(), value);
        Ok(())
    }
}

/// Dispatch that only records what it was asked to send.
#[derive(Debug, Default)]
pub struct RecordingDispatch {
    pub sent: Vec<RobotCommand>,
}

impl RecordingDispatch {
    pub fn kinds(&self) -> Vec<CommandKind> {
        self.sent.iter().map(RobotCommand::kind).collect()
    }
}

impl Dispatch for RecordingDispatch {
    fn dispatch(&mut self, cmd: RobotCommand) -> u64 {
        self.sent.push(cmd);
        (self.sent.len() - 1) as u64
    }
}

/// Link that logs every wire command into a shared vector and fails on
/// selected command names.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLink {
    pub log: Arc<Mutex<Vec<(String, u8, u8)>>>,
    fail_on: Vec<String>,
}

impl ScriptedLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(commands: &[&str]) -> Self {
        Self {
            log: Arc::default(),
            fail_on: commands.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Wire names sent so far.
    pub fn commands(&self) -> Vec<String> {
        self.log
            .lock()
            .map(|l| l.iter().map(|(c, _, _)| c.clone()).collect())
            .unwrap_or_default()
    }
}

impl RobotLink for ScriptedLink {
    fn send(&mut self, command: &str, left_speed: u8, right_speed: u8) -> Result<String, BoxError> {
        if let Ok(mut l) = self.log.lock() {
            l.push((command.to_string(), left_speed, right_speed));
        }
        if self.fail_on.iter().any(|c| c == command) {
            return Err(Box::new(std::io::Error::other(format!(
                "connection refused sending {command}"
            ))));
        }
        Ok(format!("ack {command}"))
    }
}

/// Marker source that replays a fixed list of frames, then ends.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    frames: VecDeque<Result<Vec<RawMarker>, String>>,
}

impl ScriptedSource {
    pub fn new(frames: impl IntoIterator<Item = Result<Vec<RawMarker>, String>>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// A marker `distance_m` straight ahead of the camera.
    pub fn marker_at(id: i64, distance_m: f64) -> RawMarker {
        RawMarker {
            id: Some(id),
            pose: Some([
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, distance_m, 1.0],
            ]),
        }
    }
}

impl MarkerSource for ScriptedSource {
    fn detect(&mut self) -> Result<Option<Vec<RawMarker>>, BoxError> {
        match self.frames.pop_front() {
            None => Ok(None),
            Some(Ok(frame)) => Ok(Some(frame)),
            Some(Err(msg)) => Err(msg.into()),
        }
    }
}
