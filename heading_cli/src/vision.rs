//! JSON-lines replay of recorded marker detections.
//!
//! One frame per line:
//!
//! ```text
//! {"markers":[{"id":7,"pose":[[1,0,0,0],[0,1,0,0],[0,0,1,0],[0.1,0,0.45,1]]}]}
//! {"markers":[{"id":3,"distance_m":0.4}]}
//! {"markers":[]}
//! {"error":"decode failed"}
//! ```
//!
//! `pose` is column-major with the translation in the last column.
//! `distance_m` is shorthand for a marker straight ahead. Blank lines and
//! lines starting with `#` are ignored. An `error` line or a line that does
//! not parse is a per-frame vision error.

use std::path::Path;

use eyre::WrapErr;
use heading_traits::{BoxError, MarkerSource, RawMarker};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct FrameLine {
    #[serde(default)]
    markers: Vec<MarkerLine>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MarkerLine {
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    pose: Option<[[f64; 4]; 4]>,
    #[serde(default)]
    distance_m: Option<f64>,
}

impl MarkerLine {
    fn into_raw(self) -> RawMarker {
        let pose = self.pose.or_else(|| {
            self.distance_m.map(|d| {
                [
                    [1.0, 0.0, 0.0, 0.0],
                    [0.0, 1.0, 0.0, 0.0],
                    [0.0, 0.0, 1.0, 0.0],
                    [0.0, 0.0, d, 1.0],
                ]
            })
        });
        RawMarker { id: self.id, pose }
    }
}

#[derive(Debug)]
pub struct ReplaySource {
    lines: Vec<(usize, String)>,
    pos: usize,
    looping: bool,
}

impl ReplaySource {
    pub fn open(path: &Path, looping: bool) -> eyre::Result<Self> {
        let text = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("reading replay file {}", path.display()))?;
        Ok(Self::from_text(&text, looping))
    }

    pub fn from_text(text: &str, looping: bool) -> Self {
        let lines = text
            .lines()
            .enumerate()
            .filter(|(_, l)| {
                let t = l.trim();
                !t.is_empty() && !t.starts_with('#')
            })
            .map(|(i, l)| (i + 1, l.to_string()))
            .collect();
        Self {
            lines,
            pos: 0,
            looping,
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl MarkerSource for ReplaySource {
    fn detect(&mut self) -> Result<Option<Vec<RawMarker>>, BoxError> {
        if self.pos >= self.lines.len() {
            if self.looping && !self.lines.is_empty() {
                self.pos = 0;
            } else {
                return Ok(None);
            }
        }
        let (line_no, line) = &self.lines[self.pos];
        self.pos += 1;

        let frame: FrameLine = serde_json::from_str(line)
            .map_err(|e| format!("replay line {line_no}: {e}"))?;
        if let Some(err) = frame.error {
            return Err(format!("replay line {line_no}: {err}").into());
        }
        Ok(Some(frame.markers.into_iter().map(MarkerLine::into_raw).collect()))
    }
}
