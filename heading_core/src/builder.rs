//! Builder for `Navigator`.

use std::sync::Arc;

use heading_traits::ConfigProvider;

use crate::dispatcher::Dispatch;
use crate::error::BuildError;
use crate::gate::DetectionGate;
use crate::navigator::{NavTiming, Navigator};
use crate::status::{NavState, NavStats};

impl<D: Dispatch> Navigator<D> {
    /// Start building a Navigator.
    pub fn builder() -> NavigatorBuilder<D> {
        NavigatorBuilder::default()
    }
}

/// Dispatcher and config provider are required; the gate defaults to a fresh
/// one and timing to 100 ms ticks with a 1000 ms align.
pub struct NavigatorBuilder<D: Dispatch> {
    gate: Option<Arc<DetectionGate>>,
    dispatch: Option<D>,
    config: Option<Arc<dyn ConfigProvider + Send + Sync>>,
    timing: NavTiming,
}

impl<D: Dispatch> Default for NavigatorBuilder<D> {
    fn default() -> Self {
        Self {
            gate: None,
            dispatch: None,
            config: None,
            timing: NavTiming::default(),
        }
    }
}

impl<D: Dispatch> NavigatorBuilder<D> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gate(mut self, gate: Arc<DetectionGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn with_dispatch(mut self, dispatch: D) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    pub fn with_config(mut self, config: Arc<dyn ConfigProvider + Send + Sync>) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_timing(mut self, timing: NavTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn try_build(self) -> Result<Navigator<D>, BuildError> {
        let dispatch = self.dispatch.ok_or(BuildError::MissingDispatch)?;
        let config = self.config.ok_or(BuildError::MissingConfig)?;
        if self.timing.tick_ms == 0 {
            return Err(BuildError::InvalidConfig("tick_ms must be >= 1"));
        }
        if self.timing.align_ms == 0 {
            return Err(BuildError::InvalidConfig("align_ms must be >= 1"));
        }
        Ok(Navigator {
            gate: self.gate.unwrap_or_default(),
            dispatch,
            config,
            timing: self.timing,
            state: NavState::Idle,
            remaining_ms: 0,
            fault: None,
            target: None,
            stats: NavStats::default(),
        })
    }
}
