#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Marker-approach navigation loop (transport- and camera-agnostic).
//!
//! All robot I/O goes through `heading_traits::RobotLink`, detections through
//! `heading_traits::MarkerSource`, and tunables through
//! `heading_traits::ConfigProvider`.
//!
//! ## Architecture
//!
//! - **Gate**: reentrancy-guarded nearest-marker selection (`gate`)
//! - **Kinematics**: distance to forward duration (`kinematics`)
//! - **Commands**: wire commands, single-attempt send, ordered worker (`command`, `dispatcher`)
//! - **Navigator**: the Idle/Detecting/Approaching/Aligning/Fault machine (`navigator`)
//! - **Runtime**: sequencer thread, vision pump, ticks (`runner`, `vision`)
//!
//! ## Timing
//!
//! The countdown is tick-driven: each tick subtracts `tick_ms` from the
//! remaining time and the phase ends once it reaches zero or below. Robot
//! replies never gate timing.

pub mod builder;
pub mod command;
pub mod detection;
pub mod dispatcher;
pub mod drive;
pub mod error;
pub mod gate;
pub mod kinematics;
pub mod link_error;
pub mod mocks;
pub mod navigator;
pub mod runner;
pub mod status;
pub mod util;
pub mod vision;

pub use builder::NavigatorBuilder;
pub use command::{CommandKind, CommandOutcome, RobotCommand, send_once};
pub use detection::{AcquiredMarker, MarkerCandidate};
pub use dispatcher::{CommandDispatcher, Dispatch, DispatchReport};
pub use drive::DriveConfig;
pub use error::{BuildError, DispatchError, KinematicsError, NavError, Result};
pub use gate::DetectionGate;
pub use kinematics::{MoveBreakdown, forward_duration_ms};
pub use navigator::{NavTiming, Navigator};
pub use runner::{Control, NavEvent, NavigationHandle, Runtime, RuntimeParts, spawn_sequencer};
pub use status::{NavState, NavStats, NavStatus};
