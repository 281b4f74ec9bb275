//! Ordered, fire-and-forget command delivery on a worker thread.
//!
//! The worker owns the `RobotLink`. Commands are sent one at a time in
//! submission order and each produces exactly one `DispatchReport`.
//!
//! Dropping the dispatcher closes the queue, lets the worker drain what was
//! already submitted (so a trailing Stop still goes out), and joins it.
use crossbeam_channel as xch;
use heading_traits::RobotLink;
use std::thread::JoinHandle;

use crate::command::{CommandOutcome, RobotCommand, send_once};

/// Completion of one dispatched command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub seq: u64,
    pub command: RobotCommand,
    pub outcome: CommandOutcome,
}

/// Where the navigator sends commands. Returns the command's sequence number.
pub trait Dispatch {
    fn dispatch(&mut self, cmd: RobotCommand) -> u64;
}

pub struct CommandDispatcher {
    tx: Option<xch::Sender<(u64, RobotCommand)>>,
    next_seq: u64,
    join_handle: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDispatcher")
            .field("next_seq", &self.next_seq)
            .field("running", &self.join_handle.is_some())
            .finish()
    }
}

impl CommandDispatcher {
    pub fn spawn<L: RobotLink + Send + 'static>(
        mut link: L,
        reports: xch::Sender<DispatchReport>,
    ) -> Self {
        let (tx, rx) = xch::unbounded::<(u64, RobotCommand)>();

        let join_handle = std::thread::spawn(move || {
            for (seq, command) in rx.iter() {
                let outcome = send_once(&mut link, &command);
                match &outcome {
                    CommandOutcome::Ok { body } => {
                        tracing::debug!(seq, command = %command, reply = %body, "command delivered");
                    }
                    CommandOutcome::Failed(e) => {
                        tracing::warn!(seq, command = %command, error = %e, "command dispatch failed");
                    }
                }
                // Nobody listening is fine; delivery already happened.
                let _ = reports.send(DispatchReport {
                    seq,
                    command,
                    outcome,
                });
            }
            tracing::trace!("dispatcher thread exiting cleanly");
        });

        Self {
            tx: Some(tx),
            next_seq: 0,
            join_handle: Some(join_handle),
        }
    }
}

impl Dispatch for CommandDispatcher {
    fn dispatch(&mut self, cmd: RobotCommand) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        match &self.tx {
            Some(tx) if tx.send((seq, cmd)).is_ok() => {}
            _ => tracing::error!(seq, command = %cmd, "dispatcher worker is gone; command not sent"),
        }
        seq
    }
}

impl Drop for CommandDispatcher {
    fn drop(&mut self) {
        drop(self.tx.take());
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!("dispatcher thread joined"),
                Err(e) => tracing::warn!(?e, "dispatcher thread panicked during shutdown"),
            }
        }
    }
}
