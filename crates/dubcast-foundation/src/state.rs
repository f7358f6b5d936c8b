use crate::error::DubError;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::RwLock;
use std::sync::Arc;

/// Lifecycle state of a single pipeline run, broadcast to subscribers
/// (CLI progress reporting, `--dry-run` auditing) as phases execute.
#[derive(Debug, Clone, PartialEq)]
pub enum RunState {
    Initializing,
    Running { phase: String },
    Recovering { from_error: String },
    Stopping,
    Stopped,
}

pub struct RunStateManager {
    state: Arc<RwLock<RunState>>,
    state_tx: Sender<RunState>,
    state_rx: Receiver<RunState>,
}

impl Default for RunStateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStateManager {
    pub fn new() -> Self {
        let (state_tx, state_rx) = crossbeam_channel::unbounded();
        Self {
            state: Arc::new(RwLock::new(RunState::Initializing)),
            state_tx,
            state_rx,
        }
    }

    pub fn transition(&self, new_state: RunState) -> Result<(), DubError> {
        let mut current = self.state.write();

        let valid = matches!(
            (&*current, &new_state),
            (RunState::Initializing, RunState::Running { .. })
                | (RunState::Running { .. }, RunState::Running { .. })
                | (RunState::Running { .. }, RunState::Recovering { .. })
                | (RunState::Running { .. }, RunState::Stopping)
                | (RunState::Recovering { .. }, RunState::Running { .. })
                | (RunState::Recovering { .. }, RunState::Stopping)
                | (RunState::Stopping, RunState::Stopped)
        );

        if !valid {
            return Err(DubError::Fatal(format!(
                "invalid run state transition: {:?} -> {:?}",
                *current, new_state
            )));
        }

        tracing::info!(target: "dubcast::state", from = ?*current, to = ?new_state, "run state transition");
        *current = new_state.clone();
        let _ = self.state_tx.send(new_state);
        Ok(())
    }

    pub fn current(&self) -> RunState {
        self.state.read().clone()
    }

    pub fn subscribe(&self) -> Receiver<RunState> {
        self.state_rx.clone()
    }
}
