//! Per-request pipeline job state machine
//!
//! A job moves strictly forward through the stage states and ends in
//! exactly one of `Completed` or `Failed`. Entering a terminal state
//! releases every scratch resource the job acquired. A `Drop` backstop
//! covers request futures cancelled mid-flight (client disconnect):
//! the janitor still runs even though no terminal transition happened.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::core::PipelineStage;
use crate::pipeline::janitor::TempResourceJanitor;

/// Job states, in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Created,
    Validated,
    Normalized,
    VoiceBound,
    Synthesized,
    Transcoded,
    Uploaded,
    Completed,
    Failed(PipelineStage),
}

impl JobState {
    /// Position in the forward order; Failed is terminal from anywhere
    fn ordinal(&self) -> u8 {
        match self {
            JobState::Created => 0,
            JobState::Validated => 1,
            JobState::Normalized => 2,
            JobState::VoiceBound => 3,
            JobState::Synthesized => 4,
            JobState::Transcoded => 5,
            JobState::Uploaded => 6,
            JobState::Completed => 7,
            JobState::Failed(_) => 8,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed(_))
    }
}

/// The state machine instance for one synthesis request
pub struct PipelineJob {
    id: String,
    state: JobState,
    janitor: Arc<TempResourceJanitor>,
}

impl PipelineJob {
    /// Admit a new job, creating its scratch directory
    pub fn new(scratch_root: &Path) -> std::io::Result<Self> {
        let id = Uuid::new_v4().to_string();
        let janitor = Arc::new(TempResourceJanitor::new(scratch_root, &id)?);
        debug!(job = %id, "pipeline job admitted");
        Ok(Self {
            id,
            state: JobState::Created,
            janitor,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn janitor(&self) -> &Arc<TempResourceJanitor> {
        &self.janitor
    }

    /// Advance to the next non-terminal state. States are never
    /// re-entered; the orchestrator drives strictly forward.
    pub fn advance(&mut self, next: JobState) {
        debug_assert!(
            next.ordinal() > self.state.ordinal() && !self.state.is_terminal(),
            "illegal transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!(job = %self.id, from = ?self.state, to = ?next, "stage complete");
        self.state = next;
    }

    /// Terminal success. Cleanup runs here, exactly once.
    pub fn complete(&mut self) {
        debug_assert!(!self.state.is_terminal());
        self.state = JobState::Completed;
        self.janitor.release_all();
        debug!(job = %self.id, "pipeline job completed");
    }

    /// Terminal failure at `stage`. Cleanup runs here, exactly once.
    pub fn fail(&mut self, stage: PipelineStage) {
        debug_assert!(!self.state.is_terminal());
        self.state = JobState::Failed(stage);
        self.janitor.release_all();
        debug!(job = %self.id, %stage, "pipeline job failed");
    }
}

impl Drop for PipelineJob {
    fn drop(&mut self) {
        if !self.state.is_terminal() && !self.janitor.is_released() {
            warn!(job = %self.id, state = ?self.state, "job dropped before terminal state, releasing scratch");
            self.janitor.release_all();
        }
    }
}
