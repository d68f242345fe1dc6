//! Linear state machine for one post submission.
//!
//! ```text
//! Parsing -> Validating -> PersistingFiles -> RecordingMetadata -> Done
//!    \____________\_______________\_________________\______> Failed
//! ```
//!
//! The orchestrator drives it; the state a failure happened in decides what
//! was left on disk and what cleanup, if any, applies.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Parsing,
    Validating,
    PersistingFiles,
    RecordingMetadata,
    Done,
    Failed,
}

impl SubmissionState {
    /// The successor on the success path; `None` once terminal.
    pub fn next(self) -> Option<Self> {
        match self {
            SubmissionState::Parsing => Some(SubmissionState::Validating),
            SubmissionState::Validating => Some(SubmissionState::PersistingFiles),
            SubmissionState::PersistingFiles => Some(SubmissionState::RecordingMetadata),
            SubmissionState::RecordingMetadata => Some(SubmissionState::Done),
            SubmissionState::Done | SubmissionState::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SubmissionState::Done | SubmissionState::Failed)
    }

    /// Whether a submission directory may exist on disk in this state.
    pub fn may_have_written_files(self) -> bool {
        matches!(
            self,
            SubmissionState::PersistingFiles | SubmissionState::RecordingMetadata
        )
    }
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubmissionState::Parsing => "parsing",
            SubmissionState::Validating => "validating",
            SubmissionState::PersistingFiles => "persisting_files",
            SubmissionState::RecordingMetadata => "recording_metadata",
            SubmissionState::Done => "done",
            SubmissionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid submission transition from {from}")]
pub struct TransitionError {
    pub from: SubmissionState,
}

#[derive(Debug, Clone)]
pub struct SubmissionMachine {
    state: SubmissionState,
    /// Where the failure happened, once `Failed`.
    failed_in: Option<SubmissionState>,
}

impl Default for SubmissionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionMachine {
    pub fn new() -> Self {
        Self {
            state: SubmissionState::Parsing,
            failed_in: None,
        }
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn failed_in(&self) -> Option<SubmissionState> {
        self.failed_in
    }

    /// Move to the next state on the success path.
    pub fn advance(&mut self) -> Result<SubmissionState, TransitionError> {
        let next = self
            .state
            .next()
            .ok_or(TransitionError { from: self.state })?;
        tracing::debug!(from = %self.state, to = %next, "Submission state change");
        self.state = next;
        Ok(next)
    }

    /// Enter `Failed` and return the state the failure happened in.
    pub fn fail(&mut self) -> Result<SubmissionState, TransitionError> {
        if self.state.is_terminal() {
            return Err(TransitionError { from: self.state });
        }
        let from = self.state;
        tracing::debug!(from = %from, "Submission failed");
        self.state = SubmissionState::Failed;
        self.failed_in = Some(from);
        Ok(from)
    }
}
