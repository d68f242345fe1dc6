//! Post submission: validation, directory layout, file persistence and the
//! metadata insert, run as one request-scoped pipeline.

mod validate;

pub use validate::{
    accepted_extension, is_allowed_extension, resolve_extension, validate_fields, FilePart,
    RawFields, Rejection, ValidatedFields, ALLOWED_EXTENSIONS, FILE_SLOTS, MAX_ANDREW_ID_CHARS,
    MAX_CAPTION_CHARS, MAX_NAME_CHARS,
};

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::content::{self, ContentError, ContentTree, MediaWriter, CAPTION_FILE, INSTAGRAM_FILE};
use crate::state_machine::{SubmissionMachine, SubmissionState, TransitionError};
use crate::storage::models::NewPost;
use crate::storage::{PostStore, StoreError};

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Rejected(#[from] Rejection),
    #[error("Failed to create post directory: {0}")]
    CreateDirectory(#[source] ContentError),
    #[error("Failed to save caption: {0}")]
    WriteCaption(#[source] ContentError),
    #[error("Failed to save Instagram username: {0}")]
    WriteInstagram(#[source] ContentError),
    #[error("Failed to save file: {0}")]
    WriteFile(#[source] ContentError),
    #[error("Failed to save post to database: {0}")]
    RecordMetadata(#[source] StoreError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl SubmissionError {
    /// Caller input problems, as opposed to storage failures.
    pub fn is_rejection(&self) -> bool {
        matches!(self, SubmissionError::Rejected(_))
    }

    /// Whether the submission directory is removed after this failure.
    ///
    /// Only the no-media rejection cleans up. Write and insert failures leave
    /// the directory in place for manual reconciliation.
    pub fn discards_directory(&self) -> bool {
        matches!(self, SubmissionError::Rejected(Rejection::NoMedia))
    }
}

/// A parsed submission request: text fields plus the ten file slots.
#[derive(Debug, Clone)]
pub struct SubmissionForm {
    pub fields: RawFields,
    slots: Vec<Option<FilePart>>,
}

impl Default for SubmissionForm {
    fn default() -> Self {
        Self {
            fields: RawFields::default(),
            slots: vec![None; FILE_SLOTS],
        }
    }
}

impl SubmissionForm {
    /// Slot index for a part name such as `file_3`.
    pub fn slot_index(field_name: &str) -> Option<usize> {
        field_name
            .strip_prefix("file_")
            .and_then(|n| n.parse::<usize>().ok())
            .filter(|&i| i < FILE_SLOTS && format!("file_{i}") == field_name)
    }

    /// Record a text field. Unknown names are ignored; the first value wins.
    pub fn set_field(&mut self, name: &str, value: String) {
        let slot = match name {
            "andrewId" => &mut self.fields.andrew_id,
            "name" => &mut self.fields.name,
            "instagramUsername" => &mut self.fields.instagram_username,
            "caption" => &mut self.fields.caption,
            _ => return,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    /// Fill a file slot. A slot that is already filled keeps its first part.
    pub fn set_slot(&mut self, index: usize, part: FilePart) {
        if let Some(slot) = self.slots.get_mut(index) {
            if slot.is_none() {
                *slot = Some(part);
            }
        }
    }

    pub fn slot(&self, index: usize) -> Option<&FilePart> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn filled_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub post_id: i64,
    pub files_processed: usize,
    pub post_dir: PathBuf,
}

/// Runs one submission through the state machine.
pub struct Orchestrator<'a> {
    content: &'a ContentTree,
    store: &'a dyn PostStore,
    machine: SubmissionMachine,
    post_dir: Option<PathBuf>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(content: &'a ContentTree, store: &'a dyn PostStore) -> Self {
        Self {
            content,
            store,
            machine: SubmissionMachine::new(),
            post_dir: None,
        }
    }

    pub fn state(&self) -> SubmissionState {
        self.machine.state()
    }

    pub async fn run(
        &mut self,
        parsed: Result<SubmissionForm, Rejection>,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        self.run_at(parsed, Utc::now()).await
    }

    /// Run the pipeline as if the request arrived at `now`.
    pub async fn run_at(
        &mut self,
        parsed: Result<SubmissionForm, Rejection>,
        now: DateTime<Utc>,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        match self.drive(parsed, now).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                self.handle_failure(&err).await;
                Err(err)
            }
        }
    }

    async fn drive(
        &mut self,
        parsed: Result<SubmissionForm, Rejection>,
        now: DateTime<Utc>,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        let form = parsed?;

        self.machine.advance()?;
        let fields = validate_fields(&form.fields)?;

        self.machine.advance()?;
        let post_dir = self
            .content
            .create_post_dir(&fields.andrew_id, now)
            .await
            .map_err(SubmissionError::CreateDirectory)?;
        self.post_dir = Some(post_dir.clone());

        content::write_text(&post_dir, CAPTION_FILE, &fields.caption)
            .await
            .map_err(SubmissionError::WriteCaption)?;
        content::write_text(&post_dir, INSTAGRAM_FILE, &fields.instagram_username)
            .await
            .map_err(SubmissionError::WriteInstagram)?;

        let mut writer = MediaWriter::new(&post_dir);
        for index in 0..FILE_SLOTS {
            let Some(part) = form.slot(index) else {
                continue;
            };
            let Some(extension) = accepted_extension(part) else {
                tracing::debug!(
                    slot = index,
                    file_name = ?part.file_name,
                    content_type = ?part.content_type,
                    "Skipping file with unsupported type"
                );
                continue;
            };
            writer
                .write(&extension, [&part.data])
                .await
                .map_err(SubmissionError::WriteFile)?;
        }

        let files_processed = writer.count();
        if files_processed == 0 {
            return Err(Rejection::NoMedia.into());
        }

        self.machine.advance()?;
        let content_path = post_dir.to_string_lossy().into_owned();
        let post_id = self
            .store
            .insert_post(&NewPost {
                andrew_id: fields.andrew_id.clone(),
                username: fields.name.clone(),
                content: content_path,
                created_at: now,
            })
            .await
            .map_err(SubmissionError::RecordMetadata)?;

        self.machine.advance()?;
        tracing::info!(
            post_id,
            andrew_id = %fields.andrew_id,
            files = files_processed,
            dir = %post_dir.display(),
            "Post submitted"
        );

        Ok(SubmissionOutcome {
            post_id,
            files_processed,
            post_dir,
        })
    }

    async fn handle_failure(&mut self, err: &SubmissionError) {
        let failed_in = match self.machine.fail() {
            Ok(state) => state,
            Err(e) => {
                tracing::error!(error = %e, "Submission failed outside the pipeline");
                return;
            }
        };

        let Some(dir) = self.post_dir.as_deref() else {
            tracing::debug!(state = %failed_in, error = %err, "Submission rejected");
            return;
        };

        if err.discards_directory() {
            if let Err(e) = content::discard(dir).await {
                tracing::warn!(dir = %dir.display(), error = %e, "Failed to remove post directory");
            }
            tracing::debug!(state = %failed_in, error = %err, "Submission rejected");
        } else if failed_in.may_have_written_files() {
            tracing::warn!(
                state = %failed_in,
                dir = %dir.display(),
                error = %err,
                "Submission failed; post directory left on disk without a database row"
            );
        }
    }
}
