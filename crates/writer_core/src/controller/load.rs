use client_core::ClientError;
use shared::{domain::StoryKey, protocol::StoryContent};

use super::{Settled, Submission};
use crate::{
    buffer::StoryBuffer,
    call::RemoteCall,
    config::Configuration,
    dialog::DialogEpoch,
    failure::ClassifiedFailure,
    operation::{Operation, OperationPhase, OperationState, Ticket, Workflow},
};

pub const MISSING_BUCKET_MESSAGE: &str = "Please set bucket name in settings first";
pub const MISSING_KEY_MESSAGE: &str = "Please enter the story path to load";
pub const LOADED_MESSAGE: &str = "Story loaded successfully!";

/// Replaces the whole draft with a stored story.
///
/// The key field survives a failed attempt so the user can retry as-is.
#[derive(Debug, Clone)]
pub struct LoadStoryController {
    op: Operation<StoryKey>,
    key: String,
    in_flight_key: Option<StoryKey>,
}

impl Default for LoadStoryController {
    fn default() -> Self {
        Self {
            op: Operation::new(Workflow::LoadStory),
            key: String::new(),
            in_flight_key: None,
        }
    }
}

impl LoadStoryController {
    pub fn state(&self) -> &OperationState<StoryKey> {
        self.op.state()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn set_key(&mut self, key: impl Into<String>) {
        self.key = key.into();
    }

    pub fn begin(&mut self, config: &Configuration, epoch: DialogEpoch) -> Submission {
        if self.op.phase() == OperationPhase::Pending {
            return Submission::Ignored;
        }
        let Some(bucket) = config.bucket() else {
            return self.reject(MISSING_BUCKET_MESSAGE);
        };
        if self.key.trim().is_empty() {
            return self.reject(MISSING_KEY_MESSAGE);
        }
        let Some(seq) = self.op.submit() else {
            return Submission::Ignored;
        };
        let key = StoryKey::from(self.key.trim());
        self.in_flight_key = Some(key.clone());
        tracing::info!(workflow = "load_story", bucket = %bucket, key = %key, "loading story");
        Submission::Dispatched(RemoteCall::LoadStory {
            ticket: Ticket {
                workflow: Workflow::LoadStory,
                seq,
                epoch: Some(epoch),
            },
            bucket,
            key,
        })
    }

    fn reject(&mut self, message: &str) -> Submission {
        let failure = ClassifiedFailure::validation(message);
        self.op.invalid(failure.clone());
        Submission::Rejected(failure)
    }

    /// On success the buffer is replaced outright, discarding unsaved edits.
    pub fn complete(
        &mut self,
        seq: u64,
        result: Result<StoryContent, ClientError>,
        buffer: &mut StoryBuffer,
    ) -> Settled {
        match result {
            Ok(story) => {
                let key = self
                    .in_flight_key
                    .clone()
                    .unwrap_or_else(|| StoryKey::from(self.key.as_str()));
                if !self.op.resolve(seq, key) {
                    return Settled::Stale;
                }
                self.in_flight_key = None;
                buffer.set_text(story.content);
                Settled::Succeeded(LOADED_MESSAGE.to_string())
            }
            Err(err) => {
                let failure = ClassifiedFailure::from_client_error(&err);
                if !self.op.fail(seq, failure.clone()) {
                    return Settled::Stale;
                }
                self.in_flight_key = None;
                Settled::Failed(failure)
            }
        }
    }

    pub fn dismiss_error(&mut self) -> bool {
        self.op.phase() == OperationPhase::Error && self.op.dismiss()
    }

    /// Forgets everything, including the key field; used when the dialog closes.
    pub fn reset(&mut self) {
        self.op.abandon();
        self.key.clear();
        self.in_flight_key = None;
    }
}
