use client_core::ClientError;
use shared::{
    domain::{StoryKey, DEFAULT_NOVEL_NAME},
    protocol::{GenerateQuery, GenerateResponse, StoryUploadRequest},
};

use super::{Settled, Submission, EMPTY_STORY_MESSAGE};
use crate::{
    buffer::StoryBuffer,
    call::RemoteCall,
    config::Configuration,
    failure::ClassifiedFailure,
    operation::{Operation, OperationPhase, OperationState, Ticket, Workflow},
};

pub const MISSING_BUCKET_MESSAGE: &str = "Please set bucket name in menu";
pub const GENERATED_MESSAGE: &str = "Story continuation generated!";

/// Uploads the draft under a fresh scratch key and appends the continuation
/// generated from that key.
#[derive(Debug, Clone)]
pub struct GenerateController {
    op: Operation<GenerateResponse>,
    last_key_millis: Option<i64>,
}

impl Default for GenerateController {
    fn default() -> Self {
        Self {
            op: Operation::new(Workflow::GenerateContinuation),
            last_key_millis: None,
        }
    }
}

impl GenerateController {
    pub fn state(&self) -> &OperationState<GenerateResponse> {
        self.op.state()
    }

    pub fn is_pending(&self) -> bool {
        self.op.phase() == OperationPhase::Pending
    }

    /// Scratch keys are strictly increasing within a session, even if the
    /// clock does not advance between two runs.
    fn next_key(&mut self, now_millis: i64) -> StoryKey {
        let millis = match self.last_key_millis {
            Some(last) if now_millis <= last => last + 1,
            _ => now_millis,
        };
        self.last_key_millis = Some(millis);
        StoryKey::temp_from_millis(millis)
    }

    pub fn begin(
        &mut self,
        buffer: &StoryBuffer,
        config: &Configuration,
        now_millis: i64,
    ) -> Submission {
        if self.is_pending() {
            return Submission::Ignored;
        }
        if buffer.is_blank() {
            return self.reject(EMPTY_STORY_MESSAGE);
        }
        let Some(bucket) = config.bucket() else {
            return self.reject(MISSING_BUCKET_MESSAGE);
        };
        let novel_name = config.novel_name().unwrap_or(DEFAULT_NOVEL_NAME).to_string();

        let Some(seq) = self.op.submit() else {
            return Submission::Ignored;
        };
        let key = self.next_key(now_millis);
        tracing::info!(workflow = "generate_continuation", key = %key, "uploading draft for generation");
        Submission::Dispatched(RemoteCall::GenerateContinuation {
            ticket: Ticket {
                workflow: Workflow::GenerateContinuation,
                seq,
                epoch: None,
            },
            upload: StoryUploadRequest {
                text: buffer.text().to_string(),
                filepath: key.clone(),
                bucket_name: bucket.clone(),
            },
            query: GenerateQuery {
                bucket,
                story_key: key,
                novel_name,
            },
        })
    }

    fn reject(&mut self, message: &str) -> Submission {
        let failure = ClassifiedFailure::validation(message);
        self.op.invalid(failure.clone());
        Submission::Rejected(failure)
    }

    /// Applies a completion. The buffer is only touched on success.
    pub fn complete(
        &mut self,
        seq: u64,
        result: Result<GenerateResponse, ClientError>,
        buffer: &mut StoryBuffer,
    ) -> Settled {
        match result {
            Ok(response) => {
                let continuation = response.story_continuation.clone();
                if let Some(forecast) = response.forecaster_response.as_deref() {
                    tracing::debug!(forecast, "forecaster response");
                }
                if !self.op.resolve(seq, response) {
                    return Settled::Stale;
                }
                buffer.append(&continuation);
                Settled::Succeeded(GENERATED_MESSAGE.to_string())
            }
            Err(err) => {
                let failure = ClassifiedFailure::from_client_error(&err);
                if !self.op.fail(seq, failure.clone()) {
                    return Settled::Stale;
                }
                Settled::Failed(failure)
            }
        }
    }
}
