use client_core::ClientError;
use shared::protocol::{MineEntitiesRequest, MineEntitiesResponse};

use super::{Settled, Submission, EMPTY_STORY_MESSAGE};
use crate::{
    buffer::StoryBuffer,
    call::RemoteCall,
    config::Configuration,
    dialog::DialogEpoch,
    failure::ClassifiedFailure,
    operation::{Operation, OperationPhase, OperationState, Ticket, Workflow},
};

pub const MISSING_NOVEL_NAME_MESSAGE: &str = "Please set novel name in settings first";
pub const MINED_FALLBACK_MESSAGE: &str = "Entity mining completed";

/// Submits the whole draft for entity mining.
///
/// A successful run parks in `Result` until the dialog is closed, so a result
/// being read is never replaced by a second run.
#[derive(Debug, Clone)]
pub struct MineEntitiesController {
    op: Operation<MineEntitiesResponse>,
}

impl Default for MineEntitiesController {
    fn default() -> Self {
        Self {
            op: Operation::new(Workflow::MineEntities),
        }
    }
}

impl MineEntitiesController {
    pub fn state(&self) -> &OperationState<MineEntitiesResponse> {
        self.op.state()
    }

    pub fn result(&self) -> Option<&MineEntitiesResponse> {
        match self.op.state() {
            OperationState::Result(response) => Some(response),
            _ => None,
        }
    }

    pub fn result_summary(&self) -> Option<String> {
        self.result().map(summary)
    }

    pub fn begin(
        &mut self,
        buffer: &StoryBuffer,
        config: &Configuration,
        username: &str,
        epoch: DialogEpoch,
    ) -> Submission {
        if matches!(
            self.op.phase(),
            OperationPhase::Pending | OperationPhase::Result
        ) {
            return Submission::Ignored;
        }
        if buffer.is_blank() {
            return self.reject(EMPTY_STORY_MESSAGE);
        }
        let Some(novel_name) = config.novel_name() else {
            return self.reject(MISSING_NOVEL_NAME_MESSAGE);
        };
        let Some(seq) = self.op.submit() else {
            return Submission::Ignored;
        };
        tracing::info!(
            workflow = "mine_entities",
            novel_name,
            words = buffer.word_count(),
            "submitting draft for entity mining"
        );
        Submission::Dispatched(RemoteCall::MineEntities {
            ticket: Ticket {
                workflow: Workflow::MineEntities,
                seq,
                epoch: Some(epoch),
            },
            request: MineEntitiesRequest {
                story_text: buffer.text().to_string(),
                novel_name: novel_name.to_string(),
                username: username.to_string(),
            },
        })
    }

    fn reject(&mut self, message: &str) -> Submission {
        let failure = ClassifiedFailure::validation(message);
        self.op.invalid(failure.clone());
        Submission::Rejected(failure)
    }

    pub fn complete(
        &mut self,
        seq: u64,
        result: Result<MineEntitiesResponse, ClientError>,
    ) -> Settled {
        match result {
            Ok(response) => {
                let message = summary(&response);
                if !self.op.resolve(seq, response) {
                    return Settled::Stale;
                }
                Settled::Succeeded(message)
            }
            Err(err) => {
                let failure = ClassifiedFailure::from_long_running_error(&err);
                if !self.op.fail(seq, failure.clone()) {
                    return Settled::Stale;
                }
                Settled::Failed(failure)
            }
        }
    }

    pub fn dismiss_error(&mut self) -> bool {
        self.op.phase() == OperationPhase::Error && self.op.dismiss()
    }

    pub fn reset(&mut self) {
        self.op.abandon();
    }
}

/// Banner text for a finished mining run.
pub fn summary(response: &MineEntitiesResponse) -> String {
    let message = if response.message.trim().is_empty() {
        MINED_FALLBACK_MESSAGE
    } else {
        response.message.as_str()
    };
    match response.mined_count() {
        Some(count) => format!("{message} ({count} entities)"),
        None => message.to_string(),
    }
}
