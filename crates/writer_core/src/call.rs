//! Remote calls handed out by controllers and the completions fed back to them.

use std::time::Duration;

use client_core::{ClientError, NovelWriterApi};
use shared::{
    domain::{BucketName, StoryKey},
    protocol::{
        EntityAck, EntityAddRequest, GenerateQuery, GenerateResponse, MineEntitiesRequest,
        MineEntitiesResponse, StoryContent, StoryUploadRequest,
    },
};
use tracing::{debug, warn};

use crate::operation::Ticket;

#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    /// Upload the draft, then ask for a continuation of the uploaded key.
    GenerateContinuation {
        ticket: Ticket,
        upload: StoryUploadRequest,
        query: GenerateQuery,
    },
    LoadStory {
        ticket: Ticket,
        bucket: BucketName,
        key: StoryKey,
    },
    AddEntity {
        ticket: Ticket,
        request: EntityAddRequest,
    },
    MineEntities {
        ticket: Ticket,
        request: MineEntitiesRequest,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    GenerateContinuation {
        ticket: Ticket,
        result: Result<GenerateResponse, ClientError>,
    },
    LoadStory {
        ticket: Ticket,
        result: Result<StoryContent, ClientError>,
    },
    AddEntity {
        ticket: Ticket,
        result: Result<EntityAck, ClientError>,
    },
    MineEntities {
        ticket: Ticket,
        result: Result<MineEntitiesResponse, ClientError>,
    },
}

impl RemoteCall {
    pub fn ticket(&self) -> Ticket {
        match self {
            Self::GenerateContinuation { ticket, .. }
            | Self::LoadStory { ticket, .. }
            | Self::AddEntity { ticket, .. }
            | Self::MineEntities { ticket, .. } => *ticket,
        }
    }

    /// Performs the call. `mining_deadline` bounds the mining request only.
    pub async fn execute<A>(self, api: &A, mining_deadline: Duration) -> Completion
    where
        A: NovelWriterApi + ?Sized,
    {
        let workflow = self.ticket().workflow.name();
        debug!(workflow, "remote call started");
        let completion = match self {
            Self::GenerateContinuation {
                ticket,
                upload,
                query,
            } => {
                let result = match api.upload_story(&upload).await {
                    Ok(_) => api.generate(&query).await,
                    Err(err) => Err(err),
                };
                Completion::GenerateContinuation { ticket, result }
            }
            Self::LoadStory { ticket, bucket, key } => Completion::LoadStory {
                ticket,
                result: api.fetch_story(&bucket, &key).await,
            },
            Self::AddEntity { ticket, request } => Completion::AddEntity {
                ticket,
                result: api.add_entity(&request).await,
            },
            Self::MineEntities { ticket, request } => {
                let result =
                    match tokio::time::timeout(mining_deadline, api.mine_entities(&request)).await {
                        Ok(result) => result,
                        Err(_) => Err(ClientError::Timeout(format!(
                            "no response within {}s",
                            mining_deadline.as_secs()
                        ))),
                    };
                Completion::MineEntities { ticket, result }
            }
        };
        if let Some(err) = completion.error() {
            warn!(workflow, error = %err, "remote call failed");
        } else {
            debug!(workflow, "remote call finished");
        }
        completion
    }
}

impl Completion {
    pub fn ticket(&self) -> Ticket {
        match self {
            Self::GenerateContinuation { ticket, .. }
            | Self::LoadStory { ticket, .. }
            | Self::AddEntity { ticket, .. }
            | Self::MineEntities { ticket, .. } => *ticket,
        }
    }

    pub fn error(&self) -> Option<&ClientError> {
        match self {
            Self::GenerateContinuation { result, .. } => result.as_ref().err(),
            Self::LoadStory { result, .. } => result.as_ref().err(),
            Self::AddEntity { result, .. } => result.as_ref().err(),
            Self::MineEntities { result, .. } => result.as_ref().err(),
        }
    }
}
