//! Executes remote calls concurrently while keeping every state change on the
//! caller's task: completions are yielded one at a time and applied there.

use std::{sync::Arc, time::Duration};

use client_core::NovelWriterApi;
use futures::{
    future::BoxFuture,
    stream::{FuturesUnordered, StreamExt},
    FutureExt,
};

use crate::{
    call::{Completion, RemoteCall},
    session::EditorSession,
};

/// Mining jobs can legitimately run for several minutes.
pub const DEFAULT_MINING_DEADLINE: Duration = Duration::from_secs(300);

pub struct WorkflowRunner {
    api: Arc<dyn NovelWriterApi>,
    mining_deadline: Duration,
    in_flight: FuturesUnordered<BoxFuture<'static, Completion>>,
}

impl WorkflowRunner {
    pub fn new(api: Arc<dyn NovelWriterApi>) -> Self {
        Self {
            api,
            mining_deadline: DEFAULT_MINING_DEADLINE,
            in_flight: FuturesUnordered::new(),
        }
    }

    pub fn with_mining_deadline(mut self, deadline: Duration) -> Self {
        self.mining_deadline = deadline;
        self
    }

    pub fn dispatch(&mut self, call: RemoteCall) {
        let api = Arc::clone(&self.api);
        let deadline = self.mining_deadline;
        tracing::debug!(
            workflow = call.ticket().workflow.name(),
            in_flight = self.in_flight.len() + 1,
            "dispatching remote call"
        );
        self.in_flight
            .push(async move { call.execute(api.as_ref(), deadline).await }.boxed());
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty()
    }

    /// Next finished call, in completion order. `None` once nothing is in flight.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        self.in_flight.next().await
    }

    /// Applies completions to `session` until nothing is in flight.
    /// Returns how many were applied rather than dropped.
    pub async fn drain(&mut self, session: &mut EditorSession) -> usize {
        let mut applied = 0;
        while let Some(completion) = self.next_completion().await {
            if session.apply(completion) {
                applied += 1;
            }
        }
        applied
    }
}
