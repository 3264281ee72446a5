//! Per-workflow operation state and its transition table.

use tracing::debug;

use crate::{dialog::DialogEpoch, dialog::DialogKind, failure::ClassifiedFailure};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Workflow {
    GenerateContinuation,
    LoadStory,
    AddEntity,
    MineEntities,
}

impl Workflow {
    pub fn name(self) -> &'static str {
        match self {
            Self::GenerateContinuation => "generate_continuation",
            Self::LoadStory => "load_story",
            Self::AddEntity => "add_entity",
            Self::MineEntities => "mine_entities",
        }
    }

    /// Dialog hosting the workflow. Generation runs from the editor itself.
    pub fn dialog(self) -> Option<DialogKind> {
        match self {
            Self::GenerateContinuation => None,
            Self::LoadStory => Some(DialogKind::LoadStory),
            Self::AddEntity => Some(DialogKind::AddEntity),
            Self::MineEntities => Some(DialogKind::MineEntities),
        }
    }

    /// Whether a successful run parks in [`OperationPhase::Result`] until dismissed.
    fn terminal_success(self) -> bool {
        matches!(self, Self::MineEntities)
    }
}

/// Identifies one dispatched remote call so its completion can be matched
/// against the controller and dialog that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    pub workflow: Workflow,
    pub seq: u64,
    pub epoch: Option<DialogEpoch>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationPhase {
    Idle,
    Pending,
    Success,
    Error,
    Result,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationEvent {
    Submit,
    Invalid,
    Resolve,
    Fail,
    Dismiss,
    Abandon,
}

/// The transition table. `None` means the event is not accepted in `phase`.
pub fn next_phase(
    workflow: Workflow,
    phase: OperationPhase,
    event: OperationEvent,
) -> Option<OperationPhase> {
    use OperationEvent::*;
    use OperationPhase::*;

    match (phase, event) {
        (Idle | Success | Error, Submit) => Some(Pending),
        (Idle | Success | Error, Invalid) => Some(Error),
        (Pending, Resolve) if workflow.terminal_success() => Some(Result),
        (Pending, Resolve) => Some(Success),
        (Pending, Fail) => Some(Error),
        (Success | Error | Result, Dismiss) => Some(Idle),
        (_, Abandon) => Some(Idle),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OperationState<T> {
    Idle,
    Pending,
    Success(T),
    Error(ClassifiedFailure),
    Result(T),
}

impl<T> OperationState<T> {
    pub fn phase(&self) -> OperationPhase {
        match self {
            Self::Idle => OperationPhase::Idle,
            Self::Pending => OperationPhase::Pending,
            Self::Success(_) => OperationPhase::Success,
            Self::Error(_) => OperationPhase::Error,
            Self::Result(_) => OperationPhase::Result,
        }
    }

    pub fn failure(&self) -> Option<&ClassifiedFailure> {
        match self {
            Self::Error(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn payload(&self) -> Option<&T> {
        match self {
            Self::Success(payload) | Self::Result(payload) => Some(payload),
            _ => None,
        }
    }
}

/// One controller's operation: the current state plus the ticket sequence it
/// is waiting on. Completions for any other sequence are ignored.
#[derive(Debug, Clone)]
pub struct Operation<T> {
    workflow: Workflow,
    state: OperationState<T>,
    next_seq: u64,
    awaiting: Option<u64>,
}

impl<T> Operation<T> {
    pub fn new(workflow: Workflow) -> Self {
        Self {
            workflow,
            state: OperationState::Idle,
            next_seq: 0,
            awaiting: None,
        }
    }

    pub fn state(&self) -> &OperationState<T> {
        &self.state
    }

    pub fn phase(&self) -> OperationPhase {
        self.state.phase()
    }

    pub fn accepts(&self, event: OperationEvent) -> bool {
        next_phase(self.workflow, self.phase(), event).is_some()
    }

    fn step(&mut self, event: OperationEvent, next: impl FnOnce() -> OperationState<T>) -> bool {
        let from = self.phase();
        let Some(to) = next_phase(self.workflow, from, event) else {
            debug!(
                workflow = self.workflow.name(),
                ?from,
                ?event,
                "transition rejected"
            );
            return false;
        };
        self.state = next();
        debug_assert_eq!(self.state.phase(), to);
        debug!(workflow = self.workflow.name(), ?from, ?to, "operation transition");
        true
    }

    /// Moves to `Pending` and returns the sequence number the completion must carry.
    pub fn submit(&mut self) -> Option<u64> {
        if !self.step(OperationEvent::Submit, || OperationState::Pending) {
            return None;
        }
        self.next_seq += 1;
        self.awaiting = Some(self.next_seq);
        Some(self.next_seq)
    }

    pub fn invalid(&mut self, failure: ClassifiedFailure) -> bool {
        self.step(OperationEvent::Invalid, || OperationState::Error(failure))
    }

    pub fn is_awaiting(&self, seq: u64) -> bool {
        self.awaiting == Some(seq)
    }

    pub fn resolve(&mut self, seq: u64, payload: T) -> bool {
        if !self.is_awaiting(seq) {
            return false;
        }
        let terminal = self.workflow.terminal_success();
        let accepted = self.step(OperationEvent::Resolve, move || {
            if terminal {
                OperationState::Result(payload)
            } else {
                OperationState::Success(payload)
            }
        });
        if accepted {
            self.awaiting = None;
        }
        accepted
    }

    pub fn fail(&mut self, seq: u64, failure: ClassifiedFailure) -> bool {
        if !self.is_awaiting(seq) {
            return false;
        }
        let accepted = self.step(OperationEvent::Fail, || OperationState::Error(failure));
        if accepted {
            self.awaiting = None;
        }
        accepted
    }

    pub fn dismiss(&mut self) -> bool {
        self.step(OperationEvent::Dismiss, || OperationState::Idle)
    }

    /// Drops any state, including an in-flight call, so a late completion is ignored.
    pub fn abandon(&mut self) {
        self.step(OperationEvent::Abandon, || OperationState::Idle);
        self.awaiting = None;
    }
}
