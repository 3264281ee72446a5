//! Workflow orchestration for the NovelWriter editor.
//!
//! [`EditorSession`] owns the draft buffer, the session configuration, dialog
//! visibility, the status banner and one controller per workflow. Controllers
//! never perform I/O: they hand out a [`RemoteCall`] and later accept the
//! matching [`Completion`], which [`WorkflowRunner`] produces on a single task.

pub mod buffer;
pub mod call;
pub mod config;
pub mod controller;
pub mod dialog;
pub mod failure;
pub mod operation;
pub mod runner;
pub mod session;
pub mod status;

pub use buffer::{count_words, StoryBuffer, CONTINUATION_SEPARATOR};
pub use call::{Completion, RemoteCall};
pub use config::{Configuration, ConfigurationPatch, ConfigurationStore};
pub use controller::{
    AddEntityController, EntityForm, GenerateController, LoadStoryController,
    MineEntitiesController, Settled, Submission,
};
pub use dialog::{DialogEpoch, DialogKind, DialogManager};
pub use failure::{ClassifiedFailure, FailureKind};
pub use operation::{Operation, OperationEvent, OperationPhase, OperationState, Ticket, Workflow};
pub use runner::{WorkflowRunner, DEFAULT_MINING_DEADLINE};
pub use session::{EditorSession, SessionOptions};
pub use status::{BannerKind, StatusBanner, StatusProjector};

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod session_tests;

#[cfg(test)]
#[path = "tests/runner_tests.rs"]
mod runner_tests;
