//! One controller per user-triggered workflow.
//!
//! A controller validates inputs, hands out at most one [`RemoteCall`] at a
//! time and projects the matching completion into its own operation state.

pub mod add_entity;
pub mod generate;
pub mod load;
pub mod mine;

pub use add_entity::{AddEntityController, EntityForm};
pub use generate::GenerateController;
pub use load::LoadStoryController;
pub use mine::MineEntitiesController;

use crate::{call::RemoteCall, failure::ClassifiedFailure};

pub const EMPTY_STORY_MESSAGE: &str = "Please enter some story text first";

/// Result of triggering a workflow.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Dispatched(RemoteCall),
    /// A precondition failed; no remote call was made.
    Rejected(ClassifiedFailure),
    /// The controller is busy or showing a terminal result.
    Ignored,
}

/// Result of feeding a completion to a controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settled {
    Succeeded(String),
    Failed(ClassifiedFailure),
    /// The controller no longer awaits this call.
    Stale,
}
