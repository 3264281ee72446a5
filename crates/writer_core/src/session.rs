//! The editor session: every piece of user-visible state plus the rules that
//! join dialogs to the operations they host.

use shared::domain::DEFAULT_USERNAME;
use tracing::{debug, info, warn};

use crate::{
    buffer::StoryBuffer,
    call::{Completion, RemoteCall},
    config::{Configuration, ConfigurationPatch, ConfigurationStore},
    controller::{
        AddEntityController, EntityForm, GenerateController, LoadStoryController,
        MineEntitiesController, Settled, Submission,
    },
    dialog::{DialogEpoch, DialogKind, DialogManager},
    failure::ClassifiedFailure,
    operation::Workflow,
    status::StatusProjector,
};

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Sent with mining requests to scope the mined entity collection.
    pub username: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            username: DEFAULT_USERNAME.to_string(),
        }
    }
}

#[derive(Debug)]
pub struct EditorSession {
    config: ConfigurationStore,
    buffer: StoryBuffer,
    dialogs: DialogManager,
    status: StatusProjector,
    generate: GenerateController,
    load: LoadStoryController,
    add_entity: AddEntityController,
    mine: MineEntitiesController,
    options: SessionOptions,
}

fn dispatched(submission: Submission) -> Option<RemoteCall> {
    match submission {
        Submission::Dispatched(call) => Some(call),
        Submission::Rejected(_) | Submission::Ignored => None,
    }
}

impl EditorSession {
    pub fn new(initial: Configuration, options: SessionOptions) -> Self {
        Self {
            config: ConfigurationStore::new(initial),
            buffer: StoryBuffer::default(),
            dialogs: DialogManager::default(),
            status: StatusProjector::default(),
            generate: GenerateController::default(),
            load: LoadStoryController::default(),
            add_entity: AddEntityController::default(),
            mine: MineEntitiesController::default(),
            options,
        }
    }

    pub fn configuration(&self) -> Configuration {
        self.config.get()
    }

    pub fn buffer(&self) -> &StoryBuffer {
        &self.buffer
    }

    pub fn edit_text(&mut self, text: impl Into<String>) {
        self.buffer.set_text(text);
    }

    pub fn word_count(&self) -> usize {
        self.buffer.word_count()
    }

    pub fn dialogs(&self) -> &DialogManager {
        &self.dialogs
    }

    pub fn status(&self) -> &StatusProjector {
        &self.status
    }

    pub fn generate(&self) -> &GenerateController {
        &self.generate
    }

    pub fn load(&self) -> &LoadStoryController {
        &self.load
    }

    pub fn add_entity(&self) -> &AddEntityController {
        &self.add_entity
    }

    pub fn mine(&self) -> &MineEntitiesController {
        &self.mine
    }

    pub fn set_load_key(&mut self, key: impl Into<String>) {
        self.load.set_key(key);
    }

    pub fn entity_form_mut(&mut self) -> &mut EntityForm {
        self.add_entity.form_mut()
    }

    pub fn open_dialog(&mut self, kind: DialogKind) -> DialogEpoch {
        self.dialogs.open(kind)
    }

    /// Closes `kind` and discards the operation it hosted, including a mining
    /// result, whose summary moves to the status banner.
    pub fn close_dialog(&mut self, kind: DialogKind) -> bool {
        if !self.dialogs.close(kind) {
            return false;
        }
        match kind {
            DialogKind::LoadStory => self.load.reset(),
            DialogKind::AddEntity => self.add_entity.reset(),
            DialogKind::MineEntities => {
                if let Some(summary) = self.mine.result_summary() {
                    self.status.success(summary);
                }
                self.mine.reset();
            }
            DialogKind::Settings => {}
        }
        true
    }

    pub fn save_settings(&mut self, patch: ConfigurationPatch) {
        self.config.set(patch);
        self.close_dialog(DialogKind::Settings);
    }

    /// Dismisses the error banner shown inside a dialog.
    pub fn dismiss_dialog_error(&mut self, kind: DialogKind) -> bool {
        match kind {
            DialogKind::LoadStory => self.load.dismiss_error(),
            DialogKind::AddEntity => self.add_entity.dismiss_error(),
            DialogKind::MineEntities => self.mine.dismiss_error(),
            DialogKind::Settings => false,
        }
    }

    pub fn request_generate(&mut self) -> Option<RemoteCall> {
        self.request_generate_at(chrono::Utc::now().timestamp_millis())
    }

    /// Generation runs from the editor, so its validation errors go to the banner.
    pub fn request_generate_at(&mut self, now_millis: i64) -> Option<RemoteCall> {
        let config = self.config.get();
        match self.generate.begin(&self.buffer, &config, now_millis) {
            Submission::Dispatched(call) => Some(call),
            Submission::Rejected(failure) => {
                self.status.error(failure.message());
                None
            }
            Submission::Ignored => None,
        }
    }

    pub fn request_load(&mut self) -> Option<RemoteCall> {
        let epoch = self.live_epoch(DialogKind::LoadStory)?;
        let config = self.config.get();
        dispatched(self.load.begin(&config, epoch))
    }

    pub fn request_add_entity(&mut self) -> Option<RemoteCall> {
        let epoch = self.live_epoch(DialogKind::AddEntity)?;
        dispatched(self.add_entity.begin(epoch))
    }

    pub fn request_mine(&mut self) -> Option<RemoteCall> {
        let epoch = self.live_epoch(DialogKind::MineEntities)?;
        let config = self.config.get();
        dispatched(
            self.mine
                .begin(&self.buffer, &config, &self.options.username, epoch),
        )
    }

    fn live_epoch(&self, kind: DialogKind) -> Option<DialogEpoch> {
        let epoch = self.dialogs.epoch(kind);
        if epoch.is_none() {
            debug!(dialog = kind.name(), "workflow triggered without its dialog open");
        }
        epoch
    }

    /// Feeds a completion back. Returns false when it was dropped because its
    /// dialog closed or its controller moved on.
    pub fn apply(&mut self, completion: Completion) -> bool {
        let ticket = completion.ticket();
        if let Some(dialog) = ticket.workflow.dialog() {
            let live = ticket
                .epoch
                .is_some_and(|epoch| self.dialogs.is_live(dialog, epoch));
            if !live {
                debug!(
                    workflow = ticket.workflow.name(),
                    reason = "dialog_closed",
                    "dropping late completion"
                );
                return false;
            }
        }

        let settled = match completion {
            Completion::GenerateContinuation { ticket, result } => {
                self.generate.complete(ticket.seq, result, &mut self.buffer)
            }
            Completion::LoadStory { ticket, result } => {
                self.load.complete(ticket.seq, result, &mut self.buffer)
            }
            Completion::AddEntity { ticket, result } => {
                self.add_entity.complete(ticket.seq, result)
            }
            Completion::MineEntities { ticket, result } => self.mine.complete(ticket.seq, result),
        };

        match settled {
            Settled::Stale => {
                debug!(
                    workflow = ticket.workflow.name(),
                    reason = "stale_ticket",
                    "dropping late completion"
                );
                false
            }
            Settled::Succeeded(message) => {
                self.on_success(ticket.workflow, message);
                true
            }
            Settled::Failed(failure) => {
                self.on_failure(ticket.workflow, &failure);
                true
            }
        }
    }

    fn on_success(&mut self, workflow: Workflow, message: String) {
        match workflow {
            Workflow::GenerateContinuation => self.status.success(message),
            Workflow::LoadStory => {
                self.close_dialog(DialogKind::LoadStory);
                self.status.success(message);
            }
            Workflow::AddEntity => {
                self.close_dialog(DialogKind::AddEntity);
                self.status.success(message);
            }
            Workflow::MineEntities => {
                info!(workflow = workflow.name(), %message, "mining result ready");
            }
        }
    }

    /// Dialog-hosted failures stay inside their dialog; only the editor's own
    /// workflow reports through the global banner.
    fn on_failure(&mut self, workflow: Workflow, failure: &ClassifiedFailure) {
        match workflow {
            Workflow::GenerateContinuation => self.status.error(failure.message()),
            _ => warn!(
                workflow = workflow.name(),
                kind = failure.kind().label(),
                message = failure.message(),
                "workflow failed"
            ),
        }
    }
}
