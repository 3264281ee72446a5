//! Modal dialog visibility.
//!
//! Each dialog carries an epoch that advances on every open, so a completion
//! issued under an earlier opening can be told apart from the current one.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogKind {
    LoadStory,
    AddEntity,
    MineEntities,
    Settings,
}

impl DialogKind {
    pub const ALL: [DialogKind; 4] = [
        DialogKind::LoadStory,
        DialogKind::AddEntity,
        DialogKind::MineEntities,
        DialogKind::Settings,
    ];

    fn index(self) -> usize {
        match self {
            Self::LoadStory => 0,
            Self::AddEntity => 1,
            Self::MineEntities => 2,
            Self::Settings => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::LoadStory => "load_story",
            Self::AddEntity => "add_entity",
            Self::MineEntities => "mine_entities",
            Self::Settings => "settings",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DialogEpoch(pub u64);

#[derive(Debug, Clone, Copy, Default)]
struct DialogSlot {
    open: bool,
    epoch: u64,
}

#[derive(Debug, Clone, Default)]
pub struct DialogManager {
    slots: [DialogSlot; 4],
}

impl DialogManager {
    /// Opens `kind`; reopening an open dialog keeps its epoch.
    pub fn open(&mut self, kind: DialogKind) -> DialogEpoch {
        let slot = &mut self.slots[kind.index()];
        if !slot.open {
            slot.open = true;
            slot.epoch += 1;
            tracing::debug!(dialog = kind.name(), epoch = slot.epoch, "dialog opened");
        }
        DialogEpoch(slot.epoch)
    }

    /// Returns whether the dialog was open.
    pub fn close(&mut self, kind: DialogKind) -> bool {
        let slot = &mut self.slots[kind.index()];
        let was_open = slot.open;
        slot.open = false;
        if was_open {
            tracing::debug!(dialog = kind.name(), epoch = slot.epoch, "dialog closed");
        }
        was_open
    }

    pub fn is_open(&self, kind: DialogKind) -> bool {
        self.slots[kind.index()].open
    }

    pub fn epoch(&self, kind: DialogKind) -> Option<DialogEpoch> {
        let slot = self.slots[kind.index()];
        slot.open.then_some(DialogEpoch(slot.epoch))
    }

    /// True while `kind` is still showing the opening identified by `epoch`.
    pub fn is_live(&self, kind: DialogKind, epoch: DialogEpoch) -> bool {
        self.epoch(kind) == Some(epoch)
    }

    pub fn open_dialogs(&self) -> Vec<DialogKind> {
        DialogKind::ALL
            .into_iter()
            .filter(|kind| self.is_open(*kind))
            .collect()
    }
}
