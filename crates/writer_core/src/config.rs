//! In-memory session configuration edited through the settings dialog.
//!
//! The store performs no validation; each workflow checks the fields it needs
//! against a snapshot taken when it is triggered.

use shared::domain::BucketName;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    pub bucket: Option<String>,
    pub novel_name: Option<String>,
    pub story_name: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

impl Configuration {
    pub fn bucket(&self) -> Option<BucketName> {
        non_blank(&self.bucket).map(BucketName::from)
    }

    pub fn novel_name(&self) -> Option<&str> {
        non_blank(&self.novel_name)
    }

    pub fn story_name(&self) -> Option<&str> {
        non_blank(&self.story_name)
    }
}

/// Fields to overwrite. `None` leaves a field untouched; `Some("")` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationPatch {
    pub bucket: Option<String>,
    pub novel_name: Option<String>,
    pub story_name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigurationStore {
    current: Configuration,
}

impl ConfigurationStore {
    pub fn new(initial: Configuration) -> Self {
        Self { current: initial }
    }

    pub fn get(&self) -> Configuration {
        self.current.clone()
    }

    pub fn set(&mut self, patch: ConfigurationPatch) {
        if let Some(bucket) = patch.bucket {
            self.current.bucket = Some(bucket);
        }
        if let Some(novel_name) = patch.novel_name {
            self.current.novel_name = Some(novel_name);
        }
        if let Some(story_name) = patch.story_name {
            self.current.story_name = Some(story_name);
        }
        tracing::debug!(
            bucket = self.current.bucket.as_deref().unwrap_or(""),
            novel_name = self.current.novel_name.as_deref().unwrap_or(""),
            "configuration updated"
        );
    }
}
