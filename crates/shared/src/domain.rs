use std::fmt;

use serde::{Deserialize, Serialize};

/// Novel name the generation endpoint falls back to when none is configured.
pub const DEFAULT_NOVEL_NAME: &str = "first novel";
pub const DEFAULT_USERNAME: &str = "default_user";
pub const DEFAULT_SIMILAR_RESULTS: u32 = 3;

const TEMP_STORY_PREFIX: &str = "temp/story-";

macro_rules! text_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

text_newtype!(StoryKey);
text_newtype!(BucketName);

impl StoryKey {
    /// Scratch key for a draft uploaded at `epoch_millis`, e.g. `temp/story-1732700000000.txt`.
    pub fn temp_from_millis(epoch_millis: i64) -> Self {
        Self(format!("{TEMP_STORY_PREFIX}{epoch_millis}.txt"))
    }

    pub fn is_temp(&self) -> bool {
        self.0.starts_with(TEMP_STORY_PREFIX)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateType {
    Forecaster,
    NovelCompletion,
}

impl TemplateType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Forecaster => "forecaster",
            Self::NovelCompletion => "novel_completion",
        }
    }
}
