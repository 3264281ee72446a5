/// Inserted between the draft and a generated continuation.
pub const CONTINUATION_SEPARATOR: &str = "\n\n";

/// Number of maximal non-whitespace runs in `text`.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryBuffer {
    text: String,
}

impl StoryBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn append(&mut self, continuation: &str) {
        self.text.reserve(CONTINUATION_SEPARATOR.len() + continuation.len());
        self.text.push_str(CONTINUATION_SEPARATOR);
        self.text.push_str(continuation);
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn word_count(&self) -> usize {
        count_words(&self.text)
    }
}
