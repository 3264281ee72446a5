#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBanner {
    pub kind: BannerKind,
    pub text: String,
}

/// Holds the single most recent outcome banner. It never expires on its own.
#[derive(Debug, Clone, Default)]
pub struct StatusProjector {
    current: Option<StatusBanner>,
}

impl StatusProjector {
    pub fn current(&self) -> Option<&StatusBanner> {
        self.current.as_ref()
    }

    pub fn publish(&mut self, kind: BannerKind, text: impl Into<String>) {
        let text = text.into();
        tracing::info!(kind = ?kind, text = %text, "status banner");
        self.current = Some(StatusBanner { kind, text });
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.publish(BannerKind::Success, text);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.publish(BannerKind::Error, text);
    }
}
