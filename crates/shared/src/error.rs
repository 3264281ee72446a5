use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error body returned by the API on non-success statuses.
///
/// `detail` is usually a string, but request validation failures carry a
/// list of field errors instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: Value,
}

impl ErrorBody {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: Value::String(detail.into()),
        }
    }

    pub fn detail_text(&self) -> Option<String> {
        match &self.detail {
            Value::Null => None,
            Value::String(text) if text.trim().is_empty() => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Extracts `detail` from a raw response body, if it is a JSON error body.
    pub fn parse_detail(raw: &str) -> Option<String> {
        serde_json::from_str::<Self>(raw)
            .ok()
            .and_then(|body| body.detail_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_string_and_structured_details() {
        assert_eq!(
            ErrorBody::parse_detail(r#"{"detail":"Object 'a.txt' not found"}"#).as_deref(),
            Some("Object 'a.txt' not found")
        );
        assert_eq!(
            ErrorBody::parse_detail(r#"{"detail":[{"loc":["query","bucket"]}]}"#).as_deref(),
            Some(r#"[{"loc":["query","bucket"]}]"#)
        );
        assert_eq!(ErrorBody::parse_detail(r#"{"detail":"  "}"#), None);
        assert_eq!(ErrorBody::parse_detail("Internal Server Error"), None);
    }
}
