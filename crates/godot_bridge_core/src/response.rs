//! Uniform response envelope and failure translation.

use serde::{Deserialize, Serialize};

use crate::BridgeError;

pub const FALLBACK_SUGGESTION: &str = "Check the server logs for details";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn as_text(&self) -> &str {
        match self {
            Self::Text { text } => text,
        }
    }
}

/// What every operation returns to the tool layer, success or failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub content: Vec<ContentBlock>,
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl ToolResponse {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
            is_error: false,
        }
    }

    /// The single construction point for failures: the message block, then a
    /// "Possible solutions" block. An empty suggestion list falls back to
    /// [`FALLBACK_SUGGESTION`], so the second block is always present.
    pub fn error<I, S>(message: impl Into<String>, suggestions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let message = message.into();
        let mut suggestions: Vec<String> = suggestions
            .into_iter()
            .map(Into::into)
            .filter(|s: &String| !s.trim().is_empty())
            .collect();
        if suggestions.is_empty() {
            suggestions.push(FALLBACK_SUGGESTION.to_string());
        }
        tracing::warn!(message = %message, "Returning error response");

        Self {
            content: vec![
                ContentBlock::text(message),
                ContentBlock::text(format!(
                    "Possible solutions:\n- {}",
                    suggestions.join("\n- ")
                )),
            ],
            is_error: true,
        }
    }

    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(ContentBlock::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<BridgeError> for ToolResponse {
    fn from(err: BridgeError) -> Self {
        Self::from(&err)
    }
}

impl From<&BridgeError> for ToolResponse {
    fn from(err: &BridgeError) -> Self {
        Self::error(err.to_string(), err.suggestions())
    }
}
