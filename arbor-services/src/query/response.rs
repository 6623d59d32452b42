//! Response envelopes of the assistant service and their normalization.

use serde::{Deserialize, Serialize};

/// Shown when a generate reply carries no usable text.
pub const EMPTY_REPLY: &str = "Sorry, I couldn't process your request.";
/// Shown when a search finds nothing.
pub const NO_MATCH: &str = "No matching file found.";

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// The uniform message the assistant panel displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub role: Role,
    pub content: String,
    /// True when the content describes a failure rather than an answer.
    #[serde(default)]
    pub failed: bool,
}

impl AssistantMessage {
    pub fn reply(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            failed: false,
        }
    }

    pub fn failure(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            failed: true,
        }
    }
}

/// Reply of `/ai-assistant` for the generate action.
///
/// The text is read from `response`; `ollama_response` is the spelling the
/// service currently sends. `content` is not part of the envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateEnvelope {
    pub response: Option<String>,
    pub ollama_response: Option<String>,
    pub error: Option<String>,
    pub message: Option<String>,
}

impl GenerateEnvelope {
    pub fn into_message(self) -> AssistantMessage {
        if let Some(error) = self.error {
            return AssistantMessage::failure(join_detail(error, self.message));
        }
        match self.response.or(self.ollama_response) {
            Some(text) if !text.trim().is_empty() => AssistantMessage::reply(text),
            _ => AssistantMessage::failure(EMPTY_REPLY),
        }
    }
}

/// Reply of `/summarize-document`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummarizeEnvelope {
    pub summary: Option<String>,
    pub error: Option<String>,
}

impl SummarizeEnvelope {
    pub fn into_message(self) -> AssistantMessage {
        match (self.summary, self.error) {
            (_, Some(error)) => AssistantMessage::failure(error),
            (Some(summary), None) => AssistantMessage::reply(summary),
            (None, None) => AssistantMessage::failure(EMPTY_REPLY),
        }
    }
}

/// Best match reported by `/search-files`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopMatch {
    #[serde(default)]
    pub file_path: String,
    /// A number or a numeric string, depending on the model output.
    #[serde(default)]
    pub confidence: serde_json::Value,
    #[serde(default)]
    pub context: String,
}

/// Reply of `/search-files`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchEnvelope {
    #[serde(default)]
    pub faiss_top_files: Vec<String>,
    pub top_match: Option<TopMatch>,
    pub error: Option<String>,
}

impl SearchEnvelope {
    pub fn into_message(self) -> AssistantMessage {
        if let Some(error) = self.error {
            return AssistantMessage::failure(error);
        }
        let Some(top) = self.top_match.filter(|m| !m.file_path.is_empty()) else {
            return AssistantMessage::reply(NO_MATCH);
        };

        let confidence = match &top.confidence {
            serde_json::Value::String(s) if !s.is_empty() => format!(" (confidence {})", s),
            serde_json::Value::Number(n) => format!(" (confidence {})", n),
            _ => String::new(),
        };
        let mut content = format!("Best match: {}{}", top.file_path, confidence);
        if !top.context.is_empty() {
            content.push('\n');
            content.push_str(&top.context);
        }
        AssistantMessage::reply(content)
    }
}

fn join_detail(error: String, detail: Option<String>) -> String {
    match detail {
        Some(detail) if !detail.is_empty() => format!("{}: {}", error, detail),
        _ => error,
    }
}
