use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One chunk kind in the LLM token stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    Text,
    ToolUse,
    ToolResult,
    Status,
    Error,
    Final,
}

/// A single unit of the LLM token stream. `is_final=true` MUST appear on
/// exactly one chunk per stream, and the transport never coalesces it away.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChunk {
    #[serde(rename = "type")]
    pub kind: ChunkKind,
    pub content: Value,
    pub is_final: bool,
    pub model: Option<String>,
}

impl StreamChunk {
    pub fn text(content: impl Into<String>, model: Option<String>) -> Self {
        Self { kind: ChunkKind::Text, content: Value::String(content.into()), is_final: false, model }
    }

    pub fn status(content: impl Into<String>) -> Self {
        Self { kind: ChunkKind::Status, content: Value::String(content.into()), is_final: false, model: None }
    }

    pub fn tool_use(content: Value, model: Option<String>) -> Self {
        Self { kind: ChunkKind::ToolUse, content, is_final: false, model }
    }

    pub fn tool_result(content: Value) -> Self {
        Self { kind: ChunkKind::ToolResult, content, is_final: false, model: None }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { kind: ChunkKind::Error, content: Value::String(message.into()), is_final: true, model: None }
    }

    pub fn finish(content: Value, model: Option<String>) -> Self {
        Self { kind: ChunkKind::Final, content, is_final: true, model }
    }

    /// Coalescing candidates are non-final chunks whose content is plain
    /// text — `tool_use`/`tool_result` pairs and `final`/`error` chunks are
    /// never merged.
    pub(crate) fn coalesces_with(&self, other: &StreamChunk) -> bool {
        !self.is_final
            && !other.is_final
            && self.kind == other.kind
            && matches!(self.kind, ChunkKind::Text | ChunkKind::Status)
    }

    pub(crate) fn merge(mut self, next: StreamChunk) -> StreamChunk {
        if let (Value::String(a), Value::String(b)) = (&mut self.content, &next.content) {
            a.push_str(b);
        } else {
            self.content = next.content;
        }
        self.model = next.model.or(self.model);
        self
    }
}
