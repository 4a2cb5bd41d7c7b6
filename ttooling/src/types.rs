//! Execution context and backend-facing value types.
//!
//! ```rust
//! use std::time::Duration;
//!
//! use ttooling::{CallToolOutcome, ContentBlock, ToolExecutionContext};
//!
//! let context = ToolExecutionContext::new("session-1")
//!     .with_trace_id("trace-7")
//!     .with_timeout(Duration::from_secs(5));
//! assert_eq!(context.session_id.as_str(), "session-1");
//!
//! let outcome = CallToolOutcome::text("price: 65000");
//! assert!(matches!(outcome.content[0], ContentBlock::Text { .. }));
//! ```

use std::time::Duration;

use serde_json::Value;
use tcommon::{BackendId, MetadataMap, SessionId, TraceId};
use tokio_util::sync::CancellationToken;
use tprovider::ToolDefinition;

/// A tool as advertised to the completion gateway.
pub type ToolDescriptor = ToolDefinition;

#[derive(Debug, Clone)]
pub struct ToolExecutionContext {
    pub session_id: SessionId,
    pub trace_id: Option<TraceId>,
    pub metadata: MetadataMap,
    pub cancellation: CancellationToken,
    pub timeout: Option<Duration>,
}

impl ToolExecutionContext {
    pub fn new(session_id: impl Into<SessionId>) -> Self {
        Self {
            session_id: session_id.into(),
            trace_id: None,
            metadata: MetadataMap::new(),
            cancellation: CancellationToken::new(),
            timeout: None,
        }
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<TraceId>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolExecutionResult {
    pub tool_name: String,
    pub backend_id: BackendId,
    pub output: String,
}

/// One typed block of a backend's call result.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Text { text: String },
    Image { mime_type: Option<String> },
    Audio { mime_type: Option<String> },
    Resource { uri: Option<String>, text: Option<String> },
    Other { kind: String },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn kind(&self) -> &str {
        match self {
            Self::Text { .. } => "text",
            Self::Image { .. } => "image",
            Self::Audio { .. } => "audio",
            Self::Resource { .. } => "resource",
            Self::Other { kind } => kind,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }

    pub fn from_value(value: &Value) -> Self {
        let field = |name: &str| value.get(name).and_then(Value::as_str).map(str::to_string);

        match value.get("type").and_then(Value::as_str) {
            Some("text") => Self::Text {
                text: field("text").unwrap_or_default(),
            },
            Some("image") => Self::Image {
                mime_type: field("mimeType"),
            },
            Some("audio") => Self::Audio {
                mime_type: field("mimeType"),
            },
            Some("resource") => {
                let resource = value.get("resource");
                let nested = |name: &str| {
                    resource
                        .and_then(|inner| inner.get(name))
                        .and_then(Value::as_str)
                        .map(str::to_string)
                };
                Self::Resource {
                    uri: nested("uri"),
                    text: nested("text"),
                }
            }
            Some(other) => Self::Other {
                kind: other.to_string(),
            },
            None => Self::Other {
                kind: "unknown".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CallToolOutcome {
    pub content: Vec<ContentBlock>,
    pub is_error: bool,
}

impl CallToolOutcome {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
            is_error: true,
        }
    }
}

/// A tool as listed by a backend, before schema normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendToolInfo {
    pub name: String,
    pub description: Option<String>,
    /// Either a schema object or a schema serialized into a string.
    pub input_schema: Option<Value>,
}

impl BackendToolInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_schema: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }
}
