//! Tool routing and execution errors.

use std::error::Error;
use std::fmt::{Display, Formatter};

use tcommon::BackendId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolErrorKind {
    /// No backend owns the requested tool name.
    NotFound,
    /// The backend reported a failure for the call.
    Execution,
    /// The backend answered with zero blocks or a non-text first block.
    ResultMalformed,
    InvalidSchema,
    NameCollision,
    Configuration,
    Transport,
    Timeout,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub message: String,
    pub retryable: bool,
    pub tool_name: Option<String>,
    pub backend_id: Option<BackendId>,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
            tool_name: None,
            backend_id: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::NotFound, message, false)
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Execution, message, false)
    }

    pub fn result_malformed(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::ResultMalformed, message, false)
    }

    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidSchema, message, false)
    }

    pub fn name_collision(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::NameCollision, message, false)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Configuration, message, false)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Transport, message, true)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Timeout, message, true)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Cancelled, message, false)
    }

    pub fn with_tool_name(mut self, tool_name: impl Into<String>) -> Self {
        self.tool_name = Some(tool_name.into());
        self
    }

    pub fn with_backend_id(mut self, backend_id: BackendId) -> Self {
        self.backend_id = Some(backend_id);
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }
}

impl Display for ToolError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (&self.tool_name, &self.backend_id) {
            (Some(tool_name), Some(backend_id)) => write!(
                f,
                "{:?} [tool={}, backend={}]: {}",
                self.kind, tool_name, backend_id, self.message
            ),
            (Some(tool_name), None) => {
                write!(f, "{:?} [tool={}]: {}", self.kind, tool_name, self.message)
            }
            (None, Some(backend_id)) => {
                write!(f, "{:?} [backend={}]: {}", self.kind, backend_id, self.message)
            }
            (None, None) => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl Error for ToolError {}
