//! Agent-loop errors and their mapping from gateway and tool failures.

use std::error::Error;
use std::fmt::{Display, Formatter};

use tprovider::ProviderError;
use ttooling::{ToolError, ToolErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorKind {
    InvalidRequest,
    /// The completion call failed or produced no usable choice.
    Gateway,
    ToolNotFound,
    ToolExecution,
    ToolResultMalformed,
    /// The model kept requesting tools past the round-trip cap.
    MaxIterationsExceeded,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatError {
    pub kind: ChatErrorKind,
    pub message: String,
    pub tool_name: Option<String>,
    pub iteration: Option<usize>,
}

impl ChatError {
    pub fn new(kind: ChatErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            tool_name: None,
            iteration: None,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::InvalidRequest, message)
    }

    pub fn gateway(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Gateway, message)
    }

    pub fn tool_not_found(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::ToolNotFound, message)
    }

    pub fn tool_execution(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::ToolExecution, message)
    }

    pub fn tool_result_malformed(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::ToolResultMalformed, message)
    }

    pub fn max_iterations_exceeded(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::MaxIterationsExceeded, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Cancelled, message)
    }

    pub fn with_tool_name(mut self, tool_name: impl Into<String>) -> Self {
        self.tool_name = Some(tool_name.into());
        self
    }

    pub fn with_iteration(mut self, iteration: usize) -> Self {
        self.iteration = Some(iteration);
        self
    }

    /// Tool-side failures that a corrected user message might avoid.
    pub fn is_tool_failure(&self) -> bool {
        matches!(
            self.kind,
            ChatErrorKind::ToolNotFound
                | ChatErrorKind::ToolExecution
                | ChatErrorKind::ToolResultMalformed
        )
    }
}

impl Display for ChatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.kind)?;
        match (&self.tool_name, self.iteration) {
            (Some(tool), Some(iteration)) => write!(f, " [tool={tool}, iteration={iteration}]")?,
            (Some(tool), None) => write!(f, " [tool={tool}]")?,
            (None, Some(iteration)) => write!(f, " [iteration={iteration}]")?,
            (None, None) => {}
        }
        write!(f, ": {}", self.message)
    }
}

impl Error for ChatError {}

impl From<ProviderError> for ChatError {
    fn from(value: ProviderError) -> Self {
        ChatError::gateway(value.to_string())
    }
}

impl From<ToolError> for ChatError {
    fn from(value: ToolError) -> Self {
        let kind = match value.kind {
            ToolErrorKind::NotFound => ChatErrorKind::ToolNotFound,
            ToolErrorKind::ResultMalformed => ChatErrorKind::ToolResultMalformed,
            ToolErrorKind::Cancelled => ChatErrorKind::Cancelled,
            ToolErrorKind::Execution
            | ToolErrorKind::Transport
            | ToolErrorKind::Timeout
            | ToolErrorKind::InvalidSchema
            | ToolErrorKind::NameCollision
            | ToolErrorKind::Configuration => ChatErrorKind::ToolExecution,
        };

        let mut error = ChatError::new(kind, value.message);
        error.tool_name = value.tool_name;
        error
    }
}
