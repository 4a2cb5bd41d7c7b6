//! Common imports for applications built on toolrelay.

pub use crate::config::{AppConfig, ConfigError, ConfigErrorKind};
pub use crate::runtime::{RelayRuntime, SetupError, connect_runtime};
pub use crate::{
    AgentPolicy, AgentSession, ChatError, ChatErrorKind, CompletionGateway, CompletionRequest,
    CompletionResponse, FunctionCall, Message, Role, ToolError, ToolErrorKind, ToolInvoker,
    ToolRegistry, Transcript, tr_messages, tr_msg,
};
pub use tcommon::{BackendId, SessionId};
pub use tokio_util::sync::CancellationToken;
