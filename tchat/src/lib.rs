//! Conversation state and the agent loop that ties a completion gateway to
//! tool backends.

mod agent_loop;
mod envelope;
mod error;
mod hooks;
mod policy;
mod session;
mod transcript;

pub mod prelude {
    pub use crate::{
        AgentLoopHooks, AgentPolicy, AgentSession, AgentSessionBuilder, ChatError, ChatErrorKind,
        LoopPhase, NoopAgentLoopHooks, Transcript, TurnReport,
    };
    pub use tcommon::{MetadataMap, SessionId, TraceId};
    pub use ttooling::{
        ToolDescriptor, ToolError, ToolErrorKind, ToolExecutionContext, ToolExecutionResult,
        ToolInvoker, ToolRegistry, ToolRuntime,
    };
}

pub use agent_loop::{LoopPhase, TurnReport};
pub use envelope::function_result_payload;
pub use error::{ChatError, ChatErrorKind};
pub use hooks::{AgentLoopHooks, NoopAgentLoopHooks};
pub use policy::{AgentPolicy, DEFAULT_MAX_TOOL_ROUND_TRIPS, DEFAULT_MODEL};
pub use session::{AgentSession, AgentSessionBuilder};
pub use tcommon::{MetadataMap, SessionId, TraceId};
pub use transcript::Transcript;
pub use ttooling::{
    ToolDescriptor, ToolError, ToolErrorKind, ToolExecutionContext, ToolExecutionResult,
    ToolInvoker, ToolRegistry, ToolRuntime,
};
