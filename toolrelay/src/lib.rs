//! Unified facade over the toolrelay workspace crates.
//!
//! Applications load an [`AppConfig`](config::AppConfig), call
//! [`connect_runtime`](runtime::connect_runtime), and open one
//! [`AgentSession`] per conversation.
//!
//! ```rust
//! use toolrelay::{Role, tr_messages};
//!
//! let history = tr_messages![system => "Answer briefly."];
//! assert_eq!(history[0].role(), Role::System);
//! ```

mod macros;

pub mod config;
pub mod prelude;
pub mod runtime;
pub mod util;

pub use tchat;
pub use tcommon;
pub use tobserve;
pub use tprovider;
pub use ttooling;

pub use tchat::{
    AgentLoopHooks, AgentPolicy, AgentSession, AgentSessionBuilder, ChatError, ChatErrorKind,
    LoopPhase, NoopAgentLoopHooks, Transcript, TurnReport, function_result_payload,
};
pub use tcommon::{BackendId, BoxFuture, MetadataMap, SessionId, TraceId};
pub use tobserve::{
    LayeredHooks, MetricsObservabilityHooks, RelayObservabilityHooks, SafeAgentHooks,
    SafeGatewayHooks, SafeToolHooks, TracingObservabilityHooks,
};
pub use tprovider::{
    CompletionChoice, CompletionGateway, CompletionRequest, CompletionResponse, CredentialKind,
    CredentialSource, Credentials, FinishReason, FunctionCall, GatewayFuture, GatewayId,
    GatewayOperationHooks, Message, NoopGatewayHooks, ProviderError, ProviderErrorKind,
    RetryPolicy, Role, TokenUsage, ToolArguments, ToolDefinition,
};
pub use ttooling::{
    BackendConnector, BackendSession, BackendTarget, McpStdioSession, NoopToolRuntimeHooks,
    StdioConnector, ToolDescriptor, ToolError, ToolErrorKind, ToolExecutionContext,
    ToolExecutionResult, ToolFuture, ToolInvoker, ToolRegistry, ToolRuntime, ToolRuntimeHooks,
};

pub use config::{AppConfig, ConfigError, ConfigErrorKind, ObservabilitySettings};
pub use runtime::{RelayRuntime, SetupError, build_gateway, connect_runtime};
pub use util::{
    cancel_on_shutdown, init_logging, system_message, timestamp, transcript_with_context,
    user_message,
};

#[cfg(test)]
mod tests {
    use crate::Role;

    #[test]
    fn tr_msg_macro_creates_expected_message() {
        let message = crate::tr_msg!(user => "hello");
        assert_eq!(message.role(), Role::User);
        assert_eq!(message.content(), "hello");
    }

    #[test]
    fn tr_messages_macro_builds_message_vector() {
        let messages = crate::tr_messages![
            system => "You are concise.",
            user => "How much is bitcoin price in usd?",
            function => r#"{"name":"get_crypto_price","result":"1"}"#,
        ];

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role(), Role::System);
        assert_eq!(messages[1].role(), Role::User);
        assert_eq!(messages[2].role(), Role::Function);
        assert!(messages[2].function_call().is_none());
    }
}
