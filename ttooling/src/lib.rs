//! Tool backends, routing, and execution for the toolrelay agent loop.

mod backend;
mod error;
mod hooks;
mod invoker;
pub mod mcp;
mod registry;
pub mod schema;
#[cfg(test)]
mod test_support;
mod types;

pub mod prelude {
    pub use crate::{
        BackendConnection, BackendSession, BackendTarget, NoopToolRuntimeHooks, StdioConnector,
        ToolDescriptor, ToolError, ToolErrorKind, ToolExecutionContext, ToolExecutionResult,
        ToolFuture, ToolInvoker, ToolRegistry, ToolRuntime, ToolRuntimeHooks,
    };
}

pub use backend::{BackendConnection, BackendConnector, BackendSession, BackendTarget, ToolFuture};
pub use error::{ToolError, ToolErrorKind};
pub use hooks::{NoopToolRuntimeHooks, ToolRuntimeHooks};
pub use invoker::{ToolInvoker, ToolRuntime, normalize_outcome};
pub use mcp::{McpStdioSession, StdioConnector};
pub use registry::ToolRegistry;
pub use types::{
    BackendToolInfo, CallToolOutcome, ContentBlock, ToolDescriptor, ToolExecutionContext,
    ToolExecutionResult,
};
