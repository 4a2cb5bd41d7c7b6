//! MCP over stdio: the production backend transport.

mod protocol;
mod session;

use std::sync::Arc;

use tcommon::BackendId;

use crate::{BackendConnector, BackendSession, BackendTarget, ToolError, ToolFuture};

pub use session::McpStdioSession;

/// Connects backends by spawning them as MCP stdio servers.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdioConnector;

impl BackendConnector for StdioConnector {
    fn connect<'a>(
        &'a self,
        id: BackendId,
        target: &'a BackendTarget,
    ) -> ToolFuture<'a, Result<Arc<dyn BackendSession>, ToolError>> {
        Box::pin(async move {
            let session = McpStdioSession::spawn(id, target).await?;
            Ok(Arc::new(session) as Arc<dyn BackendSession>)
        })
    }
}
