//! Backend session seams: how the registry talks to tool providers.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use tcommon::{BackendId, BoxFuture};
use tokio_util::sync::CancellationToken;
use tprovider::ToolArguments;

use crate::{BackendToolInfo, CallToolOutcome, ToolError};

pub type ToolFuture<'a, T> = BoxFuture<'a, T>;

/// How to start one subprocess backend.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BackendTarget {
    pub command: PathBuf,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub workdir: Option<PathBuf>,
}

impl BackendTarget {
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(workdir.into());
        self
    }
}

/// A live session with one tool provider.
///
/// Implementations must tolerate concurrent calls from several agent
/// sessions.
pub trait BackendSession: Send + Sync {
    fn id(&self) -> &BackendId;

    fn list_tools<'a>(&'a self) -> ToolFuture<'a, Result<Vec<BackendToolInfo>, ToolError>>;

    fn call_tool<'a>(
        &'a self,
        name: &'a str,
        arguments: ToolArguments,
        cancellation: &'a CancellationToken,
    ) -> ToolFuture<'a, Result<CallToolOutcome, ToolError>>;

    /// Releases the session. Calling it more than once is a no-op.
    fn close<'a>(&'a self) -> ToolFuture<'a, ()>;

    /// True once the session can no longer serve calls, whether it was
    /// closed or the provider went away on its own.
    fn is_closed(&self) -> bool {
        false
    }
}

pub trait BackendConnector: Send + Sync {
    fn connect<'a>(
        &'a self,
        id: BackendId,
        target: &'a BackendTarget,
    ) -> ToolFuture<'a, Result<Arc<dyn BackendSession>, ToolError>>;
}

/// A connected backend together with the tool names it owns.
#[derive(Clone)]
pub struct BackendConnection {
    pub id: BackendId,
    pub session: Arc<dyn BackendSession>,
    pub tools: Vec<String>,
}

impl BackendConnection {
    pub fn owns(&self, tool_name: &str) -> bool {
        self.tools.iter().any(|name| name == tool_name)
    }
}

impl std::fmt::Debug for BackendConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConnection")
            .field("id", &self.id)
            .field("tools", &self.tools)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_builder_collects_launch_settings() {
        let target = BackendTarget::new("/usr/local/bin/prices")
            .with_args(["--stdio", "--quiet"])
            .with_env("COINGECKO_KEY", "k")
            .with_workdir("/srv");

        assert_eq!(target.command, PathBuf::from("/usr/local/bin/prices"));
        assert_eq!(target.args, vec!["--stdio".to_string(), "--quiet".to_string()]);
        assert_eq!(target.env.get("COINGECKO_KEY"), Some(&"k".to_string()));
        assert_eq!(target.workdir, Some(PathBuf::from("/srv")));
    }
}
