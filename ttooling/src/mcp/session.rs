//! MCP client session over a child process's stdin/stdout.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use futures_timer::Delay;
use serde_json::{Value, json};
use tcommon::BackendId;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{Mutex as AsyncMutex, oneshot};
use tokio_util::sync::CancellationToken;
use tprovider::ToolArguments;
use tracing::{debug, warn};

use crate::{BackendSession, BackendTarget, BackendToolInfo, CallToolOutcome, ToolError, ToolFuture};

use super::protocol::{self, Inbound};

const INITIALIZE_TIMEOUT: Duration = Duration::from_secs(30);

type PendingSender = oneshot::Sender<Result<Value, ToolError>>;

/// One running MCP server.
///
/// Requests from concurrent callers share the pipe: writes are serialized
/// and replies are matched back to callers by request id.
pub struct McpStdioSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    id: BackendId,
    child: AsyncMutex<Option<Child>>,
    writer: AsyncMutex<Option<BufWriter<ChildStdin>>>,
    pending: Mutex<HashMap<String, PendingSender>>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

/// Drops the pending entry when a request future goes away early.
struct PendingGuard<'a> {
    inner: &'a SessionInner,
    id: &'a str,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.inner.pending_map().remove(self.id);
    }
}

impl McpStdioSession {
    /// Starts the backend process and completes the MCP handshake.
    pub async fn spawn(id: BackendId, target: &BackendTarget) -> Result<Self, ToolError> {
        let mut command = Command::new(&target.command);
        command
            .args(&target.args)
            .envs(&target.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(workdir) = &target.workdir {
            command.current_dir(workdir);
        }

        let mut child = command.spawn().map_err(|err| {
            ToolError::configuration(format!(
                "failed to start '{}': {err}",
                target.command.display()
            ))
            .with_backend_id(id.clone())
        })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            ToolError::transport("failed to capture backend stdin").with_backend_id(id.clone())
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            ToolError::transport("failed to capture backend stdout").with_backend_id(id.clone())
        })?;

        let inner = Arc::new(SessionInner {
            id,
            child: AsyncMutex::new(Some(child)),
            writer: AsyncMutex::new(Some(BufWriter::new(stdin))),
            pending: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        });

        tokio::spawn(SessionInner::reader_loop(Arc::downgrade(&inner), stdout));

        let session = Self { inner };
        if let Err(error) = session.initialize().await {
            session.inner.shutdown("backend failed to initialize").await;
            return Err(error);
        }

        debug!(backend = %session.inner.id, "MCP session initialized");
        Ok(session)
    }

    pub fn backend_id(&self) -> &BackendId {
        &self.inner.id
    }

    async fn initialize(&self) -> Result<(), ToolError> {
        let handshake = CancellationToken::new();
        let request = self
            .inner
            .request("initialize", protocol::initialize_params(), &handshake);
        let deadline = Delay::new(INITIALIZE_TIMEOUT);

        tokio::select! {
            result = request => {
                result?;
            }
            _ = deadline => {
                return Err(ToolError::timeout("backend did not answer initialize in time")
                    .with_backend_id(self.inner.id.clone()));
            }
        }

        self.inner
            .write_message(&protocol::notification("notifications/initialized", json!({})))
            .await
    }
}

impl SessionInner {
    fn pending_map(&self) -> MutexGuard<'_, HashMap<String, PendingSender>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn closed_error(&self) -> ToolError {
        ToolError::transport("backend session is closed").with_backend_id(self.id.clone())
    }

    async fn reader_loop(inner: Weak<Self>, stdout: ChildStdout) {
        let mut lines = BufReader::new(stdout).lines();

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(err) => {
                    if let Some(inner) = inner.upgrade() {
                        warn!(backend = %inner.id, %err, "failed to read from backend");
                    }
                    break;
                }
            };

            let Some(inner) = inner.upgrade() else {
                return;
            };

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match serde_json::from_str::<Value>(trimmed) {
                Ok(value) => inner.dispatch(value).await,
                Err(_) => debug!(
                    backend = %inner.id,
                    line = trimmed,
                    "skipping non-JSON line from backend"
                ),
            }
        }

        if let Some(inner) = inner.upgrade() {
            debug!(backend = %inner.id, "backend stdout closed");
            inner.closed.store(true, Ordering::SeqCst);
            inner.fail_all_pending("backend process exited");
        }
    }

    async fn dispatch(&self, value: Value) {
        match protocol::classify(value) {
            Inbound::Response { id, outcome } => {
                let Some(sender) = self.pending_map().remove(&id) else {
                    debug!(backend = %self.id, response_id = id, "response for unknown request");
                    return;
                };
                let outcome = outcome.map_err(|error| {
                    ToolError::execution(format!("rpc error {}: {}", error.code, error.message))
                        .with_backend_id(self.id.clone())
                });
                let _ = sender.send(outcome);
            }
            Inbound::Request { id, method } => {
                if method != "ping" {
                    warn!(backend = %self.id, method, "backend sent unsupported request");
                }
                let reply = protocol::server_request_reply(id, &method);
                if let Err(err) = self.write_message(&reply).await {
                    warn!(backend = %self.id, %err, "failed to answer backend request");
                }
            }
            Inbound::Notification { method } => {
                debug!(backend = %self.id, method, "notification from backend");
            }
            Inbound::Unrecognized => {
                debug!(backend = %self.id, "ignoring unrecognized message");
            }
        }
    }

    async fn request(
        &self,
        method: &str,
        params: Value,
        cancellation: &CancellationToken,
    ) -> Result<Value, ToolError> {
        if cancellation.is_cancelled() {
            return Err(self.cancelled_error(method));
        }
        if self.closed.load(Ordering::SeqCst) {
            return Err(self.closed_error());
        }

        let id = format!("req-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = oneshot::channel();
        self.pending_map().insert(id.clone(), sender);
        let _guard = PendingGuard {
            inner: self,
            id: &id,
        };

        // Re-checked after insertion so a concurrent shutdown cannot strand the entry.
        if self.closed.load(Ordering::SeqCst) {
            return Err(self.closed_error());
        }

        self.write_message(&protocol::request(&id, method, params))
            .await?;

        tokio::select! {
            biased;
            _ = cancellation.cancelled() => Err(self.cancelled_error(method)),
            response = receiver => match response {
                Ok(outcome) => outcome,
                Err(_) => Err(self.closed_error()),
            },
        }
    }

    fn cancelled_error(&self, method: &str) -> ToolError {
        ToolError::cancelled(format!("{method} request was cancelled"))
            .with_backend_id(self.id.clone())
    }

    async fn write_message(&self, message: &Value) -> Result<(), ToolError> {
        let mut encoded = serde_json::to_string(message).map_err(|err| {
            ToolError::transport(format!("failed to encode message: {err}"))
                .with_backend_id(self.id.clone())
        })?;
        encoded.push('\n');

        let mut writer = self.writer.lock().await;
        let stream = writer.as_mut().ok_or_else(|| self.closed_error())?;
        let io_error = |err: std::io::Error| {
            ToolError::transport(format!("failed to write to backend: {err}"))
                .with_backend_id(self.id.clone())
        };
        stream.write_all(encoded.as_bytes()).await.map_err(io_error)?;
        stream.flush().await.map_err(io_error)
    }

    fn fail_all_pending(&self, reason: &str) {
        let drained = self.pending_map().drain().collect::<Vec<_>>();
        for (_, sender) in drained {
            let _ = sender.send(Err(
                ToolError::transport(reason.to_string()).with_backend_id(self.id.clone())
            ));
        }
    }

    async fn shutdown(&self, reason: &str) {
        self.closed.store(true, Ordering::SeqCst);
        self.writer.lock().await.take();

        if let Some(mut child) = self.child.lock().await.take()
            && let Err(err) = child.kill().await
        {
            debug!(backend = %self.id, %err, "backend process already exited");
        }

        self.fail_all_pending(reason);
    }
}

impl BackendSession for McpStdioSession {
    fn id(&self) -> &BackendId {
        &self.inner.id
    }

    fn list_tools<'a>(&'a self) -> ToolFuture<'a, Result<Vec<BackendToolInfo>, ToolError>> {
        Box::pin(async move {
            let never = CancellationToken::new();
            let mut tools = Vec::new();
            let mut cursor: Option<String> = None;

            loop {
                let params = match &cursor {
                    Some(cursor) => json!({ "cursor": cursor }),
                    None => json!({}),
                };
                let result = self.inner.request("tools/list", params, &never).await?;
                let (page, next) = protocol::parse_tools_page(result)
                    .map_err(|err| err.with_backend_id(self.inner.id.clone()))?;
                tools.extend(page);

                match next {
                    Some(next) if cursor.as_deref() != Some(next.as_str()) => cursor = Some(next),
                    _ => break,
                }
            }

            Ok(tools)
        })
    }

    fn call_tool<'a>(
        &'a self,
        name: &'a str,
        arguments: ToolArguments,
        cancellation: &'a CancellationToken,
    ) -> ToolFuture<'a, Result<CallToolOutcome, ToolError>> {
        Box::pin(async move {
            let params = json!({
                "name": name,
                "arguments": Value::Object(arguments),
            });
            let result = self
                .inner
                .request("tools/call", params, cancellation)
                .await
                .map_err(|err| err.with_tool_name(name))?;

            protocol::parse_call_result(result)
                .map_err(|err| err.with_tool_name(name).with_backend_id(self.inner.id.clone()))
        })
    }

    fn close<'a>(&'a self) -> ToolFuture<'a, ()> {
        Box::pin(async move {
            self.inner.shutdown("backend session closed").await;
        })
    }

    fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }
}
