//! In-memory backend doubles shared by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tcommon::BackendId;
use tokio_util::sync::CancellationToken;
use tprovider::ToolArguments;

use crate::{
    BackendConnector, BackendSession, BackendTarget, BackendToolInfo, CallToolOutcome, ToolError,
    ToolFuture,
};

pub(crate) struct FakeSession {
    id: BackendId,
    tools: Vec<BackendToolInfo>,
    list_error: Option<ToolError>,
    results: HashMap<String, Result<CallToolOutcome, ToolError>>,
    delay: Option<Duration>,
    calls: Mutex<Vec<(String, ToolArguments)>>,
    closes: AtomicUsize,
    ended: AtomicBool,
}

impl FakeSession {
    pub(crate) fn new(id: &str) -> Self {
        Self {
            id: BackendId::from(id),
            tools: Vec::new(),
            list_error: None,
            results: HashMap::new(),
            delay: None,
            calls: Mutex::new(Vec::new()),
            closes: AtomicUsize::new(0),
            ended: AtomicBool::new(false),
        }
    }

    pub(crate) fn with_tool(mut self, tool: BackendToolInfo) -> Self {
        self.tools.push(tool);
        self
    }

    pub(crate) fn with_list_error(mut self, error: ToolError) -> Self {
        self.list_error = Some(error);
        self
    }

    pub(crate) fn with_result(
        mut self,
        tool: &str,
        result: Result<CallToolOutcome, ToolError>,
    ) -> Self {
        self.results.insert(tool.to_string(), result);
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub(crate) fn handle(self: &Arc<Self>) -> Arc<dyn BackendSession> {
        Arc::clone(self) as Arc<dyn BackendSession>
    }

    /// Simulates the provider going away without being closed.
    pub(crate) fn end(&self) {
        self.ended.store(true, Ordering::SeqCst);
    }

    pub(crate) fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub(crate) fn calls(&self) -> Vec<(String, ToolArguments)> {
        self.calls.lock().expect("calls lock").clone()
    }
}

impl BackendSession for FakeSession {
    fn id(&self) -> &BackendId {
        &self.id
    }

    fn list_tools<'a>(&'a self) -> ToolFuture<'a, Result<Vec<BackendToolInfo>, ToolError>> {
        Box::pin(async move {
            match &self.list_error {
                Some(error) => Err(error.clone()),
                None => Ok(self.tools.clone()),
            }
        })
    }

    fn call_tool<'a>(
        &'a self,
        name: &'a str,
        arguments: ToolArguments,
        cancellation: &'a CancellationToken,
    ) -> ToolFuture<'a, Result<CallToolOutcome, ToolError>> {
        Box::pin(async move {
            self.calls
                .lock()
                .expect("calls lock")
                .push((name.to_string(), arguments));

            if let Some(delay) = self.delay {
                tokio::select! {
                    _ = cancellation.cancelled() => {
                        return Err(ToolError::cancelled("call cancelled"));
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            self.results
                .get(name)
                .cloned()
                .unwrap_or_else(|| Ok(CallToolOutcome::text(format!("{name} ok"))))
        })
    }

    fn close<'a>(&'a self) -> ToolFuture<'a, ()> {
        Box::pin(async move {
            self.closes.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn is_closed(&self) -> bool {
        self.ended.load(Ordering::SeqCst) || self.close_count() > 0
    }
}

#[derive(Default)]
pub(crate) struct FakeConnector {
    sessions: HashMap<String, Arc<FakeSession>>,
    failing: Vec<String>,
    connected: Mutex<Vec<String>>,
}

impl FakeConnector {
    pub(crate) fn with_session(mut self, session: Arc<FakeSession>) -> Self {
        self.sessions
            .insert(session.id().as_str().to_string(), session);
        self
    }

    pub(crate) fn failing(mut self, id: &str) -> Self {
        self.failing.push(id.to_string());
        self
    }

    pub(crate) fn connected(&self) -> Vec<String> {
        self.connected.lock().expect("connected lock").clone()
    }
}

impl BackendConnector for FakeConnector {
    fn connect<'a>(
        &'a self,
        id: BackendId,
        _target: &'a BackendTarget,
    ) -> ToolFuture<'a, Result<Arc<dyn BackendSession>, ToolError>> {
        Box::pin(async move {
            self.connected
                .lock()
                .expect("connected lock")
                .push(id.as_str().to_string());

            if self.failing.iter().any(|failing| failing == id.as_str()) {
                return Err(ToolError::transport("process exited during startup"));
            }

            self.sessions
                .get(id.as_str())
                .map(FakeSession::handle)
                .ok_or_else(|| ToolError::configuration(format!("no fake for '{id}'")))
        })
    }
}
