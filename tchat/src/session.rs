//! Per-conversation agent session.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tcommon::SessionId;
use tokio_util::sync::CancellationToken;
use tprovider::{CompletionGateway, Message};
use ttooling::{ToolDescriptor, ToolRuntime};

use crate::agent_loop::AgentLoop;
use crate::{
    AgentLoopHooks, AgentPolicy, ChatError, NoopAgentLoopHooks, Transcript, TurnReport,
};

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

/// One conversation: its transcript, the advertised tools, and loop policy.
///
/// The session borrows tool backends through its [`ToolRuntime`]; it never
/// owns or closes them, so several sessions can share one registry.
pub struct AgentSession {
    id: SessionId,
    gateway: Arc<dyn CompletionGateway>,
    tools: Arc<dyn ToolRuntime>,
    catalog: Vec<ToolDescriptor>,
    policy: AgentPolicy,
    hooks: Arc<dyn AgentLoopHooks>,
    transcript: Transcript,
    last_turn: Option<TurnReport>,
}

pub struct AgentSessionBuilder {
    gateway: Arc<dyn CompletionGateway>,
    tools: Arc<dyn ToolRuntime>,
    catalog: Vec<ToolDescriptor>,
    policy: AgentPolicy,
    hooks: Arc<dyn AgentLoopHooks>,
    session_id: Option<SessionId>,
    transcript: Transcript,
}

impl AgentSessionBuilder {
    pub fn new(gateway: Arc<dyn CompletionGateway>, tools: Arc<dyn ToolRuntime>) -> Self {
        Self {
            gateway,
            tools,
            catalog: Vec::new(),
            policy: AgentPolicy::default(),
            hooks: Arc::new(NoopAgentLoopHooks),
            session_id: None,
            transcript: Transcript::new(),
        }
    }

    pub fn catalog(mut self, catalog: impl IntoIterator<Item = ToolDescriptor>) -> Self {
        self.catalog = catalog.into_iter().collect();
        self
    }

    pub fn policy(mut self, policy: AgentPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn AgentLoopHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn session_id(mut self, session_id: impl Into<SessionId>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Resumes from earlier history instead of an empty transcript.
    pub fn transcript(mut self, transcript: Transcript) -> Self {
        self.transcript = transcript;
        self
    }

    pub fn build(self) -> AgentSession {
        let id = self.session_id.unwrap_or_else(|| {
            SessionId::new(format!(
                "session-{}",
                NEXT_SESSION.fetch_add(1, Ordering::Relaxed)
            ))
        });

        AgentSession {
            id,
            gateway: self.gateway,
            tools: self.tools,
            catalog: self.catalog,
            policy: self.policy,
            hooks: self.hooks,
            transcript: self.transcript,
            last_turn: None,
        }
    }
}

impl AgentSession {
    pub fn builder(
        gateway: Arc<dyn CompletionGateway>,
        tools: Arc<dyn ToolRuntime>,
    ) -> AgentSessionBuilder {
        AgentSessionBuilder::new(gateway, tools)
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn policy(&self) -> &AgentPolicy {
        &self.policy
    }

    pub fn catalog(&self) -> &[ToolDescriptor] {
        &self.catalog
    }

    /// Appends a system message carrying background context.
    ///
    /// Repeated calls append again; earlier context is not replaced.
    pub fn set_context(&mut self, context: impl Into<String>) {
        self.transcript.append(Message::system(context));
    }

    pub async fn send_message(&mut self, text: impl Into<String>) -> Result<String, ChatError> {
        self.send_message_with_cancel(text, &CancellationToken::new())
            .await
    }

    /// Sends one user message and drives the loop to a final answer.
    ///
    /// On failure the transcript keeps everything appended up to that point,
    /// including a function-call message whose result never arrived.
    pub async fn send_message_with_cancel(
        &mut self,
        text: impl Into<String>,
        cancellation: &CancellationToken,
    ) -> Result<String, ChatError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ChatError::invalid_request("user message must not be empty"));
        }

        let started = Instant::now();
        self.transcript.append(Message::user(text));
        self.hooks.on_turn_start(&self.id, self.transcript.len());

        let driver = AgentLoop {
            gateway: self.gateway.as_ref(),
            tools: self.tools.as_ref(),
            catalog: &self.catalog,
            policy: &self.policy,
            hooks: self.hooks.as_ref(),
            session_id: &self.id,
            cancellation,
        };

        let mut report = TurnReport::default();
        let outcome = driver.run(&mut self.transcript, &mut report).await;
        self.last_turn = Some(report);

        match &outcome {
            Ok(_) => self
                .hooks
                .on_turn_complete(&self.id, &report, started.elapsed()),
            Err(error) => self
                .hooks
                .on_turn_failed(&self.id, &report, error, started.elapsed()),
        }

        outcome
    }

    /// How the most recent user message ended, if one has been sent.
    pub fn last_turn(&self) -> Option<&TurnReport> {
        self.last_turn.as_ref()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn into_transcript(self) -> Transcript {
        self.transcript
    }
}

impl std::fmt::Debug for AgentSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentSession")
            .field("id", &self.id)
            .field("gateway", &self.gateway.id())
            .field("tools", &self.catalog.len())
            .field("policy", &self.policy)
            .field("transcript_len", &self.transcript.len())
            .finish_non_exhaustive()
    }
}
