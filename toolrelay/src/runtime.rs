//! Runtime wiring from an [`AppConfig`] to ready agent sessions.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use tchat::{AgentLoopHooks, AgentPolicy, AgentSession};
#[cfg(feature = "gateway-gigachat")]
use tobserve::SafeGatewayHooks;
use tobserve::{RelayObservabilityHooks, SafeAgentHooks, SafeToolHooks};
use tprovider::{CompletionGateway, ProviderError};
use ttooling::{ToolError, ToolInvoker, ToolRegistry};

use crate::config::{AppConfig, ConfigError};

#[derive(Debug)]
pub enum SetupError {
    Config(ConfigError),
    Gateway(ProviderError),
    Tooling(ToolError),
}

impl Display for SetupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(error) => write!(f, "configuration error: {error}"),
            Self::Gateway(error) => write!(f, "gateway setup failed: {error}"),
            Self::Tooling(error) => write!(f, "tool backend setup failed: {error}"),
        }
    }
}

impl std::error::Error for SetupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(error) => Some(error),
            Self::Gateway(error) => Some(error),
            Self::Tooling(error) => Some(error),
        }
    }
}

impl From<ConfigError> for SetupError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<ProviderError> for SetupError {
    fn from(value: ProviderError) -> Self {
        Self::Gateway(value)
    }
}

impl From<ToolError> for SetupError {
    fn from(value: ToolError) -> Self {
        Self::Tooling(value)
    }
}

/// Everything a binary needs to open agent sessions.
///
/// The registry is shared by every session opened from the runtime; call
/// [`RelayRuntime::close`] once when the process is done with it.
#[derive(Clone)]
pub struct RelayRuntime {
    pub gateway: Arc<dyn CompletionGateway>,
    pub registry: Arc<ToolRegistry>,
    pub invoker: Arc<ToolInvoker>,
    pub policy: AgentPolicy,
    pub system_context: Option<String>,
    hooks: Arc<dyn AgentLoopHooks>,
    metrics: bool,
}

impl RelayRuntime {
    /// Tool and agent hooks log through `tracing`; see
    /// [`RelayRuntime::with_metrics`] to add the metrics layer.
    pub fn new(
        gateway: Arc<dyn CompletionGateway>,
        registry: Arc<ToolRegistry>,
        policy: AgentPolicy,
    ) -> Self {
        let observer = RelayObservabilityHooks::relay(false);
        let invoker = ToolInvoker::new(Arc::clone(&registry))
            .with_hooks(Arc::new(SafeToolHooks::new(observer)));

        Self {
            gateway,
            registry,
            invoker: Arc::new(invoker),
            policy,
            system_context: None,
            hooks: Arc::new(SafeAgentHooks::new(observer)),
            metrics: false,
        }
    }

    /// Reinstalls tool and agent hooks with or without the metrics layer.
    pub fn with_metrics(mut self, enabled: bool) -> Self {
        let observer = RelayObservabilityHooks::relay(enabled);
        let invoker = ToolInvoker::new(Arc::clone(&self.registry))
            .with_hooks(Arc::new(SafeToolHooks::new(observer)));

        self.invoker = Arc::new(invoker);
        self.hooks = Arc::new(SafeAgentHooks::new(observer));
        self.metrics = enabled;
        self
    }

    pub fn metrics_enabled(&self) -> bool {
        self.metrics
    }

    pub fn with_system_context(mut self, context: impl Into<String>) -> Self {
        self.system_context = Some(context.into());
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn AgentLoopHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Opens a fresh session advertising the registry's whole catalog.
    pub fn session(&self) -> AgentSession {
        let mut session = AgentSession::builder(Arc::clone(&self.gateway), self.invoker.clone())
            .catalog(self.registry.catalog().iter().cloned())
            .policy(self.policy.clone())
            .hooks(Arc::clone(&self.hooks))
            .build();

        if let Some(context) = &self.system_context {
            session.set_context(context.clone());
        }
        session
    }

    pub async fn close(&self) {
        self.registry.close().await;
    }
}

impl std::fmt::Debug for RelayRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayRuntime")
            .field("gateway", &self.gateway.id())
            .field("registry", &self.registry)
            .field("policy", &self.policy)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

/// Builds the configured gateway. Credentials are resolved here so no
/// backend process is started when they are missing.
#[cfg(feature = "gateway-gigachat")]
pub fn build_gateway(config: &AppConfig) -> Result<Arc<dyn CompletionGateway>, SetupError> {
    use tprovider::adapters::gigachat::{GigaChatConfig, GigaChatGateway};

    let credentials = config.resolve_credentials()?;
    let settings = &config.gateway;
    let gateway_config = GigaChatConfig {
        oauth_url: settings.oauth_url.clone(),
        base_url: settings.base_url.clone(),
        scope: settings.scope.clone(),
        timeout: settings.timeout(),
        accept_invalid_certs: settings.accept_invalid_certs,
        retry: settings.retry_policy(),
    };

    let gateway = GigaChatGateway::from_config(&gateway_config, credentials)?
        .with_hooks(Arc::new(SafeGatewayHooks::new(
            RelayObservabilityHooks::relay(config.observability.metrics),
        )))
        .with_fallback_model(config.agent.model.clone());
    Ok(Arc::new(gateway))
}

#[cfg(not(feature = "gateway-gigachat"))]
pub fn build_gateway(_config: &AppConfig) -> Result<Arc<dyn CompletionGateway>, SetupError> {
    Err(SetupError::Gateway(ProviderError::invalid_request(
        "gigachat support is disabled; enable feature `gateway-gigachat`",
    )))
}

/// Builds the gateway, then connects every configured stdio backend.
pub async fn connect_runtime(config: &AppConfig) -> Result<RelayRuntime, SetupError> {
    let gateway = build_gateway(config)?;
    let registry = ToolRegistry::connect_stdio(config.backend_targets()).await?;
    tracing::info!(
        backends = registry.backend_ids().len(),
        tools = registry.tool_count(),
        "tool registry ready"
    );

    let mut runtime = RelayRuntime::new(gateway, Arc::new(registry), config.agent_policy())
        .with_metrics(config.observability.metrics);
    if let Some(context) = config.system_context() {
        runtime = runtime.with_system_context(context);
    }
    Ok(runtime)
}
