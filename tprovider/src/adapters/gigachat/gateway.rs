//! GigaChat completion gateway over a pluggable transport.

use std::sync::Arc;

use crate::{
    CompletionGateway, CompletionRequest, CompletionResponse, CredentialKind, Credentials,
    GatewayFuture, GatewayId, GatewayOperationHooks, NoopGatewayHooks, ProviderError,
    ProviderErrorKind, RetryPolicy, execute_with_retry,
};

use super::auth::TokenCache;
use super::transport::{GigaChatHttpTransport, GigaChatTransport};
use super::types::{DEFAULT_MODEL, GigaChatConfig, GigaChatRequest, GigaChatResponse};

#[derive(Clone)]
pub struct GigaChatGateway {
    credentials: Credentials,
    transport: Arc<dyn GigaChatTransport>,
    tokens: Arc<TokenCache>,
    retry_policy: RetryPolicy,
    hooks: Arc<dyn GatewayOperationHooks>,
    fallback_model: String,
    repetition_penalty: f32,
}

impl GigaChatGateway {
    pub fn new(credentials: Credentials, transport: Arc<dyn GigaChatTransport>) -> Self {
        Self {
            credentials,
            transport,
            tokens: Arc::new(TokenCache::default()),
            retry_policy: RetryPolicy::default(),
            hooks: Arc::new(NoopGatewayHooks),
            fallback_model: DEFAULT_MODEL.to_string(),
            repetition_penalty: 1.0,
        }
    }

    /// Builds a gateway backed by the reqwest transport.
    pub fn from_config(
        config: &GigaChatConfig,
        credentials: Credentials,
    ) -> Result<Self, ProviderError> {
        let transport = GigaChatHttpTransport::from_config(config)?;
        Ok(Self::new(credentials, Arc::new(transport)).with_retry_policy(config.retry.clone()))
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn GatewayOperationHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_fallback_model(mut self, model: impl Into<String>) -> Self {
        self.fallback_model = model.into();
        self
    }

    pub(crate) fn build_gigachat_request(&self, request: CompletionRequest) -> GigaChatRequest {
        let model = if request.model.trim().is_empty() {
            self.fallback_model.clone()
        } else {
            request.model
        };

        GigaChatRequest {
            model,
            messages: request.messages,
            functions: request.functions,
            temperature: request.options.temperature,
            max_tokens: request.options.max_tokens,
            repetition_penalty: request
                .options
                .repetition_penalty
                .unwrap_or(self.repetition_penalty),
        }
    }

    async fn attempt(&self, request: GigaChatRequest) -> Result<GigaChatResponse, ProviderError> {
        let resolved = self
            .tokens
            .resolve(&self.credentials, self.transport.as_ref())
            .await?;

        match self.transport.complete(request.clone(), &resolved.token).await {
            Err(error)
                if error.kind == ProviderErrorKind::Authentication
                    && resolved.cached
                    && self.credentials.kind() == CredentialKind::AuthorizationKey =>
            {
                // The cached token was revoked early; exchange once more.
                tracing::debug!(error = %error, "cached GigaChat token rejected, refreshing");
                self.tokens.invalidate().await;
                let refreshed = self
                    .tokens
                    .resolve(&self.credentials, self.transport.as_ref())
                    .await?;
                self.transport.complete(request, &refreshed.token).await
            }
            other => other,
        }
    }
}

impl std::fmt::Debug for GigaChatGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GigaChatGateway")
            .field("credentials", &self.credentials)
            .field("transport", &self.transport)
            .field("retry_policy", &self.retry_policy)
            .field("fallback_model", &self.fallback_model)
            .finish_non_exhaustive()
    }
}

impl CompletionGateway for GigaChatGateway {
    fn id(&self) -> GatewayId {
        GatewayId::GigaChat
    }

    fn complete<'a>(
        &'a self,
        request: CompletionRequest,
    ) -> GatewayFuture<'a, Result<CompletionResponse, ProviderError>> {
        Box::pin(async move {
            request.validate()?;
            let gigachat_request = self.build_gigachat_request(request);

            let response = execute_with_retry(
                self.id(),
                "complete",
                &self.retry_policy,
                self.hooks.as_ref(),
                |_attempt| self.attempt(gigachat_request.clone()),
                tokio::time::sleep,
            )
            .await?;

            Ok(CompletionResponse {
                gateway: self.id(),
                model: response.model,
                choices: response.choices,
                usage: response.usage,
            })
        })
    }
}
