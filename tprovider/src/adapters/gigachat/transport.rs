//! GigaChat transport trait and reqwest-based HTTP implementation.

use reqwest::{Client, Response};

use crate::{GatewayFuture, ProviderError, SecretString};

use super::serde_api::{
    GigaChatApiResponse, GigaChatApiToken, build_api_request, extract_error_message,
};
use super::types::{
    DEFAULT_BASE_URL, DEFAULT_OAUTH_URL, DEFAULT_SCOPE, GigaChatAccessToken, GigaChatConfig,
    GigaChatRequest, GigaChatResponse,
};

pub trait GigaChatTransport: Send + Sync + std::fmt::Debug {
    /// Exchanges a long-lived authorization key for an access token.
    fn fetch_token<'a>(
        &'a self,
        authorization_key: &'a SecretString,
    ) -> GatewayFuture<'a, Result<GigaChatAccessToken, ProviderError>>;

    fn complete<'a>(
        &'a self,
        request: GigaChatRequest,
        access_token: &'a SecretString,
    ) -> GatewayFuture<'a, Result<GigaChatResponse, ProviderError>>;
}

#[derive(Debug, Clone)]
pub struct GigaChatHttpTransport {
    client: Client,
    oauth_url: String,
    base_url: String,
    scope: String,
}

impl GigaChatHttpTransport {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            oauth_url: DEFAULT_OAUTH_URL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
        }
    }

    pub fn from_config(config: &GigaChatConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|err| ProviderError::transport(format!("failed to build HTTP client: {err}")))?;

        Ok(Self::new(client)
            .with_oauth_url(config.oauth_url.clone())
            .with_base_url(config.base_url.clone())
            .with_scope(config.scope.clone()))
    }

    pub fn with_oauth_url(mut self, oauth_url: impl Into<String>) -> Self {
        self.oauth_url = oauth_url.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn map_send_error(err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::timeout(err.to_string())
        } else {
            ProviderError::transport(err.to_string())
        }
    }

    async fn parse_error(response: Response) -> ProviderError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(&body)
            .unwrap_or_else(|| format!("GigaChat request failed with status {status}"));

        ProviderError::from_http_status(status.as_u16(), message)
    }
}

impl GigaChatTransport for GigaChatHttpTransport {
    fn fetch_token<'a>(
        &'a self,
        authorization_key: &'a SecretString,
    ) -> GatewayFuture<'a, Result<GigaChatAccessToken, ProviderError>> {
        Box::pin(async move {
            let request_id = uuid::Uuid::new_v4().to_string();
            let response = self
                .client
                .post(&self.oauth_url)
                .bearer_auth(authorization_key.expose())
                .header("RqUID", request_id)
                .header("Accept", "application/json")
                .form(&[("scope", self.scope.as_str())])
                .send()
                .await
                .map_err(Self::map_send_error)?;

            if !response.status().is_success() {
                return Err(Self::parse_error(response).await);
            }

            let parsed: GigaChatApiToken = response
                .json()
                .await
                .map_err(|err| ProviderError::transport(err.to_string()))?;

            GigaChatAccessToken::try_from(parsed)
        })
    }

    fn complete<'a>(
        &'a self,
        request: GigaChatRequest,
        access_token: &'a SecretString,
    ) -> GatewayFuture<'a, Result<GigaChatResponse, ProviderError>> {
        Box::pin(async move {
            let requested_model = request.model.clone();
            let api_request = build_api_request(request)?;
            let response = self
                .client
                .post(self.endpoint("chat/completions"))
                .bearer_auth(access_token.expose())
                .header("Accept", "application/json")
                .json(&api_request)
                .send()
                .await
                .map_err(Self::map_send_error)?;

            if !response.status().is_success() {
                return Err(Self::parse_error(response).await);
            }

            let parsed: GigaChatApiResponse = response
                .json()
                .await
                .map_err(|err| ProviderError::transport(err.to_string()))?;

            parsed.into_response(&requested_model)
        })
    }
}
