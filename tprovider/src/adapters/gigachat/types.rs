//! GigaChat adapter configuration and transport-level value types.

use std::time::{Duration, SystemTime};

use crate::{CompletionChoice, Message, RetryPolicy, SecretString, TokenUsage, ToolDefinition};

pub const DEFAULT_OAUTH_URL: &str = "https://ngw.devices.sberbank.ru:9443/api/v2/oauth";
pub const DEFAULT_BASE_URL: &str = "https://gigachat.devices.sberbank.ru/api/v1";
pub const DEFAULT_SCOPE: &str = "GIGACHAT_API_PERS";
pub const DEFAULT_MODEL: &str = "GigaChat-2";

#[derive(Debug, Clone, PartialEq)]
pub struct GigaChatConfig {
    pub oauth_url: String,
    pub base_url: String,
    pub scope: String,
    pub timeout: Duration,
    /// The public endpoints are signed by a CA missing from common trust
    /// stores. Leave this off unless that CA cannot be installed.
    pub accept_invalid_certs: bool,
    pub retry: RetryPolicy,
}

impl Default for GigaChatConfig {
    fn default() -> Self {
        Self {
            oauth_url: DEFAULT_OAUTH_URL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            timeout: Duration::from_secs(30),
            accept_invalid_certs: false,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GigaChatAccessToken {
    pub token: SecretString,
    pub expires_at: Option<SystemTime>,
}

impl GigaChatAccessToken {
    pub fn new(token: impl Into<String>, expires_at: Option<SystemTime>) -> Self {
        Self {
            token: SecretString::new(token),
            expires_at,
        }
    }

    /// A token without an expiry stays usable until the API rejects it.
    pub fn is_fresh_at(&self, now: SystemTime, skew: Duration) -> bool {
        match self.expires_at {
            Some(expires_at) => now + skew < expires_at,
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GigaChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub functions: Vec<ToolDefinition>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub repetition_penalty: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GigaChatResponse {
    pub model: String,
    pub choices: Vec<CompletionChoice>,
    pub usage: TokenUsage,
}
