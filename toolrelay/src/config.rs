//! TOML application configuration and credential resolution.
//!
//! ```rust
//! use toolrelay::config::AppConfig;
//!
//! let config = AppConfig::from_toml_str(
//!     r#"
//!     [agent]
//!     model = "GigaChat-2"
//!
//!     [backends.prices]
//!     command = "/usr/local/bin/price-server"
//!     "#,
//! )
//! .expect("config should parse");
//!
//! assert_eq!(config.agent_policy().max_tool_round_trips, 5);
//! assert_eq!(config.backend_targets().len(), 1);
//! ```

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tchat::{AgentPolicy, DEFAULT_MAX_TOOL_ROUND_TRIPS, DEFAULT_MODEL};
use tcommon::BackendId;
use tprovider::{CredentialKind, CredentialSource, Credentials, RetryPolicy};
use tracing::debug;
use ttooling::BackendTarget;

pub const DEFAULT_CONFIG_PATH: &str = "toolrelay.toml";
pub const DEFAULT_CREDENTIAL_ENV: &str = "GIGACHAT_AUTHORIZATION_KEY";
pub const DEFAULT_REMINDER_QUESTION: &str = "What is the current Bitcoin price in USD?";
pub const DEFAULT_REMINDER_INTERVAL_SECS: u64 = 60;

const DEFAULT_OAUTH_URL: &str = "https://ngw.devices.sberbank.ru:9443/api/v2/oauth";
const DEFAULT_BASE_URL: &str = "https://gigachat.devices.sberbank.ru/api/v1";
const DEFAULT_SCOPE: &str = "GIGACHAT_API_PERS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorKind {
    NotFound,
    Io,
    Parse,
    Invalid,
    Credential,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub kind: ConfigErrorKind,
    pub message: String,
    pub path: Option<PathBuf>,
}

impl ConfigError {
    pub fn new(kind: ConfigErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            path: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::NotFound, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::Io, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::Parse, message)
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::Invalid, message)
    }

    pub fn credential(message: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::Credential, message)
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{:?} ({}): {}", self.kind, path.display(), self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tool_round_trips: usize,
    pub tool_timeout_secs: Option<u64>,
    /// Background context appended as a system message to every new session.
    pub system_context: Option<String>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            max_tool_round_trips: DEFAULT_MAX_TOOL_ROUND_TRIPS,
            tool_timeout_secs: None,
            system_context: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSetting {
    #[default]
    AuthorizationKey,
    AccessToken,
}

impl From<CredentialSetting> for CredentialKind {
    fn from(value: CredentialSetting) -> Self {
        match value {
            CredentialSetting::AuthorizationKey => CredentialKind::AuthorizationKey,
            CredentialSetting::AccessToken => CredentialKind::AccessToken,
        }
    }
}

/// Where the gateway secret lives. Exactly one of `value`, `file`, `env`
/// may be set; with none set the default environment variable is read.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CredentialSettings {
    pub kind: CredentialSetting,
    pub value: Option<String>,
    pub file: Option<PathBuf>,
    pub env: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewaySettings {
    pub oauth_url: String,
    pub base_url: String,
    pub scope: String,
    pub timeout_secs: u64,
    pub accept_invalid_certs: bool,
    pub max_attempts: u32,
    pub credentials: CredentialSettings,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            oauth_url: DEFAULT_OAUTH_URL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            timeout_secs: 30,
            accept_invalid_certs: false,
            max_attempts: RetryPolicy::default().max_attempts,
            credentials: CredentialSettings::default(),
        }
    }
}

impl GatewaySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendSettings {
    pub command: PathBuf,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub workdir: Option<PathBuf>,
}

impl BackendSettings {
    pub fn to_target(&self) -> BackendTarget {
        let mut target = BackendTarget::new(self.command.clone()).with_args(self.args.clone());
        for (key, value) in &self.env {
            target = target.with_env(key.clone(), value.clone());
        }
        if let Some(workdir) = &self.workdir {
            target = target.with_workdir(workdir.clone());
        }
        target
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReminderSettings {
    pub question: String,
    pub interval_secs: u64,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            question: DEFAULT_REMINDER_QUESTION.to_string(),
            interval_secs: DEFAULT_REMINDER_INTERVAL_SECS,
        }
    }
}

impl ReminderSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Hook layers installed on top of structured logging.
///
/// Metrics are emitted through the `metrics` facade; the embedding process
/// installs the recorder.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ObservabilitySettings {
    pub metrics: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub agent: AgentSettings,
    pub gateway: GatewaySettings,
    pub backends: BTreeMap<String, BackendSettings>,
    pub reminder: ReminderSettings,
    pub observability: ObservabilitySettings,
}

impl AppConfig {
    /// Reads and validates `path`, or [`DEFAULT_CONFIG_PATH`] when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
        debug!(path = %path.display(), "reading toolrelay configuration");

        let content = std::fs::read_to_string(path).map_err(|err| {
            let error = if err.kind() == io::ErrorKind::NotFound {
                ConfigError::not_found("configuration file does not exist")
            } else {
                ConfigError::io(format!("failed to read configuration: {err}"))
            };
            error.with_path(path)
        })?;

        Self::from_toml_str(&content).map_err(|error| error.with_path(path))
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|err| ConfigError::parse(err.message().to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.model.trim().is_empty() {
            return Err(ConfigError::invalid("agent.model must not be empty"));
        }
        if !(0.0..=2.0).contains(&self.agent.temperature) {
            return Err(ConfigError::invalid(
                "agent.temperature must be between 0.0 and 2.0",
            ));
        }
        if self.agent.max_tool_round_trips == 0 {
            return Err(ConfigError::invalid(
                "agent.max_tool_round_trips must be at least 1",
            ));
        }
        if self.agent.tool_timeout_secs == Some(0) {
            return Err(ConfigError::invalid(
                "agent.tool_timeout_secs must be greater than zero",
            ));
        }
        if self.gateway.timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "gateway.timeout_secs must be greater than zero",
            ));
        }

        let credentials = &self.gateway.credentials;
        let sources = [
            credentials.value.is_some(),
            credentials.file.is_some(),
            credentials.env.is_some(),
        ];
        if sources.iter().filter(|set| **set).count() > 1 {
            return Err(ConfigError::invalid(
                "gateway.credentials accepts only one of value, file, env",
            ));
        }

        if self.backends.is_empty() {
            return Err(ConfigError::invalid(
                "at least one [backends.<id>] table must be configured",
            ));
        }
        for (id, backend) in &self.backends {
            if id.trim().is_empty() {
                return Err(ConfigError::invalid("backend ids must not be blank"));
            }
            if backend.command.as_os_str().is_empty() {
                return Err(ConfigError::invalid(format!(
                    "backends.{id}.command must not be empty"
                )));
            }
        }

        if self.reminder.question.trim().is_empty() {
            return Err(ConfigError::invalid("reminder.question must not be empty"));
        }
        if self.reminder.interval_secs == 0 {
            return Err(ConfigError::invalid(
                "reminder.interval_secs must be greater than zero",
            ));
        }

        Ok(())
    }

    pub fn agent_policy(&self) -> AgentPolicy {
        let mut policy = AgentPolicy::default()
            .with_model(self.agent.model.clone())
            .with_temperature(self.agent.temperature)
            .with_max_tool_round_trips(self.agent.max_tool_round_trips);
        if let Some(secs) = self.agent.tool_timeout_secs {
            policy = policy.with_tool_timeout(Duration::from_secs(secs));
        }
        policy
    }

    pub fn system_context(&self) -> Option<&str> {
        self.agent
            .system_context
            .as_deref()
            .filter(|context| !context.trim().is_empty())
    }

    pub fn backend_targets(&self) -> BTreeMap<BackendId, BackendTarget> {
        self.backends
            .iter()
            .map(|(id, backend)| (BackendId::new(id.clone()), backend.to_target()))
            .collect()
    }

    /// Resolves gateway credentials from the process environment.
    pub fn resolve_credentials(&self) -> Result<Credentials, ConfigError> {
        resolve_credentials_with(&self.gateway.credentials, |name| std::env::var(name).ok())
    }
}

/// Resolves credentials with an explicit environment lookup.
pub fn resolve_credentials_with(
    settings: &CredentialSettings,
    lookup_env: impl Fn(&str) -> Option<String>,
) -> Result<Credentials, ConfigError> {
    let (secret, source) = if let Some(value) = &settings.value {
        (value.clone(), CredentialSource::Inline)
    } else if let Some(path) = &settings.file {
        let secret = std::fs::read_to_string(path).map_err(|err| {
            ConfigError::credential(format!("failed to read credential file: {err}"))
                .with_path(path)
        })?;
        (secret, CredentialSource::File(path.clone()))
    } else {
        let name = settings.env.as_deref().unwrap_or(DEFAULT_CREDENTIAL_ENV);
        let secret = lookup_env(name).ok_or_else(|| {
            ConfigError::credential(format!("environment variable {name} is not set"))
        })?;
        (secret, CredentialSource::Environment(name.to_string()))
    };

    let secret = secret.trim().to_string();
    let credentials = match CredentialKind::from(settings.kind) {
        CredentialKind::AuthorizationKey => Credentials::authorization_key(secret, source),
        CredentialKind::AccessToken => Credentials::access_token(secret, None, source),
    };
    credentials.map_err(|err| ConfigError::credential(err.message))
}
