mod auth;
mod gateway;
mod serde_api;
mod transport;
mod types;

pub use gateway::GigaChatGateway;
pub use transport::{GigaChatHttpTransport, GigaChatTransport};
pub use types::{
    DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_OAUTH_URL, DEFAULT_SCOPE, GigaChatAccessToken,
    GigaChatConfig, GigaChatRequest, GigaChatResponse,
};
