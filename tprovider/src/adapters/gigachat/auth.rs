//! Access-token resolution and caching for the GigaChat gateway.

use std::time::{Duration, SystemTime};

use tokio::sync::Mutex;

use crate::{Credential, Credentials, ProviderError, SecretString};

use super::transport::GigaChatTransport;
use super::types::GigaChatAccessToken;

/// Tokens are refreshed this long before the server-side expiry.
const REFRESH_SKEW: Duration = Duration::from_secs(60);

#[derive(Debug, Default)]
pub(crate) struct TokenCache {
    current: Mutex<Option<GigaChatAccessToken>>,
}

pub(crate) struct ResolvedToken {
    pub token: SecretString,
    /// True when the token came out of the cache rather than a fresh exchange.
    pub cached: bool,
}

impl TokenCache {
    pub(crate) async fn invalidate(&self) {
        self.current.lock().await.take();
    }

    pub(crate) async fn resolve(
        &self,
        credentials: &Credentials,
        transport: &dyn GigaChatTransport,
    ) -> Result<ResolvedToken, ProviderError> {
        let authorization_key = match credentials.credential() {
            Credential::AccessToken { token, expires_at } => {
                let access = GigaChatAccessToken {
                    token: token.clone(),
                    expires_at: *expires_at,
                };
                if !access.is_fresh_at(SystemTime::now(), Duration::ZERO) {
                    return Err(ProviderError::authentication(format!(
                        "access token from {} has expired",
                        credentials.source()
                    )));
                }

                return Ok(ResolvedToken {
                    token: access.token,
                    cached: false,
                });
            }
            Credential::AuthorizationKey(key) => key,
        };

        // Holding the lock across the exchange keeps concurrent callers from
        // issuing duplicate OAuth requests.
        let mut current = self.current.lock().await;
        if let Some(existing) = current.as_ref()
            && existing.is_fresh_at(SystemTime::now(), REFRESH_SKEW)
        {
            return Ok(ResolvedToken {
                token: existing.token.clone(),
                cached: true,
            });
        }

        let fresh = transport.fetch_token(authorization_key).await?;
        tracing::debug!(
            source = %credentials.source(),
            expires = fresh.expires_at.is_some(),
            "obtained GigaChat access token"
        );
        let token = fresh.token.clone();
        *current = Some(fresh);

        Ok(ResolvedToken {
            token,
            cached: false,
        })
    }
}
