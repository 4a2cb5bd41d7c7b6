//! Small helpers shared by the binaries.

use std::sync::Once;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt};

use crate::{Message, Transcript};

pub fn system_message(content: impl Into<String>) -> Message {
    Message::system(content)
}

pub fn user_message(content: impl Into<String>) -> Message {
    Message::user(content)
}

/// Resumable history seeded with a system prompt.
pub fn transcript_with_context(context: impl Into<String>) -> Transcript {
    Transcript::from_messages([Message::system(context)])
}

/// Installs the global `tracing` subscriber once. `RUST_LOG` overrides the
/// default `info` filter.
pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

/// Timestamp prefix used in reminder output.
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Cancels `token` on Ctrl-C, or on SIGTERM on unix.
///
/// The SIGTERM listener is installed before this returns. Must be called
/// from inside a tokio runtime.
pub fn cancel_on_shutdown(token: CancellationToken) {
    #[cfg(unix)]
    let terminate = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
    {
        Ok(stream) => Some(stream),
        Err(error) => {
            tracing::warn!(%error, "failed to listen for SIGTERM");
            None
        }
    };

    tokio::spawn(async move {
        let interrupt = async {
            if let Err(error) = tokio::signal::ctrl_c().await {
                tracing::warn!(%error, "failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async move {
            match terminate {
                Some(mut stream) => {
                    stream.recv().await;
                }
                None => std::future::pending::<()>().await,
            }
        };
        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = interrupt => tracing::info!("interrupt received"),
            _ = terminate => tracing::info!("termination requested"),
        }
        token.cancel();
    });
}
