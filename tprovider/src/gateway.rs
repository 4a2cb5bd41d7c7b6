//! Completion gateway contract.
//!
//! A gateway is stateless per call: it receives the whole transcript every
//! time and answers with one or more choices.
//!
//! ```rust
//! use tprovider::{
//!     CompletionChoice, CompletionGateway, CompletionRequest, CompletionResponse, GatewayFuture,
//!     GatewayId, Message, ProviderError, TokenUsage,
//! };
//!
//! struct Fixed;
//!
//! impl CompletionGateway for Fixed {
//!     fn id(&self) -> GatewayId {
//!         GatewayId::Custom("fixed")
//!     }
//!
//!     fn complete<'a>(
//!         &'a self,
//!         request: CompletionRequest,
//!     ) -> GatewayFuture<'a, Result<CompletionResponse, ProviderError>> {
//!         Box::pin(async move {
//!             Ok(CompletionResponse {
//!                 gateway: self.id(),
//!                 model: request.model,
//!                 choices: vec![CompletionChoice::stop("1939")],
//!                 usage: TokenUsage::default(),
//!             })
//!         })
//!     }
//! }
//!
//! let gateway = Fixed;
//! assert_eq!(gateway.id().to_string(), "fixed");
//! let _pending = gateway.complete(CompletionRequest::new("m", vec![Message::user("hi")]));
//! ```

use std::fmt::{Display, Formatter};

use tcommon::BoxFuture;

use crate::{CompletionRequest, CompletionResponse, ProviderError};

pub type GatewayFuture<'a, T> = BoxFuture<'a, T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayId {
    GigaChat,
    Custom(&'static str),
}

impl Display for GatewayId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GigaChat => f.write_str("gigachat"),
            Self::Custom(name) => f.write_str(name),
        }
    }
}

pub trait CompletionGateway: Send + Sync {
    fn id(&self) -> GatewayId;

    fn complete<'a>(
        &'a self,
        request: CompletionRequest,
    ) -> GatewayFuture<'a, Result<CompletionResponse, ProviderError>>;
}
