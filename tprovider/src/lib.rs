//! Completion gateway contracts and the transcript data model.
//!
//! ```rust
//! use tprovider::{CompletionRequest, Message, Role};
//!
//! let request = CompletionRequest::builder("GigaChat-2")
//!     .message(Message::system("Answer briefly."))
//!     .message(Message::user("In which year did WW2 start?"))
//!     .temperature(0.0)
//!     .build()
//!     .expect("request should be valid");
//!
//! assert_eq!(request.messages[1].role(), Role::User);
//! ```

pub mod adapters;
pub mod credentials;
pub mod error;
pub mod gateway;
pub mod model;
pub mod prelude;
pub mod resilience;

pub use credentials::{Credential, CredentialKind, CredentialSource, Credentials, SecretString};
pub use error::{ProviderError, ProviderErrorKind};
pub use gateway::{CompletionGateway, GatewayFuture, GatewayId};
pub use model::{
    CompletionChoice, CompletionRequest, CompletionRequestBuilder, CompletionResponse,
    FinishReason, FunctionCall, Message, Role, TokenUsage, ToolArguments, ToolDefinition,
    ToolSchema,
};
pub use resilience::{GatewayOperationHooks, NoopGatewayHooks, RetryPolicy, execute_with_retry};
