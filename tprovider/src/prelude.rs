//! Common `tprovider` imports for downstream crates.

pub use crate::{
    CompletionChoice, CompletionGateway, CompletionRequest, CompletionRequestBuilder,
    CompletionResponse, Credentials, FinishReason, FunctionCall, GatewayFuture, GatewayId,
    GatewayOperationHooks, Message, NoopGatewayHooks, ProviderError, ProviderErrorKind,
    RetryPolicy, Role, TokenUsage, ToolArguments, ToolDefinition, ToolSchema,
};
pub use tcommon::{BoxFuture, GenerationOptions, MetadataMap};
