//! Gateway-agnostic transcript, request, and response model types.
//!
//! ```rust
//! use tprovider::{CompletionRequest, Message, ProviderErrorKind};
//!
//! let ok = CompletionRequest::new_validated(
//!     "GigaChat-2",
//!     vec![Message::user("In which year did WW2 start?")],
//! );
//! assert!(ok.is_ok());
//!
//! let err = CompletionRequest::new_validated("", vec![Message::user("hi")])
//!     .err()
//!     .expect("empty model should fail");
//! assert_eq!(err.kind, ProviderErrorKind::InvalidRequest);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tcommon::{GenerationOptions, MetadataMap};

use crate::{GatewayId, ProviderError};

/// Argument values passed through to tools without interpretation.
pub type ToolArguments = Map<String, Value>;

/// A JSON schema object describing a tool's arguments.
pub type ToolSchema = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Function,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Function => "function",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: ToolArguments,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, arguments: ToolArguments) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// One transcript entry.
///
/// Only assistant messages can carry a [`FunctionCall`]; the constructors are
/// the only way to build a message, so the pairing cannot be violated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
}

impl Message {
    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            function_call: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    pub fn assistant_function_call(content: impl Into<String>, call: FunctionCall) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            function_call: Some(call),
        }
    }

    /// A function-role message carrying a serialized tool result.
    pub fn function(content: impl Into<String>) -> Self {
        Self::plain(Role::Function, content)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn function_call(&self) -> Option<&FunctionCall> {
        self.function_call.as_ref()
    }

    pub fn is_function_call(&self) -> bool {
        self.function_call.is_some()
    }

    pub fn into_parts(self) -> (Role, String, Option<FunctionCall>) {
        (self.role, self.content, self.function_call)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: ToolSchema,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    FunctionCall,
    Length,
    Other,
}

impl FinishReason {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("stop") => Self::Stop,
            Some("function_call") => Self::FunctionCall,
            Some("length") => Self::Length,
            _ => Self::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::FunctionCall => "function_call",
            Self::Length => "length",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    /// Adds another response's usage, clamping at `u32::MAX`.
    pub fn accumulate(&mut self, other: TokenUsage) {
        self.prompt_tokens = self.prompt_tokens.saturating_add(other.prompt_tokens);
        self.completion_tokens = self.completion_tokens.saturating_add(other.completion_tokens);
        self.total_tokens = self.total_tokens.saturating_add(other.total_tokens);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionChoice {
    pub message: Message,
    pub finish_reason: FinishReason,
}

impl CompletionChoice {
    pub fn new(message: Message, finish_reason: FinishReason) -> Self {
        Self {
            message,
            finish_reason,
        }
    }

    pub fn stop(content: impl Into<String>) -> Self {
        Self::new(Message::assistant(content), FinishReason::Stop)
    }

    pub fn function_call(call: FunctionCall) -> Self {
        Self::new(
            Message::assistant_function_call("", call),
            FinishReason::FunctionCall,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    pub gateway: GatewayId,
    pub model: String,
    pub choices: Vec<CompletionChoice>,
    pub usage: TokenUsage,
}

impl CompletionResponse {
    pub fn first_choice(&self) -> Option<&CompletionChoice> {
        self.choices.first()
    }

    pub fn into_first_choice(self) -> Option<CompletionChoice> {
        self.choices.into_iter().next()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub options: GenerationOptions,
    pub functions: Vec<ToolDefinition>,
    pub metadata: MetadataMap,
}

impl CompletionRequest {
    pub fn builder(model: impl Into<String>) -> CompletionRequestBuilder {
        CompletionRequestBuilder::new(model)
    }

    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: GenerationOptions::default(),
            functions: Vec::new(),
            metadata: MetadataMap::new(),
        }
    }

    pub fn new_validated(
        model: impl Into<String>,
        messages: Vec<Message>,
    ) -> Result<Self, ProviderError> {
        let request = Self::new(model, messages);
        request.validate()?;
        Ok(request)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.options.temperature = Some(temperature);
        self
    }

    pub fn with_functions(mut self, functions: Vec<ToolDefinition>) -> Self {
        self.functions = functions;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.model.trim().is_empty() {
            return Err(ProviderError::invalid_request("model must not be empty"));
        }

        if self.messages.is_empty() {
            return Err(ProviderError::invalid_request(
                "at least one message is required",
            ));
        }

        if let Some(max_tokens) = self.options.max_tokens
            && max_tokens == 0
        {
            return Err(ProviderError::invalid_request(
                "max_tokens must be greater than zero",
            ));
        }

        if let Some(temperature) = self.options.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            return Err(ProviderError::invalid_request(
                "temperature must be in the inclusive range 0.0..=2.0",
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CompletionRequestBuilder {
    model: String,
    messages: Vec<Message>,
    options: GenerationOptions,
    functions: Vec<ToolDefinition>,
    metadata: MetadataMap,
}

impl CompletionRequestBuilder {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            options: GenerationOptions::default(),
            functions: Vec::new(),
            metadata: MetadataMap::new(),
        }
    }

    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn messages(mut self, messages: impl IntoIterator<Item = Message>) -> Self {
        self.messages.extend(messages);
        self
    }

    pub fn options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options.temperature = Some(temperature);
        self
    }

    pub fn functions(mut self, functions: Vec<ToolDefinition>) -> Self {
        self.functions = functions;
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Result<CompletionRequest, ProviderError> {
        let request = CompletionRequest {
            model: self.model,
            messages: self.messages,
            options: self.options,
            functions: self.functions,
            metadata: self.metadata,
        };

        request.validate()?;
        Ok(request)
    }
}
