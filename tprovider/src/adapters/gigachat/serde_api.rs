//! GigaChat HTTP payload serde models and conversion helpers.

use std::time::{Duration, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    CompletionChoice, FinishReason, FunctionCall, Message, ProviderError, Role, TokenUsage,
    ToolArguments, ToolDefinition, ToolSchema,
};

use super::types::{GigaChatAccessToken, GigaChatRequest, GigaChatResponse};

pub(crate) fn build_api_request(request: GigaChatRequest) -> Result<GigaChatApiRequest, ProviderError> {
    if request.messages.is_empty() {
        return Err(ProviderError::invalid_request(
            "GigaChat request requires at least one message",
        ));
    }

    let messages = request
        .messages
        .into_iter()
        .map(GigaChatApiMessage::from)
        .collect::<Vec<_>>();

    let functions = request
        .functions
        .into_iter()
        .map(GigaChatApiFunction::from)
        .collect::<Vec<_>>();

    let function_call = (!functions.is_empty()).then_some("auto");

    Ok(GigaChatApiRequest {
        model: request.model,
        messages,
        temperature: request.temperature,
        max_tokens: request.max_tokens,
        repetition_penalty: request.repetition_penalty,
        functions,
        function_call,
    })
}

pub(crate) fn extract_error_message(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<GigaChatApiError>(body).ok()?;
    parsed.message.filter(|message| !message.trim().is_empty())
}

#[derive(Debug, Deserialize)]
pub(crate) struct GigaChatApiError {
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GigaChatApiToken {
    pub access_token: String,
    /// Milliseconds since the Unix epoch.
    pub expires_at: Option<u64>,
}

impl TryFrom<GigaChatApiToken> for GigaChatAccessToken {
    type Error = ProviderError;

    fn try_from(value: GigaChatApiToken) -> Result<Self, Self::Error> {
        if value.access_token.trim().is_empty() {
            return Err(ProviderError::authentication(
                "GigaChat OAuth response carried an empty access token",
            ));
        }

        let expires_at = value
            .expires_at
            .filter(|millis| *millis > 0)
            .map(|millis| UNIX_EPOCH + Duration::from_millis(millis));

        Ok(GigaChatAccessToken::new(value.access_token, expires_at))
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct GigaChatApiRequest {
    pub model: String,
    pub messages: Vec<GigaChatApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub repetition_penalty: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<GigaChatApiFunction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GigaChatApiMessage {
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<GigaChatApiFunctionCall>,
}

impl From<Message> for GigaChatApiMessage {
    fn from(value: Message) -> Self {
        let (role, content, function_call) = value.into_parts();
        Self {
            role,
            content,
            function_call: function_call.map(|call| GigaChatApiFunctionCall {
                name: call.name,
                arguments: Value::Object(call.arguments),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct GigaChatApiFunction {
    pub name: String,
    pub description: String,
    pub parameters: ToolSchema,
}

impl From<ToolDefinition> for GigaChatApiFunction {
    fn from(value: ToolDefinition) -> Self {
        Self {
            name: value.name,
            description: value.description,
            parameters: value.parameters,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct GigaChatApiFunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

impl TryFrom<GigaChatApiFunctionCall> for FunctionCall {
    type Error = ProviderError;

    fn try_from(value: GigaChatApiFunctionCall) -> Result<Self, Self::Error> {
        let arguments = match value.arguments {
            Value::Object(map) => map,
            Value::Null => ToolArguments::new(),
            // Some model versions send the argument object pre-encoded.
            Value::String(encoded) => match serde_json::from_str::<Value>(&encoded) {
                Ok(Value::Object(map)) => map,
                _ => {
                    return Err(ProviderError::transport(format!(
                        "function_call '{}' carried non-object arguments",
                        value.name
                    )));
                }
            },
            _ => {
                return Err(ProviderError::transport(format!(
                    "function_call '{}' carried non-object arguments",
                    value.name
                )));
            }
        };

        Ok(FunctionCall::new(value.name, arguments))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GigaChatApiResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<GigaChatApiChoice>,
    #[serde(default)]
    pub usage: Option<GigaChatApiUsage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GigaChatApiChoice {
    pub message: GigaChatApiResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GigaChatApiResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub function_call: Option<GigaChatApiFunctionCall>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GigaChatApiUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

impl GigaChatApiResponse {
    pub(crate) fn into_response(self, requested_model: &str) -> Result<GigaChatResponse, ProviderError> {
        let choices = self
            .choices
            .into_iter()
            .map(CompletionChoice::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let usage = self
            .usage
            .map(|usage| TokenUsage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            })
            .unwrap_or_default();

        Ok(GigaChatResponse {
            model: self.model.unwrap_or_else(|| requested_model.to_string()),
            choices,
            usage,
        })
    }
}

impl TryFrom<GigaChatApiChoice> for CompletionChoice {
    type Error = ProviderError;

    fn try_from(value: GigaChatApiChoice) -> Result<Self, Self::Error> {
        let content = value.message.content.unwrap_or_default();
        let message = match value.message.function_call {
            Some(call) => Message::assistant_function_call(content, FunctionCall::try_from(call)?),
            None => Message::assistant(content),
        };

        Ok(CompletionChoice::new(
            message,
            FinishReason::parse(value.finish_reason.as_deref()),
        ))
    }
}
