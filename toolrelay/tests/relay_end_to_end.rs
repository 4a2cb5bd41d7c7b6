#![cfg(unix)]

use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use toolrelay::{
    AppConfig, CompletionChoice, CompletionGateway, CompletionRequest, CompletionResponse,
    FinishReason, FunctionCall, GatewayFuture, GatewayId, Message, ProviderError, RelayRuntime,
    Role, TokenUsage, ToolArguments, ToolErrorKind, ToolRegistry,
};

/// A one-tool MCP server: `get_crypto_price` always reports the same quote.
const CRYPTO_SERVER: &str = r#"
while IFS= read -r line; do
  id=$(printf '%s' "$line" | sed -n 's/.*"id":"\([^"]*\)".*/\1/p')
  case "$line" in
    *'"method":"initialize"'*)
      printf '{"jsonrpc":"2.0","id":"%s","result":{"protocolVersion":"2025-06-18","capabilities":{"tools":{}},"serverInfo":{"name":"crypto","version":"1.0.0"}}}\n' "$id"
      ;;
    *'"method":"tools/list"'*)
      printf '{"jsonrpc":"2.0","id":"%s","result":{"tools":[{"name":"get_crypto_price","description":"Current coin price","inputSchema":{"type":"object","properties":{"coin_id":{"type":"string"}},"required":["coin_id"]}}]}}\n' "$id"
      ;;
    *'"method":"tools/call"'*)
      printf '{"jsonrpc":"2.0","id":"%s","result":{"content":[{"type":"text","text":"bitcoin: 67000 USD"}],"isError":false}}\n' "$id"
      ;;
  esac
done
"#;

const CONFIG: &str = r#"
[agent]
model = "GigaChat-2"
max_tool_round_trips = 3
system_context = "Quote prices in USD."

[backends.crypto]
command = "sh"
"#;

fn config_with(backend_ids: &[&str]) -> AppConfig {
    let mut config = AppConfig::from_toml_str(CONFIG).expect("config should parse");
    let template = config.backends.remove("crypto").expect("crypto backend");
    for id in backend_ids {
        let mut backend = template.clone();
        backend.args = vec!["-c".to_string(), CRYPTO_SERVER.to_string()];
        config.backends.insert(id.to_string(), backend);
    }
    config
}

struct ScriptedGateway {
    replies: Mutex<Vec<CompletionResponse>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedGateway {
    fn new(replies: Vec<CompletionResponse>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies),
            requests: Mutex::new(Vec::new()),
        })
    }
}

impl CompletionGateway for ScriptedGateway {
    fn id(&self) -> GatewayId {
        GatewayId::Custom("scripted")
    }

    fn complete<'a>(
        &'a self,
        request: CompletionRequest,
    ) -> GatewayFuture<'a, Result<CompletionResponse, ProviderError>> {
        Box::pin(async move {
            self.requests.lock().expect("requests lock").push(request);
            let mut replies = self.replies.lock().expect("replies lock");
            if replies.is_empty() {
                return Err(ProviderError::other("script exhausted"));
            }
            Ok(replies.remove(0))
        })
    }
}

fn response(message: Message, finish_reason: FinishReason, total_tokens: u32) -> CompletionResponse {
    CompletionResponse {
        gateway: GatewayId::Custom("scripted"),
        model: "GigaChat-2".to_string(),
        choices: vec![CompletionChoice::new(message, finish_reason)],
        usage: TokenUsage {
            prompt_tokens: total_tokens,
            completion_tokens: 0,
            total_tokens,
        },
    }
}

fn price_call() -> FunctionCall {
    let arguments = match json!({"coin_id": "bitcoin"}) {
        Value::Object(map) => map,
        _ => ToolArguments::new(),
    };
    FunctionCall::new("get_crypto_price", arguments)
}

#[tokio::test]
async fn configured_stdio_backend_answers_a_tool_turn() {
    let config = config_with(&["crypto"]);
    let registry = ToolRegistry::connect_stdio(config.backend_targets())
        .await
        .expect("backend connects");
    let gateway = ScriptedGateway::new(vec![
        response(
            Message::assistant_function_call("", price_call()),
            FinishReason::FunctionCall,
            10,
        ),
        response(
            Message::assistant("Bitcoin trades at 67000 USD."),
            FinishReason::Stop,
            20,
        ),
    ]);

    let mut runtime = RelayRuntime::new(gateway.clone(), Arc::new(registry), config.agent_policy());
    if let Some(context) = config.system_context() {
        runtime = runtime.with_system_context(context);
    }

    let mut session = runtime.session();
    let answer = session
        .send_message("How much is bitcoin price in usd?")
        .await
        .expect("turn succeeds");

    assert_eq!(answer, "Bitcoin trades at 67000 USD.");

    let roles: Vec<Role> = session
        .transcript()
        .iter()
        .map(|message| message.role())
        .collect();
    assert_eq!(
        roles,
        vec![
            Role::System,
            Role::User,
            Role::Assistant,
            Role::Function,
            Role::Assistant
        ]
    );

    let payload: Value = serde_json::from_str(session.transcript().messages()[3].content())
        .expect("function payload is JSON");
    assert_eq!(
        payload,
        json!({"name": "get_crypto_price", "arguments": {"result": "bitcoin: 67000 USD"}})
    );

    let report = session.last_turn().copied().expect("turn recorded");
    assert_eq!(report.round_trips, 1);
    assert_eq!(report.usage.total_tokens, 30);

    let requests = gateway.requests.lock().expect("requests lock");
    assert_eq!(requests[0].functions.len(), 1);
    assert_eq!(requests[0].functions[0].name, "get_crypto_price");
    drop(requests);

    runtime.close().await;
    assert!(runtime.registry.is_closed());
}

#[tokio::test]
async fn two_backends_exposing_the_same_tool_are_rejected() {
    let config = config_with(&["crypto-a", "crypto-b"]);

    let error = ToolRegistry::connect_stdio(config.backend_targets())
        .await
        .expect_err("duplicate tool names must fail");

    assert_eq!(error.kind, ToolErrorKind::NameCollision);
    assert!(error.message.contains("get_crypto_price"));
}
