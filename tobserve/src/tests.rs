use std::sync::{Arc, Mutex};
use std::time::Duration;

use tcommon::{BackendId, SessionId};
use tchat::{AgentLoopHooks, ChatError, LoopPhase, TurnReport};
use tprovider::{
    FunctionCall, GatewayId, GatewayOperationHooks, ProviderError, TokenUsage, ToolArguments,
};
use ttooling::{ToolError, ToolExecutionContext, ToolExecutionResult, ToolRuntimeHooks};

use crate::{
    LayeredHooks, MetricsObservabilityHooks, RelayObservabilityHooks, SafeAgentHooks,
    SafeGatewayHooks, SafeToolHooks, TracingObservabilityHooks,
};

fn sample_call() -> FunctionCall {
    let mut arguments = ToolArguments::new();
    arguments.insert("symbol".to_string(), "BTC".into());
    FunctionCall::new("get_price", arguments)
}

fn sample_context() -> ToolExecutionContext {
    ToolExecutionContext::new("session-1").with_trace_id("trace-1")
}

fn sample_result() -> ToolExecutionResult {
    ToolExecutionResult {
        tool_name: "get_price".to_string(),
        backend_id: BackendId::new("prices"),
        output: "42000".to_string(),
    }
}

fn sample_report() -> TurnReport {
    TurnReport {
        phase: LoopPhase::Done,
        round_trips: 1,
        completions: 2,
        usage: TokenUsage {
            prompt_tokens: 20,
            completion_tokens: 10,
            total_tokens: 30,
        },
    }
}

fn exercise_gateway_hooks(hooks: &dyn GatewayOperationHooks) {
    let error = ProviderError::timeout("gateway timeout");

    hooks.on_attempt_start(GatewayId::GigaChat, "complete", 1);
    hooks.on_retry_scheduled(
        GatewayId::GigaChat,
        "complete",
        1,
        Duration::from_millis(10),
        &error,
    );
    hooks.on_success(GatewayId::GigaChat, "complete", 2);
    hooks.on_failure(
        GatewayId::GigaChat,
        "complete",
        2,
        &ProviderError::from_http_status(503, "service unavailable"),
    );
}

fn exercise_tool_hooks(hooks: &dyn ToolRuntimeHooks) {
    let error = ToolError::execution("tool failed").with_backend_id(BackendId::new("prices"));

    hooks.on_execution_start(&sample_call(), &sample_context());
    hooks.on_execution_success(
        &sample_call(),
        &sample_context(),
        &sample_result(),
        Duration::from_millis(20),
    );
    hooks.on_execution_failure(
        &sample_call(),
        &sample_context(),
        &error,
        Duration::from_millis(20),
    );
    hooks.on_execution_failure(
        &FunctionCall::new("unknown_tool", ToolArguments::new()),
        &sample_context(),
        &ToolError::not_found("no backend provides tool 'unknown_tool'"),
        Duration::ZERO,
    );
}

fn exercise_agent_hooks(hooks: &dyn AgentLoopHooks) {
    let session_id = SessionId::from("session-1");
    let error = ChatError::max_iterations_exceeded("too many tool calls").with_iteration(6);

    hooks.on_turn_start(&session_id, 1);
    hooks.on_phase_transition(
        &session_id,
        LoopPhase::AwaitingCompletion,
        LoopPhase::ToolCallPending,
    );
    hooks.on_function_call(&session_id, &sample_call(), 1);
    hooks.on_turn_complete(&session_id, &sample_report(), Duration::from_millis(30));
    hooks.on_turn_failed(
        &session_id,
        &sample_report(),
        &error,
        Duration::from_millis(30),
    );
}

#[test]
fn tracing_hooks_smoke_test_all_callbacks() {
    let hooks = TracingObservabilityHooks;

    exercise_gateway_hooks(&hooks);
    exercise_tool_hooks(&hooks);
    exercise_agent_hooks(&hooks);
}

#[test]
fn metrics_hooks_smoke_test_all_callbacks() {
    let hooks = MetricsObservabilityHooks;

    exercise_gateway_hooks(&hooks);
    exercise_tool_hooks(&hooks);
    exercise_agent_hooks(&hooks);
}

#[derive(Default, Clone)]
struct RecordingHooks {
    events: Arc<Mutex<Vec<&'static str>>>,
}

impl RecordingHooks {
    fn push(&self, event: &'static str) {
        self.events.lock().expect("events lock").push(event);
    }
}

impl GatewayOperationHooks for RecordingHooks {
    fn on_attempt_start(&self, _gateway: GatewayId, _operation: &str, _attempt: u32) {
        self.push("attempt_start");
    }

    fn on_retry_scheduled(
        &self,
        _gateway: GatewayId,
        _operation: &str,
        _attempt: u32,
        _delay: Duration,
        _error: &ProviderError,
    ) {
        self.push("retry_scheduled");
    }

    fn on_success(&self, _gateway: GatewayId, _operation: &str, _attempts: u32) {
        self.push("success");
    }

    fn on_failure(
        &self,
        _gateway: GatewayId,
        _operation: &str,
        _attempts: u32,
        _error: &ProviderError,
    ) {
        self.push("failure");
    }
}

impl ToolRuntimeHooks for RecordingHooks {
    fn on_execution_start(&self, _call: &FunctionCall, _context: &ToolExecutionContext) {
        self.push("start");
    }

    fn on_execution_success(
        &self,
        _call: &FunctionCall,
        _context: &ToolExecutionContext,
        _result: &ToolExecutionResult,
        _elapsed: Duration,
    ) {
        self.push("success");
    }

    fn on_execution_failure(
        &self,
        _call: &FunctionCall,
        _context: &ToolExecutionContext,
        _error: &ToolError,
        _elapsed: Duration,
    ) {
        self.push("failure");
    }
}

impl AgentLoopHooks for RecordingHooks {
    fn on_turn_start(&self, _session_id: &SessionId, _transcript_len: usize) {
        self.push("turn_start");
    }

    fn on_phase_transition(&self, _session_id: &SessionId, _from: LoopPhase, _to: LoopPhase) {
        self.push("transition");
    }

    fn on_function_call(&self, _session_id: &SessionId, _call: &FunctionCall, _round_trip: usize) {
        self.push("function_call");
    }

    fn on_turn_complete(&self, _session_id: &SessionId, _report: &TurnReport, _elapsed: Duration) {
        self.push("turn_complete");
    }

    fn on_turn_failed(
        &self,
        _session_id: &SessionId,
        _report: &TurnReport,
        _error: &ChatError,
        _elapsed: Duration,
    ) {
        self.push("turn_failed");
    }
}

struct PanicHooks;

impl GatewayOperationHooks for PanicHooks {
    fn on_attempt_start(&self, _gateway: GatewayId, _operation: &str, _attempt: u32) {
        panic!("attempt_start panic");
    }

    fn on_retry_scheduled(
        &self,
        _gateway: GatewayId,
        _operation: &str,
        _attempt: u32,
        _delay: Duration,
        _error: &ProviderError,
    ) {
        panic!("retry_scheduled panic");
    }

    fn on_success(&self, _gateway: GatewayId, _operation: &str, _attempts: u32) {
        panic!("success panic");
    }

    fn on_failure(
        &self,
        _gateway: GatewayId,
        _operation: &str,
        _attempts: u32,
        _error: &ProviderError,
    ) {
        panic!("failure panic");
    }
}

impl ToolRuntimeHooks for PanicHooks {
    fn on_execution_start(&self, _call: &FunctionCall, _context: &ToolExecutionContext) {
        panic!("start panic");
    }

    fn on_execution_success(
        &self,
        _call: &FunctionCall,
        _context: &ToolExecutionContext,
        _result: &ToolExecutionResult,
        _elapsed: Duration,
    ) {
        panic!("success panic");
    }

    fn on_execution_failure(
        &self,
        _call: &FunctionCall,
        _context: &ToolExecutionContext,
        _error: &ToolError,
        _elapsed: Duration,
    ) {
        panic!("failure panic");
    }
}

impl AgentLoopHooks for PanicHooks {
    fn on_turn_start(&self, _session_id: &SessionId, _transcript_len: usize) {
        panic!("turn_start panic");
    }

    fn on_phase_transition(&self, _session_id: &SessionId, _from: LoopPhase, _to: LoopPhase) {
        panic!("transition panic");
    }

    fn on_function_call(&self, _session_id: &SessionId, _call: &FunctionCall, _round_trip: usize) {
        panic!("function_call panic");
    }

    fn on_turn_complete(&self, _session_id: &SessionId, _report: &TurnReport, _elapsed: Duration) {
        panic!("turn_complete panic");
    }

    fn on_turn_failed(
        &self,
        _session_id: &SessionId,
        _report: &TurnReport,
        _error: &ChatError,
        _elapsed: Duration,
    ) {
        panic!("turn_failed panic");
    }
}

#[test]
fn safe_gateway_hooks_delegate_when_inner_succeeds() {
    let inner = RecordingHooks::default();
    let events = Arc::clone(&inner.events);

    exercise_gateway_hooks(&SafeGatewayHooks::new(inner));

    assert_eq!(
        *events.lock().expect("events lock"),
        vec!["attempt_start", "retry_scheduled", "success", "failure"]
    );
}

#[test]
fn safe_tool_hooks_delegate_when_inner_succeeds() {
    let inner = RecordingHooks::default();
    let events = Arc::clone(&inner.events);

    exercise_tool_hooks(&SafeToolHooks::new(inner));

    assert_eq!(
        *events.lock().expect("events lock"),
        vec!["start", "success", "failure", "failure"]
    );
}

#[test]
fn safe_agent_hooks_delegate_when_inner_succeeds() {
    let inner = RecordingHooks::default();
    let events = Arc::clone(&inner.events);

    exercise_agent_hooks(&SafeAgentHooks::new(inner));

    assert_eq!(
        *events.lock().expect("events lock"),
        vec![
            "turn_start",
            "transition",
            "function_call",
            "turn_complete",
            "turn_failed"
        ]
    );
}

#[test]
fn safe_gateway_hooks_swallow_panics() {
    exercise_gateway_hooks(&SafeGatewayHooks::new(PanicHooks));
}

#[test]
fn safe_tool_hooks_swallow_panics() {
    exercise_tool_hooks(&SafeToolHooks::new(PanicHooks));
}

#[test]
fn safe_agent_hooks_swallow_panics() {
    exercise_agent_hooks(&SafeAgentHooks::new(PanicHooks));
}

#[test]
fn relay_hooks_smoke_test_with_metrics_layer() {
    let hooks = RelayObservabilityHooks::relay(true);
    assert!(hooks.has_secondary());
    assert!(!RelayObservabilityHooks::relay(false).has_secondary());

    exercise_gateway_hooks(&hooks);
    exercise_tool_hooks(&hooks);
    exercise_agent_hooks(&hooks);
}

#[test]
fn layered_hooks_call_primary_then_secondary() {
    let primary = RecordingHooks::default();
    let secondary = RecordingHooks {
        events: Arc::clone(&primary.events),
    };
    let events = Arc::clone(&primary.events);

    exercise_gateway_hooks(&LayeredHooks::new(primary, Some(secondary)));

    assert_eq!(
        *events.lock().expect("events lock"),
        vec![
            "attempt_start",
            "attempt_start",
            "retry_scheduled",
            "retry_scheduled",
            "success",
            "success",
            "failure",
            "failure"
        ]
    );
}

#[test]
fn layered_hooks_without_secondary_only_call_primary() {
    let primary = RecordingHooks::default();
    let events = Arc::clone(&primary.events);

    let hooks: LayeredHooks<RecordingHooks, RecordingHooks> = LayeredHooks::new(primary, None);
    exercise_agent_hooks(&hooks);
    exercise_tool_hooks(&hooks);

    assert_eq!(events.lock().expect("events lock").len(), 9);
}

#[test]
fn layered_hooks_inside_safe_wrapper_survive_a_panicking_layer() {
    let primary = RecordingHooks::default();
    let events = Arc::clone(&primary.events);

    exercise_tool_hooks(&SafeToolHooks::new(LayeredHooks::new(
        primary,
        Some(PanicHooks),
    )));

    assert_eq!(
        *events.lock().expect("events lock"),
        vec!["start", "success", "failure", "failure"]
    );
}
