//! Metrics-based observability hooks for gateway calls, tool execution, and agent turns.
//!
//! ```rust
//! use tobserve::MetricsObservabilityHooks;
//! use tprovider::GatewayOperationHooks;
//!
//! fn accepts_gateway_hooks(_hooks: &dyn GatewayOperationHooks) {}
//!
//! let hooks = MetricsObservabilityHooks;
//! accepts_gateway_hooks(&hooks);
//! ```

use std::time::Duration;

use tcommon::SessionId;
use tchat::{AgentLoopHooks, ChatError, LoopPhase, TurnReport};
use tprovider::{FunctionCall, GatewayId, GatewayOperationHooks, ProviderError};
use ttooling::{ToolError, ToolExecutionContext, ToolExecutionResult, ToolRuntimeHooks};

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObservabilityHooks;

impl GatewayOperationHooks for MetricsObservabilityHooks {
    fn on_attempt_start(&self, gateway: GatewayId, operation: &str, _attempt: u32) {
        metrics::counter!(
            "toolrelay_gateway_attempt_start_total",
            "gateway" => gateway.to_string(),
            "operation" => operation.to_string()
        )
        .increment(1);
    }

    fn on_retry_scheduled(
        &self,
        gateway: GatewayId,
        operation: &str,
        _attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        metrics::counter!(
            "toolrelay_gateway_retry_scheduled_total",
            "gateway" => gateway.to_string(),
            "operation" => operation.to_string(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "toolrelay_gateway_retry_delay_seconds",
            "gateway" => gateway.to_string(),
            "operation" => operation.to_string()
        )
        .record(delay.as_secs_f64());
    }

    fn on_success(&self, gateway: GatewayId, operation: &str, attempts: u32) {
        metrics::counter!(
            "toolrelay_gateway_success_total",
            "gateway" => gateway.to_string(),
            "operation" => operation.to_string()
        )
        .increment(1);
        metrics::histogram!(
            "toolrelay_gateway_attempts_per_success",
            "gateway" => gateway.to_string(),
            "operation" => operation.to_string()
        )
        .record(attempts as f64);
    }

    fn on_failure(
        &self,
        gateway: GatewayId,
        operation: &str,
        attempts: u32,
        error: &ProviderError,
    ) {
        metrics::counter!(
            "toolrelay_gateway_failure_total",
            "gateway" => gateway.to_string(),
            "operation" => operation.to_string(),
            "error_kind" => format!("{:?}", error.kind),
            "http_status" => http_status_label(error)
        )
        .increment(1);
        metrics::histogram!(
            "toolrelay_gateway_attempts_per_failure",
            "gateway" => gateway.to_string(),
            "operation" => operation.to_string()
        )
        .record(attempts as f64);
    }
}

impl ToolRuntimeHooks for MetricsObservabilityHooks {
    fn on_execution_start(&self, call: &FunctionCall, _context: &ToolExecutionContext) {
        metrics::counter!(
            "toolrelay_tool_execution_start_total",
            "tool_name" => call.name.clone()
        )
        .increment(1);
    }

    fn on_execution_success(
        &self,
        call: &FunctionCall,
        _context: &ToolExecutionContext,
        result: &ToolExecutionResult,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "toolrelay_tool_execution_success_total",
            "tool_name" => call.name.clone(),
            "backend_id" => result.backend_id.to_string()
        )
        .increment(1);
        metrics::histogram!(
            "toolrelay_tool_execution_duration_seconds",
            "tool_name" => call.name.clone(),
            "status" => "success"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_execution_failure(
        &self,
        call: &FunctionCall,
        _context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "toolrelay_tool_execution_failure_total",
            "tool_name" => call.name.clone(),
            "backend_id" => backend_label(error),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "toolrelay_tool_execution_duration_seconds",
            "tool_name" => call.name.clone(),
            "status" => "failure"
        )
        .record(elapsed.as_secs_f64());
    }
}

impl AgentLoopHooks for MetricsObservabilityHooks {
    fn on_turn_start(&self, _session_id: &SessionId, _transcript_len: usize) {
        metrics::counter!("toolrelay_agent_turn_start_total").increment(1);
    }

    fn on_phase_transition(&self, _session_id: &SessionId, _from: LoopPhase, to: LoopPhase) {
        metrics::counter!(
            "toolrelay_agent_phase_transition_total",
            "to" => to.as_str()
        )
        .increment(1);
    }

    fn on_function_call(&self, _session_id: &SessionId, call: &FunctionCall, _round_trip: usize) {
        metrics::counter!(
            "toolrelay_agent_function_call_total",
            "tool_name" => call.name.clone()
        )
        .increment(1);
    }

    fn on_turn_complete(&self, _session_id: &SessionId, report: &TurnReport, elapsed: Duration) {
        metrics::counter!("toolrelay_agent_turn_complete_total").increment(1);
        metrics::histogram!("toolrelay_agent_round_trips_per_turn").record(report.round_trips as f64);
        metrics::histogram!("toolrelay_agent_total_tokens_per_turn")
            .record(f64::from(report.usage.total_tokens));
        metrics::histogram!(
            "toolrelay_agent_turn_duration_seconds",
            "status" => "success"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_turn_failed(
        &self,
        _session_id: &SessionId,
        _report: &TurnReport,
        error: &ChatError,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "toolrelay_agent_turn_failed_total",
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "toolrelay_agent_turn_duration_seconds",
            "status" => "failure"
        )
        .record(elapsed.as_secs_f64());
    }
}

fn http_status_label(error: &ProviderError) -> String {
    error
        .http_status
        .map_or_else(|| "none".to_string(), |status| status.to_string())
}

// Unrouted calls never reach a backend.
fn backend_label(error: &ToolError) -> String {
    error
        .backend_id
        .as_ref()
        .map_or_else(|| "unrouted".to_string(), ToString::to_string)
}
