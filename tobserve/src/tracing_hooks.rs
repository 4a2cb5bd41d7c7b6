use std::time::Duration;

use tcommon::SessionId;
use tchat::{AgentLoopHooks, ChatError, LoopPhase, TurnReport};
use tprovider::{FunctionCall, GatewayId, GatewayOperationHooks, ProviderError};
use ttooling::{ToolError, ToolExecutionContext, ToolExecutionResult, ToolRuntimeHooks};

/// Emits one structured `tracing` event per hook callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObservabilityHooks;

impl GatewayOperationHooks for TracingObservabilityHooks {
    fn on_attempt_start(&self, gateway: GatewayId, operation: &str, attempt: u32) {
        tracing::info!(
            phase = "gateway",
            event = "attempt_start",
            gateway = %gateway,
            operation,
            attempt
        );
    }

    fn on_retry_scheduled(
        &self,
        gateway: GatewayId,
        operation: &str,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        tracing::warn!(
            phase = "gateway",
            event = "retry_scheduled",
            gateway = %gateway,
            operation,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }

    fn on_success(&self, gateway: GatewayId, operation: &str, attempts: u32) {
        tracing::info!(
            phase = "gateway",
            event = "success",
            gateway = %gateway,
            operation,
            attempts
        );
    }

    fn on_failure(
        &self,
        gateway: GatewayId,
        operation: &str,
        attempts: u32,
        error: &ProviderError,
    ) {
        tracing::error!(
            phase = "gateway",
            event = "failure",
            gateway = %gateway,
            operation,
            attempts,
            http_status = error.http_status,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }
}

impl ToolRuntimeHooks for TracingObservabilityHooks {
    fn on_execution_start(&self, call: &FunctionCall, context: &ToolExecutionContext) {
        tracing::info!(
            phase = "tool",
            event = "execution_start",
            tool_name = %call.name,
            session_id = %context.session_id,
            argument_count = call.arguments.len()
        );
    }

    fn on_execution_success(
        &self,
        call: &FunctionCall,
        context: &ToolExecutionContext,
        result: &ToolExecutionResult,
        elapsed: Duration,
    ) {
        tracing::info!(
            phase = "tool",
            event = "execution_success",
            tool_name = %call.name,
            backend_id = %result.backend_id,
            session_id = %context.session_id,
            output_bytes = result.output.len(),
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_execution_failure(
        &self,
        call: &FunctionCall,
        context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        tracing::error!(
            phase = "tool",
            event = "execution_failure",
            tool_name = %call.name,
            backend_id = error.backend_id.as_ref().map(|id| id.as_str()),
            session_id = %context.session_id,
            elapsed_ms = elapsed.as_millis() as u64,
            error_kind = ?error.kind,
            retryable = error.retryable,
            error = %error
        );
    }
}

impl AgentLoopHooks for TracingObservabilityHooks {
    fn on_turn_start(&self, session_id: &SessionId, transcript_len: usize) {
        tracing::info!(
            phase = "agent",
            event = "turn_start",
            session_id = %session_id,
            transcript_len
        );
    }

    fn on_phase_transition(&self, session_id: &SessionId, from: LoopPhase, to: LoopPhase) {
        tracing::debug!(
            phase = "agent",
            event = "phase_transition",
            session_id = %session_id,
            from = from.as_str(),
            to = to.as_str()
        );
    }

    fn on_function_call(&self, session_id: &SessionId, call: &FunctionCall, round_trip: usize) {
        tracing::info!(
            phase = "agent",
            event = "function_call",
            session_id = %session_id,
            tool_name = %call.name,
            round_trip
        );
    }

    fn on_turn_complete(&self, session_id: &SessionId, report: &TurnReport, elapsed: Duration) {
        tracing::info!(
            phase = "agent",
            event = "turn_complete",
            session_id = %session_id,
            round_trips = report.round_trips,
            completions = report.completions,
            total_tokens = report.usage.total_tokens,
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_turn_failed(
        &self,
        session_id: &SessionId,
        report: &TurnReport,
        error: &ChatError,
        elapsed: Duration,
    ) {
        tracing::error!(
            phase = "agent",
            event = "turn_failed",
            session_id = %session_id,
            round_trips = report.round_trips,
            completions = report.completions,
            elapsed_ms = elapsed.as_millis() as u64,
            error_kind = ?error.kind,
            error = %error
        );
    }
}
