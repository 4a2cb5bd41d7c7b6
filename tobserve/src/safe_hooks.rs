use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use tcommon::SessionId;
use tchat::{AgentLoopHooks, ChatError, LoopPhase, TurnReport};
use tprovider::{FunctionCall, GatewayId, GatewayOperationHooks, ProviderError};
use ttooling::{ToolError, ToolExecutionContext, ToolExecutionResult, ToolRuntimeHooks};

/// Swallows panics raised by the wrapped gateway hooks.
pub struct SafeGatewayHooks<H> {
    inner: H,
}

impl<H> SafeGatewayHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> GatewayOperationHooks for SafeGatewayHooks<H>
where
    H: GatewayOperationHooks,
{
    fn on_attempt_start(&self, gateway: GatewayId, operation: &str, attempt: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_attempt_start(gateway, operation, attempt)
        }));
    }

    fn on_retry_scheduled(
        &self,
        gateway: GatewayId,
        operation: &str,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_retry_scheduled(gateway, operation, attempt, delay, error)
        }));
    }

    fn on_success(&self, gateway: GatewayId, operation: &str, attempts: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_success(gateway, operation, attempts)
        }));
    }

    fn on_failure(
        &self,
        gateway: GatewayId,
        operation: &str,
        attempts: u32,
        error: &ProviderError,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_failure(gateway, operation, attempts, error)
        }));
    }
}

pub struct SafeToolHooks<H> {
    inner: H,
}

impl<H> SafeToolHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ToolRuntimeHooks for SafeToolHooks<H>
where
    H: ToolRuntimeHooks,
{
    fn on_execution_start(&self, call: &FunctionCall, context: &ToolExecutionContext) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_execution_start(call, context)
        }));
    }

    fn on_execution_success(
        &self,
        call: &FunctionCall,
        context: &ToolExecutionContext,
        result: &ToolExecutionResult,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_execution_success(call, context, result, elapsed)
        }));
    }

    fn on_execution_failure(
        &self,
        call: &FunctionCall,
        context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_execution_failure(call, context, error, elapsed)
        }));
    }
}

pub struct SafeAgentHooks<H> {
    inner: H,
}

impl<H> SafeAgentHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> AgentLoopHooks for SafeAgentHooks<H>
where
    H: AgentLoopHooks,
{
    fn on_turn_start(&self, session_id: &SessionId, transcript_len: usize) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_turn_start(session_id, transcript_len)
        }));
    }

    fn on_phase_transition(&self, session_id: &SessionId, from: LoopPhase, to: LoopPhase) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_phase_transition(session_id, from, to)
        }));
    }

    fn on_function_call(&self, session_id: &SessionId, call: &FunctionCall, round_trip: usize) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_function_call(session_id, call, round_trip)
        }));
    }

    fn on_turn_complete(&self, session_id: &SessionId, report: &TurnReport, elapsed: Duration) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_turn_complete(session_id, report, elapsed)
        }));
    }

    fn on_turn_failed(
        &self,
        session_id: &SessionId,
        report: &TurnReport,
        error: &ChatError,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_turn_failed(session_id, report, error, elapsed)
        }));
    }
}
