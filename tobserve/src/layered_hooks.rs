use std::time::Duration;

use tcommon::SessionId;
use tchat::{AgentLoopHooks, ChatError, LoopPhase, TurnReport};
use tprovider::{FunctionCall, GatewayId, GatewayOperationHooks, ProviderError};
use ttooling::{ToolError, ToolExecutionContext, ToolExecutionResult, ToolRuntimeHooks};

use crate::{MetricsObservabilityHooks, TracingObservabilityHooks};

/// Forwards every callback to `primary`, then to `secondary` when present.
///
/// ```rust
/// use tobserve::{LayeredHooks, MetricsObservabilityHooks, TracingObservabilityHooks};
///
/// let metrics_enabled = true;
/// let hooks = LayeredHooks::new(
///     TracingObservabilityHooks,
///     metrics_enabled.then_some(MetricsObservabilityHooks),
/// );
/// assert!(hooks.has_secondary());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LayeredHooks<A, B> {
    primary: A,
    secondary: Option<B>,
}

/// Tracing always, metrics when switched on.
pub type RelayObservabilityHooks = LayeredHooks<TracingObservabilityHooks, MetricsObservabilityHooks>;

impl<A, B> LayeredHooks<A, B> {
    pub fn new(primary: A, secondary: Option<B>) -> Self {
        Self { primary, secondary }
    }

    pub fn has_secondary(&self) -> bool {
        self.secondary.is_some()
    }
}

impl RelayObservabilityHooks {
    pub fn relay(metrics: bool) -> Self {
        Self::new(
            TracingObservabilityHooks,
            metrics.then_some(MetricsObservabilityHooks),
        )
    }
}

impl<A, B> GatewayOperationHooks for LayeredHooks<A, B>
where
    A: GatewayOperationHooks,
    B: GatewayOperationHooks,
{
    fn on_attempt_start(&self, gateway: GatewayId, operation: &str, attempt: u32) {
        self.primary.on_attempt_start(gateway, operation, attempt);
        if let Some(secondary) = &self.secondary {
            secondary.on_attempt_start(gateway, operation, attempt);
        }
    }

    fn on_retry_scheduled(
        &self,
        gateway: GatewayId,
        operation: &str,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        self.primary
            .on_retry_scheduled(gateway, operation, attempt, delay, error);
        if let Some(secondary) = &self.secondary {
            secondary.on_retry_scheduled(gateway, operation, attempt, delay, error);
        }
    }

    fn on_success(&self, gateway: GatewayId, operation: &str, attempts: u32) {
        self.primary.on_success(gateway, operation, attempts);
        if let Some(secondary) = &self.secondary {
            secondary.on_success(gateway, operation, attempts);
        }
    }

    fn on_failure(&self, gateway: GatewayId, operation: &str, attempts: u32, error: &ProviderError) {
        self.primary.on_failure(gateway, operation, attempts, error);
        if let Some(secondary) = &self.secondary {
            secondary.on_failure(gateway, operation, attempts, error);
        }
    }
}

impl<A, B> ToolRuntimeHooks for LayeredHooks<A, B>
where
    A: ToolRuntimeHooks,
    B: ToolRuntimeHooks,
{
    fn on_execution_start(&self, call: &FunctionCall, context: &ToolExecutionContext) {
        self.primary.on_execution_start(call, context);
        if let Some(secondary) = &self.secondary {
            secondary.on_execution_start(call, context);
        }
    }

    fn on_execution_success(
        &self,
        call: &FunctionCall,
        context: &ToolExecutionContext,
        result: &ToolExecutionResult,
        elapsed: Duration,
    ) {
        self.primary
            .on_execution_success(call, context, result, elapsed);
        if let Some(secondary) = &self.secondary {
            secondary.on_execution_success(call, context, result, elapsed);
        }
    }

    fn on_execution_failure(
        &self,
        call: &FunctionCall,
        context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        self.primary
            .on_execution_failure(call, context, error, elapsed);
        if let Some(secondary) = &self.secondary {
            secondary.on_execution_failure(call, context, error, elapsed);
        }
    }
}

impl<A, B> AgentLoopHooks for LayeredHooks<A, B>
where
    A: AgentLoopHooks,
    B: AgentLoopHooks,
{
    fn on_turn_start(&self, session_id: &SessionId, transcript_len: usize) {
        self.primary.on_turn_start(session_id, transcript_len);
        if let Some(secondary) = &self.secondary {
            secondary.on_turn_start(session_id, transcript_len);
        }
    }

    fn on_phase_transition(&self, session_id: &SessionId, from: LoopPhase, to: LoopPhase) {
        self.primary.on_phase_transition(session_id, from, to);
        if let Some(secondary) = &self.secondary {
            secondary.on_phase_transition(session_id, from, to);
        }
    }

    fn on_function_call(&self, session_id: &SessionId, call: &FunctionCall, round_trip: usize) {
        self.primary.on_function_call(session_id, call, round_trip);
        if let Some(secondary) = &self.secondary {
            secondary.on_function_call(session_id, call, round_trip);
        }
    }

    fn on_turn_complete(&self, session_id: &SessionId, report: &TurnReport, elapsed: Duration) {
        self.primary.on_turn_complete(session_id, report, elapsed);
        if let Some(secondary) = &self.secondary {
            secondary.on_turn_complete(session_id, report, elapsed);
        }
    }

    fn on_turn_failed(
        &self,
        session_id: &SessionId,
        report: &TurnReport,
        error: &ChatError,
        elapsed: Duration,
    ) {
        self.primary
            .on_turn_failed(session_id, report, error, elapsed);
        if let Some(secondary) = &self.secondary {
            secondary.on_turn_failed(session_id, report, error, elapsed);
        }
    }
}
