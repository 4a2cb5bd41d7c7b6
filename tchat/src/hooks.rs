//! Observation points inside the agent loop.
//!
//! ```rust
//! use tchat::{AgentLoopHooks, NoopAgentLoopHooks};
//!
//! fn assert_hooks_trait(_hooks: &dyn AgentLoopHooks) {}
//!
//! assert_hooks_trait(&NoopAgentLoopHooks);
//! ```

use std::time::Duration;

use tcommon::SessionId;
use tprovider::FunctionCall;

use crate::{ChatError, LoopPhase, TurnReport};

pub trait AgentLoopHooks: Send + Sync {
    fn on_turn_start(&self, _session_id: &SessionId, _transcript_len: usize) {}

    fn on_phase_transition(&self, _session_id: &SessionId, _from: LoopPhase, _to: LoopPhase) {}

    fn on_function_call(&self, _session_id: &SessionId, _call: &FunctionCall, _round_trip: usize) {
    }

    fn on_turn_complete(&self, _session_id: &SessionId, _report: &TurnReport, _elapsed: Duration) {
    }

    fn on_turn_failed(
        &self,
        _session_id: &SessionId,
        _report: &TurnReport,
        _error: &ChatError,
        _elapsed: Duration,
    ) {
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAgentLoopHooks;

impl AgentLoopHooks for NoopAgentLoopHooks {}
