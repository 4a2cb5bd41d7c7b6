//! The completion/tool-call state machine driven once per user message.

use std::pin::pin;

use futures_util::future::{Either, select};
use tcommon::SessionId;
use tokio_util::sync::CancellationToken;
use tprovider::{
    CompletionGateway, CompletionRequest, FinishReason, FunctionCall, Message, TokenUsage,
};
use tracing::debug;
use ttooling::{ToolDescriptor, ToolExecutionContext, ToolRuntime};

use crate::envelope::function_result_payload;
use crate::{AgentLoopHooks, AgentPolicy, ChatError, Transcript};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoopPhase {
    #[default]
    AwaitingCompletion,
    ToolCallPending,
    Done,
    Failed,
}

impl LoopPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AwaitingCompletion => "awaiting_completion",
            Self::ToolCallPending => "tool_call_pending",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

/// What one user message cost and how it ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TurnReport {
    pub phase: LoopPhase,
    /// Completed tool round-trips: a function call answered by a function result.
    pub round_trips: usize,
    /// Completion requests issued to the gateway.
    pub completions: usize,
    pub usage: TokenUsage,
}

pub(crate) struct AgentLoop<'a> {
    pub gateway: &'a dyn CompletionGateway,
    pub tools: &'a dyn ToolRuntime,
    pub catalog: &'a [ToolDescriptor],
    pub policy: &'a AgentPolicy,
    pub hooks: &'a dyn AgentLoopHooks,
    pub session_id: &'a SessionId,
    pub cancellation: &'a CancellationToken,
}

enum Step {
    AwaitingCompletion,
    ToolCallPending(FunctionCall),
}

impl Step {
    fn phase(&self) -> LoopPhase {
        match self {
            Self::AwaitingCompletion => LoopPhase::AwaitingCompletion,
            Self::ToolCallPending(_) => LoopPhase::ToolCallPending,
        }
    }
}

enum Completion {
    Answer(String),
    Call(FunctionCall),
}

impl AgentLoop<'_> {
    /// Runs until the model answers or the turn fails.
    ///
    /// Whatever was appended before a failure stays in the transcript.
    pub(crate) async fn run(
        &self,
        transcript: &mut Transcript,
        report: &mut TurnReport,
    ) -> Result<String, ChatError> {
        report.phase = LoopPhase::AwaitingCompletion;

        match self.drive(transcript, report).await {
            Ok(answer) => {
                self.transition(report, LoopPhase::Done);
                Ok(answer)
            }
            Err(error) => {
                self.transition(report, LoopPhase::Failed);
                Err(error)
            }
        }
    }

    async fn drive(
        &self,
        transcript: &mut Transcript,
        report: &mut TurnReport,
    ) -> Result<String, ChatError> {
        let mut step = Step::AwaitingCompletion;

        loop {
            let next = match step {
                Step::AwaitingCompletion => match self.complete(transcript, report).await? {
                    Completion::Answer(answer) => return Ok(answer),
                    Completion::Call(call) => Step::ToolCallPending(call),
                },
                Step::ToolCallPending(call) => {
                    self.invoke(call, transcript, report).await?;
                    Step::AwaitingCompletion
                }
            };

            self.transition(report, next.phase());
            step = next;
        }
    }

    fn transition(&self, report: &mut TurnReport, to: LoopPhase) {
        let from = report.phase;
        report.phase = to;
        debug!(
            session = %self.session_id,
            from = from.as_str(),
            to = to.as_str(),
            "agent loop transition"
        );
        self.hooks.on_phase_transition(self.session_id, from, to);
    }

    async fn complete(
        &self,
        transcript: &mut Transcript,
        report: &mut TurnReport,
    ) -> Result<Completion, ChatError> {
        let iteration = report.completions + 1;
        if self.cancellation.is_cancelled() {
            return Err(
                ChatError::cancelled("turn cancelled before completion").with_iteration(iteration)
            );
        }

        let request = CompletionRequest::builder(&self.policy.model)
            .messages(transcript.iter().cloned())
            .temperature(self.policy.temperature)
            .functions(self.catalog.to_vec())
            .metadata("session_id", self.session_id.as_str())
            .build()
            .map_err(|error| ChatError::from(error).with_iteration(iteration))?;

        report.completions = iteration;
        let response = {
            let completion = self.gateway.complete(request);
            let cancelled = pin!(self.cancellation.cancelled());
            match select(completion, cancelled).await {
                Either::Left((result, _)) => {
                    result.map_err(|error| ChatError::from(error).with_iteration(iteration))?
                }
                Either::Right(_) => {
                    return Err(
                        ChatError::cancelled("completion request cancelled").with_iteration(iteration)
                    );
                }
            }
        };

        report.usage.accumulate(response.usage);

        let choice = response.into_first_choice().ok_or_else(|| {
            ChatError::gateway("completion returned no choices").with_iteration(iteration)
        })?;
        let finish_reason = choice.finish_reason;
        let (_, content, function_call) = choice.message.into_parts();

        match function_call {
            Some(call) => {
                transcript.append(Message::assistant_function_call(content, call.clone()));

                if report.round_trips >= self.policy.max_tool_round_trips {
                    return Err(ChatError::max_iterations_exceeded(format!(
                        "model requested another tool after {} round-trips",
                        report.round_trips
                    ))
                    .with_tool_name(call.name)
                    .with_iteration(iteration));
                }

                Ok(Completion::Call(call))
            }
            None if finish_reason == FinishReason::FunctionCall => Err(ChatError::gateway(
                "finish reason was function_call but no function call was returned",
            )
            .with_iteration(iteration)),
            None => {
                transcript.append(Message::assistant(content.clone()));
                Ok(Completion::Answer(content))
            }
        }
    }

    async fn invoke(
        &self,
        call: FunctionCall,
        transcript: &mut Transcript,
        report: &mut TurnReport,
    ) -> Result<(), ChatError> {
        let iteration = report.completions;
        let round_trip = report.round_trips + 1;
        self.hooks.on_function_call(self.session_id, &call, round_trip);
        debug!(
            session = %self.session_id,
            tool = call.name.as_str(),
            round_trip,
            "invoking tool"
        );

        let mut context = ToolExecutionContext::new(self.session_id.clone())
            .with_cancellation(self.cancellation.clone())
            .with_metadata("round_trip", round_trip.to_string());
        if let Some(timeout) = self.policy.tool_timeout {
            context = context.with_timeout(timeout);
        }

        let tool_name = call.name.clone();
        let result = self.tools.execute(call, context).await.map_err(|error| {
            let mut error = ChatError::from(error).with_iteration(iteration);
            if error.tool_name.is_none() {
                error.tool_name = Some(tool_name.clone());
            }
            error
        })?;

        transcript.append(Message::function(function_result_payload(
            &tool_name,
            &result.output,
        )));
        report.round_trips = round_trip;
        Ok(())
    }
}
