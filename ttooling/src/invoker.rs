//! Tool runtime trait and the registry-backed invoker.

use std::sync::Arc;
use std::time::Instant;

use futures_timer::Delay;
use futures_util::future::{Either, select};
use tcommon::BackendId;
use tprovider::FunctionCall;
use tracing::debug;

use crate::{
    CallToolOutcome, ContentBlock, NoopToolRuntimeHooks, ToolError, ToolExecutionContext,
    ToolExecutionResult, ToolFuture, ToolRegistry, ToolRuntimeHooks,
};

pub trait ToolRuntime: Send + Sync {
    fn execute<'a>(
        &'a self,
        call: FunctionCall,
        context: ToolExecutionContext,
    ) -> ToolFuture<'a, Result<ToolExecutionResult, ToolError>>;
}

/// Routes calls through a [`ToolRegistry`] and reduces results to text.
///
/// Calls are never retried here.
#[derive(Clone)]
pub struct ToolInvoker {
    registry: Arc<ToolRegistry>,
    hooks: Arc<dyn ToolRuntimeHooks>,
}

impl ToolInvoker {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            hooks: Arc::new(NoopToolRuntimeHooks),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ToolRuntimeHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn registry(&self) -> Arc<ToolRegistry> {
        Arc::clone(&self.registry)
    }

    async fn invoke(
        &self,
        call: &FunctionCall,
        context: &ToolExecutionContext,
    ) -> Result<ToolExecutionResult, ToolError> {
        if context.cancellation.is_cancelled() {
            return Err(
                ToolError::cancelled("tool call cancelled before dispatch").with_tool_name(&call.name)
            );
        }

        let backend = self.registry.route_for(&call.name).ok_or_else(|| {
            ToolError::not_found(format!("no backend provides tool '{}'", call.name))
                .with_tool_name(&call.name)
        })?;

        let pending = backend
            .session
            .call_tool(&call.name, call.arguments.clone(), &context.cancellation);

        let outcome = match context.timeout {
            None => pending.await,
            Some(limit) => match select(pending, Delay::new(limit)).await {
                Either::Left((outcome, _)) => outcome,
                Either::Right(_) => Err(ToolError::timeout(format!(
                    "tool '{}' did not finish within {limit:?}",
                    call.name
                ))),
            },
        };

        let output = outcome
            .and_then(|outcome| normalize_outcome(&call.name, outcome))
            .map_err(|error| with_call_context(error, &call.name, &backend.id))?;

        Ok(ToolExecutionResult {
            tool_name: call.name.clone(),
            backend_id: backend.id,
            output,
        })
    }
}

impl ToolRuntime for ToolInvoker {
    fn execute<'a>(
        &'a self,
        call: FunctionCall,
        context: ToolExecutionContext,
    ) -> ToolFuture<'a, Result<ToolExecutionResult, ToolError>> {
        Box::pin(async move {
            self.hooks.on_execution_start(&call, &context);
            let started = Instant::now();

            match self.invoke(&call, &context).await {
                Ok(result) => {
                    self.hooks
                        .on_execution_success(&call, &context, &result, started.elapsed());
                    Ok(result)
                }
                Err(error) => {
                    self.hooks
                        .on_execution_failure(&call, &context, &error, started.elapsed());
                    Err(error)
                }
            }
        })
    }
}

impl std::fmt::Debug for ToolInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolInvoker")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Reduces a backend reply to the single text the agent loop feeds back.
pub fn normalize_outcome(tool_name: &str, outcome: CallToolOutcome) -> Result<String, ToolError> {
    if outcome.is_error {
        let text = outcome
            .content
            .iter()
            .filter_map(ContentBlock::as_text)
            .collect::<Vec<_>>()
            .join("\n");
        let message = if text.trim().is_empty() {
            "tool reported an error".to_string()
        } else {
            text
        };
        return Err(ToolError::execution(message).with_tool_name(tool_name));
    }

    let mut blocks = outcome.content.into_iter();
    match blocks.next() {
        None => Err(ToolError::result_malformed("tool returned no content").with_tool_name(tool_name)),
        Some(ContentBlock::Text { text }) => {
            let ignored = blocks.len();
            if ignored > 0 {
                debug!(tool = tool_name, ignored, "ignoring content blocks after the first");
            }
            Ok(text)
        }
        Some(other) => Err(ToolError::result_malformed(format!(
            "expected a text block first, got '{}'",
            other.kind()
        ))
        .with_tool_name(tool_name)),
    }
}

fn with_call_context(mut error: ToolError, tool_name: &str, backend_id: &BackendId) -> ToolError {
    if error.tool_name.is_none() {
        error.tool_name = Some(tool_name.to_string());
    }
    if error.backend_id.is_none() {
        error.backend_id = Some(backend_id.clone());
    }
    error
}
