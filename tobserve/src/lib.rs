//! Observability hooks for gateway calls, tool execution, and agent turns.
//!
//! ```rust
//! use tobserve::{MetricsObservabilityHooks, SafeGatewayHooks, TracingObservabilityHooks};
//!
//! let _gateway_hooks = SafeGatewayHooks::new(TracingObservabilityHooks);
//! let _metrics = MetricsObservabilityHooks;
//! ```

mod layered_hooks;
mod metrics_hooks;
mod safe_hooks;
mod tracing_hooks;

pub use layered_hooks::{LayeredHooks, RelayObservabilityHooks};
pub use metrics_hooks::MetricsObservabilityHooks;
pub use safe_hooks::{SafeAgentHooks, SafeGatewayHooks, SafeToolHooks};
pub use tracing_hooks::TracingObservabilityHooks;

pub mod prelude {
    pub use crate::{
        LayeredHooks, MetricsObservabilityHooks, RelayObservabilityHooks, SafeAgentHooks,
        SafeGatewayHooks, SafeToolHooks, TracingObservabilityHooks,
    };
}

#[cfg(test)]
mod tests;
