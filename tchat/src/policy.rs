//! Per-session agent loop settings.

use std::time::Duration;

pub const DEFAULT_MODEL: &str = "GigaChat-2";
pub const DEFAULT_MAX_TOOL_ROUND_TRIPS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct AgentPolicy {
    pub model: String,
    pub temperature: f32,
    /// Tool round-trips allowed per user message before the turn fails.
    pub max_tool_round_trips: usize,
    pub tool_timeout: Option<Duration>,
}

impl Default for AgentPolicy {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            max_tool_round_trips: DEFAULT_MAX_TOOL_ROUND_TRIPS,
            tool_timeout: None,
        }
    }
}

impl AgentPolicy {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tool_round_trips(mut self, max_tool_round_trips: usize) -> Self {
        self.max_tool_round_trips = max_tool_round_trips;
        self
    }

    pub fn with_tool_timeout(mut self, tool_timeout: Duration) -> Self {
        self.tool_timeout = Some(tool_timeout);
        self
    }
}
