/// Tunables for the control loop.
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Reasoning iterations allowed per goal before the run is abandoned.
    pub loop_limit: u32,
    /// Conversation turns handed to the oracle per completion.
    pub max_history: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            loop_limit: 20,
            max_history: 10,
        }
    }
}

impl AgentConfig {
    pub fn with_loop_limit(mut self, loop_limit: u32) -> Self {
        self.loop_limit = loop_limit;
        self
    }

    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = max_history;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.loop_limit, 20);
        assert_eq!(config.max_history, 10);
    }

    #[test]
    fn builder_overrides() {
        let config = AgentConfig::default().with_loop_limit(3).with_max_history(4);
        assert_eq!(config.loop_limit, 3);
        assert_eq!(config.max_history, 4);
    }
}
