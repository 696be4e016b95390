//! Bridge configuration.

use std::path::PathBuf;

/// Default maximum number of requests handled concurrently.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 64;

/// Default capacity of the response channel.
pub const DEFAULT_RESPONSE_BUFFER: usize = 256;

/// Configuration for the bridge server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Directory for the file backend. Records stay in memory when unset,
    /// unless `configure` supplies a `stateDir`.
    pub state_dir: Option<PathBuf>,
    /// Maximum number of lifecycle requests running at once. Further
    /// requests wait before they are read off the input stream.
    pub max_in_flight: usize,
    /// Responses buffered before handlers wait for the writer.
    pub response_buffer: usize,
}

impl BridgeConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state_dir: None,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            response_buffer: DEFAULT_RESPONSE_BUFFER,
        }
    }

    /// Set the state directory.
    #[must_use]
    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = Some(dir.into());
        self
    }

    /// Set the in-flight limit. Zero is raised to one.
    #[must_use]
    pub const fn with_max_in_flight(mut self, max: usize) -> Self {
        self.max_in_flight = if max == 0 { 1 } else { max };
        self
    }

    /// Set the response buffer size. Zero is raised to one.
    #[must_use]
    pub const fn with_response_buffer(mut self, size: usize) -> Self {
        self.response_buffer = if size == 0 { 1 } else { size };
        self
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_config_default() {
        let config = BridgeConfig::default();

        assert_eq!(config.state_dir, None);
        assert_eq!(config.max_in_flight, DEFAULT_MAX_IN_FLIGHT);
        assert_eq!(config.response_buffer, DEFAULT_RESPONSE_BUFFER);
    }

    #[test]
    fn test_bridge_config_builder() {
        let config = BridgeConfig::new()
            .with_state_dir("/var/lib/teamcity")
            .with_max_in_flight(8)
            .with_response_buffer(16);

        assert_eq!(config.state_dir, Some(PathBuf::from("/var/lib/teamcity")));
        assert_eq!(config.max_in_flight, 8);
        assert_eq!(config.response_buffer, 16);
    }

    #[test]
    fn test_bridge_config_zero_limits_are_raised() {
        let config = BridgeConfig::new().with_max_in_flight(0).with_response_buffer(0);

        assert_eq!(config.max_in_flight, 1);
        assert_eq!(config.response_buffer, 1);
    }
}
