//! Session configuration.

/// Channel endpoint used when none is configured.
pub const DEFAULT_CHANNEL_ENDPOINT: &str = "ws://localhost:8080/ws/websocket";

/// Configuration for a [`Session`](crate::Session).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// WebSocket endpoint of the STOMP broker.
    pub channel_endpoint: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { channel_endpoint: DEFAULT_CHANNEL_ENDPOINT.to_string() }
    }
}
