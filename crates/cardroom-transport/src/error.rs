//! Error types for the transport layer.

/// Errors that can occur in the transport layer.
///
/// The frame-level variants wrap the WebSocket library's own error and
/// are gated with the transport that produces them.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Binding the listener or accepting a raw TCP connection failed.
    #[error("accept failed: {0}")]
    Accept(#[from] std::io::Error),

    /// The WebSocket handshake did not complete.
    #[cfg(feature = "websocket")]
    #[error("websocket handshake failed: {0}")]
    Handshake(#[source] tokio_tungstenite::tungstenite::Error),

    /// Sending a frame failed. The peer is treated as gone; the session
    /// layer learns about that through a close event, not through this
    /// error.
    #[cfg(feature = "websocket")]
    #[error("send failed: {0}")]
    Send(#[source] tokio_tungstenite::tungstenite::Error),

    /// Receiving a frame failed mid-stream.
    #[cfg(feature = "websocket")]
    #[error("receive failed: {0}")]
    Receive(#[source] tokio_tungstenite::tungstenite::Error),
}
