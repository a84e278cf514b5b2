//! Realtime client errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RealtimeError {
    #[error("WebSocket is not connected")]
    NotConnected,

    #[error("Client was already started")]
    AlreadyStarted,

    #[error("Client task has stopped")]
    Stopped,

    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}
