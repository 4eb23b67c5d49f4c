//! Error types for the remote plugin channel

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Remote plugin channel closed")]
    ChannelClosed,

    #[error("Remote plugin host error: {0}")]
    Remote(String),

    #[error("Timeout after {duration_ms}ms: {operation}")]
    Timeout { operation: String, duration_ms: u64 },

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

impl BridgeError {
    /// True for failures that leave the channel unusable for good.
    pub fn is_channel_closed(&self) -> bool {
        matches!(
            self,
            BridgeError::ChannelClosed | BridgeError::Io(_) | BridgeError::Serialization(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
