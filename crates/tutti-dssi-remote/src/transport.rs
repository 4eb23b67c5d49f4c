//! IPC transport layer
//!
//! Length-prefixed bincode frames over a Unix domain socket. Both halves live here:
//! the adapter uses [`MessageTransport::connect`], a plugin server (or a test)
//! uses [`TransportListener`].

use crate::error::Result;
use crate::protocol::{BridgeMessage, HostMessage};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};

#[cfg(not(unix))]
compile_error!("tutti-dssi-remote requires Unix domain sockets");

/// Message transport for IPC
pub struct MessageTransport {
    stream: UnixStream,
}

impl MessageTransport {
    /// Create transport from existing Unix stream
    pub fn new(stream: UnixStream) -> Self {
        Self { stream }
    }

    /// Connect to socket path
    pub async fn connect(socket_path: &Path) -> Result<Self> {
        let stream = UnixStream::connect(socket_path).await?;
        Ok(Self::new(stream))
    }

    // TODO: a write to a dead server raises SIGPIPE in hosts that do not ignore it;
    // send with MSG_NOSIGNAL once the stream is driven through a raw fd.
    async fn send<T: Serialize>(&mut self, msg: &T) -> Result<()> {
        let data = bincode::serialize(msg)?;
        self.stream.write_u32(data.len() as u32).await?;
        self.stream.write_all(&data).await?;
        Ok(())
    }

    async fn recv<T: DeserializeOwned>(&mut self) -> Result<T> {
        let len = self.stream.read_u32().await? as usize;
        let mut data = vec![0u8; len];
        self.stream.read_exact(&mut data).await?;
        Ok(bincode::deserialize(&data)?)
    }

    /// Send a host message
    pub async fn send_host_message(&mut self, msg: &HostMessage) -> Result<()> {
        self.send(msg).await
    }

    /// Receive a bridge message
    pub async fn recv_bridge_message(&mut self) -> Result<BridgeMessage> {
        self.recv().await
    }

    /// Send a bridge message
    pub async fn send_bridge_message(&mut self, msg: &BridgeMessage) -> Result<()> {
        self.send(msg).await
    }

    /// Receive a host message
    pub async fn recv_host_message(&mut self) -> Result<HostMessage> {
        self.recv().await
    }
}

/// Server-side transport listener
pub struct TransportListener {
    listener: UnixListener,
}

impl TransportListener {
    /// Bind to socket path
    pub async fn bind(socket_path: &Path) -> Result<Self> {
        // Remove existing socket if it exists
        let _ = std::fs::remove_file(socket_path);
        let listener = UnixListener::bind(socket_path)?;
        Ok(Self { listener })
    }

    /// Accept a connection
    pub async fn accept(&self) -> Result<MessageTransport> {
        let (stream, _) = self.listener.accept().await?;
        Ok(MessageTransport::new(stream))
    }
}
