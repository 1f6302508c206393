// ABOUTME: Abstract message transport between the inspector and one server process
// ABOUTME: The client, the tracking proxy and the connection manager only ever see these traits

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::config::ServerConfig;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("transport is closed")]
    Closed,
}

/// Bidirectional JSON message channel to a single server.
///
/// Messages are delivered in the order they were sent within each direction.
/// `recv` yields `Ok(None)` once the peer has gone away or `close` was called.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one message.
    async fn send(&self, message: Value) -> Result<(), TransportError>;

    /// Wait for the next inbound message.
    async fn recv(&self) -> Result<Option<Value>, TransportError>;

    /// Shut the channel down. Safe to call more than once.
    async fn close(&self) -> Result<(), TransportError>;
}

/// Creates a fresh transport for a configured server.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransportFactory: Send + Sync {
    /// Start the server described by `config` and connect to it.
    async fn spawn(&self, config: &ServerConfig) -> Result<Arc<dyn Transport>, TransportError>;
}
