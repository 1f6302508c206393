// ABOUTME: MCP inspection core: classification, correlation, tracking proxy and connection lifecycle
// ABOUTME: Consumes an abstract transport and produces state and history snapshots for the UI

//! MCP inspection core.
//!
//! # Architecture
//!
//! ```text
//! ConnectionManager ──► ServerRegistry (state + client per server)
//!        │
//!        ▼ spawn via TransportFactory
//! McpClient ──► ProxyTransport ──► Transport (stdio / memory)
//!                    │
//!                    ▼ classify once
//!              ServerTracker (bounded history, pending index)
//! ```
//!
//! Each server owns an isolated registry slot and history partition, so work on
//! one server never waits on another.

pub mod client;
pub mod connection;
pub mod history;
pub mod memory;
pub mod message;
pub mod proxy;
pub mod registry;
pub mod state;
pub mod stdio;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::{McpClient, McpError, ServerInfo};
pub use connection::{ConnectionManager, InspectorError};
pub use history::{
    CorrelationAnomaly, Direction, EntryStatus, MessageEntry, MessageTracker, ServerTracker,
};
pub use memory::MemoryTransport;
pub use message::{JsonRpcMessage, MalformedMessage, MessageId, RpcError, classify};
pub use proxy::ProxyTransport;
pub use registry::ServerRegistry;
pub use state::{
    Capabilities, ConnectionEvent, ConnectionState, ConnectionStatus, Prompt, PromptArgument,
    Resource, Tool,
};
pub use stdio::{StdioTransport, StdioTransportFactory};
pub use transport::{Transport, TransportError, TransportFactory};
