// ABOUTME: Connection lifecycle manager driving connect/disconnect/refresh per server
// ABOUTME: Spawns transports behind the tracking proxy and runs capability-gated listings

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::client::{McpClient, McpError};
use super::history::{MessageEntry, MessageTracker};
use super::proxy::ProxyTransport;
use super::registry::{Completion, Listings, ServerRegistry};
use super::state::{Capabilities, ConnectionState, ConnectionStatus};
use super::transport::TransportFactory;
use crate::config::{InspectorSettings, ServerConfig};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InspectorError {
    #[error("unknown server: {0}")]
    UnknownServer(String),
}

struct Inner {
    registry: ServerRegistry,
    tracker: MessageTracker,
    factory: Arc<dyn TransportFactory>,
    request_timeout: Duration,
}

/// Entry point for the UI: connect, disconnect and read snapshots.
///
/// Cloning is cheap; clones share all state, so a clone can be moved into a
/// spawned task while the UI keeps reading snapshots.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

impl ConnectionManager {
    pub fn new(
        servers: Vec<ServerConfig>,
        settings: &InspectorSettings,
        factory: Arc<dyn TransportFactory>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry: ServerRegistry::new(servers),
                tracker: MessageTracker::new(settings.history_capacity, settings.request_timeout),
                factory,
                request_timeout: settings.request_timeout,
            }),
        }
    }

    /// The server table.
    pub fn registry(&self) -> &ServerRegistry {
        &self.inner.registry
    }

    /// Configured server names.
    pub fn servers(&self) -> Vec<String> {
        self.inner.registry.list()
    }

    /// Connect `name`, returning the status once the attempt settles.
    ///
    /// A no-op returning the current status when already connecting or
    /// connected. A result that lost a race with `disconnect` is discarded.
    pub async fn connect(&self, name: &str) -> Result<ConnectionStatus, InspectorError> {
        let registry = &self.inner.registry;
        let unknown = || InspectorError::UnknownServer(name.to_string());

        let Some(generation) = registry.begin_connect(name).ok_or_else(unknown)? else {
            return self.status(name);
        };
        let config = registry.config(name).cloned().ok_or_else(unknown)?;

        info!(server = %name, generation, command = %config.command_line(), "Connecting to server");

        let completion = match self.establish(&config).await {
            Ok((client, capabilities, listings)) => Completion::Established {
                client,
                capabilities,
                listings,
            },
            Err(message) => {
                error!(server = %name, error = %message, "Connection failed");
                Completion::Failed(message)
            }
        };

        match registry.complete_connect(name, generation, completion) {
            Ok(()) => {}
            Err(Completion::Established { client, .. }) => {
                info!(server = %name, generation, "Closing connection that finished after disconnect");
                if let Err(e) = client.close().await {
                    debug!(server = %name, error = %e, "Ignoring close failure");
                }
            }
            Err(Completion::Failed(_)) => {}
        }

        self.status(name)
    }

    async fn establish(
        &self,
        config: &ServerConfig,
    ) -> Result<(Arc<McpClient>, Capabilities, Listings), String> {
        let transport = self
            .inner
            .factory
            .spawn(config)
            .await
            .map_err(|e| e.to_string())?;

        let tracker = self.inner.tracker.server(&config.name);
        let proxy = Arc::new(ProxyTransport::new(transport, &tracker));
        let client = Arc::new(McpClient::new(
            &config.name,
            proxy,
            self.inner.request_timeout,
        ));

        match client.initialize().await {
            Ok(info) => {
                info!(
                    server = %config.name,
                    name = ?info.name,
                    version = ?info.version,
                    capabilities = ?info.capabilities,
                    "Handshake complete"
                );
                let listings = fetch_listings(&config.name, &client, info.capabilities).await;
                Ok((client, info.capabilities, listings))
            }
            Err(e) => {
                if let Err(close_err) = client.close().await {
                    debug!(server = %config.name, error = %close_err, "Ignoring close failure");
                }
                Err(e.to_string())
            }
        }
    }

    /// Disconnect `name`. Idempotent; pending requests are marked aborted.
    ///
    /// Only sessions started before the call are aborted, so a reconnect that
    /// begins while the old client is still closing keeps its requests.
    pub async fn disconnect(&self, name: &str) -> Result<(), InspectorError> {
        let watermark = self.inner.tracker.session_watermark(name);
        let client = self
            .inner
            .registry
            .disconnect(name)
            .ok_or_else(|| InspectorError::UnknownServer(name.to_string()))?;

        let aborted = self.inner.tracker.abort_through(name, watermark);
        if aborted > 0 {
            info!(server = %name, aborted, "Aborted pending requests on disconnect");
        }

        if let Some(client) = client {
            info!(server = %name, "Disconnecting from server");
            if let Err(e) = client.close().await {
                debug!(server = %name, error = %e, "Ignoring close failure");
            }
        }
        Ok(())
    }

    /// Re-run listings for a connected server. Returns whether they were replaced.
    pub async fn refresh(&self, name: &str) -> Result<bool, InspectorError> {
        let registry = &self.inner.registry;
        if registry.config(name).is_none() {
            return Err(InspectorError::UnknownServer(name.to_string()));
        }
        let Some((generation, client, capabilities)) = registry.connected(name) else {
            debug!(server = %name, "Refresh ignored, not connected");
            return Ok(false);
        };

        let listings = fetch_listings(name, &client, capabilities).await;
        Ok(registry.replace_listings(name, generation, listings))
    }

    /// Disconnect every server.
    pub async fn shutdown(&self) {
        for name in self.servers() {
            let _ = self.disconnect(&name).await;
        }
    }

    /// Snapshot of `name`'s connection state.
    pub fn get_state(&self, name: &str) -> Result<ConnectionState, InspectorError> {
        self.inner
            .registry
            .state(name)
            .ok_or_else(|| InspectorError::UnknownServer(name.to_string()))
    }

    /// Snapshot of `name`'s message history, oldest first.
    pub fn get_history(&self, name: &str) -> Result<Vec<MessageEntry>, InspectorError> {
        if self.inner.registry.config(name).is_none() {
            return Err(InspectorError::UnknownServer(name.to_string()));
        }
        Ok(self.inner.tracker.history(name))
    }

    fn status(&self, name: &str) -> Result<ConnectionStatus, InspectorError> {
        self.get_state(name).map(|s| s.status)
    }
}

/// Run the listing calls the server advertised, each failing independently.
async fn fetch_listings(server: &str, client: &McpClient, capabilities: Capabilities) -> Listings {
    let (resources, prompts, tools) = tokio::join!(
        gated(server, "resources", capabilities.resources, client.list_resources()),
        gated(server, "prompts", capabilities.prompts, client.list_prompts()),
        gated(server, "tools", capabilities.tools, client.list_tools()),
    );
    Listings {
        resources,
        prompts,
        tools,
    }
}

async fn gated<T>(
    server: &str,
    category: &str,
    enabled: bool,
    call: impl Future<Output = Result<Vec<T>, McpError>>,
) -> Vec<T> {
    if !enabled {
        return Vec::new();
    }
    match call.await {
        Ok(items) => {
            debug!(server = %server, category, count = items.len(), "Listing fetched");
            items
        }
        Err(e) => {
            warn!(server = %server, category, error = %e, "Listing failed, leaving it empty");
            Vec::new()
        }
    }
}
