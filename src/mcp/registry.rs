// ABOUTME: Immutable server table plus the live connection state and client per server
// ABOUTME: Every mutation goes through the state machine and a per-server generation counter

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

use super::client::McpClient;
use super::state::{
    Capabilities, ConnectionEvent, ConnectionState, ConnectionStatus, Prompt, Resource, Tool,
};
use crate::config::ServerConfig;

/// Result of a finished connect attempt.
pub(crate) enum Completion {
    Established {
        client: Arc<McpClient>,
        capabilities: Capabilities,
        listings: Listings,
    },
    Failed(String),
}

/// Capability-gated listing results.
#[derive(Debug, Default, Clone)]
pub(crate) struct Listings {
    pub resources: Vec<Resource>,
    pub prompts: Vec<Prompt>,
    pub tools: Vec<Tool>,
}

#[derive(Default)]
struct ServerSlot {
    state: ConnectionState,
    client: Option<Arc<McpClient>>,
    generation: u64,
}

impl ServerSlot {
    fn transition(&mut self, event: ConnectionEvent) -> bool {
        match self.state.status.next(event) {
            Some(next) => {
                self.state.status = next;
                true
            }
            None => false,
        }
    }
}

/// Configured servers and their live connection slots.
pub struct ServerRegistry {
    configs: Vec<ServerConfig>,
    slots: HashMap<String, Mutex<ServerSlot>>,
}

impl ServerRegistry {
    /// Build from configs. Names are expected to be unique; later duplicates are ignored.
    pub fn new(configs: Vec<ServerConfig>) -> Self {
        let mut seen = HashMap::new();
        let mut unique = Vec::with_capacity(configs.len());
        for config in configs {
            if seen.contains_key(&config.name) {
                continue;
            }
            seen.insert(config.name.clone(), Mutex::new(ServerSlot::default()));
            unique.push(config);
        }
        Self {
            configs: unique,
            slots: seen,
        }
    }

    fn slot(&self, name: &str) -> Option<MutexGuard<'_, ServerSlot>> {
        self.slots
            .get(name)
            .map(|m| m.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Server names in config order.
    pub fn list(&self) -> Vec<String> {
        self.configs.iter().map(|c| c.name.clone()).collect()
    }

    /// Config for `name`.
    pub fn config(&self, name: &str) -> Option<&ServerConfig> {
        self.configs.iter().find(|c| c.name == name)
    }

    /// All configs in order.
    pub fn configs(&self) -> &[ServerConfig] {
        &self.configs
    }

    /// Snapshot of `name`'s state and live client handle.
    pub fn get(&self, name: &str) -> Option<(ConnectionState, Option<Arc<McpClient>>)> {
        self.slot(name)
            .map(|slot| (slot.state.clone(), slot.client.clone()))
    }

    /// Snapshot of `name`'s state.
    pub fn state(&self, name: &str) -> Option<ConnectionState> {
        self.slot(name).map(|slot| slot.state.clone())
    }

    /// Move to `Connecting` and open a new generation.
    ///
    /// Returns `None` for unknown servers, `Some(None)` when a connect is not
    /// legal from the current status.
    pub(crate) fn begin_connect(&self, name: &str) -> Option<Option<u64>> {
        let mut slot = self.slot(name)?;
        if !slot.transition(ConnectionEvent::Connect) {
            debug!(server = %name, status = %slot.state.status, "Connect ignored");
            return Some(None);
        }
        slot.generation += 1;
        slot.state = ConnectionState::cleared(ConnectionStatus::Connecting);
        debug!(server = %name, generation = slot.generation, "Connecting");
        Some(Some(slot.generation))
    }

    /// Apply a connect result if `generation` is still current.
    ///
    /// A stale completion is handed back so the caller can release its client.
    pub(crate) fn complete_connect(
        &self,
        name: &str,
        generation: u64,
        completion: Completion,
    ) -> Result<(), Completion> {
        let Some(mut slot) = self.slot(name) else {
            return Err(completion);
        };
        if slot.generation != generation || slot.state.status != ConnectionStatus::Connecting {
            debug!(
                server = %name,
                generation,
                current = slot.generation,
                "Discarding stale connect result"
            );
            return Err(completion);
        }

        match completion {
            Completion::Established {
                client,
                capabilities,
                listings,
            } => {
                slot.transition(ConnectionEvent::Established);
                slot.state.error = None;
                slot.state.capabilities = capabilities;
                slot.state.resources = listings.resources;
                slot.state.prompts = listings.prompts;
                slot.state.tools = listings.tools;
                slot.client = Some(client);
            }
            Completion::Failed(message) => {
                slot.transition(ConnectionEvent::Failed);
                slot.state.error = Some(message);
                slot.client = None;
            }
        }
        Ok(())
    }

    /// Move to `Disconnected`, invalidating any in-flight connect.
    ///
    /// Returns the client that must be closed, if any. `None` for unknown servers.
    pub(crate) fn disconnect(&self, name: &str) -> Option<Option<Arc<McpClient>>> {
        let mut slot = self.slot(name)?;
        if !slot.transition(ConnectionEvent::Disconnect) {
            return Some(None);
        }
        slot.generation += 1;
        slot.state = ConnectionState::cleared(ConnectionStatus::Disconnected);
        debug!(server = %name, generation = slot.generation, "Disconnected");
        Some(slot.client.take())
    }

    /// Live client of a `Connected` server with its generation.
    pub(crate) fn connected(&self, name: &str) -> Option<(u64, Arc<McpClient>, Capabilities)> {
        let slot = self.slot(name)?;
        if slot.state.status != ConnectionStatus::Connected {
            return None;
        }
        let client = slot.client.clone()?;
        Some((slot.generation, client, slot.state.capabilities))
    }

    /// Replace listings if `generation` is still the connected one.
    pub(crate) fn replace_listings(&self, name: &str, generation: u64, listings: Listings) -> bool {
        let Some(mut slot) = self.slot(name) else {
            return false;
        };
        if slot.generation != generation || slot.state.status != ConnectionStatus::Connected {
            return false;
        }
        slot.state.resources = listings.resources;
        slot.state.prompts = listings.prompts;
        slot.state.tools = listings.tools;
        true
    }
}
