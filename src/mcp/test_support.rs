// ABOUTME: Scripted in-memory MCP servers used by unit tests
// ABOUTME: A factory hands out MemoryTransport ends wired to a task that answers per script

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use super::memory::MemoryTransport;
use super::transport::{Transport, TransportError, TransportFactory};
use crate::config::ServerConfig;

/// How a fake server behaves.
#[derive(Clone, Default)]
pub(crate) struct Script {
    pub capabilities: Value,
    /// Method -> result, or error code.
    pub results: HashMap<String, Result<Value, i64>>,
    /// When set, `initialize` is answered only after this is notified.
    pub initialize_gate: Option<Arc<Notify>>,
    pub fail_initialize: bool,
}

impl Script {
    pub fn with_capabilities(capabilities: Value) -> Self {
        Self {
            capabilities,
            ..Self::default()
        }
    }

    pub fn result(mut self, method: &str, result: Value) -> Self {
        self.results.insert(method.to_string(), Ok(result));
        self
    }

    pub fn error(mut self, method: &str, code: i64) -> Self {
        self.results.insert(method.to_string(), Err(code));
        self
    }
}

/// Start a fake server task and return the client's end.
pub(crate) fn start(script: Script) -> Arc<MemoryTransport> {
    let (client_end, server_end) = MemoryTransport::pair();
    tokio::spawn(async move {
        while let Ok(Some(message)) = server_end.recv().await {
            let (Some(id), Some(method)) = (message.get("id").cloned(), message["method"].as_str())
            else {
                continue;
            };
            let outcome = if method == "initialize" {
                if let Some(gate) = &script.initialize_gate {
                    gate.notified().await;
                }
                if script.fail_initialize {
                    Err(-32603)
                } else {
                    Ok(json!({
                        "protocolVersion": "2024-11-05",
                        "serverInfo": {"name": "fake", "version": "0.0.1"},
                        "capabilities": script.capabilities,
                    }))
                }
            } else {
                script.results.get(method).cloned().unwrap_or(Err(-32601))
            };
            let reply = match outcome {
                Ok(result) => json!({"jsonrpc": "2.0", "id": id, "result": result}),
                Err(code) => json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": {"code": code, "message": format!("{method} failed")}
                }),
            };
            if server_end.send(reply).await.is_err() {
                break;
            }
        }
    });
    Arc::new(client_end)
}

/// Factory serving a script per server name.
#[derive(Default)]
pub(crate) struct FakeFactory {
    scripts: HashMap<String, Script>,
    spawned: AtomicUsize,
    transports: Mutex<Vec<Arc<MemoryTransport>>>,
    close_delay: Option<Duration>,
}

impl FakeFactory {
    pub fn with(mut self, server: &str, script: Script) -> Self {
        self.scripts.insert(server.to_string(), script);
        self
    }

    /// Make every transport's `close` wait `delay` before shutting down.
    pub fn with_close_delay(mut self, delay: Duration) -> Self {
        self.close_delay = Some(delay);
        self
    }

    pub fn spawn_count(&self) -> usize {
        self.spawned.load(Ordering::SeqCst)
    }

    /// Client-side ends handed out so far, oldest first.
    pub fn transports(&self) -> Vec<Arc<MemoryTransport>> {
        self.transports.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransportFactory for FakeFactory {
    async fn spawn(&self, config: &ServerConfig) -> Result<Arc<dyn Transport>, TransportError> {
        let script = self
            .scripts
            .get(&config.name)
            .cloned()
            .ok_or_else(|| TransportError::Spawn {
                command: config.command.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such server"),
            })?;
        self.spawned.fetch_add(1, Ordering::SeqCst);
        let transport = start(script);
        self.transports.lock().unwrap().push(Arc::clone(&transport));
        match self.close_delay {
            Some(delay) => Ok(Arc::new(SlowClose {
                inner: transport,
                delay,
            })),
            None => Ok(transport),
        }
    }
}

/// Transport whose shutdown takes a while, like a child process slow to exit.
struct SlowClose {
    inner: Arc<MemoryTransport>,
    delay: Duration,
}

#[async_trait]
impl Transport for SlowClose {
    async fn send(&self, message: Value) -> Result<(), TransportError> {
        self.inner.send(message).await
    }

    async fn recv(&self) -> Result<Option<Value>, TransportError> {
        self.inner.recv().await
    }

    async fn close(&self) -> Result<(), TransportError> {
        tokio::time::sleep(self.delay).await;
        self.inner.close().await
    }
}

pub(crate) fn server(name: &str) -> ServerConfig {
    ServerConfig {
        name: name.to_string(),
        command: format!("{name}-server"),
        args: Vec::new(),
        env: std::collections::BTreeMap::new(),
    }
}
