// ABOUTME: Minimal MCP client: JSON-RPC calls, the initialize handshake and paginated listings
// ABOUTME: A background reader task routes responses to waiters and answers server pings

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::message::{JsonRpcMessage, MessageId, RpcError, classify};
use super::state::{Capabilities, Prompt, Resource, Tool};
use super::transport::{Transport, TransportError};

/// Protocol revision sent in `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Name reported in `clientInfo`.
pub const CLIENT_NAME: &str = "mcp-inspect";

/// Upper bound on `nextCursor` pages followed per listing.
const MAX_PAGES: usize = 100;

#[derive(Error, Debug)]
pub enum McpError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("server returned error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("{method} timed out after {}s", .timeout.as_secs())]
    Timeout { method: String, timeout: Duration },

    #[error("connection closed")]
    Closed,

    #[error("protocol error: {0}")]
    Protocol(String),
}

impl From<RpcError> for McpError {
    fn from(e: RpcError) -> Self {
        Self::Rpc {
            code: e.code,
            message: e.message,
        }
    }
}

type Waiters = Arc<Mutex<HashMap<i64, oneshot::Sender<Result<Value, RpcError>>>>>;

/// What the server told us during `initialize`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServerInfo {
    pub name: Option<String>,
    pub version: Option<String>,
    pub protocol_version: Option<String>,
    pub capabilities: Capabilities,
}

/// JSON-RPC client bound to one transport.
pub struct McpClient {
    server: String,
    transport: Arc<dyn Transport>,
    next_id: AtomicI64,
    waiters: Waiters,
    request_timeout: Duration,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl McpClient {
    /// Start the reader task over `transport`. Must run inside a tokio runtime.
    pub fn new(server: &str, transport: Arc<dyn Transport>, request_timeout: Duration) -> Self {
        let waiters: Waiters = Arc::default();
        let reader = tokio::spawn(reader_loop(
            server.to_string(),
            Arc::clone(&transport),
            Arc::clone(&waiters),
        ));
        Self {
            server: server.to_string(),
            transport,
            next_id: AtomicI64::new(1),
            waiters,
            request_timeout,
            reader: Mutex::new(Some(reader)),
        }
    }

    /// Send a request and wait for its result.
    pub async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, McpError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        lock(&self.waiters).insert(id, tx);

        let mut message = json!({"jsonrpc": "2.0", "id": id, "method": method});
        if let Some(params) = params {
            message["params"] = params;
        }

        debug!(server = %self.server, id, %method, "Sending request");
        if let Err(e) = self.transport.send(message).await {
            lock(&self.waiters).remove(&id);
            return Err(e.into());
        }

        match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(outcome)) => outcome.map_err(McpError::from),
            Ok(Err(_)) => Err(McpError::Closed),
            Err(_) => {
                lock(&self.waiters).remove(&id);
                Err(McpError::Timeout {
                    method: method.to_string(),
                    timeout: self.request_timeout,
                })
            }
        }
    }

    /// Send a notification.
    pub async fn notify(&self, method: &str, params: Option<Value>) -> Result<(), McpError> {
        let mut message = json!({"jsonrpc": "2.0", "method": method});
        if let Some(params) = params {
            message["params"] = params;
        }
        self.transport.send(message).await?;
        Ok(())
    }

    /// Run the `initialize` handshake and send `notifications/initialized`.
    pub async fn initialize(&self) -> Result<ServerInfo, McpError> {
        let result = self
            .request(
                "initialize",
                Some(json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {
                        "name": CLIENT_NAME,
                        "version": env!("CARGO_PKG_VERSION"),
                    },
                })),
            )
            .await?;

        if !result.is_object() {
            return Err(McpError::Protocol(format!(
                "initialize returned {result} instead of an object"
            )));
        }

        self.notify("notifications/initialized", None).await?;

        let text = |v: Option<&Value>| v.and_then(Value::as_str).map(str::to_string);
        let info = result.get("serverInfo");
        Ok(ServerInfo {
            name: text(info.and_then(|i| i.get("name"))),
            version: text(info.and_then(|i| i.get("version"))),
            protocol_version: text(result.get("protocolVersion")),
            capabilities: Capabilities::from_server(result.get("capabilities")),
        })
    }

    /// `resources/list`, all pages.
    pub async fn list_resources(&self) -> Result<Vec<Resource>, McpError> {
        self.list_paged("resources/list", "resources").await
    }

    /// `prompts/list`, all pages.
    pub async fn list_prompts(&self) -> Result<Vec<Prompt>, McpError> {
        self.list_paged("prompts/list", "prompts").await
    }

    /// `tools/list`, all pages.
    pub async fn list_tools(&self) -> Result<Vec<Tool>, McpError> {
        self.list_paged("tools/list", "tools").await
    }

    async fn list_paged<T: DeserializeOwned>(
        &self,
        method: &str,
        key: &str,
    ) -> Result<Vec<T>, McpError> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let params = cursor.take().map(|c| json!({ "cursor": c }));
            let mut result = self.request(method, params).await?;

            let page = result
                .get_mut(key)
                .map(Value::take)
                .ok_or_else(|| McpError::Protocol(format!("{method} result has no \"{key}\"")))?;
            let page: Vec<T> = serde_json::from_value(page)
                .map_err(|e| McpError::Protocol(format!("{method}: {e}")))?;
            items.extend(page);

            match result.get("nextCursor").and_then(Value::as_str) {
                Some(next) if !next.is_empty() => cursor = Some(next.to_string()),
                _ => return Ok(items),
            }
        }

        warn!(server = %self.server, %method, pages = MAX_PAGES, "Stopped following pagination");
        Ok(items)
    }

    /// Fail outstanding requests and close the transport.
    pub async fn close(&self) -> Result<(), McpError> {
        lock(&self.waiters).clear();
        let result = self.transport.close().await;
        if let Some(reader) = self
            .reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            reader.abort();
        }
        result.map_err(McpError::from)
    }

    /// Number of requests awaiting a response.
    pub fn in_flight(&self) -> usize {
        lock(&self.waiters).len()
    }
}

impl Drop for McpClient {
    fn drop(&mut self) {
        if let Some(reader) = self
            .reader
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            reader.abort();
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn reader_loop(server: String, transport: Arc<dyn Transport>, waiters: Waiters) {
    loop {
        let message = match transport.recv().await {
            Ok(Some(message)) => message,
            Ok(None) => {
                debug!(server = %server, "Transport closed");
                break;
            }
            Err(e) => {
                warn!(server = %server, error = %e, "Transport receive failed");
                break;
            }
        };

        match classify(&message) {
            Ok(JsonRpcMessage::Response { id, outcome }) => {
                let waiter = match &id {
                    MessageId::Number(n) => lock(&waiters).remove(n),
                    _ => None,
                };
                match waiter {
                    // Receiver may have timed out already
                    Some(tx) => {
                        let _ = tx.send(outcome);
                    }
                    None => debug!(server = %server, %id, "Response for unknown request"),
                }
            }
            Ok(JsonRpcMessage::Request { id, method, .. }) => {
                let reply = if method == "ping" {
                    json!({"jsonrpc": "2.0", "id": id.to_json(), "result": {}})
                } else {
                    json!({
                        "jsonrpc": "2.0",
                        "id": id.to_json(),
                        "error": {"code": -32601, "message": format!("Method not found: {method}")},
                    })
                };
                if let Err(e) = transport.send(reply).await {
                    warn!(server = %server, error = %e, "Failed to answer server request");
                }
            }
            Ok(JsonRpcMessage::Notification { method, .. }) => {
                debug!(server = %server, %method, "Notification received");
            }
            Err(e) => warn!(server = %server, error = %e, "Ignoring malformed message"),
        }
    }

    // Dropping the senders wakes every waiter with Closed
    lock(&waiters).clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::memory::MemoryTransport;
    use pretty_assertions::assert_eq;

    /// Spawn a server task that answers each request with `respond(method, params)`.
    fn serve<F>(server_end: MemoryTransport, respond: F) -> JoinHandle<Vec<Value>>
    where
        F: Fn(&str, &Value) -> Option<Value> + Send + 'static,
    {
        tokio::spawn(async move {
            let mut seen = Vec::new();
            while let Ok(Some(message)) = server_end.recv().await {
                seen.push(message.clone());
                let (Some(id), Some(method)) = (message.get("id"), message["method"].as_str())
                else {
                    continue;
                };
                let params = message.get("params").cloned().unwrap_or(Value::Null);
                if let Some(result) = respond(method, &params) {
                    let _ = server_end
                        .send(json!({"jsonrpc": "2.0", "id": id, "result": result}))
                        .await;
                }
            }
            seen
        })
    }

    #[tokio::test]
    async fn test_initialize_reads_capabilities_and_sends_initialized() {
        let (client_end, server_end) = MemoryTransport::pair();
        let server = serve(server_end, |method, _| match method {
            "initialize" => Some(json!({
                "protocolVersion": "2024-11-05",
                "serverInfo": {"name": "demo", "version": "1.2.3"},
                "capabilities": {"tools": {}}
            })),
            _ => None,
        });
        let client = McpClient::new("demo", Arc::new(client_end), Duration::from_secs(5));

        let info = client.initialize().await.unwrap();
        assert_eq!(info.name.as_deref(), Some("demo"));
        assert_eq!(info.version.as_deref(), Some("1.2.3"));
        assert!(info.capabilities.tools);
        assert!(!info.capabilities.resources);

        client.close().await.unwrap();
        let seen = server.await.unwrap();
        assert_eq!(seen[0]["params"]["clientInfo"]["name"], CLIENT_NAME);
        assert_eq!(seen[1]["method"], "notifications/initialized");
        assert!(seen[1].get("id").is_none());
    }

    #[tokio::test]
    async fn test_listing_follows_cursor() {
        let (client_end, server_end) = MemoryTransport::pair();
        let _server = serve(server_end, |method, params| match (method, params["cursor"].as_str()) {
            ("tools/list", None) => Some(json!({"tools": [{"name": "a"}], "nextCursor": "p2"})),
            ("tools/list", Some("p2")) => Some(json!({"tools": [{"name": "b"}]})),
            _ => None,
        });
        let client = McpClient::new("demo", Arc::new(client_end), Duration::from_secs(5));

        let names: Vec<_> = client
            .list_tools()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_rpc_error_is_surfaced() {
        let (client_end, server_end) = MemoryTransport::pair();
        tokio::spawn(async move {
            while let Ok(Some(message)) = server_end.recv().await {
                let _ = server_end
                    .send(json!({
                        "jsonrpc": "2.0",
                        "id": message["id"],
                        "error": {"code": -32601, "message": "Method not found"}
                    }))
                    .await;
            }
        });
        let client = McpClient::new("demo", Arc::new(client_end), Duration::from_secs(5));

        let err = client.list_prompts().await.unwrap_err();
        assert!(matches!(err, McpError::Rpc { code: -32601, .. }));
    }

    #[tokio::test]
    async fn test_request_times_out() {
        let (client_end, _server_end) = MemoryTransport::pair();
        let client = McpClient::new("demo", Arc::new(client_end), Duration::from_millis(50));

        let err = client.request("slow", None).await.unwrap_err();
        assert!(matches!(err, McpError::Timeout { ref method, .. } if method == "slow"));
        assert_eq!(client.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_peer_closing_fails_waiters() {
        let (client_end, server_end) = MemoryTransport::pair();
        let client = McpClient::new("demo", Arc::new(client_end), Duration::from_secs(5));
        tokio::spawn(async move {
            let _ = server_end.recv().await;
            server_end.close().await
        });

        assert!(matches!(client.request("x", None).await, Err(McpError::Closed)));
    }

    #[tokio::test]
    async fn test_server_ping_is_answered() {
        let (client_end, server_end) = MemoryTransport::pair();
        let _client = McpClient::new("demo", Arc::new(client_end), Duration::from_secs(5));

        server_end
            .send(json!({"jsonrpc": "2.0", "id": "srv-1", "method": "ping"}))
            .await
            .unwrap();
        let reply = server_end.recv().await.unwrap().unwrap();
        assert_eq!(reply, json!({"jsonrpc": "2.0", "id": "srv-1", "result": {}}));

        server_end
            .send(json!({"jsonrpc": "2.0", "id": 5, "method": "sampling/createMessage"}))
            .await
            .unwrap();
        let reply = server_end.recv().await.unwrap().unwrap();
        assert_eq!(reply["error"]["code"], -32601);
    }
}
