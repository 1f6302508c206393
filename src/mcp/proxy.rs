// ABOUTME: Transport wrapper that records every request, response and notification it carries
// ABOUTME: Messages are forwarded untouched; classification happens once here at the boundary

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{trace, warn};

use super::history::ServerTracker;
use super::message::{JsonRpcMessage, classify};
use super::transport::{Transport, TransportError};

/// Wraps one transport session and feeds its traffic to a [`ServerTracker`].
///
/// Outbound, only requests are tracked. Inbound, responses and notifications
/// are tracked. Server-initiated requests and client replies to them pass
/// through untracked. Malformed messages are logged and still forwarded.
pub struct ProxyTransport {
    inner: Arc<dyn Transport>,
    tracker: ServerTracker,
}

impl ProxyTransport {
    /// Wrap `inner`, recording into a fresh session of `tracker`.
    pub fn new(inner: Arc<dyn Transport>, tracker: &ServerTracker) -> Self {
        Self {
            inner,
            tracker: tracker.new_session(),
        }
    }

    /// The session handle entries are recorded under.
    pub const fn tracker(&self) -> &ServerTracker {
        &self.tracker
    }
}

#[async_trait]
impl Transport for ProxyTransport {
    async fn send(&self, message: Value) -> Result<(), TransportError> {
        match classify(&message) {
            Ok(request @ JsonRpcMessage::Request { .. }) => {
                self.tracker.record(&request, &message);
            }
            Ok(other) => {
                trace!(kind = ?other.method(), "Outbound message not tracked");
            }
            Err(e) => warn!(error = %e, "Outbound message is malformed"),
        }
        self.inner.send(message).await
    }

    async fn recv(&self) -> Result<Option<Value>, TransportError> {
        let Some(message) = self.inner.recv().await? else {
            return Ok(None);
        };
        match classify(&message) {
            Ok(JsonRpcMessage::Request { method, .. }) => {
                trace!(%method, "Server-initiated request not tracked");
            }
            Ok(inbound) => {
                self.tracker.record(&inbound, &message);
            }
            Err(e) => warn!(error = %e, "Dropping malformed inbound message from history"),
        }
        Ok(Some(message))
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.tracker.abort_session();
        self.inner.close().await
    }
}
