// ABOUTME: In-process transport pair backed by tokio channels
// ABOUTME: Lets an in-process server (or a test double) talk to the client without a child process

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Mutex, mpsc, watch};

use super::transport::{Transport, TransportError};

/// One end of an in-memory transport.
pub struct MemoryTransport {
    outbound: Mutex<Option<mpsc::UnboundedSender<Value>>>,
    inbound: Mutex<mpsc::UnboundedReceiver<Value>>,
    closed: watch::Sender<bool>,
}

impl MemoryTransport {
    /// Two connected ends: whatever one sends, the other receives.
    pub fn pair() -> (Self, Self) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        (Self::new(a_tx, b_rx), Self::new(b_tx, a_rx))
    }

    fn new(outbound: mpsc::UnboundedSender<Value>, inbound: mpsc::UnboundedReceiver<Value>) -> Self {
        Self {
            outbound: Mutex::new(Some(outbound)),
            inbound: Mutex::new(inbound),
            closed: watch::channel(false).0,
        }
    }

    /// Whether `close` has been called on this end.
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&self, message: Value) -> Result<(), TransportError> {
        let guard = self.outbound.lock().await;
        let sender = guard.as_ref().ok_or(TransportError::Closed)?;
        sender.send(message).map_err(|_| TransportError::Closed)
    }

    async fn recv(&self) -> Result<Option<Value>, TransportError> {
        let mut closed = self.closed.subscribe();
        if *closed.borrow() {
            return Ok(None);
        }
        let mut inbound = self.inbound.lock().await;
        tokio::select! {
            message = inbound.recv() => Ok(message),
            _ = closed.changed() => Ok(None),
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.outbound.lock().await.take();
        self.closed.send_replace(true);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_pair_delivers_in_order() {
        let (a, b) = MemoryTransport::pair();
        a.send(json!({"n": 1})).await.unwrap();
        a.send(json!({"n": 2})).await.unwrap();

        assert_eq!(b.recv().await.unwrap(), Some(json!({"n": 1})));
        assert_eq!(b.recv().await.unwrap(), Some(json!({"n": 2})));
    }

    #[tokio::test]
    async fn test_close_ends_both_directions() {
        let (a, b) = MemoryTransport::pair();
        a.close().await.unwrap();

        assert!(a.is_closed());
        assert_eq!(a.recv().await.unwrap(), None);
        assert_eq!(b.recv().await.unwrap(), None);
        assert!(matches!(a.send(json!({})).await, Err(TransportError::Closed)));
    }

    #[tokio::test]
    async fn test_close_wakes_pending_recv() {
        let (a, _b) = MemoryTransport::pair();
        let a = std::sync::Arc::new(a);
        let reader = {
            let a = std::sync::Arc::clone(&a);
            tokio::spawn(async move { a.recv().await })
        };
        tokio::task::yield_now().await;
        a.close().await.unwrap();

        assert_eq!(reader.await.unwrap().unwrap(), None);
    }
}
