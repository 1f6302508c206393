// ABOUTME: Per-server bounded message history correlating responses to pending requests
// ABOUTME: Each server partition sits behind its own lock so servers never contend with each other

//! Correlation store.
//!
//! Every server gets its own [`ServerTracker`] partition holding a bounded,
//! insertion-ordered log of [`MessageEntry`] values plus an index of requests
//! still waiting for a response. Tracking never fails: responses that cannot
//! be matched are appended as standalone entries carrying a
//! [`CorrelationAnomaly`].
//!
//! Pending requests expire lazily. Every mutation and snapshot first marks
//! requests older than the configured timeout as [`EntryStatus::TimedOut`].

use chrono::{DateTime, Local};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::message::{JsonRpcMessage, MessageId};

/// Which way a tracked message travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Client to server call.
    Request,
    /// Server reply with no pending request to attach to.
    Response,
    /// One-way server message.
    Notification,
}

/// Lifecycle of a tracked entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// Request waiting for its response.
    Pending,
    /// Request answered, or a response/notification entry.
    Completed,
    /// No response arrived within the request timeout.
    TimedOut,
    /// The connection closed before a response arrived.
    Aborted,
}

/// Why a response or request could not be correlated cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelationAnomaly {
    /// No request with this id exists in retained history.
    Unmatched,
    /// The request with this id was already answered.
    Duplicate,
    /// The request with this id had timed out or been aborted.
    Late,
    /// A request reused the id of another request still in flight.
    ReusedId,
}

impl CorrelationAnomaly {
    /// Short label for display.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unmatched => "unmatched",
            Self::Duplicate => "duplicate",
            Self::Late => "late",
            Self::ReusedId => "reused id",
        }
    }
}

/// One observed message.
#[derive(Debug, Clone)]
pub struct MessageEntry {
    /// Monotonic per-server entry id.
    pub id: u64,
    /// Proxy session that observed the message.
    pub session: u64,
    /// Direction of the original message.
    pub direction: Direction,
    /// Protocol id, for requests and responses.
    pub rpc_id: Option<MessageId>,
    /// Method, for requests and notifications.
    pub method: Option<String>,
    /// The message exactly as observed.
    pub payload: Value,
    /// Matching response, attached at most once.
    pub response: Option<Value>,
    /// Wall-clock observation time.
    pub timestamp: DateTime<Local>,
    /// Time from request to matched response.
    pub duration: Option<Duration>,
    /// Current lifecycle state.
    pub status: EntryStatus,
    /// Set when correlation was not clean.
    pub anomaly: Option<CorrelationAnomaly>,
    observed: Instant,
}

impl MessageEntry {
    /// Whether the attached response (or a standalone response payload) is an error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        let body = match self.direction {
            Direction::Request => self.response.as_ref(),
            Direction::Response => Some(&self.payload),
            Direction::Notification => None,
        };
        body.is_some_and(|b| b.get("error").is_some())
    }
}

struct Partition {
    server: String,
    capacity: usize,
    timeout: Duration,
    entries: VecDeque<MessageEntry>,
    pending: HashMap<(u64, MessageId), u64>,
    next_id: u64,
    next_session: u64,
}

impl Partition {
    fn new(server: &str, capacity: usize, timeout: Duration) -> Self {
        Self {
            server: server.to_string(),
            capacity: capacity.max(1),
            timeout,
            entries: VecDeque::new(),
            pending: HashMap::new(),
            next_id: 0,
            next_session: 1,
        }
    }

    fn index_of(&self, entry_id: u64) -> Option<usize> {
        let front = self.entries.front()?.id;
        let idx = usize::try_from(entry_id.checked_sub(front)?).ok()?;
        (idx < self.entries.len()).then_some(idx)
    }

    fn entry_mut(&mut self, entry_id: u64) -> Option<&mut MessageEntry> {
        let idx = self.index_of(entry_id)?;
        self.entries.get_mut(idx)
    }

    fn push(&mut self, mut entry: MessageEntry) -> u64 {
        while self.entries.len() >= self.capacity {
            if let Some(evicted) = self.entries.pop_front() {
                if evicted.status == EntryStatus::Pending {
                    if let Some(rpc_id) = evicted.rpc_id.clone() {
                        let key = (evicted.session, rpc_id);
                        if self.pending.get(&key) == Some(&evicted.id) {
                            self.pending.remove(&key);
                        }
                    }
                    debug!(server = %self.server, entry = evicted.id, "Evicted pending request");
                }
            }
        }
        entry.id = self.next_id;
        self.next_id += 1;
        let id = entry.id;
        self.entries.push_back(entry);
        id
    }

    fn expire(&mut self, now: Instant) {
        let timeout = self.timeout;
        let expired: Vec<((u64, MessageId), u64)> = self
            .pending
            .iter()
            .filter(|(_, entry_id)| {
                self.index_of(**entry_id)
                    .and_then(|idx| self.entries.get(idx))
                    .map_or(true, |e| now.saturating_duration_since(e.observed) >= timeout)
            })
            .map(|(key, entry_id)| (key.clone(), *entry_id))
            .collect();

        for (key, entry_id) in expired {
            self.pending.remove(&key);
            if let Some(entry) = self.entry_mut(entry_id) {
                entry.status = EntryStatus::TimedOut;
            }
            warn!(server = %self.server, id = %key.1, "Request timed out waiting for response");
        }
    }

    fn abort_where(&mut self, matches: impl Fn(&MessageEntry) -> bool) -> usize {
        let targets: Vec<((u64, MessageId), u64)> = self
            .pending
            .iter()
            .filter(|(_, entry_id)| {
                self.index_of(**entry_id)
                    .and_then(|idx| self.entries.get(idx))
                    .is_some_and(&matches)
            })
            .map(|(key, entry_id)| (key.clone(), *entry_id))
            .collect();

        for (key, entry_id) in &targets {
            self.pending.remove(key);
            if let Some(entry) = self.entry_mut(*entry_id) {
                entry.status = EntryStatus::Aborted;
            }
        }
        targets.len()
    }

    /// Anomaly for a response whose id has no pending request in `session`.
    fn classify_orphan(&self, session: u64, rpc_id: &MessageId) -> CorrelationAnomaly {
        self.entries
            .iter()
            .rev()
            .find(|e| {
                e.direction == Direction::Request
                    && e.session == session
                    && e.rpc_id.as_ref() == Some(rpc_id)
            })
            .map_or(CorrelationAnomaly::Unmatched, |e| match e.status {
                EntryStatus::TimedOut | EntryStatus::Aborted => CorrelationAnomaly::Late,
                EntryStatus::Pending | EntryStatus::Completed => CorrelationAnomaly::Duplicate,
            })
    }
}

/// Handle to one server's history partition.
///
/// Cheap to clone. Clones share the partition; [`ServerTracker::new_session`]
/// produces a handle that stamps entries with a fresh session number.
/// Responses only correlate with requests of the same session, and a single
/// connection attempt can be aborted without touching others.
#[derive(Clone)]
pub struct ServerTracker {
    partition: Arc<Mutex<Partition>>,
    session: u64,
}

impl ServerTracker {
    /// Create a standalone partition.
    pub fn new(server: &str, capacity: usize, timeout: Duration) -> Self {
        Self {
            partition: Arc::new(Mutex::new(Partition::new(server, capacity, timeout))),
            session: 0,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Partition> {
        self.partition.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Session number stamped on entries tracked through this handle.
    pub const fn session(&self) -> u64 {
        self.session
    }

    /// Handle sharing this partition under a new session number.
    pub fn new_session(&self) -> Self {
        let mut partition = self.lock();
        let session = partition.next_session;
        partition.next_session += 1;
        Self {
            partition: Arc::clone(&self.partition),
            session,
        }
    }

    /// Record an outbound request and register it as pending.
    pub fn track_request(&self, id: &MessageId, method: &str, payload: &Value) -> u64 {
        self.track_request_at(id, method, payload, Instant::now())
    }

    pub(crate) fn track_request_at(
        &self,
        id: &MessageId,
        method: &str,
        payload: &Value,
        now: Instant,
    ) -> u64 {
        let mut p = self.lock();
        p.expire(now);

        let key = (self.session, id.clone());
        let mut anomaly = None;
        if let Some(previous) = p.pending.remove(&key) {
            if let Some(entry) = p.entry_mut(previous) {
                entry.status = EntryStatus::Aborted;
            }
            debug!(server = %p.server, id = %id, "Request id reused while still pending");
            anomaly = Some(CorrelationAnomaly::ReusedId);
        }

        let entry_id = p.push(MessageEntry {
            id: 0,
            session: self.session,
            direction: Direction::Request,
            rpc_id: Some(id.clone()),
            method: Some(method.to_string()),
            payload: payload.clone(),
            response: None,
            timestamp: Local::now(),
            duration: None,
            status: EntryStatus::Pending,
            anomaly,
            observed: now,
        });
        p.pending.insert(key, entry_id);
        entry_id
    }

    /// Attach an inbound response to its pending request, or record it standalone.
    pub fn track_response(&self, id: &MessageId, payload: &Value) -> u64 {
        self.track_response_at(id, payload, Instant::now())
    }

    pub(crate) fn track_response_at(&self, id: &MessageId, payload: &Value, now: Instant) -> u64 {
        let mut p = self.lock();
        p.expire(now);

        if let Some(entry_id) = p.pending.remove(&(self.session, id.clone())) {
            if let Some(entry) = p.entry_mut(entry_id) {
                entry.response = Some(payload.clone());
                entry.duration = Some(now.saturating_duration_since(entry.observed));
                entry.status = EntryStatus::Completed;
                return entry_id;
            }
        }

        let anomaly = p.classify_orphan(self.session, id);
        debug!(server = %p.server, id = %id, anomaly = anomaly.label(), "Uncorrelated response");
        p.push(MessageEntry {
            id: 0,
            session: self.session,
            direction: Direction::Response,
            rpc_id: Some(id.clone()),
            method: None,
            payload: payload.clone(),
            response: None,
            timestamp: Local::now(),
            duration: None,
            status: EntryStatus::Completed,
            anomaly: Some(anomaly),
            observed: now,
        })
    }

    /// Record an inbound notification.
    pub fn track_notification(&self, method: &str, payload: &Value) -> u64 {
        self.track_notification_at(method, payload, Instant::now())
    }

    pub(crate) fn track_notification_at(&self, method: &str, payload: &Value, now: Instant) -> u64 {
        let mut p = self.lock();
        p.expire(now);
        p.push(MessageEntry {
            id: 0,
            session: self.session,
            direction: Direction::Notification,
            rpc_id: None,
            method: Some(method.to_string()),
            payload: payload.clone(),
            response: None,
            timestamp: Local::now(),
            duration: None,
            status: EntryStatus::Completed,
            anomaly: None,
            observed: now,
        })
    }

    /// Dispatch a classified message to the matching tracking call.
    pub fn record(&self, message: &JsonRpcMessage, payload: &Value) -> u64 {
        match message {
            JsonRpcMessage::Request { id, method, .. } => self.track_request(id, method, payload),
            JsonRpcMessage::Response { id, .. } => self.track_response(id, payload),
            JsonRpcMessage::Notification { method, .. } => {
                self.track_notification(method, payload)
            }
        }
    }

    /// Ordered snapshot of the partition.
    pub fn history(&self) -> Vec<MessageEntry> {
        self.history_at(Instant::now())
    }

    pub(crate) fn history_at(&self, now: Instant) -> Vec<MessageEntry> {
        let mut p = self.lock();
        p.expire(now);
        p.entries.iter().cloned().collect()
    }

    /// Mark timed-out requests now rather than on next access.
    pub fn expire_pending(&self) {
        self.lock().expire(Instant::now());
    }

    /// Number of requests still awaiting a response.
    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    /// Abort pending requests tracked through this handle's session only.
    pub fn abort_session(&self) -> usize {
        let session = self.session;
        let mut p = self.lock();
        let n = p.abort_where(|e| e.session == session);
        if n > 0 {
            debug!(server = %p.server, session, aborted = n, "Aborted session requests");
        }
        n
    }

    /// Highest session number handed out so far.
    pub fn session_watermark(&self) -> u64 {
        self.lock().next_session - 1
    }

    /// Abort pending requests of every session up to and including `watermark`.
    ///
    /// Sessions started after the watermark was read are left alone.
    pub fn abort_through(&self, watermark: u64) -> usize {
        let mut p = self.lock();
        let n = p.abort_where(|e| e.session <= watermark);
        if n > 0 {
            debug!(server = %p.server, watermark, aborted = n, "Aborted requests of closed sessions");
        }
        n
    }
}

/// All server partitions.
///
/// Partitions are created on first use and never shared between servers.
pub struct MessageTracker {
    partitions: RwLock<HashMap<String, ServerTracker>>,
    capacity: usize,
    timeout: Duration,
}

impl MessageTracker {
    /// Create an empty tracker with per-server capacity and request timeout.
    pub fn new(capacity: usize, timeout: Duration) -> Self {
        Self {
            partitions: RwLock::new(HashMap::new()),
            capacity,
            timeout,
        }
    }

    /// Partition for `server`, created if absent.
    pub fn server(&self, server: &str) -> ServerTracker {
        if let Some(existing) = self
            .partitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(server)
        {
            return existing.clone();
        }
        self.partitions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(server.to_string())
            .or_insert_with(|| ServerTracker::new(server, self.capacity, self.timeout))
            .clone()
    }

    fn existing(&self, server: &str) -> Option<ServerTracker> {
        self.partitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(server)
            .cloned()
    }

    /// Record an outbound request for `server`.
    pub fn track_request(&self, server: &str, id: &MessageId, method: &str, payload: &Value) {
        self.server(server).track_request(id, method, payload);
    }

    /// Record an inbound response for `server`.
    pub fn track_response(&self, server: &str, id: &MessageId, payload: &Value) {
        self.server(server).track_response(id, payload);
    }

    /// Record an inbound notification for `server`.
    pub fn track_notification(&self, server: &str, method: &str, payload: &Value) {
        self.server(server).track_notification(method, payload);
    }

    /// Ordered snapshot of one server's history; empty for unknown servers.
    pub fn history(&self, server: &str) -> Vec<MessageEntry> {
        self.existing(server)
            .map(|t| t.history())
            .unwrap_or_default()
    }

    /// Highest session number handed out for `server`; 0 before its first session.
    pub fn session_watermark(&self, server: &str) -> u64 {
        self.existing(server).map_or(0, |t| t.session_watermark())
    }

    /// Abort pending requests of `server`'s sessions up to `watermark`.
    pub fn abort_through(&self, server: &str, watermark: u64) -> usize {
        self.existing(server).map_or(0, |t| t.abort_through(watermark))
    }

    /// Configured per-server capacity.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Configured request timeout.
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn tracker() -> ServerTracker {
        ServerTracker::new("alpha", 1000, Duration::from_secs(60))
    }

    #[test]
    fn test_response_attaches_with_duration() {
        let t = tracker();
        let t0 = Instant::now();
        let req = json!({"jsonrpc": "2.0", "id": 7, "method": "resources/list"});
        let resp = json!({"jsonrpc": "2.0", "id": 7, "result": {"resources": [1, 2, 3]}});

        t.track_request_at(&MessageId::Number(7), "resources/list", &req, t0);
        t.track_response_at(&MessageId::Number(7), &resp, t0 + Duration::from_millis(42));

        let history = t.history_at(t0 + Duration::from_millis(50));
        assert_eq!(history.len(), 1);
        let entry = &history[0];
        assert_eq!(entry.direction, Direction::Request);
        assert_eq!(entry.response.as_ref(), Some(&resp));
        assert_eq!(entry.duration, Some(Duration::from_millis(42)));
        assert_eq!(entry.status, EntryStatus::Completed);
        assert_eq!(entry.anomaly, None);
        assert_eq!(t.pending_count(), 0);
    }

    #[test]
    fn test_unmatched_response_becomes_standalone_entry() {
        let t = tracker();
        let resp = json!({"id": 99, "result": {}});
        t.track_response(&MessageId::Number(99), &resp);

        let history = t.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].direction, Direction::Response);
        assert_eq!(history[0].payload, resp);
        assert_eq!(history[0].duration, None);
        assert_eq!(history[0].anomaly, Some(CorrelationAnomaly::Unmatched));
    }

    #[test]
    fn test_second_response_does_not_overwrite_first() {
        let t = tracker();
        let id = MessageId::String("a".to_string());
        let first = json!({"id": "a", "result": 1});
        let second = json!({"id": "a", "result": 2});
        t.track_request(&id, "tools/list", &json!({"id": "a", "method": "tools/list"}));
        t.track_response(&id, &first);
        t.track_response(&id, &second);

        let history = t.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].response.as_ref(), Some(&first));
        assert_eq!(history[1].payload, second);
        assert_eq!(history[1].anomaly, Some(CorrelationAnomaly::Duplicate));
    }

    #[test]
    fn test_notification_never_gains_response() {
        let t = tracker();
        let note = json!({"method": "log/message", "params": {"level": "info"}});
        t.track_notification("log/message", &note);
        // A response with no id match must not attach to the notification
        t.track_response(&MessageId::Null, &json!({"id": null, "result": {}}));

        let history = t.history();
        assert_eq!(history[0].direction, Direction::Notification);
        assert_eq!(history[0].response, None);
        assert_eq!(history[0].duration, None);
        assert_eq!(history[1].direction, Direction::Response);
    }

    #[test]
    fn test_history_preserves_observation_order() {
        let t = tracker();
        t.track_request(&MessageId::Number(1), "a", &json!({"id": 1, "method": "a"}));
        t.track_notification("n", &json!({"method": "n"}));
        t.track_request(&MessageId::Number(2), "b", &json!({"id": 2, "method": "b"}));
        t.track_response(&MessageId::Number(1), &json!({"id": 1, "result": {}}));

        let methods: Vec<_> = t
            .history()
            .into_iter()
            .map(|e| e.method.unwrap_or_default())
            .collect();
        assert_eq!(methods, vec!["a", "n", "b"]);
        let ids: Vec<u64> = t.history().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_eviction_drops_pending_mapping() {
        let t = ServerTracker::new("alpha", 2, Duration::from_secs(60));
        t.track_request(&MessageId::Number(1), "slow", &json!({"id": 1, "method": "slow"}));
        t.track_notification("a", &json!({"method": "a"}));
        t.track_notification("b", &json!({"method": "b"}));

        assert_eq!(t.pending_count(), 0);
        let history = t.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].method.as_deref(), Some("a"));

        t.track_response(&MessageId::Number(1), &json!({"id": 1, "result": {}}));
        let history = t.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].direction, Direction::Response);
        assert_eq!(history[1].anomaly, Some(CorrelationAnomaly::Unmatched));
    }

    #[test]
    fn test_pending_request_times_out_lazily() {
        let t = ServerTracker::new("alpha", 10, Duration::from_millis(100));
        let t0 = Instant::now();
        t.track_request_at(&MessageId::Number(1), "slow", &json!({"id": 1, "method": "slow"}), t0);

        let early = t.history_at(t0 + Duration::from_millis(50));
        assert_eq!(early[0].status, EntryStatus::Pending);

        let late = t.history_at(t0 + Duration::from_millis(150));
        assert_eq!(late[0].status, EntryStatus::TimedOut);
        assert_eq!(t.pending_count(), 0);

        t.track_response_at(
            &MessageId::Number(1),
            &json!({"id": 1, "result": {}}),
            t0 + Duration::from_millis(200),
        );
        let history = t.history_at(t0 + Duration::from_millis(200));
        assert_eq!(history[0].response, None);
        assert_eq!(history[1].anomaly, Some(CorrelationAnomaly::Late));
    }

    #[test]
    fn test_abort_through_resolves_open_requests() {
        let t = tracker();
        t.track_request(&MessageId::Number(1), "a", &json!({"id": 1, "method": "a"}));
        t.track_request(&MessageId::Number(2), "b", &json!({"id": 2, "method": "b"}));
        t.track_response(&MessageId::Number(2), &json!({"id": 2, "result": {}}));

        assert_eq!(t.abort_through(t.session_watermark()), 1);
        assert_eq!(t.abort_through(t.session_watermark()), 0);
        let statuses: Vec<_> = t.history().iter().map(|e| e.status).collect();
        assert_eq!(statuses, vec![EntryStatus::Aborted, EntryStatus::Completed]);
    }

    #[test]
    fn test_abort_session_leaves_other_sessions_pending() {
        let base = tracker();
        let old = base.new_session();
        let current = base.new_session();
        assert_ne!(old.session(), current.session());

        old.track_request(&MessageId::Number(1), "a", &json!({"id": 1, "method": "a"}));
        current.track_request(&MessageId::Number(2), "b", &json!({"id": 2, "method": "b"}));

        assert_eq!(old.abort_session(), 1);
        assert_eq!(base.pending_count(), 1);
        let history = base.history();
        assert_eq!(history[0].status, EntryStatus::Aborted);
        assert_eq!(history[1].status, EntryStatus::Pending);
    }

    #[test]
    fn test_responses_correlate_within_their_session() {
        let base = tracker();
        let first = base.new_session();
        let second = base.new_session();
        first.track_request(&MessageId::Number(1), "a", &json!({"id": 1, "method": "a"}));
        second.track_request(&MessageId::Number(1), "a", &json!({"id": 1, "method": "a"}));
        second.track_response(&MessageId::Number(1), &json!({"id": 1, "result": {}}));

        let history = base.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].status, EntryStatus::Pending);
        assert_eq!(history[1].status, EntryStatus::Completed);
        assert_eq!(history[1].anomaly, None);
    }

    #[test]
    fn test_reused_id_supersedes_previous_request() {
        let t = tracker();
        t.track_request(&MessageId::Number(1), "a", &json!({"id": 1, "method": "a"}));
        t.track_request(&MessageId::Number(1), "b", &json!({"id": 1, "method": "b"}));
        t.track_response(&MessageId::Number(1), &json!({"id": 1, "result": {}}));

        let history = t.history();
        assert_eq!(history[0].status, EntryStatus::Aborted);
        assert_eq!(history[1].anomaly, Some(CorrelationAnomaly::ReusedId));
        assert!(history[1].response.is_some());
    }

    #[test]
    fn test_tracker_partitions_are_isolated() {
        let tracker = MessageTracker::new(100, Duration::from_secs(60));
        tracker.track_request("a", &MessageId::Number(1), "x", &json!({"id": 1, "method": "x"}));
        tracker.track_response("b", &MessageId::Number(1), &json!({"id": 1, "result": {}}));

        let a = tracker.history("a");
        let b = tracker.history("b");
        assert_eq!(a[0].status, EntryStatus::Pending);
        assert_eq!(b[0].anomaly, Some(CorrelationAnomaly::Unmatched));
        assert!(tracker.history("missing").is_empty());
        assert_eq!(tracker.abort_through("a", tracker.session_watermark("a")), 1);
        assert_eq!(tracker.abort_through("missing", 0), 0);
    }

    #[test]
    fn test_abort_through_spares_later_sessions() {
        let base = tracker();
        let old = base.new_session();
        old.track_request(&MessageId::Number(1), "initialize", &json!({"id": 1}));
        let watermark = base.session_watermark();
        assert_eq!(watermark, old.session());

        let fresh = base.new_session();
        fresh.track_request(&MessageId::Number(1), "initialize", &json!({"id": 1}));

        assert_eq!(base.abort_through(watermark), 1);
        fresh.track_response(&MessageId::Number(1), &json!({"id": 1, "result": {}}));

        let history = base.history();
        assert_eq!(history[0].status, EntryStatus::Aborted);
        assert_eq!(history[1].status, EntryStatus::Completed);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_watermark_of_unknown_server_is_zero() {
        let tracker = MessageTracker::new(10, Duration::from_secs(60));
        assert_eq!(tracker.session_watermark("ghost"), 0);
        let session = tracker.server("alpha").new_session();
        assert_eq!(tracker.session_watermark("alpha"), session.session());
        assert_eq!(tracker.abort_through("ghost", 5), 0);
    }

    #[test]
    fn test_expire_pending_marks_overdue_requests() {
        let t = ServerTracker::new("alpha", 10, Duration::from_millis(1));
        t.track_request(&MessageId::Number(1), "tools/list", &json!({"id": 1}));
        std::thread::sleep(Duration::from_millis(5));

        t.expire_pending();
        assert_eq!(t.pending_count(), 0);
        assert_eq!(t.history()[0].status, EntryStatus::TimedOut);
    }

    #[test]
    fn test_record_dispatches_by_message_kind() {
        let t = tracker();
        let request = json!({"id": 3, "method": "prompts/list"});
        let response = json!({"id": 3, "result": {"prompts": []}});
        let notification = json!({"method": "notifications/progress"});

        for raw in [&request, &response, &notification] {
            let message = crate::mcp::message::classify(raw).unwrap();
            t.record(&message, raw);
        }

        let history = t.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].response.as_ref(), Some(&response));
        assert_eq!(history[1].direction, Direction::Notification);
    }

    #[test]
    fn test_non_integer_id_is_recorded_as_unmatched() {
        let t = tracker();
        let id = MessageId::from_json(&json!(2.5)).unwrap();
        t.track_response(&id, &json!({"id": 2.5, "result": {}}));

        let history = t.history();
        assert_eq!(history[0].rpc_id, Some(MessageId::OtherNumber("2.5".to_string())));
        assert_eq!(history[0].anomaly, Some(CorrelationAnomaly::Unmatched));
    }

    #[test]
    fn test_error_response_detection() {
        let t = tracker();
        t.track_request(&MessageId::Number(1), "x", &json!({"id": 1, "method": "x"}));
        t.track_response(
            &MessageId::Number(1),
            &json!({"id": 1, "error": {"code": -1, "message": "bad"}}),
        );
        assert!(t.history()[0].is_error());
    }
}
