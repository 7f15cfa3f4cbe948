use chrono::{DateTime, Utc};
use log::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use utoipa::ToSchema;

/// Request headers as seen on the wire: header name to every value sent for it.
pub type RequestHeaders = BTreeMap<String, Vec<String>>;

/// Number of connection logs kept when no capacity is configured.
pub const DEFAULT_CAPACITY: usize = 50;

/// Unique identifier for a connection (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ToSchema)]
#[schema(value_type = String, example = "conn_1")]
pub struct ConnectionId(String);

impl ConnectionId {
    fn from_sequence(sequence: u64) -> Self {
        Self(format!("conn_{sequence}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Diagnostic log of a single streaming connection, as served by `/debug`.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ConnectionRecord {
    pub id: ConnectionId,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
    pub remote_addr: String,
    #[schema(value_type = Object)]
    pub request_headers: RequestHeaders,
    /// Append-only, in the order the session produced them.
    pub events: Vec<String>,
    /// Registration order, breaks ties between equal `created_at` values.
    #[serde(skip)]
    sequence: u64,
}

struct RegistryState {
    records: HashMap<ConnectionId, ConnectionRecord>,
    next_sequence: u64,
}

/// Bounded store of connection logs.
///
/// Holds at most `capacity` records. Registering past capacity drops the record
/// with the oldest creation time; activity on a connection does not keep it alive.
/// A single lock covers the whole registry: writers are serialized, snapshot
/// readers may run together.
pub struct ConnectionRegistry {
    state: RwLock<RegistryState>,
    capacity: usize,
}

impl ConnectionRegistry {
    /// A zero capacity is raised to one so the newest connection is always kept.
    pub fn new(capacity: usize) -> Self {
        Self {
            state: RwLock::new(RegistryState {
                records: HashMap::new(),
                next_sequence: 1,
            }),
            capacity: capacity.max(1),
        }
    }

    /// Register a new connection and return its unique ID
    pub fn register(&self, remote_addr: String, request_headers: RequestHeaders) -> ConnectionId {
        let mut state = self.write();

        let sequence = state.next_sequence;
        state.next_sequence += 1;
        let id = ConnectionId::from_sequence(sequence);

        state.records.insert(
            id.clone(),
            ConnectionRecord {
                id: id.clone(),
                created_at: Utc::now(),
                remote_addr,
                request_headers,
                events: Vec::new(),
                sequence,
            },
        );

        while state.records.len() > self.capacity {
            match Self::oldest(&state.records) {
                Some(oldest) => {
                    state.records.remove(&oldest);
                    debug!("Evicted connection log {oldest}");
                }
                None => break,
            }
        }

        id
    }

    /// Append an event to a connection's log. Unknown or evicted ids are ignored.
    pub fn append_event(&self, id: &ConnectionId, event: impl Into<String>) {
        if let Some(record) = self.write().records.get_mut(id) {
            record.events.push(event.into());
        }
    }

    /// Point-in-time copy of every tracked connection, in no particular order.
    pub fn snapshot(&self) -> Vec<ConnectionRecord> {
        self.read().records.values().cloned().collect()
    }

    pub fn get(&self, id: &ConnectionId) -> Option<ConnectionRecord> {
        self.read().records.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn oldest(records: &HashMap<ConnectionId, ConnectionRecord>) -> Option<ConnectionId> {
        records
            .values()
            .min_by_key(|record| (record.created_at, record.sequence))
            .map(|record| record.id.clone())
    }

    // Critical sections never panic, so a poisoned guard still holds consistent records.
    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn headers(pairs: &[(&str, &str)]) -> RequestHeaders {
        let mut headers = RequestHeaders::new();
        for (name, value) in pairs {
            headers
                .entry(name.to_string())
                .or_default()
                .push(value.to_string());
        }
        headers
    }

    fn ids(records: &[ConnectionRecord]) -> HashSet<String> {
        records.iter().map(|r| r.id.as_str().to_string()).collect()
    }

    #[test]
    fn test_register_creates_empty_record() {
        let registry = ConnectionRegistry::default();
        let id = registry.register(
            "127.0.0.1:50000".to_string(),
            headers(&[("accept", "text/event-stream")]),
        );

        let record = registry.get(&id).unwrap();
        assert_eq!(id.as_str(), "conn_1");
        assert_eq!(record.remote_addr, "127.0.0.1:50000");
        assert_eq!(record.request_headers["accept"], vec!["text/event-stream"]);
        assert!(record.events.is_empty());
        assert_eq!(registry.capacity(), 50);
    }

    #[test]
    fn test_capacity_two_evicts_first_registration() {
        let registry = ConnectionRegistry::new(2);
        let a = registry.register("a".to_string(), RequestHeaders::new());
        let b = registry.register("b".to_string(), RequestHeaders::new());
        let c = registry.register("c".to_string(), RequestHeaders::new());

        let snapshot = registry.snapshot();
        assert_eq!(registry.len(), 2);
        assert_eq!(
            ids(&snapshot),
            HashSet::from([b.to_string(), c.to_string()])
        );
        assert!(registry.get(&a).is_none());
    }

    #[test]
    fn test_size_never_exceeds_capacity_and_oldest_goes_first() {
        let registry = ConnectionRegistry::new(5);
        let mut registered = Vec::new();

        for i in 0..40 {
            registered.push(registry.register(format!("10.0.0.{i}:1"), RequestHeaders::new()));
            assert!(registry.len() <= 5);

            let expected: HashSet<String> = registered
                .iter()
                .rev()
                .take(5)
                .map(|id| id.to_string())
                .collect();
            assert_eq!(ids(&registry.snapshot()), expected);
        }
    }

    #[test]
    fn test_eviction_ignores_activity() {
        let registry = ConnectionRegistry::new(2);
        let busy = registry.register("busy".to_string(), RequestHeaders::new());
        let idle = registry.register("idle".to_string(), RequestHeaders::new());
        for _ in 0..10 {
            registry.append_event(&busy, "still streaming");
        }

        registry.register("new".to_string(), RequestHeaders::new());

        assert!(registry.get(&busy).is_none());
        assert!(registry.get(&idle).is_some());
    }

    #[test]
    fn test_ids_are_never_reused_after_eviction() {
        let registry = ConnectionRegistry::new(1);
        let mut seen = HashSet::new();
        for _ in 0..10 {
            let id = registry.register("x".to_string(), RequestHeaders::new());
            assert!(seen.insert(id));
        }
    }

    #[test]
    fn test_append_event_keeps_order() {
        let registry = ConnectionRegistry::default();
        let id = registry.register("x".to_string(), RequestHeaders::new());

        registry.append_event(&id, "Connection Established");
        registry.append_event(&id, "Header: accept = text/event-stream");
        registry.append_event(&id, "Client connection closed".to_string());

        assert_eq!(
            registry.get(&id).unwrap().events,
            vec![
                "Connection Established",
                "Header: accept = text/event-stream",
                "Client connection closed"
            ]
        );
    }

    #[test]
    fn test_append_event_to_unknown_or_evicted_id_is_a_no_op() {
        let registry = ConnectionRegistry::new(1);
        let evicted = registry.register("first".to_string(), RequestHeaders::new());
        let current = registry.register("second".to_string(), RequestHeaders::new());

        registry.append_event(&evicted, "lost");
        registry.append_event(&ConnectionId::from_sequence(999), "lost");

        assert_eq!(registry.len(), 1);
        assert!(registry.get(&current).unwrap().events.is_empty());
    }

    #[test]
    fn test_zero_capacity_keeps_newest() {
        let registry = ConnectionRegistry::new(0);
        registry.register("first".to_string(), RequestHeaders::new());
        let second = registry.register("second".to_string(), RequestHeaders::new());

        assert_eq!(registry.capacity(), 1);
        assert!(registry.get(&second).is_some());
    }

    #[test]
    fn test_record_serializes_to_debug_shape() {
        let registry = ConnectionRegistry::default();
        let id = registry.register(
            "127.0.0.1:4000".to_string(),
            headers(&[("accept", "text/event-stream"), ("accept", "*/*")]),
        );
        registry.append_event(&id, "Connection Established");

        let json = serde_json::to_value(registry.snapshot()).unwrap();
        let record = &json[0];

        assert_eq!(record["id"], "conn_1");
        assert_eq!(record["remote_addr"], "127.0.0.1:4000");
        assert_eq!(
            record["request_headers"]["accept"],
            serde_json::json!(["text/event-stream", "*/*"])
        );
        assert_eq!(record["events"], serde_json::json!(["Connection Established"]));
        assert!(record["timestamp"].is_string());
        assert!(record.get("sequence").is_none());
    }

    #[test]
    fn test_concurrent_registration_respects_capacity() {
        let registry = Arc::new(ConnectionRegistry::new(8));

        std::thread::scope(|scope| {
            for worker in 0..4 {
                let registry = Arc::clone(&registry);
                scope.spawn(move || {
                    for i in 0..50 {
                        let id = registry.register(format!("{worker}:{i}"), RequestHeaders::new());
                        registry.append_event(&id, "Connection Established");
                        assert!(registry.len() <= 8);
                    }
                });
            }
        });

        assert_eq!(registry.len(), 8);
    }
}
