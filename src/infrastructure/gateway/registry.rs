use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::domain::relay::Envelope;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Liveness {
    Connecting,
    Open,
    Closing,
    Closed,
}

/// Work for a connection's writer task
#[derive(Debug)]
pub enum Outbound {
    Envelope(Envelope),
    Close,
}

pub type OutboundSender = mpsc::UnboundedSender<Outbound>;

/// One accepted transport
#[derive(Debug)]
struct Connection {
    liveness: Liveness,
    connected_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
    sender: OutboundSender,
}

/// Final view of a connection, handed back when it leaves the registry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionSnapshot {
    pub id: Uuid,
    pub liveness: Liveness,
    pub connected_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

/// Per-process table of live gateway connections, keyed by connection id.
///
/// Entries are inserted and removed only by the owning connection's
/// accept/close path; shutdown may additionally ask every writer to close.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<Uuid, Connection>>,
    draining: AtomicBool,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign an id to a freshly accepted transport
    pub fn register(&self, sender: OutboundSender) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        self.connections.write().insert(
            id,
            Connection {
                liveness: Liveness::Connecting,
                connected_at: now,
                last_activity: now,
                sender,
            },
        );
        id
    }

    pub fn mark_open(&self, id: Uuid) {
        if let Some(connection) = self.connections.write().get_mut(&id) {
            if connection.liveness == Liveness::Connecting {
                connection.liveness = Liveness::Open;
            }
        }
    }

    pub fn touch(&self, id: Uuid) {
        if let Some(connection) = self.connections.write().get_mut(&id) {
            connection.last_activity = Utc::now();
        }
    }

    /// Drop the entry, returning its last state; `None` when it was not present
    pub fn remove(&self, id: Uuid) -> Option<ConnectionSnapshot> {
        self.connections
            .write()
            .remove(&id)
            .map(|connection| ConnectionSnapshot {
                id,
                liveness: Liveness::Closed,
                connected_at: connection.connected_at,
                last_activity: connection.last_activity,
            })
    }

    /// Number of connections currently in the open state
    pub fn open_count(&self) -> usize {
        self.connections
            .read()
            .values()
            .filter(|connection| connection.liveness == Liveness::Open)
            .count()
    }

    /// Ask every writer to close its transport; returns how many were asked
    pub fn close_all(&self) -> usize {
        let mut connections = self.connections.write();
        let mut closed = 0;
        for (id, connection) in connections.iter_mut() {
            if connection.liveness == Liveness::Closing {
                continue;
            }
            connection.liveness = Liveness::Closing;
            if connection.sender.send(Outbound::Close).is_ok() {
                closed += 1;
            } else {
                tracing::debug!(connection_id = %id, "Writer already gone during shutdown");
            }
        }
        closed
    }

    /// Stop accepting connections and close the open ones
    pub fn begin_shutdown(&self) -> usize {
        self.draining.store(true, Ordering::SeqCst);
        self.close_all()
    }

    /// Whether shutdown has begun
    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::SeqCst)
    }
}
