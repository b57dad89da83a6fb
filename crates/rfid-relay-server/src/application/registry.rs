//! Connection registry: every open connection and its outbound channel.
//!
//! Each connection is represented by a [`ConnectionHandle`].  The handle does
//! not own the socket; it owns the sending end of an unbounded channel whose
//! receiving end is drained by that connection's writer task (see
//! `infrastructure::session`).  Sending to a connection therefore never
//! awaits and never blocks on a slow peer.
//!
//! # Lifecycle (for beginners)
//!
//! ```text
//! upgrade ──► register() ──► Open ──► (writer task ends) ──► Closed ──► unregister()
//! ```
//!
//! A handle reports `Closed` as soon as the writer task has gone away, even
//! if the session task has not yet called [`ConnectionRegistry::unregister`].
//! The broadcast engine checks that state at send time.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rfid_relay_core::{ConnectionId, ConnectionIdGenerator};
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};

/// Sending half of a connection's outbound text queue.
pub type OutboundSender = mpsc::UnboundedSender<String>;

/// Receiving half, owned by the connection's writer task.
pub type OutboundReceiver = mpsc::UnboundedReceiver<String>;

/// Error returned when a frame cannot be queued for a connection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    /// The connection's writer task has stopped; the peer is gone.
    #[error("connection {0} is closed")]
    Closed(ConnectionId),
}

/// Lifecycle state of a connection as seen from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Open,
    Closed,
}

/// One registered connection.
///
/// Cloning a handle is cheap (it clones a channel sender) and is how the
/// registry hands out snapshots without holding its lock during sends.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    peer_addr: String,
    connected_at: DateTime<Utc>,
    sender: OutboundSender,
}

impl ConnectionHandle {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Peer address for diagnostics.  Not used for routing.
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    pub fn state(&self) -> ConnectionState {
        if self.sender.is_closed() {
            ConnectionState::Closed
        } else {
            ConnectionState::Open
        }
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Queues one text frame for this connection.  Fire-and-forget: success
    /// means "queued", not "delivered".
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Closed`] if the writer task has already stopped.
    pub fn send_text(&self, text: String) -> Result<(), SendError> {
        self.sender.send(text).map_err(|_| SendError::Closed(self.id))
    }
}

/// In-memory registry of open connections.
///
/// # Concurrency
///
/// Entries live in a `BTreeMap` behind a `tokio::sync::RwLock`.  Register and
/// unregister take the write lock; [`snapshot`](Self::snapshot),
/// [`get`](Self::get) and [`size`](Self::size) take the read lock.  The lock
/// is never held across a send: callers get cloned handles and send after
/// the guard is dropped.
///
/// The `BTreeMap` keyed by [`ConnectionId`] keeps snapshots in registration
/// order.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    ids: ConnectionIdGenerator,
    connections: RwLock<BTreeMap<ConnectionId, ConnectionHandle>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a newly accepted connection and returns its identifier.
    pub async fn register(
        &self,
        peer_addr: impl Into<String>,
        sender: OutboundSender,
    ) -> ConnectionId {
        let id = self.ids.next_id();
        let handle = ConnectionHandle {
            id,
            peer_addr: peer_addr.into(),
            connected_at: Utc::now(),
            sender,
        };
        self.connections.write().await.insert(id, handle);
        id
    }

    /// Removes a connection.  Idempotent: returns `false` if it was already
    /// gone.
    pub async fn unregister(&self, id: ConnectionId) -> bool {
        self.connections.write().await.remove(&id).is_some()
    }

    /// Looks up one connection, e.g. to reply directly to a sender.
    pub async fn get(&self, id: ConnectionId) -> Option<ConnectionHandle> {
        self.connections.read().await.get(&id).cloned()
    }

    /// Connections registered at the instant of the call, in registration
    /// order.
    pub async fn snapshot(&self) -> Vec<ConnectionHandle> {
        self.connections.read().await.values().cloned().collect()
    }

    /// Number of registered connections.
    pub async fn size(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Connections accepted since startup, including ones already closed.
    pub fn total_accepted(&self) -> u64 {
        self.ids.allocated()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
