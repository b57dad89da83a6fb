//! Connection identifiers and the thread-safe allocator that hands them out.
//!
//! # Why not use the accept time? (for beginners)
//!
//! A tempting identifier for a new connection is "the current time in
//! milliseconds".  Two devices that connect within the same millisecond
//! would then share an identifier, and the registry would silently merge
//! them.  An atomic counter cannot collide: every call to
//! [`ConnectionIdGenerator::next_id`] returns a value no other call has seen.
//!
//! # Thread safety
//!
//! The generator uses `AtomicU64` internally.  An atomic operation reads,
//! modifies and writes a value as a single indivisible step, so many
//! connection tasks can allocate identifiers at once without a lock.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Opaque identifier of one open connection.
///
/// Identifiers are stable for the life of the connection and are never
/// reused within a process.  They order by allocation, so sorting by
/// `ConnectionId` gives registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Wraps a raw value.  Mostly useful in tests; production code gets
    /// identifiers from a [`ConnectionIdGenerator`].
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw numeric value.
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A thread-safe, monotonically increasing source of [`ConnectionId`]s.
///
/// The first identifier is `1`; `0` is never handed out.
///
/// # Examples
///
/// ```rust
/// use rfid_relay_core::ConnectionIdGenerator;
///
/// let ids = ConnectionIdGenerator::new();
/// let a = ids.next_id();
/// let b = ids.next_id();
/// assert_ne!(a, b);
/// assert!(b > a);
/// ```
#[derive(Debug)]
pub struct ConnectionIdGenerator {
    next: AtomicU64,
}

impl ConnectionIdGenerator {
    /// Creates a generator whose first identifier is `1`.
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Allocates the next identifier.
    ///
    /// `Ordering::Relaxed` is enough: uniqueness comes from the atomicity of
    /// `fetch_add`, and identifiers do not publish any other memory.
    pub fn next_id(&self) -> ConnectionId {
        ConnectionId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Number of identifiers handed out so far.  Diagnostics only.
    pub fn allocated(&self) -> u64 {
        self.next.load(Ordering::Relaxed) - 1
    }
}

impl Default for ConnectionIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_generator_starts_at_one() {
        // Arrange
        let ids = ConnectionIdGenerator::new();

        // Act
        let first = ids.next_id();

        // Assert
        assert_eq!(first.as_u64(), 1);
    }

    #[test]
    fn test_generator_increments_monotonically() {
        let ids = ConnectionIdGenerator::new();

        let values: Vec<ConnectionId> = (0..100).map(|_| ids.next_id()).collect();

        for window in values.windows(2) {
            assert!(window[1] > window[0], "ids must be strictly increasing");
        }
    }

    #[test]
    fn test_generator_is_unique_across_threads() {
        // Arrange
        let ids = Arc::new(ConnectionIdGenerator::new());
        let thread_count = 8;
        let per_thread = 1000;

        // Act – allocate from many threads at once, like a burst of connects
        let handles: Vec<_> = (0..thread_count)
            .map(|_| {
                let ids = Arc::clone(&ids);
                thread::spawn(move || (0..per_thread).map(|_| ids.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let all: HashSet<ConnectionId> = handles
            .into_iter()
            .flat_map(|h| h.join().expect("thread panicked"))
            .collect();

        // Assert
        assert_eq!(all.len(), thread_count * per_thread);
    }

    #[test]
    fn test_allocated_counts_handed_out_ids() {
        let ids = ConnectionIdGenerator::default();
        assert_eq!(ids.allocated(), 0);

        ids.next_id();
        ids.next_id();

        assert_eq!(ids.allocated(), 2);
    }

    #[test]
    fn test_display_uses_conn_prefix() {
        assert_eq!(ConnectionId::from_raw(7).to_string(), "conn-7");
    }
}
