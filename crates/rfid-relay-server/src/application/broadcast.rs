//! Broadcast engine: fan one outbound message out to every other connection.
//!
//! The message is serialized once, then queued on each connection in a
//! registry snapshot.  Every send is independent and best-effort: a peer
//! that vanished between snapshot and send is logged and skipped, and the
//! loop carries on.  Nothing is retried or stored for later.

use rfid_relay_core::{encode_outbound, ConnectionId, OutboundMessage};
use tracing::{debug, error, warn};

use crate::application::registry::ConnectionRegistry;

/// What happened to one broadcast.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Frames queued on an open connection.
    pub delivered: usize,
    /// Connections found already closed when their turn came.
    pub skipped_closed: usize,
    /// Sends that failed after the connection looked open.
    pub failed: usize,
}

/// Sends `message` to every registered connection except `exclude`.
pub async fn broadcast(
    registry: &ConnectionRegistry,
    message: &OutboundMessage,
    exclude: ConnectionId,
) -> BroadcastReport {
    let mut report = BroadcastReport::default();

    let text = match encode_outbound(message) {
        Ok(t) => t,
        Err(e) => {
            error!("dropping {} broadcast: {e}", message.type_name());
            return report;
        }
    };

    for conn in registry.snapshot().await {
        if conn.id() == exclude {
            continue;
        }
        if !conn.is_open() {
            debug!("skipping {}: already closed", conn.id());
            report.skipped_closed += 1;
            continue;
        }
        match conn.send_text(text.clone()) {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                warn!("broadcast to {} ({}) failed: {e}", conn.id(), conn.peer_addr());
                report.failed += 1;
            }
        }
    }

    debug!(
        "broadcast {}: delivered={} skipped={} failed={}",
        message.type_name(),
        report.delivered,
        report.skipped_closed,
        report.failed
    );
    report
}

// ── Tests ─────────────────────────────────────────────────────────────────────
