//! Message protocol dispatcher.
//!
//! One call to [`Dispatcher::dispatch`] handles one inbound text frame from
//! one connection:
//!
//! ```text
//! raw text ──decode──► rfid_scan       ──► stamp ─► cache ─► hook ─► broadcast (not to sender)
//!                  ├─► device_connect  ──► viewer + cached scan? ─► reply to sender only
//!                  ├─► other type      ──► log, ignore
//!                  └─► decode error    ──► log, ignore (connection stays open)
//! ```
//!
//! `dispatch` never fails and never panics on peer input; every outcome is a
//! [`DispatchOutcome`] value so tests and the session loop can see what
//! happened without parsing logs.

use std::sync::Arc;

use rfid_relay_core::protocol::messages::VIEWER_DEVICE_TYPE;
use rfid_relay_core::{
    decode_inbound, encode_outbound, ConnectionId, InboundMessage, MonotonicClock,
    OutboundMessage, ProtocolError, ScanEvent,
};
use tracing::{debug, info, warn};

use crate::application::broadcast::{broadcast, BroadcastReport};
use crate::application::cache::LastEventCache;
use crate::application::hook::{invoke_isolated, ScanHook};
use crate::application::registry::ConnectionRegistry;

/// What one call to [`Dispatcher::dispatch`] did.
#[derive(Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A scan was cached and fanned out.
    Scanned(BroadcastReport),

    /// A `device_connect` was handled.  `catch_up_sent` is `true` only when a
    /// viewer joined, a scan was cached, and the reply was queued.
    Announced { catch_up_sent: bool },

    /// Valid frame with a `type` the hub does not handle.
    Ignored { message_type: String },

    /// The frame failed validation.
    Rejected(ProtocolError),
}

/// Routes decoded messages to the registry, cache, hook and broadcast engine.
///
/// The dispatcher owns no connection state; it is shared (`Arc`) by every
/// session task.
pub struct Dispatcher {
    registry: Arc<ConnectionRegistry>,
    cache: Arc<LastEventCache>,
    hook: Arc<dyn ScanHook>,
    clock: MonotonicClock,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        cache: Arc<LastEventCache>,
        hook: Arc<dyn ScanHook>,
    ) -> Self {
        Self {
            registry,
            cache,
            hook,
            clock: MonotonicClock::new(),
        }
    }

    /// Handles one inbound frame from `origin`.
    pub async fn dispatch(&self, origin: ConnectionId, raw: &str) -> DispatchOutcome {
        debug!("{origin} received: {raw}");

        let message = match decode_inbound(raw) {
            Ok(m) => m,
            Err(e) => {
                warn!("{origin}: error processing message: {e}");
                return DispatchOutcome::Rejected(e);
            }
        };
        debug!("{origin}: decoded {} message", message.type_name());

        match message {
            InboundMessage::RfidScan {
                card_id,
                device_id,
                reader_id,
            } => {
                let event = ScanEvent::received(card_id, device_id, reader_id, self.clock.now());
                DispatchOutcome::Scanned(self.handle_scan(origin, event).await)
            }

            InboundMessage::DeviceConnect {
                device_id,
                device_type,
            } => {
                info!("device connected: {device_id} ({device_type})");
                let catch_up_sent = if device_type == VIEWER_DEVICE_TYPE {
                    self.send_catch_up(origin, &device_id).await
                } else {
                    false
                };
                DispatchOutcome::Announced { catch_up_sent }
            }

            InboundMessage::Unrecognized { message_type } => {
                debug!("{origin}: no handler for message type {message_type:?}");
                DispatchOutcome::Ignored { message_type }
            }
        }
    }

    async fn handle_scan(&self, origin: ConnectionId, event: ScanEvent) -> BroadcastReport {
        info!(
            "scan: card={} device={} reader={}",
            event.card_id(),
            event.device_id(),
            event.reader_id().unwrap_or("-")
        );

        let outbound = OutboundMessage::scan(&event);
        self.cache.store(event.clone()).await;
        invoke_isolated(self.hook.as_ref(), &event);
        broadcast(&self.registry, &outbound, origin).await
    }

    /// Replies to `origin` with the cached scan, if there is one.
    async fn send_catch_up(&self, origin: ConnectionId, viewer_device_id: &str) -> bool {
        let Some(event) = self.cache.latest().await else {
            debug!("{origin}: viewer {viewer_device_id} joined, nothing cached yet");
            return false;
        };
        let Some(conn) = self.registry.get(origin).await else {
            debug!("{origin}: viewer left before catch-up could be sent");
            return false;
        };

        let reply = OutboundMessage::catch_up(&event, viewer_device_id, self.clock.now());
        let text = match encode_outbound(&reply) {
            Ok(t) => t,
            Err(e) => {
                warn!("{origin}: failed to encode catch-up: {e}");
                return false;
            }
        };
        match conn.send_text(text) {
            Ok(()) => {
                debug!("{origin}: sent last scan {} to viewer {viewer_device_id}", event.card_id());
                true
            }
            Err(e) => {
                warn!("{origin}: catch-up not sent: {e}");
                false
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
