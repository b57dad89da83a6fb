//! # rfid-relay-core
//!
//! Shared library for the RFID relay hub containing the JSON wire protocol
//! and the domain entities that flow through it.
//!
//! This crate is used by the relay server and by anything that wants to
//! speak the relay protocol (test harnesses, device simulators).
//! It has zero dependencies on async runtimes, sockets, or HTTP frameworks.
//!
//! # Architecture overview (for beginners)
//!
//! The relay hub sits between RFID readers (usually ESP32 boards) and
//! browser viewers.  A reader sends a `rfid_scan` message whenever a card is
//! tapped; the hub stamps it with the current time, remembers it, and pushes
//! it to everyone else who is connected.  A viewer that joins late announces
//! itself with `device_connect` and is sent the last scan straight away.
//!
//! This crate defines:
//!
//! - **`protocol`** – How JSON text travels over the socket.  Inbound text is
//!   decoded once, at the boundary, into a closed [`InboundMessage`] enum;
//!   outbound [`OutboundMessage`] values are encoded back to JSON text.
//!
//! - **`domain`** – The [`ScanEvent`] value, the broker clock that stamps it,
//!   and the [`ConnectionId`] allocator.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `rfid_relay_core::ScanEvent` instead of `rfid_relay_core::domain::scan::ScanEvent`.
pub use domain::connection_id::{ConnectionId, ConnectionIdGenerator};
pub use domain::scan::{MonotonicClock, ScanEvent};
pub use protocol::codec::{decode_inbound, encode_outbound, ProtocolError};
pub use protocol::messages::{InboundMessage, OutboundMessage};
