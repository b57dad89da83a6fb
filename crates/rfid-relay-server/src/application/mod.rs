//! Application layer for rfid-relay-server.
//!
//! The application layer knows *what* the hub does with a message; it never
//! opens a socket.  Connections appear here only as [`ConnectionHandle`]s:
//! an id, a peer address, and a channel to push text into.
//!
//! # Responsibilities
//!
//! - Tracking open connections ([`ConnectionRegistry`])
//! - Remembering the latest scan ([`LastEventCache`])
//! - Validating and routing inbound frames ([`Dispatcher`])
//! - Fanning scans out to everyone but the sender ([`broadcast`])
//! - Running side effects without letting them fail a scan ([`ScanHook`])
//!
//! # What does NOT belong here?
//!
//! - WebSocket framing and upgrades (infrastructure)
//! - Spawning the audio player (infrastructure)
//! - Reading CLI arguments or environment variables (`main.rs`)

pub mod broadcast;
pub mod cache;
pub mod dispatcher;
pub mod hook;
pub mod registry;
pub mod status;

pub use broadcast::{broadcast, BroadcastReport};
pub use cache::LastEventCache;
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use hook::{invoke_isolated, HookError, NoopHook, ScanHook};
pub use registry::{
    ConnectionHandle, ConnectionRegistry, ConnectionState, OutboundReceiver, OutboundSender,
    SendError,
};
pub use status::RelayStatus;
