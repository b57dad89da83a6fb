//! rfid-relay-server library crate.
//!
//! This crate provides the relay hub: RFID readers and browser viewers hold a
//! WebSocket open to it, readers push scans, and the hub fans each scan out
//! to everyone else while remembering the latest one for late joiners.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! RFID reader / browser viewer  (JSON over WebSocket)
//!         ↕
//! [rfid-relay-server]
//!   ├── domain/           RelayConfig, SoundConfig
//!   ├── application/      Registry, last-event cache, dispatcher, broadcast, hook
//!   └── infrastructure/
//!         ├── server/     axum router: WebSocket upgrade + status endpoints
//!         ├── session/    per-connection lifecycle task
//!         ├── sound/      buzz-on-scan hook (external player process)
//!         └── local_addr/ LAN address for the startup banner
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async.
//! - `application` depends on `domain`, `rfid-relay-core`, and tokio's sync
//!   primitives only; it never touches a socket.
//! - `infrastructure` depends on everything else plus axum.

/// Domain layer: configuration types (no I/O).
pub mod domain;

/// Application layer: registry, cache, dispatch and fan-out.
pub mod application;

/// Infrastructure layer: HTTP/WebSocket server, sessions, side effects.
pub mod infrastructure;
