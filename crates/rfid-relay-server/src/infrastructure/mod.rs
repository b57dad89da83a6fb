//! Infrastructure layer for rfid-relay-server.
//!
//! The infrastructure layer handles all I/O: the HTTP listener, WebSocket
//! upgrades, per-connection tasks, and the external sound player.
//!
//! # Responsibilities
//!
//! - Binding the listener and serving the HTTP routes
//! - Upgrading `/` requests to WebSocket sessions
//! - Running one session task per connection
//! - Starting the audio player for the buzz-on-scan hook
//! - Propagating the shutdown signal to open sessions
//!
//! # What does NOT belong here?
//!
//! - Message routing and fan-out (that is the application layer)
//! - Wire message definitions (that is `rfid-relay-core`)
//! - Configuration parsing (that is done in `main.rs`)

pub mod local_addr;
pub mod server;
pub mod session;
pub mod sound;

pub use server::{router, run_server, serve, AppState};
pub use sound::SoundHook;
