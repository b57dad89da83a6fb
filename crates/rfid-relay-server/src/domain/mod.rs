//! Domain layer for rfid-relay-server.
//!
//! Pure configuration types with no dependencies on I/O, networking, or
//! external frameworks.  The infrastructure layer (and `main.rs`) populate
//! them from CLI arguments and environment variables.

pub mod config;

pub use config::{RelayConfig, SoundConfig, PRODUCTION_ENVIRONMENT};
