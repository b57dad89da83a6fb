//! Relay configuration types.
//!
//! [`RelayConfig`] is the single source of truth for all runtime settings.
//! It is built once at startup from CLI arguments (see `main.rs`) or from
//! [`RelayConfig::default`] in tests, then shared read-only.
//!
//! # Design rationale
//!
//! Keeping configuration as a plain struct (no global state, no environment
//! variable reads inside the domain) makes the hub easy to start on an
//! ephemeral port inside an integration test.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Environment name in which the buzz sound is always off.
///
/// Hosted deployments have no speaker attached, and spawning an audio player
/// there only produces error logs.
pub const PRODUCTION_ENVIRONMENT: &str = "production";

/// All runtime configuration for the relay hub.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Address the HTTP/WebSocket listener binds to.
    ///
    /// `0.0.0.0` accepts readers on the LAN as well as local viewers.
    pub bind_addr: SocketAddr,

    /// Deployment environment name (`development`, `production`, ...).
    ///
    /// Reported by `/api/status` and used to gate the sound.
    pub environment: String,

    /// Buzz-on-scan settings.
    pub sound: SoundConfig,
}

impl RelayConfig {
    /// `true` when sound was requested and the environment allows it.
    pub fn sound_enabled(&self) -> bool {
        self.sound.requested && !self.is_production()
    }

    pub fn is_production(&self) -> bool {
        self.environment == PRODUCTION_ENVIRONMENT
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for RelayConfig {
    /// | Field        | Default             |
    /// |--------------|---------------------|
    /// | bind_addr    | `0.0.0.0:8080`      |
    /// | environment  | `development`       |
    /// | sound        | [`SoundConfig::default`] |
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            environment: "development".to_string(),
            sound: SoundConfig::default(),
        }
    }
}

/// Settings for the buzz played on every scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundConfig {
    /// Operator asked for sound (`ENABLE_SOUND=true`).  See
    /// [`RelayConfig::sound_enabled`] for the effective value.
    pub requested: bool,

    /// Audio file handed to the player.
    pub file: PathBuf,

    /// Player executable, invoked as `<player> <file>`.
    pub player: String,
}

impl SoundConfig {
    /// The player most likely to exist on this platform.
    pub fn default_player() -> &'static str {
        if cfg!(target_os = "macos") {
            "afplay"
        } else {
            "mpg123"
        }
    }
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            requested: false,
            file: PathBuf::from("sounds").join("buzz.mp3"),
            player: Self::default_player().to_string(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
