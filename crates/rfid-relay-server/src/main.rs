//! RFID relay hub: entry point.
//!
//! RFID readers and browser viewers keep a WebSocket open to this process.
//! Every scan a reader sends is relayed to every other connection, and a
//! viewer that joins late is told the most recent card.
//!
//! # Usage
//!
//! ```text
//! rfid-relay [OPTIONS]
//!
//! Options:
//!   --port          <PORT>  HTTP/WebSocket port [default: 8080]
//!   --bind          <IP>    Interface to bind [default: 0.0.0.0]
//!   --environment   <NAME>  Deployment environment [default: development]
//!   --enable-sound          Play a buzz on every scan (not in production)
//!   --sound-file    <PATH>  Audio file to play [default: sounds/buzz.mp3]
//!   --sound-player  <CMD>   Player executable [default: afplay / mpg123]
//! ```
//!
//! # Environment variable overrides
//!
//! CLI args take precedence when both are present.
//!
//! | Variable             | Default            | Description                    |
//! |----------------------|--------------------|--------------------------------|
//! | `PORT`               | `8080`             | HTTP/WebSocket port            |
//! | `RELAY_BIND`         | `0.0.0.0`          | Interface to bind              |
//! | `RELAY_ENVIRONMENT`  | `development`      | Deployment environment         |
//! | `NODE_ENV`           | (unset)            | Used when `RELAY_ENVIRONMENT` is unset |
//! | `ENABLE_SOUND`       | `false`            | Buzz on every scan (`true` only) |
//! | `RELAY_SOUND_FILE`   | `sounds/buzz.mp3`  | Audio file                     |
//! | `RELAY_SOUND_PLAYER` | `afplay` / `mpg123`| Player executable              |
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rfid_relay_server::domain::{RelayConfig, SoundConfig};
use rfid_relay_server::infrastructure::run_server;

// ── CLI argument definitions ──────────────────────────────────────────────────

const DEFAULT_ENVIRONMENT: &str = "development";

/// `ENABLE_SOUND` is on only for the exact value `true`; anything else is off.
fn parse_enable_sound(raw: &str) -> Result<bool, String> {
    Ok(raw == "true")
}

/// RFID relay hub.
///
/// Relays card scans from RFID readers to every connected viewer over
/// WebSocket.
#[derive(Debug, Parser)]
#[command(
    name = "rfid-relay",
    about = "WebSocket relay hub for RFID scan events",
    version
)]
struct Cli {
    /// TCP port for HTTP and WebSocket traffic.
    #[arg(long, default_value_t = 8080, env = "PORT")]
    port: u16,

    /// IP address to bind to.
    ///
    /// `0.0.0.0` accepts readers on the LAN; `127.0.0.1` accepts only local
    /// viewers.
    #[arg(long, default_value = "0.0.0.0", env = "RELAY_BIND")]
    bind: String,

    /// Deployment environment.  Sound is always off in `production`.
    ///
    /// Falls back to `NODE_ENV` (as set by hosting platforms), then to
    /// `development`.
    #[arg(long, env = "RELAY_ENVIRONMENT")]
    environment: Option<String>,

    /// Environment name from the hosting platform.
    #[arg(long, env = "NODE_ENV", hide = true)]
    node_env: Option<String>,

    /// Play the buzz sound on every scan.
    ///
    /// From the environment only the literal `ENABLE_SOUND=true` turns it on.
    #[arg(long, env = "ENABLE_SOUND", value_parser = parse_enable_sound)]
    enable_sound: bool,

    /// Audio file handed to the player.
    #[arg(long, default_value = "sounds/buzz.mp3", env = "RELAY_SOUND_FILE")]
    sound_file: PathBuf,

    /// Player executable, invoked as `<player> <sound-file>`.
    #[arg(long, default_value = SoundConfig::default_player(), env = "RELAY_SOUND_PLAYER")]
    sound_player: String,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`RelayConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if `--bind` is not a valid IP address or
    /// `--environment` is empty.
    fn into_relay_config(self) -> anyhow::Result<RelayConfig> {
        let ip: IpAddr = self
            .bind
            .parse()
            .with_context(|| format!("invalid bind address: '{}'", self.bind))?;

        let environment = self
            .environment
            .or(self.node_env)
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string())
            .trim()
            .to_string();
        if environment.is_empty() {
            anyhow::bail!("environment name must not be empty");
        }

        Ok(RelayConfig {
            bind_addr: SocketAddr::new(ip, self.port),
            environment,
            sound: SoundConfig {
                requested: self.enable_sound,
                file: self.sound_file,
                player: self.sound_player,
            },
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_relay_config()?;

    info!(
        "RFID relay hub starting on {} ({})",
        config.bind_addr, config.environment
    );

    run_server(config, shutdown_signal()).await?;

    info!("RFID relay hub stopped");
    Ok(())
}

/// Resolves on Ctrl+C.  If the handler cannot be installed the server runs
/// until killed.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received Ctrl+C, shutting down"),
        Err(e) => {
            error!("failed to listen for Ctrl+C signal: {e}");
            std::future::pending::<()>().await;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cli_args_produce_default_config() {
        // Arrange / Act: no explicit args; env vars may not be set in test
        let cli = Cli::parse_from(["rfid-relay"]);
        let config = cli.into_relay_config().expect("defaults must be valid");

        // Assert
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.bind_addr.ip().to_string(), "0.0.0.0");
        assert_eq!(config.environment, "development");
        assert!(!config.sound.requested);
        assert_eq!(config.sound.file, PathBuf::from("sounds/buzz.mp3"));
        assert_eq!(config.sound.player, SoundConfig::default_player());
    }

    #[test]
    fn test_custom_port_and_bind() {
        let cli = Cli::parse_from(["rfid-relay", "--port", "9000", "--bind", "127.0.0.1"]);
        let config = cli.into_relay_config().unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:9000".parse().unwrap());
    }

    #[test]
    fn test_ipv6_bind_is_accepted() {
        let cli = Cli::parse_from(["rfid-relay", "--bind", "::1", "--port", "7000"]);
        let config = cli.into_relay_config().unwrap();
        assert_eq!(config.bind_addr, "[::1]:7000".parse().unwrap());
    }

    #[test]
    fn test_invalid_bind_returns_error() {
        let cli = Cli::parse_from(["rfid-relay", "--bind", "not-an-ip"]);
        let err = cli.into_relay_config().unwrap_err();
        assert!(err.to_string().contains("not-an-ip"));
    }

    #[test]
    fn test_empty_environment_returns_error() {
        let cli = Cli::parse_from(["rfid-relay", "--environment", "  "]);
        assert!(cli.into_relay_config().is_err());
    }

    #[test]
    fn test_node_env_is_used_when_environment_is_unset() {
        // Arrange / Act: hosting platforms set NODE_ENV=production
        let cli = Cli::parse_from(["rfid-relay", "--node-env", "production", "--enable-sound"]);
        let config = cli.into_relay_config().unwrap();

        // Assert: production also gates the sound off
        assert_eq!(config.environment, "production");
        assert!(config.is_production());
        assert!(!config.sound_enabled());
    }

    #[test]
    fn test_explicit_environment_wins_over_node_env() {
        let cli = Cli::parse_from([
            "rfid-relay",
            "--environment",
            "staging",
            "--node-env",
            "production",
        ]);
        let config = cli.into_relay_config().unwrap();
        assert_eq!(config.environment, "staging");
    }

    #[test]
    fn test_enable_sound_accepts_only_literal_true() {
        assert_eq!(parse_enable_sound("true"), Ok(true));
        for raw in ["1", "yes", "on", "TRUE", "false", ""] {
            assert_eq!(parse_enable_sound(raw), Ok(false), "value {raw:?}");
        }
    }

    #[test]
    fn test_enable_sound_flag() {
        let cli = Cli::parse_from(["rfid-relay", "--enable-sound"]);
        let config = cli.into_relay_config().unwrap();
        assert!(config.sound.requested);
        assert!(config.sound_enabled());
    }

    #[test]
    fn test_sound_is_gated_off_in_production() {
        let cli = Cli::parse_from([
            "rfid-relay",
            "--enable-sound",
            "--environment",
            "production",
        ]);
        let config = cli.into_relay_config().unwrap();
        assert!(config.sound.requested);
        assert!(!config.sound_enabled());
    }

    #[test]
    fn test_custom_sound_file_and_player() {
        let cli = Cli::parse_from([
            "rfid-relay",
            "--sound-file",
            "/opt/relay/beep.wav",
            "--sound-player",
            "aplay",
        ]);
        let config = cli.into_relay_config().unwrap();
        assert_eq!(config.sound.file, PathBuf::from("/opt/relay/beep.wav"));
        assert_eq!(config.sound.player, "aplay");
    }

    #[test]
    fn test_invalid_port_is_rejected_by_clap() {
        let result = Cli::try_parse_from(["rfid-relay", "--port", "70000"]);
        assert!(result.is_err());
    }
}
