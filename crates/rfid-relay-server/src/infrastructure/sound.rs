//! Buzz-on-scan: plays a short sound through an external audio player.
//!
//! The hub runs on a laptop or Raspberry Pi next to the readers, and a buzz
//! tells the person tapping a card that the scan reached the hub.  Rather
//! than link an audio stack, the hook starts a command-line player
//! (`afplay`, `mpg123`, ...) as a child process and returns immediately; a
//! small background task waits for the child so it is reaped and its exit
//! status logged.
//!
//! Sound is off unless requested, and always off in `production`.

use std::path::PathBuf;
use std::process::Stdio;

use rfid_relay_core::ScanEvent;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::application::{HookError, ScanHook};
use crate::domain::RelayConfig;

/// [`ScanHook`] that plays the configured sound file.
#[derive(Debug, Clone)]
pub struct SoundHook {
    enabled: bool,
    file: PathBuf,
    player: String,
}

impl SoundHook {
    pub fn from_config(config: &RelayConfig) -> Self {
        Self {
            enabled: config.sound_enabled(),
            file: config.sound.file.clone(),
            player: config.sound.player.clone(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Starts the player in the background.
    ///
    /// Returns `Ok(())` without doing anything when sound is disabled.
    ///
    /// # Errors
    ///
    /// - [`HookError::SoundFileMissing`] if the sound file does not exist.
    /// - [`HookError::NoRuntime`] if called outside a Tokio runtime.
    /// - [`HookError::Spawn`] if the player executable cannot be started.
    pub fn play(&self) -> Result<(), HookError> {
        if !self.enabled {
            debug!("sound is disabled; skipping buzz");
            return Ok(());
        }

        if !self.file.exists() {
            return Err(HookError::SoundFileMissing(self.file.clone()));
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| HookError::NoRuntime)?;
        // tokio::process needs the runtime's reactor when the child is spawned.
        let _guard = runtime.enter();

        let mut child = Command::new(&self.player)
            .arg(&self.file)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| HookError::Spawn {
                player: self.player.clone(),
                source,
            })?;

        info!("playing buzz sound via {}", self.player);

        let player = self.player.clone();
        runtime.spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => debug!("{player} finished"),
                Ok(status) => warn!("{player} exited with {status}"),
                Err(e) => warn!("error waiting for {player}: {e}"),
            }
        });

        Ok(())
    }
}

impl ScanHook for SoundHook {
    fn on_scan(&self, _event: &ScanEvent) -> Result<(), HookError> {
        self.play()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
