//! Side-effect hook invoked once per accepted scan.
//!
//! The hub itself only relays; anything else that should happen on a scan
//! (the buzz sound, an audit line, a GPIO pulse) lives behind [`ScanHook`].
//! Hooks are called through [`invoke_isolated`], which turns both errors and
//! panics into log lines so a broken hook can never stop a broadcast.

use std::panic::{catch_unwind, AssertUnwindSafe};

use rfid_relay_core::ScanEvent;
use thiserror::Error;
use tracing::{error, warn};

/// Errors a hook may report.  They are logged, never propagated.
#[derive(Debug, Error)]
pub enum HookError {
    /// The configured sound file does not exist.
    #[error("sound file not found: {0}")]
    SoundFileMissing(std::path::PathBuf),

    /// The external player could not be started.
    #[error("failed to start {player}: {source}")]
    Spawn {
        player: String,
        #[source]
        source: std::io::Error,
    },

    /// The hook needs a Tokio runtime and none is running on this thread.
    #[error("no async runtime available to run the hook")]
    NoRuntime,

    /// Any other hook-specific failure.
    #[error("{0}")]
    Failed(String),
}

/// A notification callback for accepted scans.
///
/// Implementations must return promptly: start long work in the background
/// and return.  The dispatcher calls the hook before it broadcasts.
#[cfg_attr(test, mockall::automock)]
pub trait ScanHook: Send + Sync {
    fn on_scan(&self, event: &ScanEvent) -> Result<(), HookError>;
}

/// A hook that does nothing.  Used when no side effect is wanted.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHook;

impl ScanHook for NoopHook {
    fn on_scan(&self, _event: &ScanEvent) -> Result<(), HookError> {
        Ok(())
    }
}

/// Calls `hook` and swallows any failure, logging it.
///
/// Returns `true` if the hook completed without error.
pub fn invoke_isolated(hook: &dyn ScanHook, event: &ScanEvent) -> bool {
    match catch_unwind(AssertUnwindSafe(|| hook.on_scan(event))) {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            warn!("scan hook failed for card {}: {e}", event.card_id());
            false
        }
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!("scan hook panicked for card {}: {reason}", event.card_id());
            false
        }
    }
}
