//! Point-in-time status of the hub, served by `/api/status` and the HTML
//! index page.

use serde::Serialize;

use crate::application::cache::LastEventCache;
use crate::application::registry::ConnectionRegistry;
use crate::domain::RelayConfig;

/// Snapshot of hub state.
///
/// # Serde representation
///
/// ```json
/// {"status":"running","clients":3,"lastCardId":"CARD1","environment":"development","soundEnabled":false}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayStatus {
    pub status: &'static str,
    pub clients: usize,
    pub last_card_id: Option<String>,
    pub environment: String,
    pub sound_enabled: bool,
}

impl RelayStatus {
    /// Reads the registry and cache once each.
    pub async fn collect(
        registry: &ConnectionRegistry,
        cache: &LastEventCache,
        config: &RelayConfig,
    ) -> Self {
        Self {
            status: "running",
            clients: registry.size().await,
            last_card_id: cache.last_card_id().await,
            environment: config.environment.clone(),
            sound_enabled: config.sound_enabled(),
        }
    }
}
