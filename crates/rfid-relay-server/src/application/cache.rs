//! Last-event cache: the single most recent scan.
//!
//! Exactly one slot, last write wins, no history.  Late-joining viewers are
//! answered from here.

use rfid_relay_core::ScanEvent;
use tokio::sync::RwLock;

/// Holds the latest [`ScanEvent`], if any.
///
/// The slot sits behind a `tokio::sync::RwLock`, so a reader sees either the
/// previous event or the new one, never a half-written mix.
#[derive(Debug, Default)]
pub struct LastEventCache {
    slot: RwLock<Option<ScanEvent>>,
}

impl LastEventCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the slot and returns whatever was there before.
    pub async fn store(&self, event: ScanEvent) -> Option<ScanEvent> {
        self.slot.write().await.replace(event)
    }

    /// Clone of the cached event.
    pub async fn latest(&self) -> Option<ScanEvent> {
        self.slot.read().await.clone()
    }

    /// Card id of the cached event, for the status page.
    pub async fn last_card_id(&self) -> Option<String> {
        self.slot
            .read()
            .await
            .as_ref()
            .map(|e| e.card_id().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn scan(card: &str) -> ScanEvent {
        ScanEvent::received(card, "esp32-001", None, Utc::now())
    }

    #[tokio::test]
    async fn test_new_cache_is_empty() {
        let cache = LastEventCache::new();
        assert!(cache.latest().await.is_none());
        assert!(cache.last_card_id().await.is_none());
    }

    #[tokio::test]
    async fn test_store_then_latest_returns_event() {
        // Arrange
        let cache = LastEventCache::new();
        let event = scan("CARD1");

        // Act
        let previous = cache.store(event.clone()).await;

        // Assert
        assert!(previous.is_none());
        assert_eq!(cache.latest().await, Some(event));
    }

    #[tokio::test]
    async fn test_store_overwrites_and_returns_previous() {
        let cache = LastEventCache::new();
        cache.store(scan("CARD1")).await;

        let previous = cache.store(scan("CARD2")).await;

        assert_eq!(previous.map(|e| e.card_id().to_string()).as_deref(), Some("CARD1"));
        assert_eq!(cache.last_card_id().await.as_deref(), Some("CARD2"));
    }
}
