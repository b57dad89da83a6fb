//! The scan event and the broker clock that stamps it.
//!
//! A [`ScanEvent`] is one RFID read as the broker understands it: which card,
//! which device, optionally which reader head, and *when the broker received
//! it*.  Devices do not send a timestamp, and if they did it would not be
//! trusted: cheap microcontrollers rarely have a synchronised clock.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, SecondsFormat, Utc};

/// The one device whose `readerId` is forwarded.
///
/// This unit has several reader heads wired to a single ESP32 and reports
/// which head saw the card.  No other device's `readerId` is passed on.
pub const READER_ID_DEVICE: &str = "esp32-003";

/// One RFID read, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEvent {
    card_id: String,
    device_id: String,
    reader_id: Option<String>,
    timestamp: DateTime<Utc>,
}

impl ScanEvent {
    /// Builds an event from the fields a device supplied plus the broker's
    /// receipt time.
    ///
    /// `supplied_reader_id` is kept only when `device_id` is
    /// [`READER_ID_DEVICE`] and the value is non-empty; for every other
    /// device it is dropped.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chrono::Utc;
    /// use rfid_relay_core::ScanEvent;
    ///
    /// let kept = ScanEvent::received("CARD2", "esp32-003", Some("R7".into()), Utc::now());
    /// assert_eq!(kept.reader_id(), Some("R7"));
    ///
    /// let dropped = ScanEvent::received("CARD2", "esp32-001", Some("R7".into()), Utc::now());
    /// assert_eq!(dropped.reader_id(), None);
    /// ```
    pub fn received(
        card_id: impl Into<String>,
        device_id: impl Into<String>,
        supplied_reader_id: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let device_id = device_id.into();
        let reader_id = if device_id == READER_ID_DEVICE {
            supplied_reader_id.filter(|r| !r.is_empty())
        } else {
            None
        };
        Self {
            card_id: card_id.into(),
            device_id,
            reader_id,
            timestamp,
        }
    }

    pub fn card_id(&self) -> &str {
        &self.card_id
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn reader_id(&self) -> Option<&str> {
        self.reader_id.as_deref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Formats a timestamp the way browsers print `Date.prototype.toISOString()`:
/// UTC, millisecond precision, `Z` suffix.
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use rfid_relay_core::domain::scan::to_iso8601;
///
/// let ts = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
/// assert_eq!(to_iso8601(&ts), "2025-01-02T03:04:05.000Z");
/// ```
pub fn to_iso8601(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Wall clock that never runs backwards.
///
/// If the system clock is stepped back (NTP correction, manual change), the
/// clock keeps returning the last value it handed out until wall time
/// catches up.  Events stamped in receipt order therefore carry
/// non-decreasing timestamps.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current time, clamped to be no earlier than any previous
    /// result.
    pub fn now(&self) -> DateTime<Utc> {
        self.observe(Utc::now())
    }

    /// Feeds one wall-clock reading through the clamp.
    pub fn observe(&self, wall: DateTime<Utc>) -> DateTime<Utc> {
        // The critical section cannot panic, so a poisoned lock still holds a
        // valid value.
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        let stamped = match *last {
            Some(prev) if prev > wall => prev,
            _ => wall,
        };
        *last = Some(stamped);
        stamped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_reader_id_kept_for_reserved_device() {
        // Arrange / Act
        let event = ScanEvent::received("CARD2", "esp32-003", Some("R7".to_string()), at(0));

        // Assert
        assert_eq!(event.reader_id(), Some("R7"));
    }

    #[test]
    fn test_reader_id_dropped_for_other_devices() {
        let event = ScanEvent::received("CARD2", "esp32-001", Some("R7".to_string()), at(0));
        assert_eq!(event.reader_id(), None);
    }

    #[test]
    fn test_reader_id_match_is_exact() {
        // Near-misses must not be treated as the reserved device.
        for device in ["ESP32-003", "esp32-0030", " esp32-003", "esp32-03"] {
            let event = ScanEvent::received("C", device, Some("R1".to_string()), at(0));
            assert_eq!(event.reader_id(), None, "device {device:?} must not forward readerId");
        }
    }

    #[test]
    fn test_empty_reader_id_is_treated_as_absent() {
        let event = ScanEvent::received("C", "esp32-003", Some(String::new()), at(0));
        assert_eq!(event.reader_id(), None);
    }

    #[test]
    fn test_accessors_return_constructed_values() {
        let event = ScanEvent::received("CARD1", "esp32-001", None, at(5));
        assert_eq!(event.card_id(), "CARD1");
        assert_eq!(event.device_id(), "esp32-001");
        assert_eq!(event.timestamp(), at(5));
    }

    #[test]
    fn test_to_iso8601_uses_millis_and_z_suffix() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() + Duration::milliseconds(42);
        assert_eq!(to_iso8601(&ts), "2024-06-01T12:00:00.042Z");
    }

    #[test]
    fn test_monotonic_clock_passes_forward_time_through() {
        let clock = MonotonicClock::new();
        assert_eq!(clock.observe(at(1)), at(1));
        assert_eq!(clock.observe(at(2)), at(2));
    }

    #[test]
    fn test_monotonic_clock_never_goes_backwards() {
        // Arrange
        let clock = MonotonicClock::new();
        clock.observe(at(10));

        // Act – the wall clock is stepped back by five seconds
        let stamped = clock.observe(at(5));

        // Assert
        assert_eq!(stamped, at(10));
    }

    #[test]
    fn test_monotonic_clock_now_is_non_decreasing() {
        let clock = MonotonicClock::new();
        let readings: Vec<_> = (0..50).map(|_| clock.now()).collect();
        for window in readings.windows(2) {
            assert!(window[1] >= window[0]);
        }
    }
}
