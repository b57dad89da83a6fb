//! Message types for the device/viewer WebSocket protocol.
//!
//! Every frame is a JSON object with a `"type"` field naming the message.
//! Field names are camelCase on the wire (`cardId`, `deviceId`, ...).
//!
//! # Message flow
//!
//! ```text
//! Device → Hub:   {"type":"rfid_scan", ...}        →  InboundMessage::RfidScan
//! Viewer → Hub:   {"type":"device_connect", ...}   →  InboundMessage::DeviceConnect
//! Hub → others:   OutboundMessage::RfidScan        →  {"type":"rfid_scan", ...}
//! Hub → viewer:   OutboundMessage::LastRfidScan    →  {"type":"last_rfid_scan", ...}
//! ```
//!
//! # Why separate inbound and outbound types?
//!
//! The two directions carry different fields: a device never sends a
//! timestamp, and the hub never sends `deviceType`.  Two enums make it a
//! compile-time error to echo an inbound message back out unchanged.

use serde::{Deserialize, Serialize};

use crate::domain::scan::{to_iso8601, ScanEvent};

pub use crate::domain::scan::READER_ID_DEVICE;

/// `type` value of a scan notification (inbound and outbound).
pub const RFID_SCAN: &str = "rfid_scan";

/// `type` value of a device or viewer announcing itself.
pub const DEVICE_CONNECT: &str = "device_connect";

/// `type` value of the catch-up reply sent to a late-joining viewer.
pub const LAST_RFID_SCAN: &str = "last_rfid_scan";

/// `deviceType` that marks a browser viewer rather than a scanning device.
pub const VIEWER_DEVICE_TYPE: &str = "react_client";

// ── Inbound ───────────────────────────────────────────────────────────────────

/// Every message a peer can send, after validation at the decode boundary.
///
/// Built by [`crate::protocol::decode_inbound`]; anything that fails
/// validation never becomes an `InboundMessage` at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    /// A device read a card.
    RfidScan {
        card_id: String,
        device_id: String,
        /// Reader head, as supplied.  Whether it is forwarded is decided when
        /// the [`ScanEvent`] is built.
        reader_id: Option<String>,
    },

    /// A device or viewer introduced itself.
    DeviceConnect {
        device_id: String,
        device_type: String,
    },

    /// Well-formed JSON with a `type` the hub has no handler for.
    Unrecognized { message_type: String },
}

impl InboundMessage {
    /// The wire `type` string, for log lines.
    pub fn type_name(&self) -> &str {
        match self {
            InboundMessage::RfidScan { .. } => RFID_SCAN,
            InboundMessage::DeviceConnect { .. } => DEVICE_CONNECT,
            InboundMessage::Unrecognized { message_type } => message_type,
        }
    }
}

// ── Outbound ──────────────────────────────────────────────────────────────────

/// Every message the hub sends.
///
/// # Serde representation
///
/// ```json
/// {"type":"rfid_scan","cardId":"CARD1","deviceId":"esp32-001","timestamp":"2025-01-01T12:00:00.000Z"}
/// {"type":"rfid_scan","cardId":"CARD2","deviceId":"esp32-003","timestamp":"...","readerId":"R7"}
/// {"type":"last_rfid_scan","cardId":"CARD1","timestamp":"...","deviceId":"web-1"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum OutboundMessage {
    /// Live scan, fanned out to every connection except the sender.
    RfidScan {
        card_id: String,
        device_id: String,
        timestamp: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reader_id: Option<String>,
    },

    /// Catch-up reply to a viewer that just announced itself.
    ///
    /// `device_id` echoes the *viewer's* id, not the scanning device's.
    LastRfidScan {
        card_id: String,
        timestamp: String,
        device_id: String,
    },
}

impl OutboundMessage {
    /// The live broadcast form of `event`.
    pub fn scan(event: &ScanEvent) -> Self {
        OutboundMessage::RfidScan {
            card_id: event.card_id().to_string(),
            device_id: event.device_id().to_string(),
            timestamp: to_iso8601(&event.timestamp()),
            reader_id: event.reader_id().map(str::to_string),
        }
    }

    /// The catch-up form of `event`, addressed to `viewer_device_id` and
    /// stamped with the reply time.
    pub fn catch_up(
        event: &ScanEvent,
        viewer_device_id: &str,
        replied_at: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        OutboundMessage::LastRfidScan {
            card_id: event.card_id().to_string(),
            timestamp: to_iso8601(&replied_at),
            device_id: viewer_device_id.to_string(),
        }
    }

    /// The wire `type` string, for log lines.
    pub fn type_name(&self) -> &'static str {
        match self {
            OutboundMessage::RfidScan { .. } => RFID_SCAN,
            OutboundMessage::LastRfidScan { .. } => LAST_RFID_SCAN,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::{json, Value};

    fn scan_at_noon(device: &str, reader: Option<&str>) -> ScanEvent {
        let ts = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        ScanEvent::received("CARD1", device, reader.map(str::to_string), ts)
    }

    #[test]
    fn test_scan_serializes_with_snake_case_type_and_camel_case_fields() {
        // Arrange
        let msg = OutboundMessage::scan(&scan_at_noon("esp32-001", None));

        // Act
        let value: Value = serde_json::to_value(&msg).unwrap();

        // Assert
        assert_eq!(
            value,
            json!({
                "type": "rfid_scan",
                "cardId": "CARD1",
                "deviceId": "esp32-001",
                "timestamp": "2025-01-01T12:00:00.000Z"
            })
        );
    }

    #[test]
    fn test_scan_omits_reader_id_key_when_absent() {
        let msg = OutboundMessage::scan(&scan_at_noon("esp32-001", Some("R7")));
        let text = serde_json::to_string(&msg).unwrap();
        assert!(!text.contains("readerId"), "readerId must be omitted: {text}");
    }

    #[test]
    fn test_scan_includes_reader_id_for_reserved_device() {
        let msg = OutboundMessage::scan(&scan_at_noon("esp32-003", Some("R7")));
        let value: Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["readerId"], "R7");
    }

    #[test]
    fn test_catch_up_carries_viewer_device_id_and_reply_time() {
        // Arrange
        let event = scan_at_noon("esp32-001", None);
        let replied_at = Utc.with_ymd_and_hms(2025, 1, 1, 12, 5, 0).unwrap();

        // Act
        let value = serde_json::to_value(OutboundMessage::catch_up(&event, "web-1", replied_at))
            .unwrap();

        // Assert
        assert_eq!(
            value,
            json!({
                "type": "last_rfid_scan",
                "cardId": "CARD1",
                "timestamp": "2025-01-01T12:05:00.000Z",
                "deviceId": "web-1"
            })
        );
    }

    #[test]
    fn test_outbound_type_names_match_wire_tags() {
        let event = scan_at_noon("esp32-001", None);
        assert_eq!(OutboundMessage::scan(&event).type_name(), RFID_SCAN);
        assert_eq!(
            OutboundMessage::catch_up(&event, "web-1", Utc::now()).type_name(),
            LAST_RFID_SCAN
        );
    }

    #[test]
    fn test_inbound_type_name_for_unrecognized_echoes_raw_type() {
        let msg = InboundMessage::Unrecognized {
            message_type: "heartbeat".to_string(),
        };
        assert_eq!(msg.type_name(), "heartbeat");
    }
}
