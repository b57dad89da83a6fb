//! JSON codec for relay protocol messages.
//!
//! Decoding is the single validation point of the protocol.  Raw text from a
//! peer is parsed once into an [`InboundMessage`]; handlers further in never
//! see an unchecked field.
//!
//! Validation rules:
//!
//! - The text must be a JSON object.
//! - It must carry a string `type`.
//! - `rfid_scan` needs string `cardId` and `deviceId`.  `readerId` is
//!   optional and lenient: a non-empty string is kept, any other value is
//!   dropped without rejecting the scan.
//! - `device_connect` needs string `deviceId` and `deviceType`.
//! - Any other `type` decodes to [`InboundMessage::Unrecognized`].
//! - Unknown extra fields are ignored.

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::protocol::messages::{InboundMessage, OutboundMessage, DEVICE_CONNECT, RFID_SCAN};

/// Errors that can occur while decoding or encoding a protocol message.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The text is not valid JSON.
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    /// The text is valid JSON but not an object (e.g. an array or a number).
    #[error("message is not a JSON object")]
    NotAnObject,

    /// The object has no `type` field.
    #[error("message has no \"type\" field")]
    MissingType,

    /// The `type` field is present but not a string.
    #[error("\"type\" field must be a string")]
    InvalidType,

    /// A known message type is missing a required field or has a field of the
    /// wrong JSON type.
    #[error("malformed {message_type} message: {reason}")]
    MalformedFields {
        message_type: &'static str,
        reason: String,
    },

    /// An outbound message could not be serialized.
    #[error("failed to encode message: {0}")]
    Encode(String),
}

// ── Wire shapes of the known inbound variants ─────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RfidScanFields {
    card_id: String,
    device_id: String,
    #[serde(default)]
    reader_id: Option<Value>,
}

/// Keeps a `readerId` only when it is a non-empty string.
fn lenient_reader_id(raw: Option<Value>) -> Option<String> {
    match raw {
        Some(Value::String(id)) if !id.is_empty() => Some(id),
        _ => None,
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceConnectFields {
    device_id: String,
    device_type: String,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Decodes one inbound text frame.
///
/// # Errors
///
/// Returns [`ProtocolError`] when the text breaks any rule listed in the
/// module documentation.  An unknown `type` is **not** an error.
///
/// # Examples
///
/// ```rust
/// use rfid_relay_core::{decode_inbound, InboundMessage};
///
/// let msg = decode_inbound(r#"{"type":"device_connect","deviceId":"web-1","deviceType":"react_client"}"#).unwrap();
/// assert!(matches!(msg, InboundMessage::DeviceConnect { .. }));
/// ```
pub fn decode_inbound(text: &str) -> Result<InboundMessage, ProtocolError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;

    let Value::Object(fields) = value else {
        return Err(ProtocolError::NotAnObject);
    };

    let message_type = match fields.get("type") {
        Some(Value::String(t)) => t.clone(),
        Some(_) => return Err(ProtocolError::InvalidType),
        None => return Err(ProtocolError::MissingType),
    };

    match message_type.as_str() {
        RFID_SCAN => {
            let f: RfidScanFields = fields_as(RFID_SCAN, fields)?;
            Ok(InboundMessage::RfidScan {
                card_id: f.card_id,
                device_id: f.device_id,
                reader_id: lenient_reader_id(f.reader_id),
            })
        }
        DEVICE_CONNECT => {
            let f: DeviceConnectFields = fields_as(DEVICE_CONNECT, fields)?;
            Ok(InboundMessage::DeviceConnect {
                device_id: f.device_id,
                device_type: f.device_type,
            })
        }
        _ => Ok(InboundMessage::Unrecognized { message_type }),
    }
}

/// Encodes one outbound message to JSON text.
///
/// # Errors
///
/// Returns [`ProtocolError::Encode`] if serialization fails.  With the
/// current message set this cannot happen, but the signature keeps callers
/// honest should a non-string field ever be added.
pub fn encode_outbound(msg: &OutboundMessage) -> Result<String, ProtocolError> {
    serde_json::to_string(msg).map_err(|e| ProtocolError::Encode(e.to_string()))
}

/// Deserializes the validated object into the typed field set for
/// `message_type`.
fn fields_as<T: for<'de> Deserialize<'de>>(
    message_type: &'static str,
    fields: Map<String, Value>,
) -> Result<T, ProtocolError> {
    serde_json::from_value(Value::Object(fields)).map_err(|e| ProtocolError::MalformedFields {
        message_type,
        reason: e.to_string(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
