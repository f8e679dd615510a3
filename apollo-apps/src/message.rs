//! Inbound wire messages.
//!
//! Every frame from the backend is a JSON envelope:
//!
//! ```text
//! { "type": "throughput_data" | "security_alert", "payload": <type specific> }
//! ```
//!
//! [`InboundMessage::parse`] validates the envelope and the payload shape in one step, so the
//! rest of the panel only ever sees typed values. Unknown `type` tags are not an error; they
//! parse to [`InboundMessage::Unknown`] and are ignored downstream.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const MESSAGE_TYPE_THROUGHPUT_DATA: &str = "throughput_data";
pub const MESSAGE_TYPE_SECURITY_ALERT: &str = "security_alert";

/// Raw per-window counters reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// Bytes seen during the window. Missing means zero.
    #[serde(default)]
    pub bytes_total: Option<f64>,
    #[serde(default)]
    pub packets: Option<u64>,
}

/// A throughput frame after the timestamp has been pulled out of the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ThroughputFrame {
    /// Window start, epoch seconds.
    pub timestamp: i64,
    pub sample: RawSample,
}

/// Geolocation enrichment attached to an alert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoInfo {
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
}

/// A security alert emitted by the backend's intrusion prevention engine.
///
/// Only `ip` and `timestamp` are required. Fields this panel does not know about are kept in
/// `extra` so the record can be re-served verbatim by the monitoring API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub ip: String,
    /// Epoch seconds, possibly fractional.
    pub timestamp: f64,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub geo: Option<GeoInfo>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AlertRecord {
    /// Lower-cased severity, used for styling only.
    pub fn severity_class(&self) -> Option<String> {
        self.severity.as_deref().map(str::to_lowercase)
    }

    /// Lower-cased ISO country code, used for flag selection only.
    pub fn country_class(&self) -> Option<String> {
        self.geo
            .as_ref()
            .and_then(|g| g.country_code.as_deref())
            .map(str::to_lowercase)
    }

    pub fn hostname(&self) -> Option<&str> {
        self.geo.as_ref().and_then(|g| g.hostname.as_deref())
    }
}

/// A validated inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Throughput(ThroughputFrame),
    SecurityAlert(Box<AlertRecord>),
    /// Well-formed envelope with a `type` this panel does not handle.
    Unknown(String),
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Value,
}

/// Explicit throughput payload: the timestamp travels as a field.
#[derive(Deserialize)]
struct TimestampedSample {
    timestamp: i64,
    #[serde(flatten)]
    sample: RawSample,
}

impl InboundMessage {
    /// Parses one text frame.
    pub fn parse(frame: &str) -> Result<Self, MessageError> {
        let envelope: Envelope = serde_json::from_str(frame).map_err(MessageError::InvalidJson)?;

        match envelope.kind.as_str() {
            MESSAGE_TYPE_THROUGHPUT_DATA => {
                parse_throughput_payload(envelope.payload).map(InboundMessage::Throughput)
            }
            MESSAGE_TYPE_SECURITY_ALERT => serde_json::from_value::<AlertRecord>(envelope.payload)
                .map(|alert| InboundMessage::SecurityAlert(Box::new(alert)))
                .map_err(|e| MessageError::InvalidPayload {
                    kind: MESSAGE_TYPE_SECURITY_ALERT,
                    source: e,
                }),
            _ => Ok(InboundMessage::Unknown(envelope.kind)),
        }
    }

    /// The envelope tag this message was parsed from.
    pub fn kind(&self) -> &str {
        match self {
            InboundMessage::Throughput(_) => MESSAGE_TYPE_THROUGHPUT_DATA,
            InboundMessage::SecurityAlert(_) => MESSAGE_TYPE_SECURITY_ALERT,
            InboundMessage::Unknown(kind) => kind,
        }
    }
}

// Accepts `{ "timestamp": N, "bytes_total": .. }` or the legacy `{ "<epoch>": { .. } }` form.
// The legacy map must carry exactly one entry.
fn parse_throughput_payload(payload: Value) -> Result<ThroughputFrame, MessageError> {
    let Value::Object(map) = payload else {
        return Err(MessageError::UnexpectedPayloadShape(
            "throughput payload is not an object",
        ));
    };

    if map.contains_key("timestamp") {
        let explicit: TimestampedSample = serde_json::from_value(Value::Object(map)).map_err(
            |e| MessageError::InvalidPayload {
                kind: MESSAGE_TYPE_THROUGHPUT_DATA,
                source: e,
            },
        )?;
        return Ok(ThroughputFrame {
            timestamp: explicit.timestamp,
            sample: explicit.sample,
        });
    }

    if map.len() != 1 {
        return Err(MessageError::AmbiguousThroughputWindows(map.len()));
    }

    let (key, value) = map
        .into_iter()
        .next()
        .ok_or(MessageError::AmbiguousThroughputWindows(0))?;
    let timestamp = key
        .trim()
        .parse::<i64>()
        .map_err(|_| MessageError::InvalidTimestampKey(key.clone()))?;
    let sample: RawSample =
        serde_json::from_value(value).map_err(|e| MessageError::InvalidPayload {
            kind: MESSAGE_TYPE_THROUGHPUT_DATA,
            source: e,
        })?;

    Ok(ThroughputFrame { timestamp, sample })
}

/// Why a frame was rejected at the parse boundary.
#[derive(Debug)]
pub enum MessageError {
    /// The frame is not a JSON envelope with a `type` field.
    InvalidJson(serde_json::Error),
    /// The envelope is fine but the payload does not match its `type`.
    InvalidPayload {
        kind: &'static str,
        source: serde_json::Error,
    },
    UnexpectedPayloadShape(&'static str),
    /// Legacy throughput payload with zero or several window keys.
    AmbiguousThroughputWindows(usize),
    InvalidTimestampKey(String),
    /// Binary frame that is not valid UTF-8.
    NonUtf8Frame,
}

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageError::InvalidJson(e) => write!(f, "invalid JSON envelope: {e}"),
            MessageError::InvalidPayload { kind, source } => {
                write!(f, "invalid `{kind}` payload: {source}")
            }
            MessageError::UnexpectedPayloadShape(what) => write!(f, "{what}"),
            MessageError::AmbiguousThroughputWindows(n) => write!(
                f,
                "throughput payload must carry exactly one window, found {n}"
            ),
            MessageError::InvalidTimestampKey(key) => {
                write!(f, "throughput window key `{key}` is not an epoch timestamp")
            }
            MessageError::NonUtf8Frame => write!(f, "binary frame is not valid UTF-8"),
        }
    }
}

impl std::error::Error for MessageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MessageError::InvalidJson(e) => Some(e),
            MessageError::InvalidPayload { source, .. } => Some(source),
            _ => None,
        }
    }
}
