//! Event stream decoder.
//!
//! Turns the text payload of one `data: ` line into a typed [`StreamEvent`].
//! Decoding is pure: it never touches shared state, so the ingestion loop
//! can parse outside the state lock and only hold it while applying.
//!
//! # Envelope
//!
//! ```text
//! {"type": "packet", "data": "{\"src_hash\":100,\"dst_hash\":200,...}"}
//! ```
//!
//! The `data` field carries a second JSON document, normally encoded as a
//! string. Inline objects are accepted as well.

mod adverts;
mod error;

pub use adverts::parse_adverts;
pub use error::DecodeError;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::node::{NodeHash, NodeRef};

/// Upper bound on the size of a single payload.
pub const MAX_PAYLOAD_BYTES: usize = 1024 * 1024;

/// Inner `type` value that marks a multi-hop path trace.
pub const PROPAGATION_PATH_TYPE: &str = "propagation.path";

/// A decoded stream envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// New connection-status text from `connected` / `statusUpdate`.
    Status(String),
    /// Liveness only; refreshes the last-update label.
    Ping,
    /// One packet transit.
    Packet(PacketReport),
    /// One multi-hop propagation trace.
    Propagation(PropagationTrace),
    /// Packet or propagation envelope whose payload yields nothing to draw
    /// (malformed, not a path trace, too short). Still counts as activity.
    Unrendered,
    /// Well-formed envelope with nothing to apply.
    Ignored,
}

/// Contents of a `packet` payload.
#[derive(Debug, Clone, PartialEq)]
pub struct PacketReport {
    /// Upper-cased direction, empty when absent.
    pub direction: String,
    pub sender: String,
    pub origin: String,
    /// Source and destination, present only when both are of the same kind.
    pub route: Option<(NodeRef, NodeRef)>,
}

impl PacketReport {
    /// Log line for this packet: `"<time> <DIRECTION>: <sender> -> <origin>"`.
    pub fn log_line(&self, time_label: &str) -> String {
        let mut line = String::with_capacity(64);
        if !time_label.is_empty() {
            line.push_str(time_label);
            line.push(' ');
        }
        if !self.direction.is_empty() {
            line.push_str(&self.direction);
            line.push_str(": ");
        }
        line.push_str(&self.sender);
        line.push_str(" -> ");
        line.push_str(&self.origin);
        line
    }
}

/// Contents of a `propagation.path` payload.
#[derive(Debug, Clone, PartialEq)]
pub struct PropagationTrace {
    /// Hops in path order. Entries that were neither numbers nor strings
    /// are already dropped.
    pub hops: Vec<NodeRef>,
    /// Length of the path as sent, including entries that were dropped.
    /// Drives the animation duration.
    pub hop_count: usize,
}

/// Deserialize a field, treating a value of the wrong type as absent.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    kind: Option<String>,
    #[serde(rename = "connectionStatus", default, deserialize_with = "lenient")]
    connection_status: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    status: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct PacketPayload {
    #[serde(default, deserialize_with = "lenient")]
    direction: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    sender_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    group_sender_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    advert_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    origin: Option<String>,
    #[serde(default)]
    src_hash: Option<Value>,
    #[serde(default)]
    dst_hash: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct PropagationPayload {
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    kind: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    path: Option<PathBody>,
}

#[derive(Debug, Deserialize)]
struct PathBody {
    #[serde(default, deserialize_with = "lenient")]
    nodes: Option<Vec<Value>>,
}

/// Decode one envelope from the event stream.
pub fn decode_envelope(raw: &str) -> Result<StreamEvent, DecodeError> {
    check_object(raw)?;
    let envelope: Envelope = serde_json::from_str(raw)?;

    match envelope.kind.as_deref().unwrap_or_default() {
        "connected" | "statusUpdate" => {
            let status = non_empty(envelope.connection_status).or(non_empty(envelope.status));
            Ok(status.map_or(StreamEvent::Ignored, StreamEvent::Status))
        }
        "ping" => Ok(StreamEvent::Ping),
        "packet" => Ok(activity(
            nested::<PacketPayload>(envelope.data)
                .map(|payload| payload.map(|payload| StreamEvent::Packet(packet_report(payload)))),
        )),
        "propagation" => Ok(activity(
            nested::<PropagationPayload>(envelope.data).and_then(|payload| match payload {
                Some(payload) => Ok(Some(
                    propagation_trace(payload)?
                        .map_or(StreamEvent::Unrendered, StreamEvent::Propagation),
                )),
                None => Ok(None),
            }),
        )),
        _ => Ok(StreamEvent::Ignored),
    }
}

/// Outcome of a packet or propagation envelope.
///
/// Missing or empty `data` is `Ignored`. Once a payload is present, a
/// failure inside it only costs the drawing, not the activity.
fn activity(result: Result<Option<StreamEvent>, DecodeError>) -> StreamEvent {
    match result {
        Ok(Some(event)) => event,
        Ok(None) => StreamEvent::Ignored,
        Err(e) => {
            debug!(error = %e, "Undrawable stream payload");
            StreamEvent::Unrendered
        }
    }
}

/// Decode a bare `packet` payload (the document inside `data`).
pub fn decode_packet(raw: &str) -> Result<PacketReport, DecodeError> {
    check_object(raw)?;
    Ok(packet_report(serde_json::from_str(raw)?))
}

/// Decode a bare propagation payload.
///
/// Returns `Ok(None)` when the payload is not a `propagation.path` trace.
pub fn decode_propagation(raw: &str) -> Result<Option<PropagationTrace>, DecodeError> {
    check_object(raw)?;
    propagation_trace(serde_json::from_str(raw)?)
}

/// Size and shape gate applied before any JSON parsing.
fn check_object(raw: &str) -> Result<(), DecodeError> {
    if raw.len() > MAX_PAYLOAD_BYTES {
        return Err(DecodeError::Oversized {
            size: raw.len(),
            max: MAX_PAYLOAD_BYTES,
        });
    }
    match raw.trim_start().as_bytes().first() {
        Some(b'{') => Ok(()),
        _ => Err(DecodeError::NotAnObject),
    }
}

/// Extract the nested payload from `data`. Empty, missing or non-document
/// data is `None`.
fn nested<T: DeserializeOwned>(data: Option<Value>) -> Result<Option<T>, DecodeError> {
    match data {
        Some(Value::String(text)) if text.is_empty() => Ok(None),
        Some(Value::String(text)) => {
            check_object(&text)?;
            Ok(Some(serde_json::from_str(&text)?))
        }
        Some(object @ Value::Object(_)) => Ok(Some(serde_json::from_value(object)?)),
        _ => Ok(None),
    }
}

fn packet_report(payload: PacketPayload) -> PacketReport {
    let sender = non_empty(payload.sender_name)
        .or(non_empty(payload.group_sender_name))
        .or(non_empty(payload.advert_name))
        .unwrap_or_else(|| "unknown".to_string());

    PacketReport {
        direction: payload.direction.unwrap_or_default().to_ascii_uppercase(),
        sender,
        origin: non_empty(payload.origin).unwrap_or_else(|| "unknown".to_string()),
        route: packet_route(payload.src_hash.as_ref(), payload.dst_hash.as_ref()),
    }
}

/// Both endpoints must be numbers, or both strings; mixed kinds yield no route.
fn packet_route(src: Option<&Value>, dst: Option<&Value>) -> Option<(NodeRef, NodeRef)> {
    match (src?, dst?) {
        (src @ Value::Number(_), dst @ Value::Number(_)) => {
            Some((NodeRef::Hash(hash_value(src)?), NodeRef::Hash(hash_value(dst)?)))
        }
        (Value::String(src), Value::String(dst)) => Some((
            NodeRef::KeyPrefix(src.clone()),
            NodeRef::KeyPrefix(dst.clone()),
        )),
        _ => None,
    }
}

fn propagation_trace(
    payload: PropagationPayload,
) -> Result<Option<PropagationTrace>, DecodeError> {
    if payload.kind.as_deref() != Some(PROPAGATION_PATH_TYPE) {
        return Ok(None);
    }

    let nodes = payload
        .path
        .and_then(|path| path.nodes)
        .ok_or(DecodeError::MissingField("path.nodes"))?;
    if nodes.len() < 2 {
        return Err(DecodeError::PathTooShort(nodes.len()));
    }

    let hop_count = nodes.len();
    let hops = nodes
        .iter()
        .filter_map(|entry| match entry {
            Value::Number(_) => hash_value(entry).map(NodeRef::Hash),
            Value::String(token) => Some(NodeRef::Token(token.clone())),
            _ => None,
        })
        .collect();

    Ok(Some(PropagationTrace { hops, hop_count }))
}

/// Numeric hash from a JSON number. Integral floats are accepted.
pub(crate) fn hash_value(value: &Value) -> Option<NodeHash> {
    if let Some(n) = value.as_u64() {
        return NodeHash::try_from(n).ok();
    }
    let f = value.as_f64()?;
    if f.fract() == 0.0 && f >= 0.0 && f <= NodeHash::MAX as f64 {
        Some(f as NodeHash)
    } else {
        None
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet_envelope(inner: &str) -> String {
        serde_json::json!({ "type": "packet", "data": inner }).to_string()
    }

    fn propagation_envelope(inner: &str) -> String {
        serde_json::json!({ "type": "propagation", "data": inner }).to_string()
    }

    #[test]
    fn test_status_envelopes() {
        let event =
            decode_envelope(r#"{"type":"connected","connectionStatus":"Connected"}"#).unwrap();
        assert_eq!(event, StreamEvent::Status("Connected".to_string()));

        let event =
            decode_envelope(r#"{"type":"statusUpdate","connectionStatus":"Reconnecting \"x\""}"#)
                .unwrap();
        assert_eq!(event, StreamEvent::Status("Reconnecting \"x\"".to_string()));
    }

    #[test]
    fn test_empty_status_is_ignored() {
        let event = decode_envelope(r#"{"type":"statusUpdate","connectionStatus":""}"#).unwrap();
        assert_eq!(event, StreamEvent::Ignored);
        let event = decode_envelope(r#"{"type":"connected"}"#).unwrap();
        assert_eq!(event, StreamEvent::Ignored);
    }

    #[test]
    fn test_ping_and_unknown_types() {
        assert_eq!(decode_envelope(r#"{"type":"ping"}"#).unwrap(), StreamEvent::Ping);
        assert_eq!(
            decode_envelope(r#"{"type":"weather","data":"{}"}"#).unwrap(),
            StreamEvent::Ignored
        );
        assert_eq!(decode_envelope(r#"{"kind":"ping"}"#).unwrap(), StreamEvent::Ignored);
        assert_eq!(decode_envelope(r#"{"type":7}"#).unwrap(), StreamEvent::Ignored);
    }

    #[test]
    fn test_malformed_input_is_an_error() {
        assert!(matches!(decode_envelope(""), Err(DecodeError::NotAnObject)));
        assert!(matches!(decode_envelope("[1,2]"), Err(DecodeError::NotAnObject)));
        assert!(matches!(
            decode_envelope(r#"{"type":"packet","data":"{\"src"#),
            Err(DecodeError::Json(_))
        ));
    }

    #[test]
    fn test_broken_inner_payload_is_unrendered() {
        assert_eq!(
            decode_envelope(&packet_envelope(r#"{"src_hash":1"#)).unwrap(),
            StreamEvent::Unrendered
        );
        assert_eq!(
            decode_envelope(&packet_envelope("not json")).unwrap(),
            StreamEvent::Unrendered
        );
        assert_eq!(
            decode_envelope(&propagation_envelope("[1,2]")).unwrap(),
            StreamEvent::Unrendered
        );
    }

    #[test]
    fn test_non_document_data_is_ignored() {
        assert_eq!(
            decode_envelope(r#"{"type":"packet","data":42}"#).unwrap(),
            StreamEvent::Ignored
        );
        assert_eq!(
            decode_envelope(r#"{"type":"propagation","data":null}"#).unwrap(),
            StreamEvent::Ignored
        );
    }

    #[test]
    fn test_oversized_payload_rejected() {
        let big = format!(r#"{{"type":"ping","pad":"{}"}}"#, "x".repeat(MAX_PAYLOAD_BYTES));
        assert!(matches!(
            decode_envelope(&big),
            Err(DecodeError::Oversized { .. })
        ));
    }

    #[test]
    fn test_packet_defaults() {
        let report = match decode_envelope(&packet_envelope("{}")).unwrap() {
            StreamEvent::Packet(report) => report,
            other => panic!("expected packet, got {:?}", other),
        };
        assert_eq!(report.sender, "unknown");
        assert_eq!(report.origin, "unknown");
        assert_eq!(report.direction, "");
        assert_eq!(report.route, None);
    }

    #[test]
    fn test_packet_sender_fallback_order() {
        let report =
            decode_packet(r#"{"sender_name":"","group_sender_name":"G","advert_name":"A"}"#)
                .unwrap();
        assert_eq!(report.sender, "G");

        let report = decode_packet(r#"{"advert_name":"A","origin":"Base"}"#).unwrap();
        assert_eq!(report.sender, "A");
        assert_eq!(report.origin, "Base");
    }

    #[test]
    fn test_packet_route_kinds() {
        let report = decode_packet(r#"{"src_hash":100,"dst_hash":200}"#).unwrap();
        assert_eq!(report.route, Some((NodeRef::Hash(100), NodeRef::Hash(200))));

        let report = decode_packet(r#"{"src_hash":"ab","dst_hash":"CD"}"#).unwrap();
        assert_eq!(
            report.route,
            Some((NodeRef::KeyPrefix("ab".into()), NodeRef::KeyPrefix("CD".into())))
        );

        let report = decode_packet(r#"{"src_hash":100,"dst_hash":"CD"}"#).unwrap();
        assert_eq!(report.route, None, "Mixed kinds produce no route");

        let report = decode_packet(r#"{"src_hash":100}"#).unwrap();
        assert_eq!(report.route, None);
    }

    #[test]
    fn test_inline_object_data_accepted() {
        let raw = r#"{"type":"packet","data":{"sender_name":"Inline"}}"#;
        let StreamEvent::Packet(report) = decode_envelope(raw).unwrap() else {
            panic!("expected packet");
        };
        assert_eq!(report.sender, "Inline");
    }

    #[test]
    fn test_empty_data_produces_nothing() {
        assert_eq!(
            decode_envelope(&packet_envelope("")).unwrap(),
            StreamEvent::Ignored
        );
        assert_eq!(decode_envelope(r#"{"type":"packet"}"#).unwrap(), StreamEvent::Ignored);
    }

    #[test]
    fn test_log_line_format() {
        let report = PacketReport {
            direction: "RX".to_string(),
            sender: "A".to_string(),
            origin: "B".to_string(),
            route: None,
        };
        assert_eq!(report.log_line("12:00:01"), "12:00:01 RX: A -> B");

        let report = PacketReport {
            direction: String::new(),
            ..report
        };
        assert_eq!(report.log_line("12:00:01"), "12:00:01 A -> B");
    }

    #[test]
    fn test_direction_upper_cased() {
        let report = decode_packet(r#"{"direction":"rx"}"#).unwrap();
        assert_eq!(report.direction, "RX");
    }

    #[test]
    fn test_propagation_path_mixed_hops() {
        let inner = r#"{"type":"propagation.path","path":{"nodes":[100,"ab12",true,200.0]}}"#;
        let event = decode_envelope(&propagation_envelope(inner)).unwrap();
        assert_eq!(
            event,
            StreamEvent::Propagation(PropagationTrace {
                hops: vec![
                    NodeRef::Hash(100),
                    NodeRef::Token("ab12".to_string()),
                    NodeRef::Hash(200),
                ],
                hop_count: 4,
            })
        );
    }

    #[test]
    fn test_propagation_other_type_unrendered() {
        let inner = r#"{"type":"propagation.summary","path":{"nodes":[1,2]}}"#;
        assert_eq!(
            decode_envelope(&propagation_envelope(inner)).unwrap(),
            StreamEvent::Unrendered
        );
        assert_eq!(
            decode_propagation(inner).unwrap(),
            None,
            "Bare decode reports no trace"
        );
    }

    #[test]
    fn test_short_path_envelope_unrendered() {
        for inner in [
            r#"{"type":"propagation.path","path":{"nodes":[1]}}"#,
            r#"{"type":"propagation.path","path":{}}"#,
            r#"{"type":"propagation.path"}"#,
        ] {
            assert_eq!(
                decode_envelope(&propagation_envelope(inner)).unwrap(),
                StreamEvent::Unrendered,
                "{}",
                inner
            );
        }
    }

    #[test]
    fn test_propagation_requires_two_nodes() {
        assert!(matches!(
            decode_propagation(r#"{"type":"propagation.path","path":{"nodes":[1]}}"#),
            Err(DecodeError::PathTooShort(1))
        ));
        assert!(matches!(
            decode_propagation(r#"{"type":"propagation.path","path":{}}"#),
            Err(DecodeError::MissingField("path.nodes"))
        ));
        assert!(matches!(
            decode_propagation(r#"{"type":"propagation.path","path":{"nodes":"1,2"}}"#),
            Err(DecodeError::MissingField("path.nodes"))
        ));
    }

    #[test]
    fn test_hash_value_bounds() {
        assert_eq!(hash_value(&serde_json::json!(7)), Some(7));
        assert_eq!(hash_value(&serde_json::json!(7.0)), Some(7));
        assert_eq!(hash_value(&serde_json::json!(7.5)), None);
        assert_eq!(hash_value(&serde_json::json!(-1)), None);
        assert_eq!(hash_value(&serde_json::json!(u64::MAX)), None);
    }
}
