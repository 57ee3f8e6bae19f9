//! Parsing of the `/api/adverts` node collection.

use serde::Deserialize;
use serde_json::Value;

use super::{hash_value, lenient, DecodeError};
use crate::coord::GeoPoint;
use crate::node::{Node, NodeFlags};

/// One advert record as served upstream.
///
/// Every field is optional and parsed leniently: a field of the wrong type
/// is treated as absent instead of rejecting the whole record.
#[derive(Debug, Default, Deserialize)]
struct AdvertRecord {
    #[serde(default, deserialize_with = "lenient")]
    id: Option<i64>,
    #[serde(default)]
    node_hash: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    lon: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    lng: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    public_key_hex: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    is_room_server: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    is_repeater: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    is_chat_node: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    is_sensor: Option<bool>,
}

impl From<AdvertRecord> for Node {
    fn from(record: AdvertRecord) -> Self {
        Node {
            id: record.id.unwrap_or(0),
            hash: record.node_hash.as_ref().and_then(hash_value).unwrap_or(0),
            // `lon` wins over `lng` when both are present
            position: GeoPoint::from_parts(record.lat, record.lon.or(record.lng)),
            flags: NodeFlags {
                room_server: record.is_room_server.unwrap_or(false),
                repeater: record.is_repeater.unwrap_or(false),
                chat_node: record.is_chat_node.unwrap_or(false),
                sensor: record.is_sensor.unwrap_or(false),
            },
            name: record.name.unwrap_or_default(),
            public_key_hex: record.public_key_hex.unwrap_or_default(),
        }
    }
}

/// Parse an advert list body into nodes, preserving list order.
///
/// Non-object entries are skipped. An empty array yields an empty list;
/// callers decide whether that should replace existing data.
pub fn parse_adverts(body: &[u8]) -> Result<Vec<Node>, DecodeError> {
    let root: Value = serde_json::from_slice(body)?;
    let Value::Array(entries) = root else {
        return Err(DecodeError::NotAnArray);
    };

    let nodes = entries
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|entry| serde_json::from_value::<AdvertRecord>(entry).ok())
        .map(Node::from)
        .collect();

    Ok(nodes)
}
