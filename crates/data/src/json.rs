//! Textual wire format.
//!
//! `Node`, `DataObject` and `DataArray` implement serde's `Serialize` and
//! `Deserialize`, so any serde format works; JSON through `serde_json` is the
//! one the containers expose directly. Integral literals become
//! [`Node::Int`] (or [`Node::UInt`] above `i64::MAX`), anything with a
//! fraction or exponent becomes [`Node::Float`].
//!
//! `serde_json` refuses documents nested deeper than 128 levels on its own,
//! whatever [`DataLimits::max_nesting_depth`] says.

use std::fmt;
use std::io::Read;

use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use tracing::{debug, trace};

use crate::array::DataArray;
use crate::error::{DataError, DataResult};
use crate::limits::DataLimits;
use crate::node::Node;
use crate::object::DataObject;

// ==================== Serialize ====================

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::UInt(u) => serializer.serialize_u64(*u),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::String(s) => serializer.serialize_str(s),
            Self::Array(arr) => arr.serialize(serializer),
            Self::Object(obj) => obj.serialize(serializer),
        }
    }
}

impl Serialize for DataObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entries = self.entries();
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in &entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl Serialize for DataArray {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let nodes = self.nodes();
        let mut seq = serializer.serialize_seq(Some(nodes.len()))?;
        for node in &nodes {
            seq.serialize_element(node)?;
        }
        seq.end()
    }
}

/// Serializes objects with their keys in lexicographic order.
pub(crate) struct Sorted<'a>(pub &'a Node);

impl Serialize for Sorted<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Node::Object(obj) => {
                let mut entries = obj.entries();
                entries.sort_by(|a, b| a.0.cmp(&b.0));
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in &entries {
                    map.serialize_entry(key, &Sorted(value))?;
                }
                map.end()
            }
            Node::Array(arr) => {
                let nodes = arr.nodes();
                let mut seq = serializer.serialize_seq(Some(nodes.len()))?;
                for node in &nodes {
                    seq.serialize_element(&Sorted(node))?;
                }
                seq.end()
            }
            other => other.serialize(serializer),
        }
    }
}

pub(crate) fn to_pretty_string(node: &Node) -> DataResult<String> {
    Ok(serde_json::to_string_pretty(&Sorted(node))?)
}

// ==================== Deserialize ====================

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = Node;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Node, E> {
        Ok(Node::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Node, E> {
        Ok(Node::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Node, D::Error> {
        Node::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Node, E> {
        Ok(Node::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Node, E> {
        Ok(Node::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Node, E> {
        Ok(Node::unsigned(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Node, E> {
        Ok(Node::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Node, E> {
        Ok(Node::String(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Node, E> {
        Ok(Node::String(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Node, A::Error> {
        let mut nodes = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(4096));
        while let Some(node) = seq.next_element::<Node>()? {
            nodes.push(node);
        }
        Ok(Node::Array(DataArray::from_vec(nodes)))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Node, A::Error> {
        let mut map = IndexMap::with_capacity(access.size_hint().unwrap_or(0).min(4096));
        while let Some((key, value)) = access.next_entry::<String, Node>()? {
            map.insert(key, value);
        }
        Ok(Node::Object(DataObject::from_map(map)))
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NodeVisitor)
    }
}

impl<'de> Deserialize<'de> for DataObject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Node::deserialize(deserializer)? {
            Node::Object(obj) => Ok(obj),
            other => Err(de::Error::custom(format!(
                "expected object root, found {}",
                other.kind()
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for DataArray {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Node::deserialize(deserializer)? {
            Node::Array(arr) => Ok(arr),
            other => Err(de::Error::custom(format!(
                "expected array root, found {}",
                other.kind()
            ))),
        }
    }
}

// ==================== Entry points ====================

pub(crate) fn parse_slice(payload: &[u8], limits: &DataLimits) -> DataResult<Node> {
    trace!(bytes = payload.len(), "parsing json payload");
    let result = limits
        .check_payload_bytes(payload.len())
        .and_then(|()| Ok(serde_json::from_slice::<Node>(payload)?))
        .and_then(|node| {
            limits.check_nesting_depth(node.depth())?;
            Ok(node)
        });
    if let Err(ref err) = result {
        debug!(code = err.code(), error = %err, "json payload rejected");
    }
    result
}

/// Reads the source to completion, then parses it.
pub(crate) fn parse_reader(reader: impl Read, limits: &DataLimits) -> DataResult<Node> {
    let cap = u64::try_from(limits.max_payload_bytes)
        .unwrap_or(u64::MAX)
        .saturating_add(1);
    let mut payload = Vec::new();
    if let Err(err) = reader.take(cap).read_to_end(&mut payload) {
        let err = DataError::from(err);
        debug!(code = err.code(), error = %err, "json source failed");
        return Err(err);
    }
    parse_slice(&payload, limits)
}

pub(crate) fn expect_object(node: Node) -> DataResult<DataObject> {
    match node {
        Node::Object(obj) => Ok(obj),
        other => Err(DataError::Json(format!(
            "expected object root, found {}",
            other.kind()
        ))),
    }
}

pub(crate) fn expect_array(node: Node) -> DataResult<DataArray> {
    match node {
        Node::Array(arr) => Ok(arr),
        other => Err(DataError::Json(format!(
            "expected array root, found {}",
            other.kind()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_integer_literals() {
        let node = parse_slice(b"[1, -1, 9223372036854775808, 1.0, 1e3]", &DataLimits::default())
            .unwrap();
        let arr = node.as_array().unwrap();
        assert_eq!(arr.get(0).unwrap(), Node::Int(1));
        assert_eq!(arr.get(1).unwrap(), Node::Int(-1));
        assert!(matches!(arr.get(2).unwrap(), Node::UInt(9_223_372_036_854_775_808)));
        assert_eq!(arr.get(3).unwrap(), Node::Float(1.0));
        assert_eq!(arr.get(4).unwrap(), Node::Float(1000.0));
    }

    #[test]
    fn test_compact_preserves_insertion_order() {
        let node = parse_slice(br#"{"b":1,"a":[true,null]}"#, &DataLimits::default()).unwrap();
        assert_eq!(node.to_string(), r#"{"b":1,"a":[true,null]}"#);
    }

    #[test]
    fn test_pretty_sorts_keys() {
        let node = parse_slice(br#"{"b":{"y":1,"x":2},"a":0}"#, &DataLimits::default()).unwrap();
        let pretty = to_pretty_string(&node).unwrap();
        assert_eq!(
            pretty,
            "{\n  \"a\": 0,\n  \"b\": {\n    \"x\": 2,\n    \"y\": 1\n  }\n}"
        );
    }

    #[test]
    fn test_payload_limit() {
        let limits = DataLimits {
            max_payload_bytes: 4,
            ..DataLimits::default()
        };
        let err = parse_slice(b"[1,2,3]", &limits).unwrap_err();
        assert!(matches!(err, DataError::LimitExceeded { limit: "payload bytes", .. }));
    }

    #[test]
    fn test_nesting_limit() {
        let limits = DataLimits {
            max_nesting_depth: 2,
            ..DataLimits::default()
        };
        assert!(parse_slice(b"[[1]]", &limits).is_ok());
        assert!(parse_slice(b"[[[1]]]", &limits).is_err());
    }

    #[test]
    fn test_reader_over_limit() {
        let limits = DataLimits {
            max_payload_bytes: 3,
            ..DataLimits::default()
        };
        let err = parse_reader(&b"[1, 2]"[..], &limits).unwrap_err();
        assert!(matches!(err, DataError::LimitExceeded { .. }));
    }

    #[test]
    fn test_malformed() {
        let err = parse_slice(b"{\"a\":", &DataLimits::default()).unwrap_err();
        assert!(matches!(err, DataError::Json(_)));
    }

    #[test]
    fn test_root_kind() {
        assert!(expect_object(Node::Int(1)).is_err());
        let err = serde_json::from_str::<DataArray>("{}").unwrap_err();
        assert!(err.to_string().contains("expected array root"));
    }
}
