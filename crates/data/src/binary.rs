//! Binary wire format boundary.
//!
//! Containers never touch term bytes themselves: they hand a [`Node`] to a
//! [`BinaryCodec`] and get one back. [`EtfCodec`] is the codec used by the
//! gateway transport; it maps nodes onto [`courier_etf::Term`]:
//!
//! | Node | Term |
//! |---|---|
//! | `Null` | `nil` atom |
//! | `Bool` | `true` / `false` atoms |
//! | `Int`, `UInt` | integer (small, 32-bit or big) |
//! | `Float` | `NEW_FLOAT_EXT` |
//! | `String` | binary |
//! | `Array` | list |
//! | `Object` | map with binary keys |
//!
//! Decoding also accepts atoms as strings and atom map keys. Integers that
//! fit neither `i64` nor `u64` are rejected.

use courier_etf::{Decoder, Term};
use tracing::{debug, trace};

use crate::array::DataArray;
use crate::error::{DataError, DataResult};
use crate::limits::DataLimits;
use crate::node::Node;
use crate::object::DataObject;

/// Pack/unpack boundary for a binary wire format.
pub trait BinaryCodec {
    fn encode(&self, node: &Node) -> DataResult<Vec<u8>>;

    /// Decode a complete payload. Failures are [`DataError::Binary`].
    fn decode(&self, payload: &[u8]) -> DataResult<Node>;
}

/// External term format codec
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EtfCodec {
    limits: DataLimits,
}

impl EtfCodec {
    pub const fn new(limits: DataLimits) -> Self {
        Self { limits }
    }

    pub const fn limits(&self) -> &DataLimits {
        &self.limits
    }

    fn decode_inner(&self, payload: &[u8]) -> DataResult<Node> {
        self.limits.check_payload_bytes(payload.len())?;
        let term = Decoder::new()
            .with_max_depth(self.limits.max_nesting_depth)
            .decode(payload)?;
        from_term(term)
    }
}

impl BinaryCodec for EtfCodec {
    fn encode(&self, node: &Node) -> DataResult<Vec<u8>> {
        Ok(courier_etf::encode(&to_term(node)).to_vec())
    }

    fn decode(&self, payload: &[u8]) -> DataResult<Node> {
        trace!(bytes = payload.len(), "decoding binary payload");
        let result = self.decode_inner(payload);
        if let Err(ref err) = result {
            debug!(code = err.code(), error = %err, "binary payload rejected");
        }
        result
    }
}

fn to_term(node: &Node) -> Term {
    match node {
        Node::Null => Term::Nil,
        Node::Bool(b) => Term::Bool(*b),
        Node::Int(i) => Term::Integer(i128::from(*i)),
        Node::UInt(u) => Term::Integer(i128::from(*u)),
        Node::Float(f) => Term::Float(*f),
        Node::String(s) => Term::binary(s.as_str()),
        Node::Array(arr) => Term::List(arr.nodes().iter().map(to_term).collect()),
        Node::Object(obj) => Term::Map(
            obj.entries()
                .iter()
                .map(|(key, value)| (Term::binary(key.as_str()), to_term(value)))
                .collect(),
        ),
    }
}

fn from_term(term: Term) -> DataResult<Node> {
    Ok(match term {
        Term::Nil => Node::Null,
        Term::Bool(b) => Node::Bool(b),
        Term::Integer(i) => integer(i)?,
        Term::Float(f) => Node::Float(f),
        Term::Binary(bytes) => Node::String(
            String::from_utf8(bytes)
                .map_err(|_| DataError::Binary("binary is not valid UTF-8 text".into()))?,
        ),
        Term::Atom(name) => Node::String(name),
        Term::List(items) => Node::Array(DataArray::from_vec(
            items.into_iter().map(from_term).collect::<DataResult<_>>()?,
        )),
        Term::Map(entries) => {
            let map = entries
                .into_iter()
                .map(|(key, value)| Ok((map_key(&key)?, from_term(value)?)))
                .collect::<DataResult<_>>()?;
            Node::Object(DataObject::from_map(map))
        }
    })
}

fn integer(value: i128) -> DataResult<Node> {
    if let Ok(signed) = i64::try_from(value) {
        Ok(Node::Int(signed))
    } else if let Ok(unsigned) = u64::try_from(value) {
        Ok(Node::UInt(unsigned))
    } else {
        Err(DataError::Binary(format!(
            "integer {value} does not fit in 64 bits"
        )))
    }
}

fn map_key(key: &Term) -> DataResult<String> {
    key.as_text().map(str::to_owned).ok_or_else(|| {
        DataError::Binary(format!(
            "map key must be text, found {}",
            key.type_name()
        ))
    })
}
