//! Runtime kind classification.
//!
//! Every [`Node`] belongs to exactly one [`NodeKind`]. `Unknown` is never
//! produced by [`NodeKind::classify`]; it exists so callers can name a kind
//! that matches nothing.
//!
//! ```rust
//! use courier_data::{Node, NodeKind};
//!
//! assert_eq!(NodeKind::classify(&Node::from(3)), NodeKind::Integer);
//! assert!(NodeKind::Integer.matches(&Node::from(u64::MAX)));
//! assert!(!NodeKind::Unknown.matches(&Node::Null));
//! ```

use core::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::node::Node;

/// Kind of a [`Node`]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Integer,
    Float,
    String,
    Boolean,
    Array,
    Object,
    Null,
    Unknown,
}

impl NodeKind {
    /// The kind of a node. Any integral width classifies as `Integer`.
    pub const fn classify(node: &Node) -> Self {
        match node {
            Node::Null => Self::Null,
            Node::Bool(_) => Self::Boolean,
            Node::Int(_) | Node::UInt(_) => Self::Integer,
            Node::Float(_) => Self::Float,
            Node::String(_) => Self::String,
            Node::Array(_) => Self::Array,
            Node::Object(_) => Self::Object,
        }
    }

    /// Whether `node` belongs to this kind. `Unknown` matches nothing.
    pub const fn matches(self, node: &Node) -> bool {
        !matches!(self, Self::Unknown) && (self as u8) == (Self::classify(node) as u8)
    }

    /// `kind.matches(node)` with the arguments in lookup order
    #[inline]
    pub const fn is_type(node: &Node, kind: Self) -> bool {
        kind.matches(node)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
            Self::Null => "null",
            Self::Unknown => "unknown",
        }
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
