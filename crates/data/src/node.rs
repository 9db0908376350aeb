//! The dynamic value model
//!
//! A [`Node`] is a closed sum type over everything the remote service can
//! send: null, booleans, integers, floats, strings, arrays and objects.
//!
//! ## Aliasing
//!
//! `Node::Array` and `Node::Object` hold a [`DataArray`] / [`DataObject`],
//! which are reference-counted handles to shared backing storage. Cloning a
//! node, or reading a nested container out of a parent, yields another handle
//! to the same storage: mutating it mutates the parent. Use
//! [`Node::deep_copy`] when an independent tree is needed.
//!
//! The handles are `!Send` and `!Sync`; a tree belongs to one thread.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::array::DataArray;
use crate::kind::NodeKind;
use crate::object::DataObject;

/// One value in the dynamic data model.
#[derive(Clone, Default)]
pub enum Node {
    #[default]
    Null,
    Bool(bool),
    /// Signed integer; every value up to `i64::MAX` is stored here
    Int(i64),
    /// Unsigned integer above `i64::MAX`
    UInt(u64),
    Float(f64),
    String(String),
    Array(DataArray),
    Object(DataObject),
}

impl Node {
    /// Normalising constructor for unsigned integers: values that fit the
    /// signed range become [`Node::Int`].
    pub fn unsigned(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(signed) => Self::Int(signed),
            Err(_) => Self::UInt(value),
        }
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        NodeKind::classify(self)
    }

    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&DataObject> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&DataArray> {
        match self {
            Self::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Copy this node and every container below it into fresh storage.
    #[must_use]
    pub fn deep_copy(&self) -> Self {
        match self {
            Self::Array(arr) => Self::Array(arr.deep_copy()),
            Self::Object(obj) => Self::Object(obj.deep_copy()),
            other => other.clone(),
        }
    }

    /// The value as plain text: strings unquoted, numbers and booleans in
    /// their literal form, containers as compact JSON.
    pub fn natural_text(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Null => "null".to_owned(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::UInt(u) => u.to_string(),
            Self::Float(f) => format_float(*f),
            Self::Array(_) | Self::Object(_) => self.to_string(),
        }
    }

    /// True if `storage` is reachable from this node.
    pub(crate) fn reaches(&self, storage: *const ()) -> bool {
        match self {
            Self::Array(arr) => {
                arr.storage_ptr() == storage || arr.nodes().iter().any(|n| n.reaches(storage))
            }
            Self::Object(obj) => {
                obj.storage_ptr() == storage || obj.values().iter().any(|n| n.reaches(storage))
            }
            _ => false,
        }
    }

    /// Deepest container nesting below and including this node.
    pub(crate) fn depth(&self) -> usize {
        match self {
            Self::Array(arr) => 1 + arr.nodes().iter().map(Self::depth).max().unwrap_or(0),
            Self::Object(obj) => 1 + obj.values().iter().map(Self::depth).max().unwrap_or(0),
            _ => 0,
        }
    }
}

pub(crate) fn format_float(value: f64) -> String {
    // serde_json formats through ryu and keeps the ".0" on integral floats
    match serde_json::Number::from_f64(value) {
        Some(number) => number.to_string(),
        None => value.to_string(),
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::UInt(a), Self::UInt(b)) => a == b,
            (Self::Int(a), Self::UInt(b)) | (Self::UInt(b), Self::Int(a)) => {
                i128::from(*a) == i128::from(*b)
            }
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(&self.kind()).hash(state);
        match self {
            Self::Null => {}
            Self::Bool(b) => b.hash(state),
            Self::Int(i) => i128::from(*i).hash(state),
            Self::UInt(u) => i128::from(*u).hash(state),
            // 0.0 == -0.0, so both must hash alike
            Self::Float(f) if *f == 0.0 => 0u64.hash(state),
            Self::Float(f) => f.to_bits().hash(state),
            Self::String(s) => s.hash(state),
            Self::Array(arr) => arr.hash(state),
            Self::Object(obj) => obj.hash(state),
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Int(i) => write!(f, "Int({i})"),
            Self::UInt(u) => write!(f, "UInt({u})"),
            Self::Float(v) => write!(f, "Float({v:?})"),
            Self::String(s) => write!(f, "String({s:?})"),
            Self::Array(arr) => fmt::Debug::fmt(arr, f),
            Self::Object(obj) => fmt::Debug::fmt(obj, f),
        }
    }
}

/// Compact JSON.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

// ==================== Insertion capabilities ====================

/// What an inserted value turns into, resolved once at insertion time.
///
/// A type that serializes itself to an object or an array reports that
/// capability; the container then stores the underlying node rather than the
/// wrapper. Because a type picks exactly one variant, a value can never be
/// both object-capable and array-capable.
#[derive(Debug, Clone)]
pub enum Capability {
    Object(DataObject),
    Array(DataArray),
    Raw(Node),
}

impl Capability {
    #[must_use]
    pub fn into_node(self) -> Node {
        match self {
            Self::Object(obj) => Node::Object(obj),
            Self::Array(arr) => Node::Array(arr),
            Self::Raw(node) => node,
        }
    }
}

/// Anything that can be stored in a container.
///
/// Implement this for domain types that render themselves as data:
///
/// ```
/// use courier_data::{Capability, DataObject, IntoNode};
///
/// struct Embed {
///     title: String,
/// }
///
/// impl IntoNode for &Embed {
///     fn into_capability(self) -> Capability {
///         let data = DataObject::empty();
///         data.put("title", self.title.as_str()).unwrap();
///         Capability::Object(data)
///     }
/// }
///
/// let message = DataObject::empty();
/// message.put("embed", &Embed { title: "hi".into() }).unwrap();
/// assert_eq!(message.get_object("embed").unwrap().get_string("title").unwrap(), "hi");
/// ```
pub trait IntoNode {
    fn into_capability(self) -> Capability;

    fn into_node(self) -> Node
    where
        Self: Sized,
    {
        self.into_capability().into_node()
    }
}

impl IntoNode for Node {
    fn into_capability(self) -> Capability {
        match self {
            Node::Object(obj) => Capability::Object(obj),
            Node::Array(arr) => Capability::Array(arr),
            raw => Capability::Raw(raw),
        }
    }
}

impl IntoNode for &Node {
    fn into_capability(self) -> Capability {
        self.clone().into_capability()
    }
}

impl IntoNode for DataObject {
    fn into_capability(self) -> Capability {
        Capability::Object(self)
    }
}

impl IntoNode for &DataObject {
    fn into_capability(self) -> Capability {
        Capability::Object(self.clone())
    }
}

impl IntoNode for DataArray {
    fn into_capability(self) -> Capability {
        Capability::Array(self)
    }
}

impl IntoNode for &DataArray {
    fn into_capability(self) -> Capability {
        Capability::Array(self.clone())
    }
}

impl<T: IntoNode> IntoNode for Option<T> {
    fn into_capability(self) -> Capability {
        match self {
            Some(value) => value.into_capability(),
            None => Capability::Raw(Node::Null),
        }
    }
}

impl<T: IntoNode> IntoNode for Vec<T> {
    fn into_capability(self) -> Capability {
        Capability::Array(self.into_iter().collect())
    }
}

macro_rules! raw_into_node {
    ($($ty:ty => |$v:ident| $make:expr),* $(,)?) => {
        $(
            impl IntoNode for $ty {
                fn into_capability(self) -> Capability {
                    let $v = self;
                    Capability::Raw($make)
                }
            }

            impl From<$ty> for Node {
                fn from($v: $ty) -> Self {
                    $make
                }
            }
        )*
    };
}

raw_into_node! {
    bool => |v| Node::Bool(v),
    i8 => |v| Node::Int(i64::from(v)),
    i16 => |v| Node::Int(i64::from(v)),
    i32 => |v| Node::Int(i64::from(v)),
    i64 => |v| Node::Int(v),
    u8 => |v| Node::Int(i64::from(v)),
    u16 => |v| Node::Int(i64::from(v)),
    u32 => |v| Node::Int(i64::from(v)),
    u64 => |v| Node::unsigned(v),
    f32 => |v| Node::Float(f64::from(v)),
    f64 => |v| Node::Float(v),
    String => |v| Node::String(v),
    &str => |v| Node::String(v.to_owned()),
    &String => |v| Node::String(v.clone()),
    char => |v| Node::String(v.to_string()),
}

#[cfg(feature = "temporal")]
impl<Tz> IntoNode for chrono::DateTime<Tz>
where
    Tz: chrono::TimeZone,
    Tz::Offset: fmt::Display,
{
    fn into_capability(self) -> Capability {
        Capability::Raw(Node::String(self.to_rfc3339()))
    }
}

impl From<DataObject> for Node {
    fn from(obj: DataObject) -> Self {
        Self::Object(obj)
    }
}

impl From<DataArray> for Node {
    fn from(arr: DataArray) -> Self {
        Self::Array(arr)
    }
}
