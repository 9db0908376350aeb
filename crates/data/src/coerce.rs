//! Typed extraction from nodes.
//!
//! Every typed getter on [`DataObject`], [`DataArray`] and
//! [`DataPath`](crate::DataPath) resolves through the same four steps:
//!
//! 1. the stored node already has the target's kind: return it;
//! 2. the node is a string and the target is not: parse the text, and fail
//!    with [`DataError::InvalidText`] if it does not parse;
//! 3. the node is numeric and the target is numeric: narrow or widen it
//!    (integers wrap, floats truncate toward zero and saturate);
//! 4. otherwise fail with [`DataError::TypeMismatch`].
//!
//! Absence and null are handled before any of that by [`required`],
//! [`fallback`] and [`optional`].

use crate::array::DataArray;
use crate::error::{DataError, DataResult, Location};
use crate::node::Node;
use crate::object::DataObject;

/// Numeric view of a node for step 3.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    UInt(u64),
    Float(f64),
}

impl Number {
    pub const fn of(node: &Node) -> Option<Self> {
        match node {
            Node::Int(i) => Some(Self::Int(*i)),
            Node::UInt(u) => Some(Self::UInt(*u)),
            Node::Float(f) => Some(Self::Float(*f)),
            _ => None,
        }
    }
}

/// A type that typed getters can produce.
///
/// Implementors only describe the individual conversion steps; the ordering
/// lives in [`coerce`].
pub trait FromNode: Sized {
    /// Target name used in error messages
    const TARGET: &'static str;

    /// Step 1: the node already has the right kind.
    fn from_exact(node: &Node) -> Option<Self>;

    /// Step 2: parse a string node. `None` is a parse failure.
    fn from_text(_text: &str) -> Option<Self> {
        None
    }

    /// Step 3: numeric narrowing. `None` means the target is not numeric.
    fn from_number(_number: Number) -> Option<Self> {
        None
    }
}

/// Run the conversion steps on a present, non-null node.
pub fn coerce<T: FromNode>(node: &Node, location: impl FnOnce() -> Location) -> DataResult<T> {
    if let Some(value) = T::from_exact(node) {
        return Ok(value);
    }
    if let Node::String(text) = node {
        return T::from_text(text)
            .ok_or_else(|| DataError::invalid_text(location(), T::TARGET, text.as_str()));
    }
    if let Some(value) = Number::of(node).and_then(T::from_number) {
        return Ok(value);
    }
    Err(DataError::type_mismatch(
        location(),
        T::TARGET,
        node.kind(),
        node.to_string(),
    ))
}

/// Absent or null is an error.
pub(crate) fn required<T: FromNode>(
    slot: Option<&Node>,
    location: impl FnOnce() -> Location,
) -> DataResult<T> {
    match slot {
        None => Err(DataError::missing(location())),
        Some(Node::Null) => Err(DataError::null(location())),
        Some(node) => coerce(node, location),
    }
}

/// Absent or null yields `fallback`; an incompatible value is still an error.
pub(crate) fn fallback<T: FromNode>(
    slot: Option<&Node>,
    fallback: T,
    location: impl FnOnce() -> Location,
) -> DataResult<T> {
    match slot {
        None | Some(Node::Null) => Ok(fallback),
        Some(node) => coerce(node, location),
    }
}

/// Absent or null yields `None`.
pub(crate) fn optional<T: FromNode>(
    slot: Option<&Node>,
    location: impl FnOnce() -> Location,
) -> DataResult<Option<T>> {
    match slot {
        None | Some(Node::Null) => Ok(None),
        Some(node) => coerce(node, location).map(Some),
    }
}

/// Typed getter families built on a container's `get_as` / `get_as_or` /
/// `opt_as`. `$at: $loc` is the lookup parameter (key, index or root).
macro_rules! typed_getters {
    ($at:ident: $loc:ty) => {
        /// Any value as text: strings as-is, other kinds in their literal or
        /// compact JSON form.
        pub fn get_string(&self, $at: $loc) -> DataResult<String> {
            self.get_as($at)
        }

        pub fn get_string_or(&self, $at: $loc, fallback: impl Into<String>) -> DataResult<String> {
            self.get_as_or($at, fallback.into())
        }

        pub fn opt_string(&self, $at: $loc) -> DataResult<Option<String>> {
            self.opt_as($at)
        }

        typed_getters! {
            @each $at: $loc;
            /// Boolean; text parses case-insensitively as `true` or `false`.
            get_boolean, get_boolean_or, opt_boolean => bool;
            /// 32-bit signed integer. Wider numbers wrap, floats truncate.
            get_int, get_int_or, opt_int => i32;
            /// 32-bit unsigned integer. Wider numbers wrap, floats truncate.
            get_unsigned_int, get_unsigned_int_or, opt_unsigned_int => u32;
            /// 64-bit signed integer. Text outside the signed range is an error.
            get_long, get_long_or, opt_long => i64;
            /// 64-bit unsigned integer; text may use the full unsigned range.
            get_unsigned_long, get_unsigned_long_or, opt_unsigned_long => u64;
            /// Double precision float.
            get_double, get_double_or, opt_double => f64;
            /// ISO-8601 / RFC 3339 timestamp with an offset, parsed from text.
            #[cfg(feature = "temporal")]
            get_offset_date_time, get_offset_date_time_or, opt_offset_date_time
                => chrono::DateTime<chrono::FixedOffset>;
            /// Nested object. The result shares storage with its parent.
            get_object, get_object_or, opt_object => $crate::DataObject;
            /// Nested array. The result shares storage with its parent.
            get_array, get_array_or, opt_array => $crate::DataArray;
        }
    };
    (@each $at:ident: $loc:ty; $( $(#[$meta:meta])* $get:ident, $get_or:ident, $opt:ident => $ty:ty; )*) => {
        $(
            $(#[$meta])*
            pub fn $get(&self, $at: $loc) -> DataResult<$ty> {
                self.get_as($at)
            }

            $(#[$meta])*
            pub fn $get_or(&self, $at: $loc, fallback: $ty) -> DataResult<$ty> {
                self.get_as_or($at, fallback)
            }

            $(#[$meta])*
            pub fn $opt(&self, $at: $loc) -> DataResult<Option<$ty>> {
                self.opt_as($at)
            }
        )*
    };
}

// ==================== Targets ====================

impl FromNode for Node {
    const TARGET: &'static str = "value";

    fn from_exact(node: &Node) -> Option<Self> {
        Some(node.clone())
    }
}

impl FromNode for DataObject {
    const TARGET: &'static str = "object";

    fn from_exact(node: &Node) -> Option<Self> {
        node.as_object().cloned()
    }
}

impl FromNode for DataArray {
    const TARGET: &'static str = "array";

    fn from_exact(node: &Node) -> Option<Self> {
        node.as_array().cloned()
    }
}

/// Any non-null node has a text form.
impl FromNode for String {
    const TARGET: &'static str = "string";

    fn from_exact(node: &Node) -> Option<Self> {
        Some(node.natural_text())
    }

    fn from_text(text: &str) -> Option<Self> {
        Some(text.to_owned())
    }
}

impl FromNode for bool {
    const TARGET: &'static str = "boolean";

    fn from_exact(node: &Node) -> Option<Self> {
        match node {
            Node::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn from_text(text: &str) -> Option<Self> {
        if text.eq_ignore_ascii_case("true") {
            Some(true)
        } else if text.eq_ignore_ascii_case("false") {
            Some(false)
        } else {
            None
        }
    }
}

macro_rules! numeric_target {
    (
        $ty:ty, $name:literal, $exact:pat => $value:expr,
        Int($i:ident) => $from_int:expr,
        UInt($u:ident) => $from_uint:expr,
        Float($f:ident) => $from_float:expr $(,)?
    ) => {
        impl FromNode for $ty {
            const TARGET: &'static str = $name;

            fn from_exact(node: &Node) -> Option<Self> {
                match node {
                    $exact => Some($value),
                    _ => None,
                }
            }

            fn from_text(text: &str) -> Option<Self> {
                text.parse().ok()
            }

            fn from_number(number: Number) -> Option<Self> {
                Some(match number {
                    Number::Int($i) => $from_int,
                    Number::UInt($u) => $from_uint,
                    Number::Float($f) => $from_float,
                })
            }
        }
    };
}

numeric_target!(i32, "int", Node::Int(n) => *n as i32,
    Int(i) => i as i32,
    UInt(u) => u as i32,
    Float(f) => f as i32,
);
numeric_target!(u32, "unsigned int", Node::Int(n) => *n as u32,
    Int(i) => i as u32,
    UInt(u) => u as u32,
    Float(f) => f as u32,
);
numeric_target!(i64, "long", Node::Int(n) => *n,
    Int(i) => i,
    UInt(u) => u as i64,
    Float(f) => f as i64,
);
numeric_target!(u64, "unsigned long", Node::UInt(n) => *n,
    Int(i) => i as u64,
    UInt(u) => u,
    Float(f) => f as u64,
);
numeric_target!(f64, "double", Node::Float(n) => *n,
    Int(i) => i as f64,
    UInt(u) => u as f64,
    Float(f) => f,
);

#[cfg(feature = "temporal")]
impl FromNode for chrono::DateTime<chrono::FixedOffset> {
    const TARGET: &'static str = "offset date-time";

    fn from_exact(_node: &Node) -> Option<Self> {
        None
    }

    fn from_text(text: &str) -> Option<Self> {
        iso::parse_offset_date_time(text)
    }
}

/// Strict ISO-8601 offset date-times: `2021-03-04T05:06[:07[.123]]` followed
/// by `Z`, `+02:00` or `+02:00:30`. No lowercase designators, no space
/// separator, no single-digit fields.
#[cfg(feature = "temporal")]
mod iso {
    use chrono::{DateTime, FixedOffset, NaiveDateTime};

    const WITH_SECONDS: &str = "%Y-%m-%dT%H:%M:%S%.f";
    const WITHOUT_SECONDS: &str = "%Y-%m-%dT%H:%M";
    const LOCAL_SHAPE: &[u8; 16] = b"dddd-dd-ddTdd:dd";

    pub(super) fn parse_offset_date_time(text: &str) -> Option<DateTime<FixedOffset>> {
        let (local, offset) = split_offset(text)?;
        if !is_local_shape(local.as_bytes()) {
            return None;
        }
        let format = if local.len() == LOCAL_SHAPE.len() {
            WITHOUT_SECONDS
        } else {
            WITH_SECONDS
        };
        NaiveDateTime::parse_from_str(local, format)
            .ok()?
            .and_local_timezone(offset)
            .single()
    }

    fn split_offset(text: &str) -> Option<(&str, FixedOffset)> {
        if let Some(local) = text.strip_suffix('Z') {
            return Some((local, FixedOffset::east_opt(0)?));
        }
        // the date part has its own '-' separators before index 10
        let at = text.rfind(['+', '-']).filter(|&at| at > 10)?;
        let (local, offset) = text.split_at(at);
        let sign = if offset.starts_with('-') { -1 } else { 1 };
        let seconds = match offset.as_bytes()[1..] {
            [h1, h2, b':', m1, m2] => hours(h1, h2)? + minutes(m1, m2)?,
            [h1, h2, b':', m1, m2, b':', s1, s2] => {
                hours(h1, h2)? + minutes(m1, m2)? + sixty(s1, s2)?
            }
            _ => return None,
        };
        Some((local, FixedOffset::east_opt(sign * seconds)?))
    }

    fn is_local_shape(local: &[u8]) -> bool {
        if local.len() < LOCAL_SHAPE.len() {
            return false;
        }
        let (head, tail) = local.split_at(LOCAL_SHAPE.len());
        let head_ok = head
            .iter()
            .zip(LOCAL_SHAPE)
            .all(|(&byte, &shape)| match shape {
                b'd' => byte.is_ascii_digit(),
                literal => byte == literal,
            });
        head_ok
            && match tail {
                [] => true,
                [b':', s1, s2, fraction @ ..] => {
                    s1.is_ascii_digit()
                        && s2.is_ascii_digit()
                        && match fraction {
                            [] => true,
                            [b'.', digits @ ..] => {
                                (1..=9).contains(&digits.len())
                                    && digits.iter().all(u8::is_ascii_digit)
                            }
                            _ => false,
                        }
                }
                _ => false,
            }
    }

    fn two_digits(high: u8, low: u8) -> Option<i32> {
        (high.is_ascii_digit() && low.is_ascii_digit())
            .then(|| i32::from(high - b'0') * 10 + i32::from(low - b'0'))
    }

    fn hours(high: u8, low: u8) -> Option<i32> {
        two_digits(high, low).filter(|h| *h <= 18).map(|h| h * 3600)
    }

    fn minutes(high: u8, low: u8) -> Option<i32> {
        sixty(high, low).map(|m| m * 60)
    }

    fn sixty(high: u8, low: u8) -> Option<i32> {
        two_digits(high, low).filter(|v| *v < 60)
    }
}
