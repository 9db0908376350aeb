//! Path expressions
//!
//! A path addresses a nested value without a manual walk:
//!
//! ```text
//! name-step        ::= NAME ["?"]
//! index-step       ::= "[" INDEX "]" ["?"]
//! element          ::= name-step index-step*
//! path-from-object ::= element ("." element)*
//! path-from-array  ::= index-step+ ("." element)*
//! ```
//!
//! `NAME` is any run of characters other than `.`, `[` and `]`; `INDEX` is a
//! non-negative decimal integer. A trailing `?` marks the step optional: if
//! its key is absent or null (or its index out of range or null), resolution
//! stops and the typed accessor reports absence instead of failing.
//!
//! ```
//! use courier_data::{DataObject, path};
//!
//! let root = DataObject::from_json_str(r#"{"user": {"name": "Bob"}, "arr": [{"k": "x"}]}"#)?;
//! assert_eq!(path::get_string(&root, "user.name")?, "Bob");
//! assert_eq!(path::get_string_or(&root, "user.nickname?", "N/A")?, "N/A");
//! assert_eq!(path::get_string(&root, "arr[0].k")?, "x");
//! assert_eq!(path::get_string_or(&root, "arr[5]?.k", "none")?, "none");
//! # Ok::<(), courier_data::DataError>(())
//! ```
//!
//! Malformed paths fail with [`DataError::InvalidPath`] before any data is
//! read. Parse a [`DataPath`] once to resolve it repeatedly.

use std::fmt;
use std::iter::Peekable;
use std::str::{CharIndices, FromStr};

use tracing::{debug, trace};

use crate::array::DataArray;
use crate::coerce::FromNode;
use crate::error::{DataError, DataResult, Location};
use crate::limits::DataLimits;
use crate::node::Node;
use crate::object::DataObject;

/// What a single step addresses
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object key: `name`
    Key(String),
    /// Array position: `[index]`
    Index(usize),
}

/// One step of a path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathStep {
    pub segment: PathSegment,
    /// Marked with `?`
    pub optional: bool,
}

impl PathStep {
    fn location(&self) -> Location {
        match &self.segment {
            PathSegment::Key(key) => Location::Key(key.clone()),
            PathSegment::Index(index) => Location::Index(*index),
        }
    }
}

/// A parsed path expression
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataPath {
    steps: Vec<PathStep>,
}

/// A value a path can be resolved against.
pub trait PathRoot {
    /// The root as a node; only objects and arrays can be walked.
    fn root_node(&self) -> Node;
}

impl PathRoot for DataObject {
    fn root_node(&self) -> Node {
        Node::Object(self.clone())
    }
}

impl PathRoot for DataArray {
    fn root_node(&self) -> Node {
        Node::Array(self.clone())
    }
}

impl PathRoot for Node {
    fn root_node(&self) -> Node {
        self.clone()
    }
}

impl DataPath {
    /// Parse with the default step limit
    pub fn parse(path: &str) -> DataResult<Self> {
        Self::parse_with_limits(path, &DataLimits::default())
    }

    pub fn parse_with_limits(path: &str, limits: &DataLimits) -> DataResult<Self> {
        trace!(path, "parsing path");
        let result = Parser::new(path)
            .parse()
            .and_then(|steps| {
                limits.check_path_steps(steps.len())?;
                Ok(Self { steps })
            });
        if let Err(ref err) = result {
            debug!(code = err.code(), error = %err, "path rejected");
        }
        result
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Whether the path starts with a name step
    pub fn is_object_rooted(&self) -> bool {
        matches!(
            self.steps.first(),
            Some(PathStep {
                segment: PathSegment::Key(_),
                ..
            })
        )
    }

    // ==================== Resolution ====================

    /// Required read of the final value; an absent optional step is
    /// [`DataError::Missing`].
    pub fn get_as<T: FromNode>(&self, root: &impl PathRoot) -> DataResult<T> {
        self.in_context(|| match self.resolve(root)? {
            Target::Absent(location) => Err(DataError::missing(location)),
            Target::Key(obj, key) => obj.get_as(&key),
            Target::Index(arr, index) => arr.get_as(index),
        })
    }

    /// `fallback` when an optional step was absent or the final value is
    /// absent or null.
    pub fn get_as_or<T: FromNode>(&self, root: &impl PathRoot, fallback: T) -> DataResult<T> {
        self.in_context(|| match self.resolve(root)? {
            Target::Absent(_) => Ok(fallback),
            Target::Key(obj, key) => obj.get_as_or(&key, fallback),
            Target::Index(arr, index) => arr.get_as_or(index, fallback),
        })
    }

    /// `None` when an optional step was absent or the final value is absent
    /// or null.
    pub fn opt_as<T: FromNode>(&self, root: &impl PathRoot) -> DataResult<Option<T>> {
        self.in_context(|| match self.resolve(root)? {
            Target::Absent(_) => Ok(None),
            Target::Key(obj, key) => obj.opt_as(&key),
            Target::Index(arr, index) => arr.opt_as(index),
        })
    }

    typed_getters!(root: &impl PathRoot);

    fn in_context<T>(&self, resolve: impl FnOnce() -> DataResult<T>) -> DataResult<T> {
        resolve().map_err(|err| err.at_path(self))
    }

    /// Walk every step but the last, choosing object or array for each
    /// child by the kind of the step that follows it.
    fn resolve(&self, root: &impl PathRoot) -> DataResult<Target> {
        let Some((last, init)) = self.steps.split_last() else {
            return Err(DataError::contract("path has no steps"));
        };

        let mut current = match (root.root_node(), &self.steps[0].segment) {
            (Node::Object(obj), PathSegment::Key(_)) => Container::Object(obj),
            (Node::Array(arr), PathSegment::Index(_)) => Container::Array(arr),
            (Node::Object(_), PathSegment::Index(_)) => {
                return Err(DataError::contract(
                    "a path into an object must start with a name step",
                ));
            }
            (Node::Array(_), PathSegment::Key(_)) => {
                return Err(DataError::contract(
                    "a path into an array must start with an index step",
                ));
            }
            (other, _) => {
                return Err(DataError::contract(format!(
                    "a path cannot be resolved against a {} value",
                    other.kind()
                )));
            }
        };

        for (position, step) in init.iter().enumerate() {
            if step.optional && current.is_absent(&step.segment) {
                return Ok(Target::Absent(step.location()));
            }
            let wants_array = matches!(self.steps[position + 1].segment, PathSegment::Index(_));
            current = current.child(&step.segment, wants_array)?;
        }

        if last.optional && current.is_absent(&last.segment) {
            return Ok(Target::Absent(last.location()));
        }
        match (current, &last.segment) {
            (Container::Object(obj), PathSegment::Key(key)) => Ok(Target::Key(obj, key.clone())),
            (Container::Array(arr), PathSegment::Index(index)) => Ok(Target::Index(arr, *index)),
            (current, segment) => Err(current.mismatch(segment)),
        }
    }
}

/// Where the walk ended up
enum Target {
    Absent(Location),
    Key(DataObject, String),
    Index(DataArray, usize),
}

enum Container {
    Object(DataObject),
    Array(DataArray),
}

impl Container {
    fn is_absent(&self, segment: &PathSegment) -> bool {
        match (self, segment) {
            (Self::Object(obj), PathSegment::Key(key)) => obj.is_null(key),
            (Self::Array(arr), PathSegment::Index(index)) => arr.is_null(*index),
            _ => false,
        }
    }

    fn child(&self, segment: &PathSegment, wants_array: bool) -> DataResult<Self> {
        match (self, segment) {
            (Self::Object(obj), PathSegment::Key(key)) if wants_array => {
                obj.get_array(key).map(Self::Array)
            }
            (Self::Object(obj), PathSegment::Key(key)) => obj.get_object(key).map(Self::Object),
            (Self::Array(arr), PathSegment::Index(index)) if wants_array => {
                arr.get_array(*index).map(Self::Array)
            }
            (Self::Array(arr), PathSegment::Index(index)) => {
                arr.get_object(*index).map(Self::Object)
            }
            (current, segment) => Err(current.mismatch(segment)),
        }
    }

    fn mismatch(&self, segment: &PathSegment) -> DataError {
        let found = match self {
            Self::Object(_) => "object",
            Self::Array(_) => "array",
        };
        DataError::contract(format!("step {segment:?} cannot address an {found}"))
    }
}

// ==================== Parsing ====================

struct Parser<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
        }
    }

    fn error(&self, position: usize, reason: impl Into<String>) -> DataError {
        DataError::invalid_path(self.source, position, reason)
    }

    fn position(&mut self) -> usize {
        self.chars.peek().map_or(self.source.len(), |&(at, _)| at)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn parse(mut self) -> DataResult<Vec<PathStep>> {
        if self.source.is_empty() {
            return Err(self.error(0, "path is empty"));
        }
        let mut steps = Vec::new();
        if self.peek() == Some('[') {
            self.index_steps(&mut steps)?;
        } else {
            self.element(&mut steps)?;
        }
        loop {
            match self.chars.next() {
                None => return Ok(steps),
                Some((_, '.')) => self.element(&mut steps)?,
                Some((at, c)) => {
                    return Err(self.error(at, format!("expected '.' or end of path, found '{c}'")));
                }
            }
        }
    }

    fn element(&mut self, steps: &mut Vec<PathStep>) -> DataResult<()> {
        let start = self.position();
        let mut name = String::new();
        while let Some((at, c)) = self.chars.peek().copied() {
            match c {
                '.' | '[' => break,
                ']' => return Err(self.error(at, "unexpected ']'")),
                _ => {
                    name.push(c);
                    self.chars.next();
                }
            }
        }
        let optional = name.ends_with('?');
        if optional {
            name.pop();
        }
        if name.is_empty() {
            return Err(self.error(start, "expected a name"));
        }
        steps.push(PathStep {
            segment: PathSegment::Key(name),
            optional,
        });
        self.index_steps(steps)
    }

    fn index_steps(&mut self, steps: &mut Vec<PathStep>) -> DataResult<()> {
        while self.eat('[') {
            let start = self.position();
            let mut digits = String::new();
            while let Some(c) = self.peek().filter(char::is_ascii_digit) {
                digits.push(c);
                self.chars.next();
            }
            if digits.is_empty() {
                let at = self.position();
                return Err(self.error(at, "expected a non-negative index"));
            }
            match self.chars.next() {
                Some((_, ']')) => {}
                Some((at, c)) => return Err(self.error(at, format!("expected ']', found '{c}'"))),
                None => return Err(self.error(self.source.len(), "unterminated index step")),
            }
            let index = digits
                .parse()
                .map_err(|_| self.error(start, "index is too large"))?;
            let optional = self.eat('?');
            steps.push(PathStep {
                segment: PathSegment::Index(index),
                optional,
            });
        }
        Ok(())
    }
}

impl FromStr for DataPath {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Canonical form; parses back to an equal path.
impl fmt::Display for DataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, step) in self.steps.iter().enumerate() {
            match &step.segment {
                PathSegment::Key(key) if position == 0 => f.write_str(key)?,
                PathSegment::Key(key) => write!(f, ".{key}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
            if step.optional {
                f.write_str("?")?;
            }
        }
        Ok(())
    }
}

// ==================== One-shot functions ====================

/// Parse `path` and read it as `T` from `root`
pub fn get_as<T: FromNode>(root: &impl PathRoot, path: &str) -> DataResult<T> {
    DataPath::parse(path)?.get_as(root)
}

pub fn get_as_or<T: FromNode>(root: &impl PathRoot, path: &str, fallback: T) -> DataResult<T> {
    DataPath::parse(path)?.get_as_or(root, fallback)
}

pub fn opt_as<T: FromNode>(root: &impl PathRoot, path: &str) -> DataResult<Option<T>> {
    DataPath::parse(path)?.opt_as(root)
}

pub fn get_string(root: &impl PathRoot, path: &str) -> DataResult<String> {
    DataPath::parse(path)?.get_string(root)
}

pub fn get_string_or(
    root: &impl PathRoot,
    path: &str,
    fallback: impl Into<String>,
) -> DataResult<String> {
    DataPath::parse(path)?.get_string_or(root, fallback)
}

pub fn opt_string(root: &impl PathRoot, path: &str) -> DataResult<Option<String>> {
    DataPath::parse(path)?.opt_string(root)
}

macro_rules! path_functions {
    ($( $(#[$meta:meta])* $get:ident, $get_or:ident, $opt:ident => $ty:ty; )*) => {
        $(
            $(#[$meta])*
            pub fn $get(root: &impl PathRoot, path: &str) -> DataResult<$ty> {
                DataPath::parse(path)?.$get(root)
            }

            $(#[$meta])*
            pub fn $get_or(root: &impl PathRoot, path: &str, fallback: $ty) -> DataResult<$ty> {
                DataPath::parse(path)?.$get_or(root, fallback)
            }

            $(#[$meta])*
            pub fn $opt(root: &impl PathRoot, path: &str) -> DataResult<Option<$ty>> {
                DataPath::parse(path)?.$opt(root)
            }
        )*
    };
}

path_functions! {
    get_boolean, get_boolean_or, opt_boolean => bool;
    get_int, get_int_or, opt_int => i32;
    get_unsigned_int, get_unsigned_int_or, opt_unsigned_int => u32;
    get_long, get_long_or, opt_long => i64;
    get_unsigned_long, get_unsigned_long_or, opt_unsigned_long => u64;
    get_double, get_double_or, opt_double => f64;
    #[cfg(feature = "temporal")]
    get_offset_date_time, get_offset_date_time_or, opt_offset_date_time
        => chrono::DateTime<chrono::FixedOffset>;
    get_object, get_object_or, opt_object => DataObject;
    get_array, get_array_or, opt_array => DataArray;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn key(name: &str, optional: bool) -> PathStep {
        PathStep {
            segment: PathSegment::Key(name.to_owned()),
            optional,
        }
    }

    fn index(at: usize, optional: bool) -> PathStep {
        PathStep {
            segment: PathSegment::Index(at),
            optional,
        }
    }

    #[test]
    fn test_parse_steps() {
        let path = DataPath::parse("user.roles[0]?.name?").unwrap();
        assert_eq!(
            path.steps(),
            &[
                key("user", false),
                key("roles", false),
                index(0, true),
                key("name", true)
            ]
        );
        assert!(path.is_object_rooted());
    }

    #[test]
    fn test_parse_array_rooted() {
        let path = DataPath::parse("[1][2]?.k").unwrap();
        assert_eq!(path.steps(), &[index(1, false), index(2, true), key("k", false)]);
        assert!(!path.is_object_rooted());
    }

    #[test]
    fn test_names_may_contain_other_punctuation() {
        let path = DataPath::parse("a?b.c-d e").unwrap();
        assert_eq!(path.steps(), &[key("a?b", false), key("c-d e", false)]);
    }

    #[rstest]
    #[case("", 0)]
    #[case(".a", 0)]
    #[case("a.", 2)]
    #[case("a..b", 2)]
    #[case("a.[0]", 2)]
    #[case("a[", 2)]
    #[case("a[]", 2)]
    #[case("a[-1]", 2)]
    #[case("a[1", 3)]
    #[case("a[1x]", 3)]
    #[case("a]", 1)]
    #[case("a[0]b", 4)]
    #[case("?", 0)]
    #[case("a[99999999999999999999999]", 2)]
    fn test_parse_rejects(#[case] path: &str, #[case] position: usize) {
        let err = DataPath::parse(path).unwrap_err();
        assert!(err.is_contract_violation(), "{path}: {err}");
        match err {
            DataError::InvalidPath { position: at, .. } => assert_eq!(at, position, "{path}"),
            other => panic!("unexpected error for {path}: {other}"),
        }
    }

    #[test]
    fn test_step_limit() {
        let limits = DataLimits {
            max_path_steps: 2,
            ..DataLimits::default()
        };
        assert!(DataPath::parse_with_limits("a.b", &limits).is_ok());
        let err = DataPath::parse_with_limits("a.b[0]", &limits).unwrap_err();
        assert!(matches!(err, DataError::LimitExceeded { .. }));
    }

    #[test]
    fn test_display_is_canonical() {
        for text in ["a", "a.b", "a[0]?.b?", "[0][1]", "[3]?.x[2]"] {
            let path: DataPath = text.parse().unwrap();
            assert_eq!(path.to_string(), text);
            assert_eq!(path.to_string().parse::<DataPath>().unwrap(), path);
        }
    }

    fn root() -> DataObject {
        DataObject::from_json_str(
            r#"{"user": {"name": "Bob", "age": "42", "nick": null},
                "arr": [{"k": "x"}, [1, 2]],
                "count": 3}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_resolve_nested() {
        let root = root();
        assert_eq!(get_string(&root, "user.name").unwrap(), "Bob");
        assert_eq!(get_int(&root, "user.age").unwrap(), 42);
        assert_eq!(get_string(&root, "arr[0].k").unwrap(), "x");
        assert_eq!(get_long(&root, "arr[1][1]").unwrap(), 2);
        assert_eq!(get_array(&root, "arr[1]").unwrap().len(), 2);
    }

    #[test]
    fn test_optional_steps() {
        let root = root();
        assert_eq!(get_string_or(&root, "user.nickname?", "N/A").unwrap(), "N/A");
        assert_eq!(get_string_or(&root, "arr[5]?.k", "none").unwrap(), "none");
        assert_eq!(get_string_or(&root, "user.nick?.first", "-").unwrap(), "-");
        assert_eq!(opt_string(&root, "missing?.x").unwrap(), None);
        assert_eq!(opt_int(&root, "count").unwrap(), Some(3));
    }

    #[test]
    fn test_required_absent_optional_is_missing() {
        let err = get_string(&root(), "user.nickname?").unwrap_err();
        assert!(matches!(err.root_cause(), DataError::Missing { .. }));
        assert!(err.to_string().contains("user.nickname?"));
    }

    #[test]
    fn test_fallback_does_not_hide_type_errors() {
        let root = root();
        assert!(get_boolean_or(&root, "user.name", false).is_err());
        // intermediate steps without `?` are still required
        assert!(get_string_or(&root, "nobody.name", "x").is_err());
    }

    #[test]
    fn test_out_of_bounds_step() {
        let err = get_string(&root(), "arr[5].k").unwrap_err();
        assert!(err.is_out_of_bounds());
    }

    #[test]
    fn test_intermediate_kind_mismatch() {
        let err = get_string(&root(), "count.x").unwrap_err();
        assert!(matches!(
            err.root_cause(),
            DataError::TypeMismatch {
                expected: "object",
                ..
            }
        ));
    }

    #[test]
    fn test_root_kind_must_match_first_step() {
        let err = get_string(&root(), "[0]").unwrap_err();
        assert!(err.is_contract_violation());

        let arr = DataArray::from_json_str(r#"[{"a": 1}]"#).unwrap();
        assert_eq!(get_int(&arr, "[0].a").unwrap(), 1);
        assert!(get_int(&arr, "a").unwrap_err().is_contract_violation());
        assert!(get_int(&Node::Int(1), "a").unwrap_err().is_contract_violation());
    }

    #[test]
    fn test_malformed_path_before_access() {
        let err = get_string(&root(), "user..name").unwrap_err();
        assert!(matches!(err, DataError::InvalidPath { .. }));
    }

    #[test]
    fn test_reuse_parsed_path() {
        let path = DataPath::parse("user.name").unwrap();
        let a = root();
        let b = root();
        b.get_object("user").unwrap().put("name", "Eve").unwrap();
        assert_eq!(path.get_string(&a).unwrap(), "Bob");
        assert_eq!(path.get_string(&b).unwrap(), "Eve");
    }

    #[test]
    fn test_structural_result_aliases() {
        let root = root();
        get_object(&root, "arr[0]").unwrap().put("k", "y").unwrap();
        assert_eq!(get_string(&root, "arr[0].k").unwrap(), "y");
    }
}
