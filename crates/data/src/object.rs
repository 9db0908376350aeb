//! String-keyed container
//!
//! [`DataObject`] is a handle to a shared, insertion-ordered map of
//! [`Node`]s. Cloning the handle, or reading a nested object out of a parent,
//! aliases the same storage; [`DataObject::deep_copy`] detaches it.
//!
//! ```
//! use courier_data::DataObject;
//!
//! let data = DataObject::from_json_str(r#"{"id": "81384788765712384", "user": {"name": "Bob"}}"#)?;
//! assert_eq!(data.get_unsigned_long("id")?, 81_384_788_765_712_384);
//!
//! let user = data.get_object("user")?;
//! user.put("name", "Alice")?;
//! assert_eq!(data.get_object("user")?.get_string("name")?, "Alice");
//! # Ok::<(), courier_data::DataError>(())
//! ```

use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::io::Read;
use std::rc::Rc;
use std::str::FromStr;

use indexmap::{IndexMap, IndexSet};

use crate::binary::{BinaryCodec, EtfCodec};
use crate::coerce::{self, FromNode};
use crate::error::{DataError, DataResult, Location};
use crate::json;
use crate::kind::NodeKind;
use crate::limits::DataLimits;
use crate::node::{IntoNode, Node};

/// Mutable map of string keys to nodes with coercing accessors.
#[derive(Clone, Default)]
pub struct DataObject {
    inner: Rc<RefCell<IndexMap<String, Node>>>,
}

impl DataObject {
    /// Create an empty object
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap an existing map in fresh storage
    pub fn from_map(map: IndexMap<String, Node>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(map)),
        }
    }

    pub fn from_json(payload: &[u8]) -> DataResult<Self> {
        Self::from_json_with_limits(payload, &DataLimits::default())
    }

    /// Parse a JSON payload whose root must be an object
    pub fn from_json_with_limits(payload: &[u8], limits: &DataLimits) -> DataResult<Self> {
        json::expect_object(json::parse_slice(payload, limits)?)
    }

    pub fn from_json_str(text: &str) -> DataResult<Self> {
        Self::from_json(text.as_bytes())
    }

    /// Read a stream to completion and parse it. I/O failures surface as
    /// [`DataError::Io`].
    pub fn from_reader(reader: impl Read) -> DataResult<Self> {
        Self::from_reader_with_limits(reader, &DataLimits::default())
    }

    pub fn from_reader_with_limits(reader: impl Read, limits: &DataLimits) -> DataResult<Self> {
        json::expect_object(json::parse_reader(reader, limits)?)
    }

    pub fn from_binary(payload: &[u8]) -> DataResult<Self> {
        Self::from_binary_with(&EtfCodec::default(), payload)
    }

    pub fn from_binary_with_limits(payload: &[u8], limits: &DataLimits) -> DataResult<Self> {
        Self::from_binary_with(&EtfCodec::new(*limits), payload)
    }

    /// Decode a binary payload whose root must be an object
    pub fn from_binary_with(codec: &impl BinaryCodec, payload: &[u8]) -> DataResult<Self> {
        match codec.decode(payload)? {
            Node::Object(obj) => Ok(obj),
            other => Err(DataError::Binary(format!(
                "expected object root, found {}",
                other.kind()
            ))),
        }
    }

    // ==================== Inspection ====================

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.inner.borrow().contains_key(key)
    }

    /// True if the key is absent or explicitly null
    pub fn is_null(&self, key: &str) -> bool {
        self.inner.borrow().get(key).is_none_or(Node::is_null)
    }

    /// Whether the value at `key` has `kind`; an absent key counts as null.
    pub fn is_type(&self, key: &str, kind: NodeKind) -> bool {
        match self.inner.borrow().get(key) {
            Some(node) => kind.matches(node),
            None => kind == NodeKind::Null,
        }
    }

    /// Same storage, not just equal contents
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn storage_ptr(&self) -> *const () {
        Rc::as_ptr(&self.inner).cast()
    }

    // ==================== Access ====================

    /// Required typed read: absent, null or incompatible values are errors.
    pub fn get_as<T: FromNode>(&self, key: &str) -> DataResult<T> {
        coerce::required(self.inner.borrow().get(key), || Location::from(key))
    }

    /// Typed read returning `fallback` when the key is absent or null.
    pub fn get_as_or<T: FromNode>(&self, key: &str, fallback: T) -> DataResult<T> {
        coerce::fallback(self.inner.borrow().get(key), fallback, || {
            Location::from(key)
        })
    }

    /// Typed read returning `None` when the key is absent or null.
    pub fn opt_as<T: FromNode>(&self, key: &str) -> DataResult<Option<T>> {
        coerce::optional(self.inner.borrow().get(key), || Location::from(key))
    }

    /// The raw node; absent and null are errors
    pub fn get(&self, key: &str) -> DataResult<Node> {
        self.get_as(key)
    }

    /// The raw node, `None` when absent or null
    pub fn opt(&self, key: &str) -> Option<Node> {
        self.inner
            .borrow()
            .get(key)
            .filter(|node| !node.is_null())
            .cloned()
    }

    typed_getters!(key: &str);

    // ==================== Mutation ====================

    /// Insert or overwrite `key`.
    ///
    /// Objects and arrays are stored as shared handles. Inserting a value
    /// that contains this object fails with [`DataError::Contract`].
    pub fn put(&self, key: impl Into<String>, value: impl IntoNode) -> DataResult<&Self> {
        let node = self.admit(value)?;
        self.inner.borrow_mut().insert(key.into(), node);
        Ok(self)
    }

    pub fn put_null(&self, key: impl Into<String>) -> &Self {
        self.inner.borrow_mut().insert(key.into(), Node::Null);
        self
    }

    /// Remove `key`, returning its value if it was present
    pub fn remove(&self, key: &str) -> Option<Node> {
        self.inner.borrow_mut().shift_remove(key)
    }

    /// Move the value at `old` to `new`, overwriting `new`. No-op when `old`
    /// is absent.
    pub fn rename(&self, old: &str, new: impl Into<String>) -> &Self {
        let new = new.into();
        if old != new {
            let mut map = self.inner.borrow_mut();
            if let Some(value) = map.shift_remove(old) {
                map.insert(new, value);
            }
        }
        self
    }

    fn admit(&self, value: impl IntoNode) -> DataResult<Node> {
        let node = value.into_node();
        if node.reaches(self.storage_ptr()) {
            return Err(DataError::contract(
                "an object cannot contain itself, directly or through a child",
            ));
        }
        Ok(node)
    }

    // ==================== Bulk ====================

    pub fn keys(&self) -> IndexSet<String> {
        self.inner.borrow().keys().cloned().collect()
    }

    pub fn values(&self) -> Vec<Node> {
        self.inner.borrow().values().cloned().collect()
    }

    /// Snapshot of the entries in insertion order
    pub fn entries(&self) -> Vec<(String, Node)> {
        self.inner
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Shallow copy of the backing map; nested containers stay shared.
    pub fn to_map(&self) -> IndexMap<String, Node> {
        self.inner.borrow().clone()
    }

    /// Independent copy of the whole tree
    #[must_use]
    pub fn deep_copy(&self) -> Self {
        let map = self
            .inner
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.deep_copy()))
            .collect();
        Self::from_map(map)
    }

    // ==================== Serialization ====================

    /// Compact JSON
    pub fn to_json(&self) -> DataResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Indented JSON with keys sorted at every level
    pub fn to_pretty_string(&self) -> DataResult<String> {
        json::to_pretty_string(&Node::Object(self.clone()))
    }

    pub fn to_binary(&self) -> DataResult<Vec<u8>> {
        self.to_binary_with(&EtfCodec::default())
    }

    pub fn to_binary_with(&self, codec: &impl BinaryCodec) -> DataResult<Vec<u8>> {
        codec.encode(&Node::Object(self.clone()))
    }
}

impl PartialEq for DataObject {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.inner.borrow() == *other.inner.borrow()
    }
}

impl Hash for DataObject {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let map = self.inner.borrow();
        let mut entries: Vec<_> = map.iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries.len().hash(state);
        for (key, value) in entries {
            key.hash(state);
            value.hash(state);
        }
    }
}

impl fmt::Debug for DataObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.inner.borrow().iter()).finish()
    }
}

impl fmt::Display for DataObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

impl FromStr for DataObject {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_json_str(s)
    }
}

impl From<IndexMap<String, Node>> for DataObject {
    fn from(map: IndexMap<String, Node>) -> Self {
        Self::from_map(map)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;

    use super::*;
    use crate::DataArray;
    use pretty_assertions::assert_eq;

    fn hash_of(obj: &DataObject) -> u64 {
        let mut hasher = DefaultHasher::new();
        obj.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_put_and_remove() {
        let obj = DataObject::empty();
        obj.put("x", 5).unwrap();
        assert!(obj.has_key("x"));
        assert_eq!(obj.remove("x"), Some(Node::Int(5)));
        assert!(!obj.has_key("x"));
        assert_eq!(obj.remove("x"), None);
    }

    #[test]
    fn test_put_overwrites() {
        let obj = DataObject::empty();
        obj.put("k", 1).unwrap().put("k", "two").unwrap();
        assert_eq!(obj.len(), 1);
        assert_eq!(obj.get_string("k").unwrap(), "two");
    }

    #[test]
    fn test_numeric_coercion() {
        let obj = DataObject::from_json_str(r#"{"a": 1, "b": "2", "c": "abc"}"#).unwrap();
        assert_eq!(obj.get_int("a").unwrap(), 1);
        assert_eq!(obj.get_int("b").unwrap(), 2);
        assert!(obj.get_int("c").unwrap_err().is_parsing_error());
    }

    #[test]
    fn test_null_vs_missing() {
        let obj = DataObject::from_json_str(r#"{"c": null}"#).unwrap();
        assert!(obj.is_null("c"));
        assert!(obj.has_key("c"));
        assert!(obj.is_null("d"));
        assert!(!obj.has_key("d"));

        assert!(matches!(obj.get_int("c").unwrap_err(), DataError::Null { .. }));
        assert!(matches!(obj.get_int("d").unwrap_err(), DataError::Missing { .. }));
        assert_eq!(obj.opt("c"), None);
        assert!(obj.get("c").is_err());
    }

    #[test]
    fn test_fallback_only_covers_absence() {
        let obj = DataObject::from_json_str(r#"{"n": null, "s": "x", "o": {}}"#).unwrap();
        assert_eq!(obj.get_int_or("n", 7).unwrap(), 7);
        assert_eq!(obj.get_int_or("missing", 7).unwrap(), 7);
        assert!(obj.get_int_or("s", 7).is_err());
        assert!(obj.get_boolean_or("o", false).is_err());
        assert_eq!(obj.get_string_or("missing", "N/A").unwrap(), "N/A");
    }

    #[test]
    fn test_is_type() {
        let obj = DataObject::from_json_str(r#"{"i": 1, "f": 1.5, "a": []}"#).unwrap();
        assert!(obj.is_type("i", NodeKind::Integer));
        assert!(obj.is_type("f", NodeKind::Float));
        assert!(obj.is_type("a", NodeKind::Array));
        assert!(obj.is_type("nope", NodeKind::Null));
        assert!(!obj.is_type("i", NodeKind::Unknown));
    }

    #[test]
    fn test_child_view_aliases_parent() {
        let obj = DataObject::from_json_str(r#"{"child": {}}"#).unwrap();
        obj.get_object("child").unwrap().put("x", true).unwrap();
        assert!(obj.get_object("child").unwrap().get_boolean("x").unwrap());
    }

    #[test]
    fn test_deep_copy_detaches() {
        let obj = DataObject::from_json_str(r#"{"child": {"x": 1}}"#).unwrap();
        let copy = obj.deep_copy();
        copy.get_object("child").unwrap().put("x", 2).unwrap();
        assert_eq!(obj.get_object("child").unwrap().get_int("x").unwrap(), 1);
        assert_ne!(obj, copy);
    }

    #[test]
    fn test_cycle_rejected() {
        let parent = DataObject::empty();
        let child = DataObject::empty();
        parent.put("child", &child).unwrap();

        let err = child.put("parent", &parent).unwrap_err();
        assert!(err.is_contract_violation());
        assert!(parent.put("me", &parent).is_err());

        let arr = DataArray::empty();
        arr.add(&parent).unwrap();
        assert!(child.put("list", &arr).is_err());
    }

    #[test]
    fn test_rename() {
        let obj = DataObject::empty();
        obj.put("a", 1).unwrap().put("b", 2).unwrap();
        obj.rename("a", "b");
        assert_eq!(obj.len(), 1);
        assert_eq!(obj.get_int("b").unwrap(), 1);

        obj.rename("zzz", "y");
        assert!(!obj.has_key("y"));
        obj.rename("b", "b");
        assert!(obj.has_key("b"));
    }

    #[test]
    fn test_equality_and_hash_ignore_order() {
        let a = DataObject::from_json_str(r#"{"x": 1, "y": [1, 2]}"#).unwrap();
        let b = DataObject::from_json_str(r#"{"y": [1, 2], "x": 1}"#).unwrap();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn test_capability_unwrap() {
        let inner = DataArray::empty();
        inner.add(1).unwrap();
        let obj = DataObject::empty();
        obj.put("list", &inner).unwrap();
        obj.put("maybe", None::<&str>).unwrap();

        assert!(obj.is_type("list", NodeKind::Array));
        assert!(obj.get_array("list").unwrap().ptr_eq(&inner));
        assert!(obj.is_null("maybe"));
    }

    #[test]
    fn test_structural_getters() {
        let obj = DataObject::from_json_str(r#"{"o": {}, "a": [], "n": null}"#).unwrap();
        assert!(obj.get_object("a").is_err());
        assert!(obj.get_array("o").is_err());
        assert!(obj.opt_object("n").unwrap().is_none());
        assert!(obj.opt_array("missing").unwrap().is_none());
        assert!(obj.opt_array("o").is_err());
    }

    #[test]
    fn test_keys_values() {
        let obj = DataObject::from_json_str(r#"{"b": 1, "a": 2}"#).unwrap();
        assert_eq!(
            obj.keys().into_iter().collect::<Vec<_>>(),
            vec!["b".to_string(), "a".to_string()]
        );
        assert_eq!(obj.values(), vec![Node::Int(1), Node::Int(2)]);
        assert_eq!(obj.to_map().len(), 2);
    }

    #[test]
    fn test_serialization_forms() {
        let obj = DataObject::from_json_str(r#"{"b": 1, "a": "x"}"#).unwrap();
        assert_eq!(obj.to_string(), r#"{"b":1,"a":"x"}"#);
        assert_eq!(obj.to_json().unwrap(), br#"{"b":1,"a":"x"}"#.to_vec());
        assert_eq!(obj.to_pretty_string().unwrap(), "{\n  \"a\": \"x\",\n  \"b\": 1\n}");
    }

    #[test]
    fn test_wrong_root() {
        assert!(matches!(
            DataObject::from_json_str("[1]").unwrap_err(),
            DataError::Json(_)
        ));
        assert!("{".parse::<DataObject>().is_err());
    }

    #[test]
    fn test_from_reader() {
        let obj = DataObject::from_reader(&br#"{"ok": true}"#[..]).unwrap();
        assert!(obj.get_boolean("ok").unwrap());
    }

    #[test]
    fn test_debug() {
        let obj = DataObject::empty();
        obj.put("a", 1).unwrap();
        assert_eq!(format!("{obj:?}"), r#"{"a": Int(1)}"#);
    }
}
