//! Index-ordered container
//!
//! [`DataArray`] mirrors [`DataObject`](crate::DataObject): the same typed
//! getters and coercion, keyed by position. An index past the end reads as
//! absent, so `is_null` and the fallback getters treat it like a missing key,
//! while the required getters fail with
//! [`DataError::IndexOutOfBounds`].

use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::io::Read;
use std::rc::Rc;
use std::str::FromStr;

use crate::binary::{BinaryCodec, EtfCodec};
use crate::coerce::{self, FromNode};
use crate::error::{DataError, DataResult, Location};
use crate::json;
use crate::kind::NodeKind;
use crate::limits::DataLimits;
use crate::node::{IntoNode, Node};

/// Mutable list of nodes with coercing accessors.
#[derive(Clone, Default)]
pub struct DataArray {
    inner: Rc<RefCell<Vec<Node>>>,
}

impl DataArray {
    /// Create an empty array
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_vec(nodes: Vec<Node>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(nodes)),
        }
    }

    pub fn from_nodes<T: IntoNode>(values: impl IntoIterator<Item = T>) -> Self {
        values.into_iter().collect()
    }

    pub fn from_json(payload: &[u8]) -> DataResult<Self> {
        Self::from_json_with_limits(payload, &DataLimits::default())
    }

    /// Parse a JSON payload whose root must be an array
    pub fn from_json_with_limits(payload: &[u8], limits: &DataLimits) -> DataResult<Self> {
        json::expect_array(json::parse_slice(payload, limits)?)
    }

    pub fn from_json_str(text: &str) -> DataResult<Self> {
        Self::from_json(text.as_bytes())
    }

    pub fn from_reader(reader: impl Read) -> DataResult<Self> {
        Self::from_reader_with_limits(reader, &DataLimits::default())
    }

    pub fn from_reader_with_limits(reader: impl Read, limits: &DataLimits) -> DataResult<Self> {
        json::expect_array(json::parse_reader(reader, limits)?)
    }

    pub fn from_binary(payload: &[u8]) -> DataResult<Self> {
        Self::from_binary_with(&EtfCodec::default(), payload)
    }

    pub fn from_binary_with_limits(payload: &[u8], limits: &DataLimits) -> DataResult<Self> {
        Self::from_binary_with(&EtfCodec::new(*limits), payload)
    }

    pub fn from_binary_with(codec: &impl BinaryCodec, payload: &[u8]) -> DataResult<Self> {
        match codec.decode(payload)? {
            Node::Array(arr) => Ok(arr),
            other => Err(DataError::Binary(format!(
                "expected array root, found {}",
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

    /// True if `index` is out of range or holds null
    pub fn is_null(&self, index: usize) -> bool {
        self.inner.borrow().get(index).is_none_or(Node::is_null)
    }

    /// Whether the value at `index` has `kind`; out of range counts as null.
    pub fn is_type(&self, index: usize, kind: NodeKind) -> bool {
        match self.inner.borrow().get(index) {
            Some(node) => kind.matches(node),
            None => kind == NodeKind::Null,
        }
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn storage_ptr(&self) -> *const () {
        Rc::as_ptr(&self.inner).cast()
    }

    // ==================== Access ====================

    /// Required typed read. Out of range is
    /// [`DataError::IndexOutOfBounds`]; null or incompatible values are
    /// parsing errors.
    pub fn get_as<T: FromNode>(&self, index: usize) -> DataResult<T> {
        let list = self.inner.borrow();
        match list.get(index) {
            None => Err(DataError::index_out_of_bounds(index, list.len())),
            slot => coerce::required(slot, || Location::from(index)),
        }
    }

    /// Typed read returning `fallback` when out of range or null.
    pub fn get_as_or<T: FromNode>(&self, index: usize, fallback: T) -> DataResult<T> {
        coerce::fallback(self.inner.borrow().get(index), fallback, || {
            Location::from(index)
        })
    }

    /// Typed read returning `None` when out of range or null.
    pub fn opt_as<T: FromNode>(&self, index: usize) -> DataResult<Option<T>> {
        coerce::optional(self.inner.borrow().get(index), || Location::from(index))
    }

    pub fn get(&self, index: usize) -> DataResult<Node> {
        self.get_as(index)
    }

    pub fn opt(&self, index: usize) -> Option<Node> {
        self.inner
            .borrow()
            .get(index)
            .filter(|node| !node.is_null())
            .cloned()
    }

    typed_getters!(index: usize);

    // ==================== Mutation ====================

    /// Append a value. Fails with [`DataError::Contract`] if the value
    /// contains this array.
    pub fn add(&self, value: impl IntoNode) -> DataResult<&Self> {
        let node = self.admit(value)?;
        self.inner.borrow_mut().push(node);
        Ok(self)
    }

    /// Append every value, or none of them if any is rejected.
    pub fn add_all<T: IntoNode>(&self, values: impl IntoIterator<Item = T>) -> DataResult<&Self> {
        let nodes = values
            .into_iter()
            .map(|value| self.admit(value))
            .collect::<DataResult<Vec<_>>>()?;
        self.inner.borrow_mut().extend(nodes);
        Ok(self)
    }

    /// Append the elements of another array (which may be this one).
    pub fn add_all_array(&self, other: &Self) -> DataResult<&Self> {
        self.add_all(other.nodes())
    }

    /// Insert at `index`, shifting later elements. `index == len()` appends.
    pub fn insert(&self, index: usize, value: impl IntoNode) -> DataResult<&Self> {
        let node = self.admit(value)?;
        let mut list = self.inner.borrow_mut();
        if index > list.len() {
            return Err(DataError::index_out_of_bounds(index, list.len()));
        }
        list.insert(index, node);
        Ok(self)
    }

    /// Replace the value at `index`
    pub fn set(&self, index: usize, value: impl IntoNode) -> DataResult<&Self> {
        let node = self.admit(value)?;
        let mut list = self.inner.borrow_mut();
        let length = list.len();
        let slot = list
            .get_mut(index)
            .ok_or_else(|| DataError::index_out_of_bounds(index, length))?;
        *slot = node;
        Ok(self)
    }

    /// Remove and return the value at `index`
    pub fn remove(&self, index: usize) -> DataResult<Node> {
        let mut list = self.inner.borrow_mut();
        if index >= list.len() {
            return Err(DataError::index_out_of_bounds(index, list.len()));
        }
        Ok(list.remove(index))
    }

    /// Remove the first element structurally equal to `value`.
    pub fn remove_value(&self, value: impl IntoNode) -> bool {
        let target = value.into_node();
        // comparing may borrow `target`, which can alias this array
        let position = self.inner.borrow().iter().position(|node| *node == target);
        match position {
            Some(index) => {
                self.inner.borrow_mut().remove(index);
                true
            }
            None => false,
        }
    }

    fn admit(&self, value: impl IntoNode) -> DataResult<Node> {
        let node = value.into_node();
        if node.reaches(self.storage_ptr()) {
            return Err(DataError::contract(
                "an array cannot contain itself, directly or through a child",
            ));
        }
        Ok(node)
    }

    // ==================== Iteration ====================

    /// Snapshot of the current nodes
    pub fn nodes(&self) -> Vec<Node> {
        self.inner.borrow().clone()
    }

    /// Iterate a snapshot; later mutation does not affect the iterator.
    pub fn iter(&self) -> std::vec::IntoIter<Node> {
        self.nodes().into_iter()
    }

    /// Lazily map `mapper(self, index)` over `0..len()`, with the length
    /// taken when this is called.
    ///
    /// ```
    /// use courier_data::DataArray;
    ///
    /// let arr = DataArray::from_json_str(r#"["1", 2, 3.5]"#)?;
    /// let ints: Vec<i64> = arr.stream(DataArray::get_long).collect::<Result<_, _>>()?;
    /// assert_eq!(ints, vec![1, 2, 3]);
    /// # Ok::<(), courier_data::DataError>(())
    /// ```
    pub fn stream<T>(&self, mapper: impl Fn(&Self, usize) -> T) -> impl Iterator<Item = T> {
        (0..self.len()).map(move |index| mapper(self, index))
    }

    /// Shallow copy of the backing list
    pub fn to_list(&self) -> Vec<Node> {
        self.nodes()
    }

    #[must_use]
    pub fn deep_copy(&self) -> Self {
        Self::from_vec(self.inner.borrow().iter().map(Node::deep_copy).collect())
    }

    // ==================== Serialization ====================

    pub fn to_json(&self) -> DataResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn to_pretty_string(&self) -> DataResult<String> {
        json::to_pretty_string(&Node::Array(self.clone()))
    }

    pub fn to_binary(&self) -> DataResult<Vec<u8>> {
        self.to_binary_with(&EtfCodec::default())
    }

    pub fn to_binary_with(&self, codec: &impl BinaryCodec) -> DataResult<Vec<u8>> {
        codec.encode(&Node::Array(self.clone()))
    }
}

impl PartialEq for DataArray {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.inner.borrow() == *other.inner.borrow()
    }
}

impl Hash for DataArray {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.borrow().hash(state);
    }
}

impl fmt::Debug for DataArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inner.borrow().iter()).finish()
    }
}

impl fmt::Display for DataArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

impl FromStr for DataArray {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_json_str(s)
    }
}

impl<T: IntoNode> FromIterator<T> for DataArray {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().map(IntoNode::into_node).collect())
    }
}

impl IntoIterator for &DataArray {
    type Item = Node;
    type IntoIter = std::vec::IntoIter<Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
