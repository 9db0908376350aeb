/// A decoded term.
///
/// Integers are carried as `i128` so that both the signed and the unsigned
/// 64-bit ranges survive a round trip unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// The `nil` atom
    Nil,
    /// The `true` / `false` atoms
    Bool(bool),
    Integer(i128),
    Float(f64),
    /// Raw binary, used for text on the wire
    Binary(Vec<u8>),
    /// Any atom other than `nil`, `true` and `false`
    Atom(String),
    List(Vec<Term>),
    /// Key/value pairs in wire order
    Map(Vec<(Term, Term)>),
}

impl Term {
    /// Create a binary term from UTF-8 text
    pub fn binary(text: impl Into<String>) -> Self {
        Self::Binary(text.into().into_bytes())
    }

    /// Create an atom term
    pub fn atom(name: impl Into<String>) -> Self {
        Self::Atom(name.into())
    }

    /// Human readable name of the term type, for diagnostics
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Binary(_) => "binary",
            Self::Atom(_) => "atom",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// Text content of a binary or atom term
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Binary(bytes) => std::str::from_utf8(bytes).ok(),
            Self::Atom(name) => Some(name),
            _ => None,
        }
    }
}

impl From<&str> for Term {
    fn from(text: &str) -> Self {
        Self::binary(text)
    }
}

impl From<i64> for Term {
    fn from(v: i64) -> Self {
        Self::Integer(i128::from(v))
    }
}

impl From<u64> for Term {
    fn from(v: u64) -> Self {
        Self::Integer(i128::from(v))
    }
}

impl From<f64> for Term {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Term {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}
