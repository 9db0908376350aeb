//! External term format codec.
//!
//! The binary gateway transport exchanges payloads in the external term
//! format: a version marker byte (`131`) followed by one tagged, length
//! prefixed term. This crate models those terms as [`Term`] and provides
//! [`encode`] / [`decode`] over raw bytes. It has no knowledge of the data
//! layer that sits on top of it.
//!
//! ```
//! use courier_etf::{Term, decode, encode};
//!
//! let term = Term::Map(vec![(Term::binary("op"), Term::Integer(2))]);
//! let bytes = encode(&term);
//! assert_eq!(bytes[0], courier_etf::FORMAT_VERSION);
//! assert_eq!(decode(&bytes).unwrap(), term);
//! ```

mod decode;
mod encode;
mod error;
mod tag;
mod term;

pub use decode::{DEFAULT_MAX_DEPTH, Decoder, decode};
pub use encode::{encode, encode_into};
pub use error::{EtfError, EtfResult};
pub use tag::Tag;
pub use term::Term;

/// Leading byte of every payload.
pub const FORMAT_VERSION: u8 = 131;
