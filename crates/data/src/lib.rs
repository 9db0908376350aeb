#![allow(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(clippy::all)]
//! Dynamic data layer for the courier API client.
//!
//! Payloads from the remote service arrive as JSON or as external term
//! format binaries and are read into two loosely typed containers:
//!
//! - [`DataObject`]: string keys to [`Node`]s
//! - [`DataArray`]: an ordered list of [`Node`]s
//!
//! Both offer typed getters that coerce between kinds (`"42"` reads as an
//! integer, an integer reads as a string) and [`path`] expressions such as
//! `"guild.roles[0]?.name"` address nested values in one call.
//!
//! ```
//! use courier_data::prelude::*;
//!
//! let event = DataObject::from_json_str(r#"{"op": 0, "d": {"id": "1", "flags": 4}}"#)?;
//! assert_eq!(event.get_object("d")?.get_long("id")?, 1);
//! assert_eq!(path::get_int(&event, "d.flags")?, 4);
//! assert!(event.is_null("s"));
//! # Ok::<(), DataError>(())
//! ```
//!
//! Containers are shared handles: a nested container read from a parent
//! aliases the parent's storage, and they are neither `Send` nor `Sync`.

#[macro_use]
mod coerce;

mod array;
mod binary;
mod error;
mod json;
mod kind;
mod limits;
mod node;
mod object;
pub mod path;

pub use array::DataArray;
pub use binary::{BinaryCodec, EtfCodec};
pub use coerce::{FromNode, Number, coerce};
pub use error::{DataError, DataResult, Location};
pub use kind::NodeKind;
pub use limits::DataLimits;
pub use node::{Capability, IntoNode, Node};
pub use object::DataObject;
pub use path::{DataPath, PathRoot, PathSegment, PathStep};

/// Prelude for common imports
pub mod prelude {
    pub use crate::path;
    pub use crate::{
        DataArray, DataError, DataLimits, DataObject, DataPath, DataResult, IntoNode, Node,
        NodeKind,
    };
}
