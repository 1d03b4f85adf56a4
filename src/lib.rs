//! An in-memory, mutable JSON document tree.
//!
//! Raw JSON is decoded with `serde_json` and turned into a tree of object, array and scalar
//! nodes stored in a [`Document`]. Every object and array keeps its structural children next to a
//! plain-value mirror of them, so any node can be serialized straight from its mirror while
//! identity-based edits (append, move, delete) work on the node graph. Nodes are located with
//! dotted paths such as `object.array[2][0]`.
//!
//! ```
//! use serde_json::json;
//!
//! let mut doc = jsontree::Document::parse(br#"{"object": {"array": [1, [2, 3]]}}"#)?;
//! assert_eq!(doc.get("object.array[1][0]").unwrap().value(), json!(2));
//!
//! doc.delete_path("object.array[0]")?;
//! assert_eq!(doc.to_json_string(doc.root())?, r#"{"object":{"array":[[2,3]]}}"#);
//! # Ok::<(), jsontree::Error>(())
//! ```

mod builder;
mod config;
mod document;
mod error;
mod node;
mod path;
mod spanned;

pub use builder::nesting_depth;
pub use config::Config;
pub use document::Document;
pub use error::{Error, LookupError, Result};
pub use node::{value_kind_desc, NodeId, NodeKind, NodeRef};
pub use path::{lenient_step_parser, parse_path, step_parser, Step};
pub use spanned::Spanned;
