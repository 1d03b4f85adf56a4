//! Node storage and the borrowed [`NodeRef`] view.

use std::fmt;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use slotmap::new_key_type;

use crate::document::Document;
use crate::error::LookupError;

new_key_type! {
    /// Stable handle to a node of a [`Document`].
    ///
    /// Ids stay valid while the tree around the node changes and become stale once the node
    /// (or one of its ancestors) is deleted.
    pub struct NodeId;
}

/// The three node variants. Fixed when a node is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Object,
    Array,
    Scalar,
}

impl NodeKind {
    pub fn kind_desc(&self) -> &'static str {
        match self {
            NodeKind::Object => "object",
            NodeKind::Array => "array",
            NodeKind::Scalar => "scalar",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind_desc())
    }
}

/// Short description of a generic value's shape, used in error messages.
pub fn value_kind_desc(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub(crate) fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

#[derive(Debug)]
pub(crate) struct NodeData {
    /// Key under which the parent object holds this node. Empty for array elements and roots.
    pub(crate) name: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) payload: Payload,
}

impl NodeData {
    pub(crate) fn new(name: impl Into<String>, payload: Payload) -> Self {
        Self {
            name: name.into(),
            parent: None,
            payload,
        }
    }
}

/// Structural children next to their plain-value mirror.
///
/// Invariant: `mirror[k] == value(children[k])` for objects and `mirror[i] == value(children[i])`
/// for arrays. A scalar never holds an object or array.
#[derive(Debug)]
pub(crate) enum Payload {
    Object {
        children: IndexMap<String, NodeId>,
        mirror: Map<String, Value>,
    },
    Array {
        children: Vec<NodeId>,
        mirror: Vec<Value>,
    },
    Scalar(Value),
}

/// Position of a node inside its parent's mirror.
#[derive(Debug, Clone)]
pub(crate) enum Slot {
    Key(String),
    Index(usize),
}

impl Payload {
    pub(crate) fn empty_object() -> Self {
        Payload::Object {
            children: IndexMap::new(),
            mirror: Map::new(),
        }
    }

    pub(crate) fn empty_array() -> Self {
        Payload::Array {
            children: Vec::new(),
            mirror: Vec::new(),
        }
    }

    pub(crate) fn kind(&self) -> NodeKind {
        match self {
            Payload::Object { .. } => NodeKind::Object,
            Payload::Array { .. } => NodeKind::Array,
            Payload::Scalar(_) => NodeKind::Scalar,
        }
    }

    pub(crate) fn to_value(&self) -> Value {
        match self {
            Payload::Object { mirror, .. } => Value::Object(mirror.clone()),
            Payload::Array { mirror, .. } => Value::Array(mirror.clone()),
            Payload::Scalar(value) => value.clone(),
        }
    }

    pub(crate) fn child_ids(&self) -> Vec<NodeId> {
        match self {
            Payload::Object { children, .. } => children.values().copied().collect(),
            Payload::Array { children, .. } => children.clone(),
            Payload::Scalar(_) => Vec::new(),
        }
    }

    pub(crate) fn children_len(&self) -> usize {
        match self {
            Payload::Object { children, .. } => children.len(),
            Payload::Array { children, .. } => children.len(),
            Payload::Scalar(_) => 0,
        }
    }

    /// Replaces the mirror entry reached by following `route` from the outermost slot inwards.
    ///
    /// `route[0]` is the innermost slot (the changed node inside its own parent) and the last
    /// element is the slot directly inside this payload.
    pub(crate) fn patch_mirror(&mut self, route: &[Slot], value: Value) {
        let Some((outer, inner)) = route.split_last() else {
            return;
        };
        let entry = match (self, outer) {
            (Payload::Object { mirror, .. }, Slot::Key(key)) => mirror.get_mut(key),
            (Payload::Array { mirror, .. }, Slot::Index(index)) => mirror.get_mut(*index),
            _ => None,
        };
        let mut target = entry;
        for slot in inner.iter().rev() {
            target = match (target, slot) {
                (Some(value), Slot::Key(key)) => value.get_mut(key.as_str()),
                (Some(value), Slot::Index(index)) => value.get_mut(*index),
                (None, _) => None,
            };
        }
        if let Some(target) = target {
            *target = value;
        }
    }
}

/// A borrowed, read-only view of one node.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    pub(crate) doc: &'a Document,
    pub(crate) id: NodeId,
    pub(crate) data: &'a NodeData,
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.data.payload.kind()
    }

    /// The key under which the parent object holds this node, or `""`.
    pub fn name(&self) -> &'a str {
        &self.data.name
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.data.parent.and_then(|parent| self.doc.node(parent))
    }

    /// The plain value of this node, taken from its mirror.
    pub fn value(&self) -> Value {
        self.data.payload.to_value()
    }

    /// The scalar payload, or `None` for objects and arrays.
    pub fn as_scalar(&self) -> Option<&'a Value> {
        match &self.data.payload {
            Payload::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// Direct children. Arrays yield them in order; object order is not part of the contract.
    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let doc = self.doc;
        let ids: Box<dyn Iterator<Item = &'a NodeId> + 'a> = match &self.data.payload {
            Payload::Object { children, .. } => Box::new(children.values()),
            Payload::Array { children, .. } => Box::new(children.iter()),
            Payload::Scalar(_) => Box::new(std::iter::empty()),
        };
        ids.filter_map(move |&id| doc.node(id))
    }

    pub fn children_len(&self) -> usize {
        self.data.payload.children_len()
    }

    /// Looks up the child named `key`. Only objects support key lookup.
    pub fn lookup(&self, key: &str) -> Result<NodeRef<'a>, LookupError> {
        match &self.data.payload {
            Payload::Object { children, .. } => children
                .get(key)
                .and_then(|&id| self.doc.node(id))
                .ok_or_else(|| LookupError::KeyNotFound(key.to_owned())),
            _ => Err(LookupError::WrongKind {
                op: "look up a key",
                kind: self.kind(),
            }),
        }
    }

    /// Indexes into an array. Negative and out-of-range indices fail; there is no wraparound.
    pub fn at(&self, index: i64) -> Result<NodeRef<'a>, LookupError> {
        let Payload::Array { children, .. } = &self.data.payload else {
            return Err(LookupError::WrongKind {
                op: "index",
                kind: self.kind(),
            });
        };
        let len = children.len();
        usize::try_from(index)
            .ok()
            .and_then(|i| children.get(i))
            .and_then(|&id| self.doc.node(id))
            .ok_or(LookupError::IndexOutOfRange { index, len })
    }

    pub fn get(&self, key: &str) -> Option<NodeRef<'a>> {
        self.lookup(key).ok()
    }

    pub fn index(&self, index: usize) -> Option<NodeRef<'a>> {
        i64::try_from(index).ok().and_then(|i| self.at(i).ok())
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("name", &self.name())
            .finish()
    }
}

/// Serializes the mirror directly; no walk through the node graph.
impl Serialize for NodeRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.data.payload {
            Payload::Object { mirror, .. } => mirror.serialize(serializer),
            Payload::Array { mirror, .. } => mirror.serialize(serializer),
            Payload::Scalar(value) => value.serialize(serializer),
        }
    }
}

/// Pretty-prints the node as JSON with four-space indentation.
impl fmt::Display for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser).map_err(|_| fmt::Error)?;
        f.write_str(std::str::from_utf8(&buf).map_err(|_| fmt::Error)?)
    }
}
