//! The document arena and its mutation layer.
//!
//! A [`Document`] owns every node in a [`SlotMap`]. Parents refer to their children by
//! [`NodeId`] and children keep a plain, non-owning `parent` id that is only used to detach the
//! node again and to refresh the mirrors of its ancestors.

use serde_json::Value;
use slotmap::SlotMap;
use tracing::*;

use crate::builder::nesting_depth;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::node::{is_container, value_kind_desc, NodeData, NodeId, NodeKind, NodeRef, Payload, Slot};

/// An arena of JSON nodes with one designated root.
///
/// Nodes created with `create_*` or [`Document::build`] start out parentless and stay in the
/// arena until they are appended, [discarded](Document::discard) or the document is dropped.
///
/// Each object and array holds a full copy of its subtree's value, so memory and build time
/// grow with subtree size times nesting depth, and every mutation re-copies the changed value
/// into each ancestor.
#[derive(Debug)]
pub struct Document {
    pub(crate) nodes: SlotMap<NodeId, NodeData>,
    pub(crate) root: NodeId,
    pub(crate) config: Config,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document whose root is an empty, nameless object.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(NodeData::new("", Payload::empty_object()));
        Self {
            nodes,
            root,
            config,
        }
    }

    /// Decodes raw JSON and builds the node tree for it.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        Self::parse_with_config(bytes, Config::default())
    }

    pub fn parse_with_config(bytes: &[u8], config: Config) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value_with_config(&value, config)
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        Self::from_value_with_config(value, Config::default())
    }

    pub fn from_value_with_config(value: &Value, config: Config) -> Result<Self> {
        let mut doc = Self {
            nodes: SlotMap::with_key(),
            root: NodeId::default(),
            config,
        };
        doc.root = doc.build("", value)?;
        debug!(nodes = doc.nodes.len(), "built document");
        Ok(doc)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_node(&self) -> NodeRef<'_> {
        NodeRef {
            doc: self,
            id: self.root,
            data: &self.nodes[self.root],
        }
    }

    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.nodes.get(id).map(|data| NodeRef {
            doc: self,
            id,
            data,
        })
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of live nodes, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn data(&self, id: NodeId) -> Result<&NodeData> {
        self.nodes.get(id).ok_or(Error::InvalidNode)
    }

    pub(crate) fn data_mut(&mut self, id: NodeId) -> Result<&mut NodeData> {
        self.nodes.get_mut(id).ok_or(Error::InvalidNode)
    }

    /// Creates a detached, empty object.
    pub fn create_object(&mut self, name: impl Into<String>) -> NodeId {
        self.nodes.insert(NodeData::new(name, Payload::empty_object()))
    }

    /// Creates a detached, empty array.
    pub fn create_array(&mut self, name: impl Into<String>) -> NodeId {
        self.nodes.insert(NodeData::new(name, Payload::empty_array()))
    }

    /// Creates a detached scalar. Objects and arrays are rejected; use [`Document::build`].
    pub fn create_scalar(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<NodeId> {
        let value = value.into();
        if is_container(&value) {
            return Err(Error::InvalidValueType {
                expected: "scalar",
                found: value_kind_desc(&value),
            });
        }
        Ok(self.nodes.insert(NodeData::new(name, Payload::Scalar(value))))
    }

    /// Appends `child` under `parent`.
    ///
    /// Objects need a non-empty, unused child name. Arrays append positionally and clear the
    /// child's name. Scalars have no children. A child that already has a parent is moved.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let parent_kind = self.data(parent)?.payload.kind();
        let child_data = self.data(child)?;
        let name = child_data.name.clone();

        match &self.data(parent)?.payload {
            Payload::Scalar(_) => {
                return Err(Error::UnsupportedOperation {
                    op: "append_child",
                    kind: parent_kind,
                })
            }
            Payload::Object { children, .. } => {
                if name.is_empty() {
                    return Err(Error::MissingName);
                }
                if children.contains_key(&name) {
                    return Err(Error::DuplicateKey { key: name });
                }
            }
            Payload::Array { .. } => {}
        }
        if child == self.root {
            return Err(Error::UnsupportedOperation {
                op: "re-parenting the document root",
                kind: self.data(child)?.payload.kind(),
            });
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(Error::Cycle);
        }
        self.check_depth(self.ancestor_count(parent) + 1, self.subtree_depth(child))?;

        self.detach(child)?;

        let value = self.data(child)?.payload.to_value();
        match &mut self.data_mut(parent)?.payload {
            Payload::Object { children, mirror } => {
                children.insert(name.clone(), child);
                mirror.insert(name, value);
            }
            Payload::Array { children, mirror } => {
                children.push(child);
                mirror.push(value);
            }
            Payload::Scalar(_) => {}
        }

        let child_data = self.data_mut(child)?;
        child_data.parent = Some(parent);
        if parent_kind == NodeKind::Array {
            child_data.name.clear();
        }
        trace!(?parent, ?child, "appended child");

        self.sync_ancestors(parent);
        Ok(())
    }

    /// Replaces the content of `id` with `value`, rebuilding every child.
    ///
    /// Objects take a mapping and arrays a sequence; scalars take anything but those two. The new
    /// children are fully built before the old ones are swapped out, so a failure leaves the node
    /// untouched.
    pub fn set(&mut self, id: NodeId, value: &Value) -> Result<()> {
        let kind = self.data(id)?.payload.kind();
        let matches = match kind {
            NodeKind::Object => value.is_object(),
            NodeKind::Array => value.is_array(),
            NodeKind::Scalar => !is_container(value),
        };
        if !matches {
            return Err(Error::InvalidValueType {
                expected: kind.kind_desc(),
                found: value_kind_desc(value),
            });
        }
        self.check_depth(self.ancestor_count(id), nesting_depth(value))?;

        let payload = self.mint_payload(value);
        let old = std::mem::replace(&mut self.data_mut(id)?.payload, payload);
        self.adopt_children(id);
        for child in old.child_ids() {
            self.free_subtree(child);
        }
        trace!(?id, %kind, "set node value");

        self.sync_ancestors(id);
        Ok(())
    }

    /// Renames a node.
    ///
    /// Inside an object the new name must be non-empty and unused; the mirror entry moves with
    /// it. Array elements cannot be named.
    pub fn rename(&mut self, id: NodeId, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        let data = self.data(id)?;
        let old = data.name.clone();
        let Some(parent) = data.parent else {
            self.data_mut(id)?.name = name;
            return Ok(());
        };
        if name == old {
            return Ok(());
        }

        match &mut self.data_mut(parent)?.payload {
            Payload::Object { children, mirror } => {
                if name.is_empty() {
                    return Err(Error::MissingName);
                }
                if children.contains_key(&name) {
                    return Err(Error::DuplicateKey { key: name });
                }
                children.shift_remove(&old);
                children.insert(name.clone(), id);
                if let Some(value) = mirror.shift_remove(&old) {
                    mirror.insert(name.clone(), value);
                }
            }
            Payload::Array { .. } => {
                return Err(Error::UnsupportedOperation {
                    op: "naming an array element",
                    kind: NodeKind::Array,
                })
            }
            Payload::Scalar(_) => {}
        }
        self.data_mut(id)?.name = name;

        self.sync_ancestors(parent);
        Ok(())
    }

    /// Removes `id` from its parent's children and mirror. The subtree stays alive as a new
    /// parentless subtree and may be appended elsewhere.
    ///
    /// Returns `false` if the node had no parent.
    pub fn detach(&mut self, id: NodeId) -> Result<bool> {
        let data = self.data(id)?;
        let Some(parent) = data.parent else {
            return Ok(false);
        };
        let name = data.name.clone();

        match &mut self.data_mut(parent)?.payload {
            Payload::Object { children, mirror } => {
                if children.get(&name) == Some(&id) {
                    children.shift_remove(&name);
                    mirror.shift_remove(&name);
                }
            }
            Payload::Array { children, mirror } => {
                if let Some(pos) = children.iter().position(|&child| child == id) {
                    children.remove(pos);
                    mirror.remove(pos);
                }
            }
            Payload::Scalar(_) => {}
        }
        self.data_mut(id)?.parent = None;
        trace!(?parent, child = ?id, "detached child");

        self.sync_ancestors(parent);
        Ok(true)
    }

    /// Detaches `id` and frees its whole subtree. Deleting a parentless node is a no-op.
    pub fn delete(&mut self, id: NodeId) -> Result<()> {
        if self.detach(id)? {
            let freed = self.free_subtree(id);
            debug!(?id, freed, "deleted node");
        }
        Ok(())
    }

    /// Frees `id` and its whole subtree, detaching it first if it is attached. This is how
    /// parentless subtrees (detached nodes, or created nodes that were never appended) are
    /// reclaimed. Returns how many nodes were freed.
    pub fn discard(&mut self, id: NodeId) -> Result<usize> {
        if id == self.root {
            return Err(Error::UnsupportedOperation {
                op: "discarding the document root",
                kind: self.data(id)?.payload.kind(),
            });
        }
        self.detach(id)?;
        let freed = self.free_subtree(id);
        debug!(?id, freed, "discarded subtree");
        Ok(freed)
    }

    /// Resolves `path` from the root and deletes the node it names.
    pub fn delete_path(&mut self, path: &str) -> Result<()> {
        let id = self.resolve(self.root, path)?;
        self.delete(id)
    }

    /// Resolves `path` from the root and replaces that node's content.
    pub fn set_path(&mut self, path: &str, value: &Value) -> Result<()> {
        let id = self.resolve(self.root, path)?;
        self.set(id, value)
    }

    /// Resolves `path` from the root, `None` on any failure.
    pub fn get(&self, path: &str) -> Option<NodeRef<'_>> {
        self.resolve(self.root, path)
            .ok()
            .and_then(|id| self.node(id))
    }

    pub fn to_json_string(&self, id: NodeId) -> Result<String> {
        let node = self.node(id).ok_or(Error::InvalidNode)?;
        Ok(serde_json::to_string(&node)?)
    }

    pub fn to_json_string_pretty(&self, id: NodeId) -> Result<String> {
        let node = self.node(id).ok_or(Error::InvalidNode)?;
        Ok(serde_json::to_string_pretty(&node)?)
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == candidate {
                return true;
            }
            current = self.nodes.get(node).and_then(|data| data.parent);
        }
        false
    }

    fn ancestor_count(&self, id: NodeId) -> usize {
        let mut count = 0;
        let mut current = self.nodes.get(id).and_then(|data| data.parent);
        while let Some(node) = current {
            count += 1;
            current = self.nodes.get(node).and_then(|data| data.parent);
        }
        count
    }

    /// Like [`nesting_depth`], measured over the arena.
    fn subtree_depth(&self, id: NodeId) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(id, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            let Some(data) = self.nodes.get(node) else {
                continue;
            };
            if data.payload.kind() != NodeKind::Scalar {
                deepest = deepest.max(depth + 1);
                stack.extend(data.payload.child_ids().into_iter().map(|c| (c, depth + 1)));
            }
        }
        deepest
    }

    fn slot_in_parent(&self, parent: NodeId, child: NodeId) -> Option<Slot> {
        match &self.nodes.get(parent)?.payload {
            Payload::Object { .. } => Some(Slot::Key(self.nodes.get(child)?.name.clone())),
            Payload::Array { children, .. } => children
                .iter()
                .position(|&c| c == child)
                .map(Slot::Index),
            Payload::Scalar(_) => None,
        }
    }

    /// Copies the current value of `id` into the mirror of every ancestor.
    pub(crate) fn sync_ancestors(&mut self, id: NodeId) {
        let Some(data) = self.nodes.get(id) else {
            return;
        };
        let value = data.payload.to_value();
        let mut route = Vec::new();
        let mut current = id;
        while let Some(parent) = self.nodes.get(current).and_then(|data| data.parent) {
            let Some(slot) = self.slot_in_parent(parent, current) else {
                break;
            };
            route.push(slot);
            if let Some(parent_data) = self.nodes.get_mut(parent) {
                parent_data.payload.patch_mirror(&route, value.clone());
            }
            current = parent;
        }
    }

    /// Points the `parent` of every child of `id` back at `id`.
    pub(crate) fn adopt_children(&mut self, id: NodeId) {
        let children = match self.nodes.get(id) {
            Some(data) => data.payload.child_ids(),
            None => return,
        };
        for child in children {
            if let Some(data) = self.nodes.get_mut(child) {
                data.parent = Some(id);
            }
        }
    }

    /// Removes `id` and all of its descendants from the arena. Returns how many nodes were freed.
    pub(crate) fn free_subtree(&mut self, id: NodeId) -> usize {
        let mut stack = vec![id];
        let mut freed = 0;
        while let Some(node) = stack.pop() {
            if let Some(data) = self.nodes.remove(node) {
                stack.extend(data.payload.child_ids());
                freed += 1;
            }
        }
        freed
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn object_with(doc: &mut Document, name: &str, value: Value) -> NodeId {
        doc.build(name, &value).unwrap()
    }

    #[test]
    fn new_document_has_empty_object_root() {
        let doc = Document::new();
        let root = doc.root_node();
        assert_eq!(root.kind(), NodeKind::Object);
        assert_eq!(root.name(), "");
        assert!(root.parent().is_none());
        assert_eq!(root.value(), json!({}));
    }

    #[test]
    fn append_into_object_updates_mirror() {
        let mut doc = Document::new();
        let child = doc.create_scalar("key", "val").unwrap();
        doc.append_child(doc.root(), child).unwrap();

        assert_eq!(doc.root_node().value(), json!({"key": "val"}));
        assert_eq!(doc.node(child).unwrap().parent().unwrap().id(), doc.root());
    }

    #[test]
    fn append_unnamed_into_object_fails() {
        let mut doc = Document::new();
        let child = doc.create_scalar("", 1).unwrap();
        assert!(matches!(
            doc.append_child(doc.root(), child),
            Err(Error::MissingName)
        ));
        assert_eq!(doc.root_node().children_len(), 0);
    }

    #[test]
    fn duplicate_key_leaves_object_unchanged() {
        let mut doc = Document::new();
        let first = doc.create_scalar("k", 1).unwrap();
        let second = doc.create_scalar("k", 2).unwrap();
        doc.append_child(doc.root(), first).unwrap();

        let err = doc.append_child(doc.root(), second).unwrap_err();
        assert!(matches!(err, Error::DuplicateKey { ref key } if key == "k"));
        assert_eq!(doc.root_node().children_len(), 1);
        assert_eq!(doc.root_node().value(), json!({"k": 1}));
        assert!(doc.node(second).unwrap().parent().is_none());
    }

    #[test]
    fn append_into_scalar_is_unsupported() {
        let mut doc = Document::new();
        let scalar = doc.create_scalar("s", true).unwrap();
        let child = doc.create_scalar("c", 1).unwrap();
        assert!(matches!(
            doc.append_child(scalar, child),
            Err(Error::UnsupportedOperation {
                kind: NodeKind::Scalar,
                ..
            })
        ));
    }

    #[test]
    fn array_append_clears_name_and_keeps_order() {
        let mut doc = Document::new();
        let array = doc.create_array("arr");
        for (name, n) in [("a", 1), ("b", 2), ("", 3)] {
            let item = doc.create_scalar(name, n).unwrap();
            doc.append_child(array, item).unwrap();
        }
        let array = doc.node(array).unwrap();
        assert_eq!(array.value(), json!([1, 2, 3]));
        assert!(array.children().all(|c| c.name().is_empty()));
    }

    #[test]
    fn create_scalar_rejects_containers() {
        let mut doc = Document::new();
        assert!(matches!(
            doc.create_scalar("x", json!([1])),
            Err(Error::InvalidValueType {
                expected: "scalar",
                found: "array"
            })
        ));
    }

    #[test]
    fn nested_append_reaches_every_ancestor_mirror() {
        let mut doc = Document::new();
        let outer = doc.create_object("outer");
        doc.append_child(doc.root(), outer).unwrap();
        let list = doc.create_array("list");
        doc.append_child(outer, list).unwrap();
        let leaf = doc.create_scalar("", "x").unwrap();
        doc.append_child(list, leaf).unwrap();

        assert_eq!(doc.root_node().value(), json!({"outer": {"list": ["x"]}}));
        assert_eq!(doc.node(outer).unwrap().value(), json!({"list": ["x"]}));
    }

    #[test]
    fn appending_attached_node_moves_it() {
        let mut doc = Document::from_value(&json!({"a": {"x": 1}, "b": {}})).unwrap();
        let x = doc.resolve(doc.root(), "a.x").unwrap();
        let b = doc.resolve(doc.root(), "b").unwrap();

        doc.append_child(b, x).unwrap();
        assert_eq!(doc.root_node().value(), json!({"a": {}, "b": {"x": 1}}));
        assert_eq!(doc.node(x).unwrap().parent().unwrap().id(), b);
    }

    #[test]
    fn appending_ancestor_into_descendant_is_a_cycle() {
        let mut doc = Document::from_value(&json!({"a": {"b": {}}})).unwrap();
        let a = doc.resolve(doc.root(), "a").unwrap();
        let b = doc.resolve(doc.root(), "a.b").unwrap();

        assert!(matches!(doc.append_child(b, a), Err(Error::Cycle)));
        assert!(matches!(doc.append_child(a, a), Err(Error::Cycle)));
        assert_eq!(doc.root_node().value(), json!({"a": {"b": {}}}));
    }

    #[test]
    fn root_cannot_be_reparented() {
        let mut doc = Document::new();
        let holder = doc.create_array("");
        assert!(matches!(
            doc.append_child(holder, doc.root()),
            Err(Error::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn set_object_rebuilds_children() {
        let mut doc = Document::from_value(&json!({"o": {"old": 1}})).unwrap();
        let o = doc.resolve(doc.root(), "o").unwrap();
        let old = doc.resolve(doc.root(), "o.old").unwrap();

        doc.set(o, &json!({"new": [1, 2], "other": null})).unwrap();

        assert!(!doc.contains(old));
        assert_eq!(doc.node(o).unwrap().children_len(), 2);
        assert_eq!(
            doc.root_node().value(),
            json!({"o": {"new": [1, 2], "other": null}})
        );
        let new = doc.resolve(doc.root(), "o.new[1]").unwrap();
        assert_eq!(doc.node(new).unwrap().value(), json!(2));
    }

    #[test]
    fn set_wrong_shape_leaves_node_untouched() {
        let mut doc = Document::from_value(&json!({"a": [1, 2]})).unwrap();
        let a = doc.resolve(doc.root(), "a").unwrap();

        let err = doc.set(a, &json!({"k": 1})).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidValueType {
                expected: "array",
                found: "object"
            }
        ));
        assert_eq!(doc.root_node().value(), json!({"a": [1, 2]}));
        assert_eq!(doc.node(a).unwrap().children_len(), 2);
    }

    #[test]
    fn set_scalar_replaces_payload() {
        let mut doc = Document::from_value(&json!({"s": "before"})).unwrap();
        let s = doc.resolve(doc.root(), "s").unwrap();

        doc.set(s, &json!(42)).unwrap();
        assert_eq!(doc.root_node().value(), json!({"s": 42}));
        assert!(doc.set(s, &json!([1])).is_err());
    }

    #[test]
    fn set_too_deep_fails_without_changes() {
        let config = Config {
            max_depth: 2,
            ..Config::default()
        };
        let mut doc = Document::from_value_with_config(&json!({"a": {}}), config).unwrap();
        let a = doc.resolve(doc.root(), "a").unwrap();
        let before = doc.len();

        let err = doc.set(a, &json!({"b": {"c": {}}})).unwrap_err();
        assert!(matches!(err, Error::DepthLimitExceeded { limit: 2 }));
        assert_eq!(doc.len(), before);
        assert_eq!(doc.root_node().value(), json!({"a": {}}));
    }

    #[test]
    fn set_counts_enclosing_containers() {
        let config = Config {
            max_depth: 3,
            ..Config::default()
        };
        let mut doc = Document::from_value_with_config(&json!({"a": {"b": {}}}), config).unwrap();
        let b = doc.resolve(doc.root(), "a.b").unwrap();

        assert!(matches!(
            doc.set(b, &json!({"c": {}})),
            Err(Error::DepthLimitExceeded { limit: 3 })
        ));
        doc.set(b, &json!({"c": 1})).unwrap();
        assert_eq!(doc.root_node().value(), json!({"a": {"b": {"c": 1}}}));
    }

    #[test]
    fn append_beyond_depth_limit_fails() {
        let config = Config {
            max_depth: 3,
            ..Config::default()
        };
        let mut doc = Document::with_config(config);
        let a = doc.create_object("a");
        doc.append_child(doc.root(), a).unwrap();
        let b = doc.create_array("b");
        doc.append_child(a, b).unwrap();

        let deep = doc.build("", &json!([1])).unwrap();
        assert!(matches!(
            doc.append_child(b, deep),
            Err(Error::DepthLimitExceeded { limit: 3 })
        ));
        assert!(doc.node(deep).unwrap().parent().is_none());

        let flat = doc.create_scalar("", 1).unwrap();
        doc.append_child(b, flat).unwrap();
        assert_eq!(doc.root_node().value(), json!({"a": {"b": [1]}}));
    }

    #[test]
    fn assembled_chain_stays_parseable() {
        let mut doc = Document::new();
        let mut parent = doc.root();
        let mut refused = None;
        for level in 0..300 {
            let next = doc.create_object("k");
            if let Err(err) = doc.append_child(parent, next) {
                refused = Some((level, err));
                break;
            }
            parent = next;
        }
        let (level, err) = refused.unwrap();
        assert_eq!(level, 126);
        assert!(matches!(err, Error::DepthLimitExceeded { limit: 127 }));

        let text = doc.to_json_string(doc.root()).unwrap();
        let reparsed = Document::parse(text.as_bytes()).unwrap();
        assert_eq!(reparsed.root_node().value(), doc.root_node().value());
    }

    #[test]
    fn rename_moves_mirror_key() {
        let mut doc = Document::from_value(&json!({"o": {"a": 1, "b": 2}})).unwrap();
        let a = doc.resolve(doc.root(), "o.a").unwrap();

        doc.rename(a, "c").unwrap();
        assert_eq!(doc.root_node().value(), json!({"o": {"b": 2, "c": 1}}));
        assert!(matches!(
            doc.rename(a, "b"),
            Err(Error::DuplicateKey { .. })
        ));
        assert!(matches!(doc.rename(a, ""), Err(Error::MissingName)));
    }

    #[test]
    fn rename_array_element_is_unsupported() {
        let mut doc = Document::from_value(&json!([1])).unwrap();
        let first = doc.resolve(doc.root(), "[0]").unwrap();
        assert!(matches!(
            doc.rename(first, "x"),
            Err(Error::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn detach_keeps_subtree_alive() {
        let mut doc = Document::from_value(&json!({"a": {"b": 1}, "c": {}})).unwrap();
        let a = doc.resolve(doc.root(), "a").unwrap();
        let c = doc.resolve(doc.root(), "c").unwrap();

        assert!(doc.detach(a).unwrap());
        assert!(!doc.detach(a).unwrap());
        assert_eq!(doc.root_node().value(), json!({"c": {}}));
        assert_eq!(doc.node(a).unwrap().value(), json!({"b": 1}));

        doc.append_child(c, a).unwrap();
        assert_eq!(doc.root_node().value(), json!({"c": {"a": {"b": 1}}}));
    }

    #[test]
    fn delete_array_element_preserves_order() {
        let mut doc = Document::from_value(&json!({"arr": [1, 2, 3, 4]})).unwrap();
        let second = doc.resolve(doc.root(), "arr[1]").unwrap();

        doc.delete(second).unwrap();
        assert!(!doc.contains(second));
        assert_eq!(doc.root_node().value(), json!({"arr": [1, 3, 4]}));
    }

    #[test]
    fn delete_frees_descendants() {
        let mut doc = Document::from_value(&json!({"a": {"b": [1, 2]}})).unwrap();
        let a = doc.resolve(doc.root(), "a").unwrap();
        let one = doc.resolve(doc.root(), "a.b[0]").unwrap();

        doc.delete(a).unwrap();
        assert!(!doc.contains(one));
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn delete_root_is_noop() {
        let mut doc = Document::from_value(&json!({"a": 1})).unwrap();
        doc.delete(doc.root()).unwrap();
        assert_eq!(doc.root_node().value(), json!({"a": 1}));
    }

    #[test]
    fn discard_frees_parentless_subtrees() {
        let mut doc = Document::from_value(&json!({"a": {"b": [1, 2]}, "c": 3})).unwrap();
        let a = doc.resolve(doc.root(), "a").unwrap();
        let before = doc.len();

        doc.detach(a).unwrap();
        doc.delete(a).unwrap();
        assert!(doc.contains(a));

        assert_eq!(doc.discard(a).unwrap(), 4);
        assert!(!doc.contains(a));
        assert_eq!(doc.len(), before - 4);
        assert_eq!(doc.root_node().value(), json!({"c": 3}));

        let orphans: Vec<_> = (0..100).map(|_| doc.create_object("o")).collect();
        for id in orphans {
            doc.discard(id).unwrap();
        }
        assert_eq!(doc.len(), before - 4);
    }

    #[test]
    fn discard_detaches_attached_nodes() {
        let mut doc = Document::from_value(&json!({"arr": [1, [2], 3]})).unwrap();
        let inner = doc.resolve(doc.root(), "arr[1]").unwrap();

        assert_eq!(doc.discard(inner).unwrap(), 2);
        assert_eq!(doc.root_node().value(), json!({"arr": [1, 3]}));
        assert!(matches!(doc.discard(inner), Err(Error::InvalidNode)));
        assert!(matches!(
            doc.discard(doc.root()),
            Err(Error::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn stale_ids_are_rejected() {
        let mut doc = Document::from_value(&json!({"a": 1})).unwrap();
        let a = doc.resolve(doc.root(), "a").unwrap();
        doc.delete(a).unwrap();

        assert!(doc.node(a).is_none());
        assert!(matches!(doc.set(a, &json!(2)), Err(Error::InvalidNode)));
        assert!(matches!(doc.delete(a), Err(Error::InvalidNode)));
    }

    #[test]
    fn object_with_helper_builds_detached_subtree() {
        let mut doc = Document::new();
        let sub = object_with(&mut doc, "sub", json!({"k": [true]}));
        assert!(doc.node(sub).unwrap().parent().is_none());
        doc.append_child(doc.root(), sub).unwrap();
        assert_eq!(doc.to_json_string(doc.root()).unwrap(), r#"{"sub":{"k":[true]}}"#);
    }
}
