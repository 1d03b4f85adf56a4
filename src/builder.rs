//! Converts decoded JSON values into node subtrees.

use serde_json::Value;

use crate::document::Document;
use crate::error::{Error, Result};
use crate::node::{NodeData, NodeId, Payload};

impl Document {
    /// Builds a detached subtree for `value`, named `name`.
    ///
    /// Mappings become objects with one child per entry, sequences become arrays and everything
    /// else becomes a scalar. Values nested deeper than [`Config::max_depth`](crate::Config) are
    /// rejected before anything is created.
    pub fn build(&mut self, name: &str, value: &Value) -> Result<NodeId> {
        self.check_depth(0, nesting_depth(value))?;
        Ok(self.mint(name, value))
    }

    /// `above` containers enclose a subtree that nests `depth` levels itself.
    pub(crate) fn check_depth(&self, above: usize, depth: usize) -> Result<()> {
        let limit = self.config.max_depth;
        if above + depth > limit {
            return Err(Error::DepthLimitExceeded { limit });
        }
        Ok(())
    }

    /// Recursion depth is bounded by a prior [`Document::check_depth`].
    ///
    /// Every container's mirror is its own copy of its subtree, so minting costs grow with the
    /// subtree size times its depth.
    fn mint(&mut self, name: &str, value: &Value) -> NodeId {
        let payload = self.mint_payload(value);
        let id = self.nodes.insert(NodeData::new(name, payload));
        self.adopt_children(id);
        id
    }

    /// Builds the payload for `value` with freshly minted, not yet adopted children.
    pub(crate) fn mint_payload(&mut self, value: &Value) -> Payload {
        match value {
            Value::Object(entries) => Payload::Object {
                children: entries
                    .iter()
                    .map(|(key, entry)| (key.clone(), self.mint(key, entry)))
                    .collect(),
                mirror: entries.clone(),
            },
            Value::Array(items) => Payload::Array {
                children: items.iter().map(|item| self.mint("", item)).collect(),
                mirror: items.clone(),
            },
            scalar => Payload::Scalar(scalar.clone()),
        }
    }
}

/// Number of nested objects/arrays; scalars have depth 0.
///
/// Iterative so that measuring adversarial input cannot overflow the stack itself.
pub fn nesting_depth(value: &Value) -> usize {
    let mut deepest = 0;
    let mut stack = vec![(value, 0usize)];
    while let Some((value, depth)) = stack.pop() {
        match value {
            Value::Object(entries) => {
                deepest = deepest.max(depth + 1);
                stack.extend(entries.values().map(|v| (v, depth + 1)));
            }
            Value::Array(items) => {
                deepest = deepest.max(depth + 1);
                stack.extend(items.iter().map(|v| (v, depth + 1)));
            }
            _ => {}
        }
    }
    deepest
}
