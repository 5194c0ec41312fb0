#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! JSON wire form of trees.
//!
//! Nodes are objects with a `value`, an optional `balance` or `color`, and
//! `left`/`right` children that are either nested nodes or `null`. Trees can
//! be as deep as they have nodes, so conversion never recurses and requests
//! are parsed without serde_json's nesting limit.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de::DeserializeOwned};
use serde_json::{Map, Value};

use super::{Annotation, Color, NodeId, Side, Tree};
use crate::error::TreeError;

/// True for the two encodings of an absent tree: `null` and `{}`.
fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Reads an optional scalar field; `null` counts as absent.
fn optional<'a>(record: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    record.get(key).filter(|value| !value.is_null())
}

/// Reads the `left` or `right` link of a node record.
fn child<'a>(record: &'a Map<String, Value>, side: Side) -> Result<Option<&'a Value>, String> {
    let key = match side {
        Side::Left => "left",
        Side::Right => "right",
    };
    match optional(record, key) {
        None => Ok(None),
        Some(node @ Value::Object(_)) => Ok(Some(node)),
        Some(other) => Err(format!("'{key}' must be a node or null, got {other}")),
    }
}

/// Decodes the scalar fields of one node record.
fn fields<A: Annotation>(node: &Value) -> Result<(i64, A, &Map<String, Value>), TreeError> {
    let invalid = |msg: String| TreeError::invalid(format!("{} - {msg}", A::KIND));
    let Value::Object(record) = node else {
        return Err(invalid(format!("expected a node object, got {node}")));
    };
    let value = record
        .get("value")
        .and_then(Value::as_i64)
        .ok_or_else(|| invalid("each node needs an integer 'value'".to_string()))?;
    let balance = optional(record, "balance")
        .map(|balance| {
            balance
                .as_i64()
                .ok_or_else(|| invalid(format!("node {value}: 'balance' must be an integer")))
        })
        .transpose()?;
    let color = optional(record, "color")
        .map(|color| {
            Color::deserialize(color)
                .map_err(|e| invalid(format!("node {value}: invalid 'color' - {e}")))
        })
        .transpose()?;
    let annotation = A::from_wire(balance, color).map_err(|e| match e {
        TreeError::InvalidFormat(msg) => TreeError::invalid(format!("node {value}: {msg}")),
        other => other,
    })?;
    Ok((value, annotation, record))
}

impl<A: Annotation> Tree<A> {
    /// Parses a tree from its JSON wire form, rejecting trees with more than
    /// `max_nodes` nodes.
    pub fn from_json_limited(value: &Value, max_nodes: usize) -> Result<Self, TreeError> {
        let mut tree = Tree::new();
        if is_absent(value) {
            return Ok(tree);
        }
        let mut stack: Vec<(&Value, Option<(NodeId, Side)>)> = vec![(value, None)];
        let mut count = 0usize;
        while let Some((node, slot)) = stack.pop() {
            count += 1;
            if count > max_nodes {
                return Err(TreeError::invalid(format!(
                    "{} has more than {max_nodes} nodes",
                    A::KIND
                )));
            }
            let (value, annotation, record) = fields::<A>(node)?;
            let id = tree.alloc(value, annotation);
            match slot {
                Some((parent, side)) => tree.set_child(parent, side, Some(id)),
                None => tree.set_root(Some(id)),
            }
            for side in [Side::Right, Side::Left] {
                let link = child(record, side).map_err(|msg| {
                    TreeError::invalid(format!("{} - node {value}: {msg}", A::KIND))
                })?;
                if let Some(link) = link {
                    stack.push((link, Some((id, side))));
                }
            }
        }
        Ok(tree)
    }

    /// Parses a tree from its JSON wire form using the configured node limit.
    pub fn from_json(value: &Value) -> Result<Self, TreeError> {
        Self::from_json_limited(value, crate::config::get().max_nodes())
    }

    /// Converts the tree into JSON; `null` for the empty tree.
    ///
    /// Children are built before their parents, so no call depends on the
    /// depth of the tree.
    pub fn to_json(&self) -> Value {
        let mut built: HashMap<NodeId, Value> = HashMap::new();
        for id in self.postorder() {
            let mut record = Map::new();
            record.insert("value".into(), Value::from(self.value(id)));
            match self.annotation(id).to_wire() {
                (Some(balance), _) => {
                    record.insert("balance".into(), Value::from(balance));
                }
                (None, Some(color)) => {
                    record.insert("color".into(), Value::String(color.to_string()));
                }
                (None, None) => {}
            }
            let mut link = |node: Option<NodeId>| {
                node.and_then(|node| built.remove(&node))
                    .unwrap_or(Value::Null)
            };
            let left = link(self.left(id));
            let right = link(self.right(id));
            record.insert("left".into(), left);
            record.insert("right".into(), right);
            built.insert(id, Value::Object(record));
        }
        self.root()
            .and_then(|root| built.remove(&root))
            .unwrap_or(Value::Null)
    }
}

impl<A: Annotation> Serialize for Tree<A> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de, A: Annotation> Deserialize<'de> for Tree<A> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Tree::from_json(&value).map_err(serde::de::Error::custom)
    }
}

/// Parses JSON text of any nesting depth.
///
/// The parser grows its stack on demand instead of stopping at serde_json's
/// default limit of 128 levels.
pub fn from_str_unbounded<T: DeserializeOwned>(raw: &str) -> serde_json::Result<T> {
    let mut de = serde_json::Deserializer::from_str(raw);
    de.disable_recursion_limit();
    let parsed = T::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(parsed)
}

/// Serializes `value` of any nesting depth as JSON text.
pub fn to_vec_unbounded<T: Serialize>(value: &T, pretty: bool) -> serde_json::Result<Vec<u8>> {
    let mut out = Vec::new();
    if pretty {
        let mut ser = serde_json::Serializer::pretty(&mut out);
        value.serialize(serde_stacker::Serializer::new(&mut ser))?;
    } else {
        let mut ser = serde_json::Serializer::new(&mut out);
        value.serialize(serde_stacker::Serializer::new(&mut ser))?;
    }
    Ok(out)
}
