use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::reconcile::tree::Node;

pub const VALUE_KEY: &str = "value";
pub const VISIBLE_KEY: &str = "visible";

/// A reviewable value and whether it survives projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field<T> {
    pub value: T,
    pub visible: bool,
}

impl<T> Field<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            visible: true,
        }
    }
}

impl Field<Value> {
    /// Reads a wrapper back out of the review tree. `None` if `node` is not
    /// shaped like one.
    pub fn from_node(node: &Node) -> Option<Self> {
        let value = node.get(VALUE_KEY)?.to_value();
        let visible = node.get(VISIBLE_KEY)?.as_bool()?;
        Some(Self { value, visible })
    }
}

impl From<Field<Value>> for Node {
    fn from(field: Field<Value>) -> Self {
        let mut map = BTreeMap::new();
        map.insert(VALUE_KEY.to_string(), Node::Leaf(field.value));
        map.insert(VISIBLE_KEY.to_string(), Node::Leaf(Value::Bool(field.visible)));
        Node::Map(Arc::new(map))
    }
}
