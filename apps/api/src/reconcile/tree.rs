//! Review State tree and its path-addressed mutator.
//!
//! Nodes are immutable and reference-counted. `set` copies only the ancestors
//! on the path, so every subtree off the path is shared with the input and
//! `Arc::ptr_eq` can be used for change detection.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    List(Arc<Vec<Node>>),
    Map(Arc<BTreeMap<String, Node>>),
    Leaf(Value),
}

#[derive(Debug, Error, PartialEq)]
pub enum PathError {
    #[error("path is empty")]
    Empty,

    #[error("no node at '{0}'")]
    Missing(String),

    #[error("'{0}' is not a valid list index")]
    BadIndex(String),

    #[error("'{0}' does not hold a boolean")]
    NotBoolean(String),
}

impl Node {
    pub fn map(entries: BTreeMap<String, Node>) -> Self {
        Node::Map(Arc::new(entries))
    }

    pub fn list(items: Vec<Node>) -> Self {
        Node::List(Arc::new(items))
    }

    /// Converts plain JSON into a tree: objects become maps, arrays lists.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(items) => Node::list(items.into_iter().map(Node::from_value).collect()),
            Value::Object(map) => Node::map(
                map.into_iter()
                    .map(|(k, v)| (k, Node::from_value(v)))
                    .collect(),
            ),
            leaf => Node::Leaf(leaf),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Node::Leaf(v) => v.clone(),
            Node::List(items) => Value::Array(items.iter().map(Node::to_value).collect()),
            Node::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_value()))
                    .collect(),
            ),
        }
    }

    /// One step down: a map key, or a list index written as a string.
    pub fn get(&self, segment: &str) -> Option<&Node> {
        match self {
            Node::Map(map) => map.get(segment),
            Node::List(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            Node::Leaf(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Leaf(Value::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Leaf(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Node]> {
        match self {
            Node::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Node>> {
        match self {
            Node::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&Node> {
        path.iter()
            .try_fold(self, |node, segment| node.get(segment.as_ref()))
    }

    /// Returns a copy of `self` with the node at `path` replaced by `value`.
    ///
    /// The last segment may add a new key to a map. Every earlier segment must
    /// already exist, and list indices must be in range.
    pub fn with_path<S: AsRef<str>>(&self, path: &[S], value: Node) -> Result<Node, PathError> {
        let (head, rest) = path.split_first().ok_or(PathError::Empty)?;
        let head = head.as_ref();

        match self {
            Node::Map(map) => {
                let child = match (map.get(head), rest.is_empty()) {
                    (_, true) => value,
                    (Some(existing), false) => existing.with_path(rest, value)?,
                    (None, false) => return Err(PathError::Missing(head.to_string())),
                };
                let mut copy = (**map).clone();
                copy.insert(head.to_string(), child);
                Ok(Node::Map(Arc::new(copy)))
            }
            Node::List(items) => {
                let idx = head
                    .parse::<usize>()
                    .ok()
                    .filter(|i| *i < items.len())
                    .ok_or_else(|| PathError::BadIndex(head.to_string()))?;
                let child = if rest.is_empty() {
                    value
                } else {
                    items[idx].with_path(rest, value)?
                };
                let mut copy = (**items).clone();
                copy[idx] = child;
                Ok(Node::List(Arc::new(copy)))
            }
            Node::Leaf(_) => Err(PathError::Missing(head.to_string())),
        }
    }

    /// Same node, not just equal content.
    #[cfg(test)]
    pub fn ptr_eq(&self, other: &Node) -> bool {
        match (self, other) {
            (Node::Map(a), Node::Map(b)) => Arc::ptr_eq(a, b),
            (Node::List(a), Node::List(b)) => Arc::ptr_eq(a, b),
            (Node::Leaf(a), Node::Leaf(b)) => a == b,
            _ => false,
        }
    }
}

/// Working copy of a document during one review session.
///
/// Built by `reconcile::review::build`, read back by `reconcile::projector`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewState {
    root: Node,
}

impl ReviewState {
    pub(crate) fn from_root(root: Node) -> Self {
        Self { root }
    }

    #[cfg(test)]
    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn get<S: AsRef<str>>(&self, path: &[S]) -> Option<&Node> {
        self.root.get_path(path)
    }

    pub fn set<S: AsRef<str>>(&self, path: &[S], value: Node) -> Result<ReviewState, PathError> {
        Ok(ReviewState {
            root: self.root.with_path(path, value)?,
        })
    }

    /// Flips a boolean leaf, normally a `visible` flag.
    pub fn toggle<S: AsRef<str>>(&self, path: &[S]) -> Result<ReviewState, PathError> {
        let current = self
            .get(path)
            .ok_or_else(|| PathError::Missing(join(path)))?
            .as_bool()
            .ok_or_else(|| PathError::NotBoolean(join(path)))?;
        self.set(path, Node::Leaf(Value::Bool(!current)))
    }
}

fn join<S: AsRef<str>>(path: &[S]) -> String {
    path.iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(".")
}

/// Splits a dotted path such as `experience.items.0.visible`.
pub fn parse_path(path: &str) -> Vec<String> {
    path.split('.')
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state() -> ReviewState {
        ReviewState::from_root(Node::from_value(json!({
            "experience": {
                "visible": true,
                "items": [
                    {"id": "a", "visible": true, "company": {"value": "Acme", "visible": true}},
                    {"id": "b", "visible": true, "company": {"value": "Globex", "visible": true}}
                ]
            },
            "projects": {"visible": true, "items": []}
        })))
    }

    #[test]
    fn test_get_walks_maps_and_lists() {
        let s = state();
        let company = s.get(&["experience", "items", "1", "company", "value"]).unwrap();
        assert_eq!(company.as_str(), Some("Globex"));
    }

    #[test]
    fn test_get_missing_segment_is_none() {
        let s = state();
        assert!(s.get(&["experience", "items", "9"]).is_none());
        assert!(s.get(&["nope", "visible"]).is_none());
        assert!(s.get(&["experience", "items", "x"]).is_none());
    }

    #[test]
    fn test_set_leaves_input_untouched() {
        let s = state();
        let snapshot = s.root().to_value();

        let next = s
            .set(&["experience", "items", "0", "company", "value"], Node::Leaf(json!("Initech")))
            .unwrap();

        assert_eq!(s.root().to_value(), snapshot);
        assert_eq!(
            next.get(&["experience", "items", "0", "company", "value"]).and_then(Node::as_str),
            Some("Initech")
        );
    }

    #[test]
    fn test_set_shares_untouched_subtrees() {
        let s = state();
        let next = s
            .set(&["experience", "items", "0", "visible"], Node::Leaf(json!(false)))
            .unwrap();

        assert!(!next.root().ptr_eq(s.root()));
        assert!(!next.get(&["experience"]).unwrap().ptr_eq(s.get(&["experience"]).unwrap()));
        assert!(next.get(&["projects"]).unwrap().ptr_eq(s.get(&["projects"]).unwrap()));
        assert!(next
            .get(&["experience", "items", "1"])
            .unwrap()
            .ptr_eq(s.get(&["experience", "items", "1"]).unwrap()));
        assert!(next
            .get(&["experience", "items", "0", "company"])
            .unwrap()
            .ptr_eq(s.get(&["experience", "items", "0", "company"]).unwrap()));
    }

    #[test]
    fn test_set_inserts_new_final_key() {
        let s = state();
        let next = s
            .set(&["experience", "items", "0", "location"], Node::Leaf(json!("Remote")))
            .unwrap();
        assert!(next.get(&["experience", "items", "0", "location"]).is_some());
    }

    #[test]
    fn test_set_rejects_bad_paths() {
        let s = state();
        assert_eq!(
            s.set(&["missing", "visible"], Node::Leaf(json!(true))),
            Err(PathError::Missing("missing".into()))
        );
        assert_eq!(
            s.set(&["experience", "items", "5"], Node::Leaf(json!(true))),
            Err(PathError::BadIndex("5".into()))
        );
        assert_eq!(
            s.set::<&str>(&[], Node::Leaf(json!(true))),
            Err(PathError::Empty)
        );
    }

    #[test]
    fn test_toggle_flips_visibility_twice() {
        let s = state();
        let hidden = s.toggle(&["experience", "visible"]).unwrap();
        assert_eq!(hidden.get(&["experience", "visible"]).and_then(Node::as_bool), Some(false));
        let shown = hidden.toggle(&["experience", "visible"]).unwrap();
        assert_eq!(shown, s);
    }

    #[test]
    fn test_toggle_requires_boolean() {
        let s = state();
        assert!(matches!(
            s.toggle(&["experience", "items", "0", "id"]),
            Err(PathError::NotBoolean(_))
        ));
    }

    #[test]
    fn test_state_serde_round_trip() {
        let s = state();
        let json = serde_json::to_string(&s).unwrap();
        let back: ReviewState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn test_parse_path() {
        assert_eq!(parse_path("skills.items.0.visible"), vec!["skills", "items", "0", "visible"]);
        assert!(parse_path("").is_empty());
    }
}
