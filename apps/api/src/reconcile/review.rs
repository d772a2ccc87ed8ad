//! Review State Builder: canonical document -> Review State tree.
//!
//! Layout of the tree (keys mirror the document's JSON):
//!
//! ```text
//! personalInfo.<field>           {value, visible}
//! socialProfiles.<provider>      {value, visible}
//! <section>                      {visible, items: [...]}
//!   record item                  {id, visible, status?, mergeGroupId?, ephemeralId?,
//!                                 <field>: {value, visible} | [{value, visible}, ...]}
//!   scalar item                  {id, visible, value: {value, visible}}
//! ```

use std::collections::BTreeMap;

use serde_json::Value;

use crate::models::portfolio::{PersonalInfo, PortfolioDocument, Record, SectionId, SectionRef};
use crate::reconcile::field::{Field, VALUE_KEY, VISIBLE_KEY};
use crate::reconcile::ids::IdGenerator;
use crate::reconcile::tree::{Node, ReviewState};

pub const PERSONAL_INFO_KEY: &str = "personalInfo";
pub const SOCIAL_PROFILES_KEY: &str = "socialProfiles";
pub const ITEMS_KEY: &str = "items";
pub const ID_KEY: &str = "id";
pub const STATUS_KEY: &str = "status";
pub const GROUP_KEY: &str = "mergeGroupId";
/// Set on items whose id was generated here rather than read from the document.
pub const EPHEMERAL_ID_KEY: &str = "ephemeralId";

/// Item-level keys that are bookkeeping, not record content.
pub const RESERVED_ITEM_KEYS: [&str; 5] =
    [ID_KEY, STATUS_KEY, GROUP_KEY, EPHEMERAL_ID_KEY, VISIBLE_KEY];

pub fn build(doc: &PortfolioDocument, ids: &dyn IdGenerator) -> ReviewState {
    let mut root = BTreeMap::new();

    let personal: BTreeMap<String, Node> = PersonalInfo::REVIEWED
        .iter()
        .map(|field| {
            let value = doc
                .personal_info
                .get(field)
                .map(|s| Value::String(s.clone()))
                .unwrap_or(Value::Null);
            (field.to_string(), Node::from(Field::new(value)))
        })
        .collect();
    root.insert(PERSONAL_INFO_KEY.to_string(), Node::map(personal));

    let social: BTreeMap<String, Node> = doc
        .social_profiles
        .iter()
        .map(|(provider, url)| {
            (
                provider.clone(),
                Node::from(Field::new(Value::String(url.clone()))),
            )
        })
        .collect();
    root.insert(SOCIAL_PROFILES_KEY.to_string(), Node::map(social));

    for id in SectionId::ALL {
        let items = match doc.section(id) {
            SectionRef::Records(records) => records.iter().map(|r| wrap_record(r, ids)).collect(),
            SectionRef::Strings(strings) => {
                strings.iter().map(|s| wrap_scalar_item(s, ids)).collect()
            }
        };
        root.insert(id.key().to_string(), section_node(items));
    }

    ReviewState::from_root(Node::map(root))
}

pub fn section_node(items: Vec<Node>) -> Node {
    let mut section = BTreeMap::new();
    section.insert(VISIBLE_KEY.to_string(), Node::Leaf(Value::Bool(true)));
    section.insert(ITEMS_KEY.to_string(), Node::list(items));
    Node::map(section)
}

/// Wraps a record's content. A missing id is generated and flagged ephemeral.
pub fn wrap_record(record: &Record, ids: &dyn IdGenerator) -> Node {
    let mut item = BTreeMap::new();
    match &record.id {
        Some(id) => {
            item.insert(ID_KEY.to_string(), Node::Leaf(Value::String(id.clone())));
        }
        None => {
            item.insert(ID_KEY.to_string(), Node::Leaf(Value::String(ids.next_id())));
            item.insert(EPHEMERAL_ID_KEY.to_string(), Node::Leaf(Value::Bool(true)));
        }
    }
    item.insert(VISIBLE_KEY.to_string(), Node::Leaf(Value::Bool(true)));
    if let Some(status) = record.status {
        item.insert(
            STATUS_KEY.to_string(),
            Node::Leaf(Value::String(status.as_str().to_string())),
        );
    }
    if let Some(group) = &record.merge_group_id {
        item.insert(GROUP_KEY.to_string(), Node::Leaf(Value::String(group.clone())));
    }
    for (name, value) in &record.fields {
        if RESERVED_ITEM_KEYS.contains(&name.as_str()) {
            continue;
        }
        item.insert(name.clone(), wrap_value(value));
    }
    Node::map(item)
}

/// Arrays become lists of wrappers; anything else a single wrapper.
pub fn wrap_value(value: &Value) -> Node {
    match value {
        Value::Array(items) => Node::list(
            items
                .iter()
                .map(|v| Node::from(Field::new(v.clone())))
                .collect(),
        ),
        other => Node::from(Field::new(other.clone())),
    }
}

fn wrap_scalar_item(value: &str, ids: &dyn IdGenerator) -> Node {
    let mut item = BTreeMap::new();
    item.insert(ID_KEY.to_string(), Node::Leaf(Value::String(ids.next_id())));
    item.insert(VISIBLE_KEY.to_string(), Node::Leaf(Value::Bool(true)));
    item.insert(
        VALUE_KEY.to_string(),
        Node::from(Field::new(Value::String(value.to_string()))),
    );
    Node::map(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::ids::SequentialIds;
    use serde_json::json;

    fn doc() -> PortfolioDocument {
        serde_json::from_value(json!({
            "personalInfo": {"name": "Ada", "phone": "555"},
            "socialProfiles": {"github": "https://github.com/ada"},
            "skills": [{"category": "Languages", "items": ["Rust", "Go"]}],
            "experience": [{
                "id": "e1", "status": "NEW", "mergeGroupId": "g1",
                "company": "Acme", "techStack": ["Rust"]
            }],
            "achievements": ["A", "B"]
        }))
        .unwrap()
    }

    #[test]
    fn test_personal_info_fields_are_wrapped() {
        let state = build(&doc(), &SequentialIds::new("r"));
        let name = state.get(&["personalInfo", "name"]).unwrap();
        assert_eq!(Field::from_node(name), Some(Field::new(json!("Ada"))));
        let bio = state.get(&["personalInfo", "bio"]).unwrap();
        assert_eq!(Field::from_node(bio), Some(Field::new(Value::Null)));
        assert!(state.get(&["personalInfo", "phone"]).is_none());
    }

    #[test]
    fn test_record_items_keep_metadata_unwrapped() {
        let state = build(&doc(), &SequentialIds::new("r"));
        let item = state.get(&["experience", "items", "0"]).unwrap();
        assert_eq!(item.get("id").and_then(Node::as_str), Some("e1"));
        assert_eq!(item.get("status").and_then(Node::as_str), Some("NEW"));
        assert_eq!(item.get("mergeGroupId").and_then(Node::as_str), Some("g1"));
        assert_eq!(item.get("visible").and_then(Node::as_bool), Some(true));
        assert!(item.get(EPHEMERAL_ID_KEY).is_none());
        assert_eq!(
            item.get("company").map(Node::to_value),
            Some(json!({"value": "Acme", "visible": true}))
        );
        assert_eq!(
            item.get("techStack").map(Node::to_value),
            Some(json!([{"value": "Rust", "visible": true}]))
        );
    }

    #[test]
    fn test_missing_ids_are_generated_and_flagged() {
        let state = build(&doc(), &SequentialIds::new("r"));
        let skill = state.get(&["skills", "items", "0"]).unwrap();
        assert!(skill.get("id").and_then(Node::as_str).unwrap().starts_with("r-"));
        assert_eq!(skill.get(EPHEMERAL_ID_KEY).and_then(Node::as_bool), Some(true));
    }

    #[test]
    fn test_scalar_items_are_wrapped() {
        let state = build(&doc(), &SequentialIds::new("r"));
        let second = state.get(&["achievements", "items", "1"]).unwrap();
        assert_eq!(
            second.get("value").map(Node::to_value),
            Some(json!({"value": "B", "visible": true}))
        );
        assert!(second.get("id").is_some());
    }

    #[test]
    fn test_absent_sections_build_as_empty_visible_lists() {
        let state = build(&PortfolioDocument::default(), &SequentialIds::new("r"));
        for id in SectionId::ALL {
            let section = state.get(&[id.key()]).unwrap();
            assert_eq!(section.get("visible").and_then(Node::as_bool), Some(true));
            assert_eq!(section.get("items").and_then(Node::as_list).map(<[Node]>::len), Some(0));
        }
    }

    #[test]
    fn test_rebuilding_yields_fresh_incidental_ids() {
        let ids = SequentialIds::new("r");
        let a = build(&doc(), &ids);
        let b = build(&doc(), &ids);
        assert_ne!(
            a.get(&["achievements", "items", "0", "id"]),
            b.get(&["achievements", "items", "0", "id"])
        );
    }
}
