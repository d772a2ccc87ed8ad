//! Document Projector: Review State -> canonical document.
//!
//! Hidden sections project as empty lists, hidden items and fields are
//! dropped. The review tree keeps them, so flipping `visible` back restores
//! them. Anything the tree does not carry comes from `base`.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::models::portfolio::{
    PersonalInfo, PortfolioDocument, Provenance, Record, SectionContent, SectionId,
};
use crate::reconcile::field::{Field, VALUE_KEY, VISIBLE_KEY};
use crate::reconcile::review::{
    EPHEMERAL_ID_KEY, GROUP_KEY, ID_KEY, ITEMS_KEY, PERSONAL_INFO_KEY, RESERVED_ITEM_KEYS,
    SOCIAL_PROFILES_KEY, STATUS_KEY,
};
use crate::reconcile::schema::SectionSchema;
use crate::reconcile::tree::{Node, ReviewState};

pub fn project(state: &ReviewState, base: &PortfolioDocument) -> PortfolioDocument {
    let mut doc = base.clone();

    for field in PersonalInfo::REVIEWED {
        let Some(wrapped) = state
            .get(&[PERSONAL_INFO_KEY, field])
            .and_then(Field::from_node)
        else {
            continue;
        };
        if let Some(slot) = doc.personal_info.slot_mut(field) {
            *slot = if wrapped.visible {
                as_text(&wrapped.value)
            } else {
                None
            };
        }
    }

    if let Some(profiles) = state.get(&[SOCIAL_PROFILES_KEY]).and_then(Node::as_map) {
        doc.social_profiles = profiles
            .iter()
            .filter_map(|(provider, node)| {
                let field = Field::from_node(node)?;
                if !field.visible {
                    return None;
                }
                Some((provider.clone(), as_text(&field.value)?))
            })
            .collect::<BTreeMap<_, _>>();
    }

    for id in SectionId::ALL {
        if let Some(section) = state.get(&[id.key()]) {
            doc.set_section(id, project_section(id, section));
        }
    }

    doc
}

fn project_section(id: SectionId, section: &Node) -> SectionContent {
    let visible = section
        .get(VISIBLE_KEY)
        .and_then(Node::as_bool)
        .unwrap_or(true);
    let items: &[Node] = if visible {
        section
            .get(ITEMS_KEY)
            .and_then(Node::as_list)
            .unwrap_or(&[])
    } else {
        &[]
    };
    let shown = items.iter().filter(|item| is_visible(item));

    match id.schema() {
        SectionSchema::ScalarList => SectionContent::Strings(
            shown
                .filter_map(|item| item.get(VALUE_KEY).and_then(Field::from_node))
                .filter(|field| field.visible)
                .filter_map(|field| as_text(&field.value))
                .collect(),
        ),
        SectionSchema::RecordList { .. } | SectionSchema::Grouped { .. } => {
            SectionContent::Records(shown.filter_map(unwrap_record).collect())
        }
    }
}

fn is_visible(node: &Node) -> bool {
    node.get(VISIBLE_KEY).and_then(Node::as_bool).unwrap_or(true)
}

/// Reads a record item back into canonical form, dropping hidden fields and
/// hidden list elements. Generated ids are not emitted.
pub fn unwrap_record(item: &Node) -> Option<Record> {
    let map = item.as_map()?;
    let ephemeral = map
        .get(EPHEMERAL_ID_KEY)
        .and_then(Node::as_bool)
        .unwrap_or(false);

    let id = if ephemeral {
        None
    } else {
        map.get(ID_KEY).and_then(Node::as_str).map(String::from)
    };
    let status = map
        .get(STATUS_KEY)
        .and_then(Node::as_str)
        .and_then(Provenance::parse);
    let merge_group_id = map.get(GROUP_KEY).and_then(Node::as_str).map(String::from);

    let mut fields = Map::new();
    for (name, node) in map.iter() {
        if RESERVED_ITEM_KEYS.contains(&name.as_str()) {
            continue;
        }
        if let Some(value) = unwrap_value(node) {
            fields.insert(name.clone(), value);
        }
    }

    Some(Record {
        id,
        status,
        merge_group_id,
        fields,
    })
}

fn unwrap_value(node: &Node) -> Option<Value> {
    if let Node::List(items) = node {
        return Some(Value::Array(
            items
                .iter()
                .filter_map(|item| match Field::from_node(item) {
                    Some(field) if field.visible => Some(field.value),
                    Some(_) => None,
                    None => Some(item.to_value()),
                })
                .collect(),
        ));
    }
    match Field::from_node(node) {
        Some(field) if field.visible => Some(field.value),
        Some(_) => None,
        None => Some(node.to_value()),
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::ids::SequentialIds;
    use crate::reconcile::review::build;
    use serde_json::json;

    fn doc() -> PortfolioDocument {
        serde_json::from_value(json!({
            "personalInfo": {"name": "Ada", "title": "Engineer", "phone": "555", "image": "me.png"},
            "socialProfiles": {"github": "https://github.com/ada", "x": "https://x.com/ada"},
            "skills": [{"category": "Languages", "items": ["Rust", "Go"]}],
            "experience": [
                {"id": "e1", "company": "Acme", "role": "Engineer", "bullets": ["Shipped", "Led"]},
                {"id": "e2", "company": "Globex", "role": "Lead", "mergeGroupId": "g", "status": "NEW"},
                {"id": "e3", "company": "Initech", "role": "Intern", "remote": true}
            ],
            "projects": [{"id": "p1", "title": "Engine", "techStack": []}],
            "achievements": ["A", "B"],
            "coursework": ["Compilers"],
            "customSections": [{"title": "Talks", "items": ["RustConf"]}],
            "sectionOrder": ["experience", "projects"],
            "sectionTitles": {"projects": "Things I Built"},
            "sectionVisibility": {"coursework": false},
            "theme": {"accent": "teal"}
        }))
        .unwrap()
    }

    #[test]
    fn test_untouched_state_projects_to_original() {
        let original = doc();
        let state = build(&original, &SequentialIds::new("r"));
        assert_eq!(project(&state, &original), original);
    }

    #[test]
    fn test_hidden_scalar_item_is_dropped() {
        let original = doc();
        let state = build(&original, &SequentialIds::new("r"))
            .toggle(&["achievements", "items", "0", "visible"])
            .unwrap();
        assert_eq!(project(&state, &original).achievements, vec!["B"]);
    }

    #[test]
    fn test_hidden_section_projects_empty_and_restores() {
        let original = doc();
        let state = build(&original, &SequentialIds::new("r"));
        let hidden = state.toggle(&["experience", "visible"]).unwrap();
        assert!(project(&hidden, &original).experience.is_empty());

        let restored = hidden.toggle(&["experience", "visible"]).unwrap();
        let projected = project(&restored, &original);
        assert_eq!(projected.experience, original.experience);
    }

    #[test]
    fn test_section_visibility_overrides_item_visibility() {
        let original = doc();
        let state = build(&original, &SequentialIds::new("r"))
            .toggle(&["experience", "items", "1", "visible"])
            .unwrap()
            .toggle(&["experience", "visible"])
            .unwrap();
        assert!(project(&state, &original).experience.is_empty());

        let shown = state.toggle(&["experience", "visible"]).unwrap();
        let ids: Vec<_> = project(&shown, &original)
            .experience
            .iter()
            .map(|r| r.id.clone().unwrap())
            .collect();
        assert_eq!(ids, vec!["e1", "e3"]);
    }

    #[test]
    fn test_hidden_fields_and_bullets_are_dropped() {
        let original = doc();
        let state = build(&original, &SequentialIds::new("r"))
            .toggle(&["experience", "items", "0", "role", "visible"])
            .unwrap()
            .toggle(&["experience", "items", "0", "bullets", "1", "visible"])
            .unwrap();
        let projected = project(&state, &original);
        let first = &projected.experience[0];
        assert!(first.fields.get("role").is_none());
        assert_eq!(first.string_list("bullets"), vec!["Shipped"]);
    }

    #[test]
    fn test_edited_value_is_projected() {
        let original = doc();
        let state = build(&original, &SequentialIds::new("r"))
            .set(
                &["experience", "items", "2", "company", "value"],
                Node::Leaf(json!("Initrode")),
            )
            .unwrap();
        assert_eq!(
            project(&state, &original).experience[2].field_str("company"),
            Some("Initrode")
        );
    }

    #[test]
    fn test_personal_info_visibility_and_passthrough() {
        let original = doc();
        let state = build(&original, &SequentialIds::new("r"))
            .toggle(&["personalInfo", "title", "visible"])
            .unwrap()
            .toggle(&["socialProfiles", "x", "visible"])
            .unwrap();
        let projected = project(&state, &original);
        assert_eq!(projected.personal_info.name.as_deref(), Some("Ada"));
        assert_eq!(projected.personal_info.title, None);
        assert_eq!(projected.personal_info.phone.as_deref(), Some("555"));
        assert_eq!(projected.personal_info.image.as_deref(), Some("me.png"));
        assert_eq!(projected.social_profiles.len(), 1);
        assert!(projected.social_profiles.contains_key("github"));
    }

    #[test]
    fn test_generated_ids_are_not_persisted() {
        let original = doc();
        let state = build(&original, &SequentialIds::new("r"));
        let projected = project(&state, &original);
        assert_eq!(projected.skills[0].id, None);
        assert_eq!(projected.custom_sections[0].id, None);
    }

    #[test]
    fn test_projection_survives_session_serialization() {
        let original = doc();
        let state = build(&original, &SequentialIds::new("r"));
        let json = serde_json::to_string(&state).unwrap();
        let restored: ReviewState = serde_json::from_str(&json).unwrap();
        assert_eq!(project(&restored, &original), original);
    }
}
