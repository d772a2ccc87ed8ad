use crate::errors::AppError;
use crate::models::portfolio::{PortfolioDocument, SectionContent, SectionId};
use crate::reconcile::schema::{normalize, SectionSchema};

/// Removes one item from a section.
///
/// Record lists are addressed by record id, grouped sections by group name
/// (case-insensitive) and scalar lists by the string itself.
pub fn remove_item(
    doc: &mut PortfolioDocument,
    section: SectionId,
    item_id: &str,
) -> Result<(), AppError> {
    let not_found = || AppError::NotFound(format!("item '{item_id}' not found in '{section}'"));

    let schema = section.schema();
    if let SectionSchema::ScalarList = schema {
        let SectionContent::Strings(mut items) = doc.section_content(section) else {
            return Err(not_found());
        };
        let pos = items.iter().position(|s| s == item_id).ok_or_else(not_found)?;
        items.remove(pos);
        doc.set_section(section, SectionContent::Strings(items));
        return Ok(());
    }

    let records = doc.records_mut(section).ok_or_else(not_found)?;
    let pos = match schema {
        SectionSchema::Grouped { name_field, .. } => {
            let wanted = normalize(Some(&serde_json::Value::String(item_id.to_string())));
            records
                .iter()
                .position(|r| normalize(r.fields.get(name_field)) == wanted)
        }
        _ => records.iter().position(|r| r.id.as_deref() == Some(item_id)),
    }
    .ok_or_else(not_found)?;
    records.remove(pos);
    Ok(())
}

/// Empties a section and drops its display settings.
pub fn remove_section(doc: &mut PortfolioDocument, section: SectionId) {
    let empty = match doc.section_content(section) {
        SectionContent::Strings(_) => SectionContent::Strings(Vec::new()),
        SectionContent::Records(_) => SectionContent::Records(Vec::new()),
    };
    doc.set_section(section, empty);

    let key = section.key();
    doc.section_order.retain(|k| k != key);
    doc.section_titles.remove(key);
    doc.section_visibility.remove(key);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> PortfolioDocument {
        serde_json::from_value(json!({
            "skills": [{"category": "Languages", "items": ["Rust"]}],
            "experience": [{"id": "e1", "company": "Acme"}, {"id": "e2", "company": "Globex"}],
            "achievements": ["Award", "Prize"],
            "sectionOrder": ["skills", "experience", "achievements"],
            "sectionTitles": {"experience": "Work"},
            "sectionVisibility": {"experience": false}
        }))
        .unwrap()
    }

    #[test]
    fn test_remove_record_by_id() {
        let mut d = doc();
        remove_item(&mut d, SectionId::Experience, "e1").unwrap();
        assert_eq!(d.experience.len(), 1);
        assert_eq!(d.experience[0].id.as_deref(), Some("e2"));
    }

    #[test]
    fn test_remove_scalar_by_value() {
        let mut d = doc();
        remove_item(&mut d, SectionId::Achievements, "Prize").unwrap();
        assert_eq!(d.achievements, vec!["Award"]);
    }

    #[test]
    fn test_remove_group_by_name() {
        let mut d = doc();
        remove_item(&mut d, SectionId::Skills, " languages").unwrap();
        assert!(d.skills.is_empty());
    }

    #[test]
    fn test_remove_missing_item_is_not_found() {
        let mut d = doc();
        let err = remove_item(&mut d, SectionId::Experience, "nope").unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(d.experience.len(), 2);
    }

    #[test]
    fn test_remove_section_clears_display_settings() {
        let mut d = doc();
        remove_section(&mut d, SectionId::Experience);
        assert!(d.experience.is_empty());
        assert_eq!(d.section_order, vec!["skills", "achievements"]);
        assert!(d.section_titles.is_empty());
        assert!(d.section_visibility.is_empty());
    }
}
