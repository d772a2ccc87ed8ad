//! Change Summary: which top-level sections differ between two documents.

use crate::models::portfolio::{PortfolioDocument, SectionId};

/// Labels of the sections that changed, in a fixed order. `theme` is not
/// tracked.
pub fn summarize_changes(before: &PortfolioDocument, after: &PortfolioDocument) -> Vec<String> {
    let mut changes = Vec::new();

    if before.personal_info != after.personal_info {
        changes.push("Updated Personal Info".to_string());
    }
    if before.social_profiles != after.social_profiles {
        changes.push("Updated Social Profiles".to_string());
    }
    for id in SectionId::ALL {
        if before.section_content(id) != after.section_content(id) {
            changes.push(id.change_label().to_string());
        }
    }
    if before.section_order != after.section_order {
        changes.push("Updated Section Order".to_string());
    }
    if before.section_titles != after.section_titles {
        changes.push("Updated Section Titles".to_string());
    }
    if before.section_visibility != after.section_visibility {
        changes.push("Updated Section Visibility".to_string());
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> PortfolioDocument {
        serde_json::from_value(json!({
            "personalInfo": {"name": "Ada"},
            "projects": [{"id": "p1", "title": "Engine"}],
            "sectionOrder": ["projects"]
        }))
        .unwrap()
    }

    #[test]
    fn test_identical_documents_have_no_changes() {
        assert!(summarize_changes(&doc(), &doc()).is_empty());
    }

    #[test]
    fn test_theme_is_not_tracked() {
        let mut after = doc();
        after.theme = Some(json!({"accent": "teal"}));
        assert!(summarize_changes(&doc(), &after).is_empty());
    }

    #[test]
    fn test_changed_projects_are_labelled() {
        let mut after = doc();
        after.projects[0]
            .fields
            .insert("title".into(), json!("Engine v2"));
        assert_eq!(summarize_changes(&doc(), &after), vec!["Updated Projects Section"]);
    }

    #[test]
    fn test_labels_follow_fixed_order() {
        let mut after = doc();
        after.section_visibility.insert("projects".into(), false);
        after.achievements.push("Award".into());
        after.personal_info.name = Some("Ada L.".into());
        after.experience.push(Default::default());
        assert_eq!(
            summarize_changes(&doc(), &after),
            vec![
                "Updated Personal Info",
                "Updated Experience Section",
                "Updated Achievements Section",
                "Updated Section Visibility",
            ]
        );
    }

    #[test]
    fn test_provenance_counts_as_a_change() {
        let mut after = doc();
        after.projects[0].status = Some(crate::models::portfolio::Provenance::New);
        assert_eq!(summarize_changes(&doc(), &after), vec!["Updated Projects Section"]);
    }
}
