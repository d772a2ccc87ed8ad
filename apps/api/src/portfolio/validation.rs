use std::collections::HashSet;

use serde_json::Value;

use crate::errors::AppError;
use crate::models::portfolio::{PortfolioDocument, SectionId};

/// Top-level keys a document must carry before it may be stored.
pub const REQUIRED_SECTIONS: [&str; 4] = ["personalInfo", "skills", "experience", "projects"];

/// Validates a raw document submitted for persistence and decodes it.
///
/// Presence is checked on the raw JSON: once decoded, a missing section and an
/// empty one look the same.
pub fn validate_document(raw: Value) -> Result<PortfolioDocument, AppError> {
    let Some(object) = raw.as_object() else {
        return Err(AppError::Validation(
            "document must be a JSON object".to_string(),
        ));
    };

    let missing: Vec<&str> = REQUIRED_SECTIONS
        .iter()
        .copied()
        .filter(|key| object.get(*key).map_or(true, Value::is_null))
        .collect();
    if !missing.is_empty() {
        return Err(AppError::Validation(format!(
            "missing required sections: {}",
            missing.join(", ")
        )));
    }

    let doc: PortfolioDocument = serde_json::from_value(raw)
        .map_err(|e| AppError::Validation(format!("malformed document: {e}")))?;
    check_unique_ids(&doc)?;
    Ok(doc)
}

/// Record ids must be unique within a section, otherwise deletes and merges
/// cannot address a single record.
pub fn check_unique_ids(doc: &PortfolioDocument) -> Result<(), AppError> {
    for id in SectionId::ALL {
        let Some(records) = doc.records(id) else {
            continue;
        };
        let mut seen = HashSet::new();
        for record_id in records.iter().filter_map(|r| r.id.as_deref()) {
            if !seen.insert(record_id) {
                return Err(AppError::Validation(format!(
                    "duplicate id '{record_id}' in section '{id}'"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> Value {
        json!({
            "personalInfo": {"name": "Ada"},
            "skills": [],
            "experience": [],
            "projects": []
        })
    }

    #[test]
    fn test_minimal_document_passes() {
        let doc = validate_document(minimal()).unwrap();
        assert_eq!(doc.personal_info.name.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_missing_sections_are_named() {
        let mut raw = minimal();
        raw.as_object_mut().unwrap().remove("skills");
        raw.as_object_mut().unwrap().insert("projects".into(), Value::Null);
        match validate_document(raw) {
            Err(AppError::Validation(msg)) => {
                assert!(msg.contains("skills"));
                assert!(msg.contains("projects"));
                assert!(!msg.contains("experience"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(matches!(
            validate_document(json!([1, 2])),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_wrong_section_shape_is_rejected() {
        let mut raw = minimal();
        raw["experience"] = json!("Acme");
        assert!(matches!(validate_document(raw), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_duplicate_record_ids_are_rejected() {
        let mut raw = minimal();
        raw["projects"] = json!([{"id": "p", "title": "A"}, {"id": "p", "title": "B"}]);
        assert!(matches!(validate_document(raw), Err(AppError::Validation(_))));
    }
}
