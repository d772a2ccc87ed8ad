//! Section schemas: how each section is keyed and reconciled.

use serde_json::Value;

use crate::models::portfolio::{Record, SectionId};

/// Separator between normalized key fields in a match key.
const KEY_SEPARATOR: &str = "|";

/// The closed set of section shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionSchema {
    /// Ordered plain strings. Merged by order-preserving set union.
    ScalarList,
    /// Records that can conflict. Two records are the same logical entry when
    /// their `match_fields` normalize to the same key.
    RecordList { match_fields: &'static [&'static str] },
    /// Named string lists (`{category, items}`). Same-named groups union their
    /// items and never conflict.
    Grouped {
        name_field: &'static str,
        items_field: &'static str,
    },
}

impl SectionId {
    pub fn schema(&self) -> SectionSchema {
        match self {
            SectionId::Experience => SectionSchema::RecordList {
                match_fields: &["company", "role"],
            },
            SectionId::Projects => SectionSchema::RecordList {
                match_fields: &["title"],
            },
            SectionId::Education => SectionSchema::RecordList {
                match_fields: &["institute", "degree"],
            },
            SectionId::Certifications => SectionSchema::RecordList {
                match_fields: &["name"],
            },
            SectionId::Publications => SectionSchema::RecordList {
                match_fields: &["title"],
            },
            SectionId::Extracurricular => SectionSchema::RecordList {
                match_fields: &["organization", "role"],
            },
            SectionId::Skills => SectionSchema::Grouped {
                name_field: "category",
                items_field: "items",
            },
            SectionId::CustomSections => SectionSchema::Grouped {
                name_field: "title",
                items_field: "items",
            },
            SectionId::Achievements | SectionId::Coursework => SectionSchema::ScalarList,
        }
    }

    /// Label shown in the change summary.
    pub fn change_label(&self) -> &'static str {
        match self {
            SectionId::Skills => "Updated Skills Section",
            SectionId::Experience => "Updated Experience Section",
            SectionId::Projects => "Updated Projects Section",
            SectionId::Education => "Updated Education Section",
            SectionId::Certifications => "Updated Certifications Section",
            SectionId::Publications => "Updated Publications Section",
            SectionId::Achievements => "Updated Achievements Section",
            SectionId::Coursework => "Updated Coursework Section",
            SectionId::Extracurricular => "Updated Extracurricular Section",
            SectionId::CustomSections => "Updated Custom Sections",
        }
    }
}

/// Trimmed, lowercased text form of a field value. Missing or null is empty.
pub fn normalize(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_lowercase(),
        Some(other) => other.to_string().trim().to_lowercase(),
    }
}

/// Composite match key of a record over the given fields.
pub fn match_key(record: &Record, fields: &[&str]) -> String {
    fields
        .iter()
        .map(|f| normalize(record.fields.get(*f)))
        .collect::<Vec<_>>()
        .join(KEY_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: Value) -> Record {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_match_key_is_case_and_whitespace_insensitive() {
        let a = record(json!({"company": " Acme ", "role": "Engineer"}));
        let b = record(json!({"company": "acme", "role": "ENGINEER  "}));
        assert_eq!(
            match_key(&a, &["company", "role"]),
            match_key(&b, &["company", "role"])
        );
    }

    #[test]
    fn test_match_key_missing_field_is_empty_segment() {
        let a = record(json!({"company": "Acme"}));
        assert_eq!(match_key(&a, &["company", "role"]), "acme|");
    }

    #[test]
    fn test_match_key_distinguishes_field_boundaries() {
        let a = record(json!({"company": "Ac", "role": "me"}));
        let b = record(json!({"company": "Acme", "role": ""}));
        assert_ne!(
            match_key(&a, &["company", "role"]),
            match_key(&b, &["company", "role"])
        );
    }

    #[test]
    fn test_every_section_has_a_label() {
        for id in SectionId::ALL {
            assert!(id.change_label().starts_with("Updated"));
        }
    }

    #[test]
    fn test_scalar_sections() {
        assert_eq!(SectionId::Achievements.schema(), SectionSchema::ScalarList);
        assert_eq!(SectionId::Coursework.schema(), SectionSchema::ScalarList);
    }
}
