use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::FromRow;

/// Provenance tag a merge attaches to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    #[serde(rename = "NEW")]
    New,
    #[serde(rename = "OLD")]
    Old,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::New => "NEW",
            Provenance::Old => "OLD",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NEW" => Some(Provenance::New),
            "OLD" => Some(Provenance::Old),
            _ => None,
        }
    }
}

/// One entry of a list section.
///
/// Content lives in `fields` as plain JSON so every section kind can be merged,
/// reviewed and projected by the same code. `id`, `status` and `merge_group_id`
/// are structural metadata and never count as content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Provenance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_group_id: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    #[cfg(test)]
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            ..Default::default()
        }
    }

    #[cfg(test)]
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_str())
    }

    /// String items of an array field. Non-string elements are skipped.
    pub fn string_list(&self, name: &str) -> Vec<String> {
        self.fields
            .get(name)
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Same logical content, ignoring identity and provenance.
    pub fn same_content(&self, other: &Record) -> bool {
        self.fields == other.fields
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume: Option<String>,
}

impl PersonalInfo {
    /// Fields surfaced in the review flow. The rest pass through untouched.
    pub const REVIEWED: [&'static str; 4] = ["name", "title", "bio", "email"];

    pub fn get(&self, field: &str) -> Option<&String> {
        match field {
            "name" => self.name.as_ref(),
            "title" => self.title.as_ref(),
            "bio" => self.bio.as_ref(),
            "email" => self.email.as_ref(),
            "phone" => self.phone.as_ref(),
            "location" => self.location.as_ref(),
            "image" => self.image.as_ref(),
            "resume" => self.resume.as_ref(),
            _ => None,
        }
    }

    pub fn slot_mut(&mut self, field: &str) -> Option<&mut Option<String>> {
        match field {
            "name" => Some(&mut self.name),
            "title" => Some(&mut self.title),
            "bio" => Some(&mut self.bio),
            "email" => Some(&mut self.email),
            "phone" => Some(&mut self.phone),
            "location" => Some(&mut self.location),
            "image" => Some(&mut self.image),
            "resume" => Some(&mut self.resume),
            _ => None,
        }
    }

    pub const ALL: [&'static str; 8] = [
        "name", "title", "bio", "email", "phone", "location", "image", "resume",
    ];
}

/// The persisted portfolio record. Stored as a single JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioDocument {
    #[serde(default)]
    pub personal_info: PersonalInfo,
    #[serde(default)]
    pub social_profiles: BTreeMap<String, String>,
    #[serde(default)]
    pub skills: Vec<Record>,
    #[serde(default)]
    pub experience: Vec<Record>,
    #[serde(default)]
    pub projects: Vec<Record>,
    #[serde(default)]
    pub education: Vec<Record>,
    #[serde(default)]
    pub certifications: Vec<Record>,
    #[serde(default)]
    pub publications: Vec<Record>,
    #[serde(default)]
    pub achievements: Vec<String>,
    #[serde(default)]
    pub coursework: Vec<String>,
    #[serde(default)]
    pub extracurricular: Vec<Record>,
    #[serde(default)]
    pub custom_sections: Vec<Record>,
    #[serde(default)]
    pub section_order: Vec<String>,
    #[serde(default)]
    pub section_titles: BTreeMap<String, String>,
    #[serde(default)]
    pub section_visibility: BTreeMap<String, bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Value>,
}

/// A stored portfolio row.
#[derive(Debug, Clone, FromRow)]
pub struct PortfolioRow {
    pub id: String,
    pub data: Json<PortfolioDocument>,
    pub updated_at: DateTime<Utc>,
}

/// Every list section a portfolio document knows about, in display-default order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionId {
    Skills,
    Experience,
    Projects,
    Education,
    Certifications,
    Publications,
    Achievements,
    Coursework,
    Extracurricular,
    CustomSections,
}

impl SectionId {
    pub const ALL: [SectionId; 10] = [
        SectionId::Skills,
        SectionId::Experience,
        SectionId::Projects,
        SectionId::Education,
        SectionId::Certifications,
        SectionId::Publications,
        SectionId::Achievements,
        SectionId::Coursework,
        SectionId::Extracurricular,
        SectionId::CustomSections,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            SectionId::Skills => "skills",
            SectionId::Experience => "experience",
            SectionId::Projects => "projects",
            SectionId::Education => "education",
            SectionId::Certifications => "certifications",
            SectionId::Publications => "publications",
            SectionId::Achievements => "achievements",
            SectionId::Coursework => "coursework",
            SectionId::Extracurricular => "extracurricular",
            SectionId::CustomSections => "customSections",
        }
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown section '{0}'")]
pub struct UnknownSection(pub String);

impl FromStr for SectionId {
    type Err = UnknownSection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionId::ALL
            .into_iter()
            .find(|id| id.key() == s)
            .ok_or_else(|| UnknownSection(s.to_string()))
    }
}

/// Borrowed content of one section.
#[derive(Debug, Clone, Copy)]
pub enum SectionRef<'a> {
    Records(&'a [Record]),
    Strings(&'a [String]),
}

/// Owned content of one section.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionContent {
    Records(Vec<Record>),
    Strings(Vec<String>),
}

impl SectionContent {
    pub fn len(&self) -> usize {
        match self {
            SectionContent::Records(r) => r.len(),
            SectionContent::Strings(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_value(&self) -> Value {
        match self {
            SectionContent::Records(records) => {
                serde_json::to_value(records).unwrap_or(Value::Array(Vec::new()))
            }
            SectionContent::Strings(strings) => Value::from(strings.clone()),
        }
    }
}

impl PortfolioDocument {
    /// Empty document served when nothing has been persisted yet.
    pub fn placeholder() -> Self {
        Self {
            section_order: SectionId::ALL.iter().map(|s| s.key().to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn section(&self, id: SectionId) -> SectionRef<'_> {
        match id {
            SectionId::Achievements => SectionRef::Strings(&self.achievements),
            SectionId::Coursework => SectionRef::Strings(&self.coursework),
            _ => SectionRef::Records(self.records(id).unwrap_or(&[])),
        }
    }

    pub fn section_content(&self, id: SectionId) -> SectionContent {
        match self.section(id) {
            SectionRef::Records(r) => SectionContent::Records(r.to_vec()),
            SectionRef::Strings(s) => SectionContent::Strings(s.to_vec()),
        }
    }

    pub fn records(&self, id: SectionId) -> Option<&[Record]> {
        let records = match id {
            SectionId::Skills => &self.skills,
            SectionId::Experience => &self.experience,
            SectionId::Projects => &self.projects,
            SectionId::Education => &self.education,
            SectionId::Certifications => &self.certifications,
            SectionId::Publications => &self.publications,
            SectionId::Extracurricular => &self.extracurricular,
            SectionId::CustomSections => &self.custom_sections,
            SectionId::Achievements | SectionId::Coursework => return None,
        };
        Some(records)
    }

    pub fn records_mut(&mut self, id: SectionId) -> Option<&mut Vec<Record>> {
        let records = match id {
            SectionId::Skills => &mut self.skills,
            SectionId::Experience => &mut self.experience,
            SectionId::Projects => &mut self.projects,
            SectionId::Education => &mut self.education,
            SectionId::Certifications => &mut self.certifications,
            SectionId::Publications => &mut self.publications,
            SectionId::Extracurricular => &mut self.extracurricular,
            SectionId::CustomSections => &mut self.custom_sections,
            SectionId::Achievements | SectionId::Coursework => return None,
        };
        Some(records)
    }

    /// Replaces a section's content. Content of the wrong shape for the section
    /// is ignored and reported as `false`.
    pub fn set_section(&mut self, id: SectionId, content: SectionContent) -> bool {
        match (id, content) {
            (SectionId::Achievements, SectionContent::Strings(s)) => self.achievements = s,
            (SectionId::Coursework, SectionContent::Strings(s)) => self.coursework = s,
            (_, SectionContent::Records(r)) => match self.records_mut(id) {
                Some(slot) => *slot = r,
                None => return false,
            },
            _ => return false,
        }
        true
    }

    /// Visits every record of every record-bearing section.
    pub fn for_each_record_mut(&mut self, mut f: impl FnMut(SectionId, &mut Record)) {
        for id in SectionId::ALL {
            if let Some(records) = self.records_mut(id) {
                for record in records.iter_mut() {
                    f(id, record);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_flattens_fields() {
        let record: Record = serde_json::from_value(json!({
            "id": "r1",
            "status": "NEW",
            "mergeGroupId": "g1",
            "company": "Acme",
            "techStack": ["Rust"]
        }))
        .unwrap();
        assert_eq!(record.id.as_deref(), Some("r1"));
        assert_eq!(record.status, Some(Provenance::New));
        assert_eq!(record.merge_group_id.as_deref(), Some("g1"));
        assert_eq!(record.field_str("company"), Some("Acme"));
        assert_eq!(record.string_list("techStack"), vec!["Rust".to_string()]);
        assert!(!record.fields.contains_key("id"));
    }

    #[test]
    fn test_record_serializes_without_empty_metadata() {
        let record = Record::from_fields(json!({"title": "X"}).as_object().unwrap().clone());
        assert_eq!(serde_json::to_value(&record).unwrap(), json!({"title": "X"}));
    }

    #[test]
    fn test_same_content_ignores_metadata() {
        let mut a = Record::from_fields(json!({"name": "AWS"}).as_object().unwrap().clone());
        let mut b = a.clone();
        a.id = Some("1".into());
        b.status = Some(Provenance::New);
        b.merge_group_id = Some("g".into());
        assert!(a.same_content(&b));
    }

    #[test]
    fn test_document_missing_sections_default_to_empty() {
        let doc: PortfolioDocument =
            serde_json::from_value(json!({"personalInfo": {"name": "Ada"}})).unwrap();
        assert_eq!(doc.personal_info.name.as_deref(), Some("Ada"));
        assert!(doc.experience.is_empty());
        assert!(doc.achievements.is_empty());
    }

    #[test]
    fn test_section_id_round_trips_through_key() {
        for id in SectionId::ALL {
            assert_eq!(id.key().parse::<SectionId>().unwrap(), id);
        }
        assert!("theme".parse::<SectionId>().is_err());
    }

    #[test]
    fn test_set_section_rejects_wrong_shape() {
        let mut doc = PortfolioDocument::placeholder();
        assert!(!doc.set_section(
            SectionId::Experience,
            SectionContent::Strings(vec!["x".into()])
        ));
        assert!(doc.set_section(
            SectionId::Coursework,
            SectionContent::Strings(vec!["Compilers".into()])
        ));
        assert_eq!(doc.coursework, vec!["Compilers".to_string()]);
    }
}
