use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::portfolio::{PortfolioDocument, Record, SectionId};
use crate::reconcile::merger::merge_documents;
use crate::reconcile::projector::project;
use crate::reconcile::resolver::{
    conflict_groups, orphaned_records, ConflictPair, MergeSelection,
};
use crate::reconcile::review::build;
use crate::reconcile::schema::SectionSchema;
use crate::reconcile::{IdGenerator, ReviewState};

/// One resume import under review.
///
/// `base` is the merged document the review tree was built from; whatever
/// the tree does not carry (theme, display settings, unreviewed personal
/// fields) is projected from it. `original` is the stored document at import
/// time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSession {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub source_file: String,
    pub state: ReviewState,
    #[serde(default)]
    pub selection: MergeSelection,
    pub base: PortfolioDocument,
    pub original: PortfolioDocument,
}

impl ReviewSession {
    /// Merges `draft` into `existing` and builds the review tree.
    pub fn open(
        source_file: &str,
        existing: PortfolioDocument,
        draft: &PortfolioDocument,
        ids: &dyn IdGenerator,
    ) -> Self {
        let base = merge_documents(&existing, draft, ids);
        let state = build(&base, ids);
        let session = Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            source_file: source_file.to_string(),
            state,
            selection: MergeSelection::default(),
            base,
            original: existing,
        };
        debug!(
            "Opened review session {} with {} conflict groups",
            session.id,
            session.conflicts().values().map(Vec::len).sum::<usize>()
        );
        session
    }

    /// The document the session would commit right now.
    pub fn projected(&self) -> PortfolioDocument {
        project(&self.state, &self.base)
    }

    /// Unresolved conflict pairs keyed by section.
    pub fn conflicts(&self) -> BTreeMap<String, Vec<ConflictPair>> {
        per_record_section(|id| conflict_groups(&self.state, id))
    }

    /// Records left alone in a merge group, keyed by section.
    pub fn orphaned(&self) -> BTreeMap<String, Vec<Record>> {
        per_record_section(|id| orphaned_records(&self.state, id))
    }

    /// The document to persist. Refused while any conflict pair is pending;
    /// once none are, a remaining `merge_group_id` has no partner and is
    /// dropped.
    pub fn commit_document(&self) -> Result<PortfolioDocument, AppError> {
        let pending: usize = self.conflicts().values().map(Vec::len).sum();
        if pending > 0 {
            return Err(AppError::Conflict(format!(
                "{pending} conflict group(s) must be resolved before committing"
            )));
        }
        let mut doc = self.projected();
        doc.for_each_record_mut(|_, record| record.merge_group_id = None);
        Ok(doc)
    }
}

fn per_record_section<T>(f: impl Fn(SectionId) -> Vec<T>) -> BTreeMap<String, Vec<T>> {
    SectionId::ALL
        .into_iter()
        .filter(|id| matches!(id.schema(), SectionSchema::RecordList { .. }))
        .filter_map(|id| {
            let found = f(id);
            (!found.is_empty()).then(|| (id.key().to_string(), found))
        })
        .collect()
}

/// What the client renders for a session.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub source_file: String,
    pub state: ReviewState,
    pub selection: MergeSelection,
    pub conflicts: BTreeMap<String, Vec<ConflictPair>>,
    pub orphaned: BTreeMap<String, Vec<Record>>,
}

impl From<&ReviewSession> for SessionView {
    fn from(session: &ReviewSession) -> Self {
        Self {
            id: session.id,
            created_at: session.created_at,
            source_file: session.source_file.clone(),
            state: session.state.clone(),
            selection: session.selection.clone(),
            conflicts: session.conflicts(),
            orphaned: session.orphaned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::portfolio::Provenance;
    use crate::reconcile::ids::SequentialIds;
    use crate::reconcile::resolver::resolve;
    use serde_json::json;

    fn existing() -> PortfolioDocument {
        serde_json::from_value(json!({
            "personalInfo": {"name": "Ada", "resume": "https://old/cv.pdf"},
            "experience": [{"id": "e1", "company": "Acme", "role": "Engineer", "summary": "old"}],
            "sectionOrder": ["experience"],
            "theme": {"accent": "teal"}
        }))
        .unwrap()
    }

    fn draft() -> PortfolioDocument {
        serde_json::from_value(json!({
            "personalInfo": {"name": "Ada L.", "resume": "https://new/cv.pdf"},
            "experience": [{"id": "e9", "company": "ACME", "role": "engineer", "summary": "new"}],
            "projects": [{"id": "p1", "title": "Engine"}]
        }))
        .unwrap()
    }

    #[test]
    fn test_open_surfaces_conflicts_and_keeps_original() {
        let session = ReviewSession::open("cv.pdf", existing(), &draft(), &SequentialIds::new("x"));

        let conflicts = session.conflicts();
        let pairs = &conflicts["experience"];
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].current.field_str("summary"), Some("old"));
        assert_eq!(pairs[0].incoming.field_str("summary"), Some("new"));
        assert_eq!(session.original, existing());
    }

    #[test]
    fn test_projected_keeps_untracked_fields() {
        let session = ReviewSession::open("cv.pdf", existing(), &draft(), &SequentialIds::new("x"));
        let doc = session.projected();

        assert_eq!(doc.personal_info.name.as_deref(), Some("Ada L."));
        assert_eq!(doc.personal_info.resume.as_deref(), Some("https://new/cv.pdf"));
        assert_eq!(doc.theme, Some(json!({"accent": "teal"})));
        assert_eq!(doc.projects.len(), 1);
        assert_eq!(doc.projects[0].status, Some(Provenance::New));
        assert_eq!(doc.section_order, vec!["experience", "projects"]);
    }

    #[test]
    fn test_commit_is_refused_while_conflicts_are_pending() {
        let session = ReviewSession::open("cv.pdf", existing(), &draft(), &SequentialIds::new("x"));
        assert!(matches!(session.commit_document(), Err(AppError::Conflict(_))));
    }

    #[test]
    fn test_commit_after_resolve_carries_no_groups() {
        let ids = SequentialIds::new("x");
        let mut session = ReviewSession::open("cv.pdf", existing(), &draft(), &ids);
        let pair = session.conflicts()["experience"][0].clone();
        session.selection.select("e1").unwrap();
        session.selection.select("e9").unwrap();
        session.state = resolve(
            &session.state,
            SectionId::Experience,
            &mut session.selection,
            pair.incoming,
            &ids,
        )
        .unwrap();

        let doc = session.commit_document().unwrap();
        assert_eq!(doc.experience.len(), 1);
        assert!(doc.experience.iter().all(|r| r.merge_group_id.is_none()));
    }

    #[test]
    fn test_orphans_are_listed_and_cleared_on_commit() {
        let draft: PortfolioDocument = serde_json::from_value(json!({
            "projects": [{"id": "p1", "title": "Engine", "v": 1}, {"id": "p2", "title": "Engine", "v": 2}]
        }))
        .unwrap();
        let stored: PortfolioDocument = serde_json::from_value(json!({
            "projects": [{"id": "p0", "title": "Engine", "v": 0}]
        }))
        .unwrap();
        let ids = SequentialIds::new("x");
        let mut session = ReviewSession::open("cv.pdf", stored, &draft, &ids);

        let orphaned = session.orphaned();
        assert_eq!(orphaned["projects"].len(), 1);
        assert_eq!(orphaned["projects"][0].id.as_deref(), Some("p1"));

        session.selection.select("p0").unwrap();
        session.selection.select("p2").unwrap();
        let merged = session.conflicts()["projects"][0].incoming.clone();
        session.state = resolve(
            &session.state,
            SectionId::Projects,
            &mut session.selection,
            merged,
            &ids,
        )
        .unwrap();

        let doc = session.commit_document().unwrap();
        assert_eq!(doc.projects.len(), 2);
        assert!(doc.projects.iter().all(|r| r.merge_group_id.is_none()));
    }

    #[test]
    fn test_session_survives_serde() {
        let session = ReviewSession::open("cv.pdf", existing(), &draft(), &SequentialIds::new("x"));
        let json = serde_json::to_string(&session).unwrap();
        let back: ReviewSession = serde_json::from_str(&json).unwrap();
        assert_eq!(back, session);
        assert_eq!(back.projected(), session.projected());
    }
}
