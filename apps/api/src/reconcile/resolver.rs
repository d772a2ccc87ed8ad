//! Conflict Resolver: collapses a two-record conflict group into one record.
//!
//! Selection is tracked in `MergeSelection` (at most two ids). Once a pair is
//! selected, `resolve` replaces both records with a caller-supplied merge,
//! which is placed first in the section and tagged `NEW`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::models::portfolio::{Provenance, Record, SectionId};
use crate::reconcile::ids::IdGenerator;
use crate::reconcile::projector::unwrap_record;
use crate::reconcile::review::{wrap_record, GROUP_KEY, ID_KEY, ITEMS_KEY};
use crate::reconcile::tree::{Node, PathError, ReviewState};

pub const MAX_SELECTED: usize = 2;

#[derive(Debug, Error, PartialEq)]
pub enum SelectionError {
    #[error("two items are already selected; deselect one first")]
    Full,

    #[error("select exactly two items before merging (have {0})")]
    NotPaired(usize),
}

#[derive(Debug, Error, PartialEq)]
pub enum ResolveError {
    #[error("select exactly two items before merging (have {0})")]
    SelectionSize(usize),

    #[error("section '{0}' is not part of this review")]
    UnknownSection(SectionId),

    #[error("item '{0}' is not in this section")]
    ItemNotFound(String),

    #[error("the selected items are not one conflict group")]
    NotAGroup,

    #[error(transparent)]
    Path(#[from] PathError),
}

/// Items picked for a merge, plus the group the user started merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeSelection {
    selected: Vec<String>,
    target_group: Option<String>,
}

impl MergeSelection {
    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn target_group(&self) -> Option<&str> {
        self.target_group.as_deref()
    }

    pub fn is_ready(&self) -> bool {
        self.selected.len() == MAX_SELECTED
    }

    pub fn select(&mut self, id: &str) -> Result<(), SelectionError> {
        if self.selected.iter().any(|s| s == id) {
            return Ok(());
        }
        if self.selected.len() >= MAX_SELECTED {
            return Err(SelectionError::Full);
        }
        self.selected.push(id.to_string());
        Ok(())
    }

    pub fn deselect(&mut self, id: &str) {
        self.selected.retain(|s| s != id);
        self.target_group = None;
    }

    pub fn begin_merge(&mut self, group_id: &str) -> Result<(), SelectionError> {
        if !self.is_ready() {
            return Err(SelectionError::NotPaired(self.selected.len()));
        }
        self.target_group = Some(group_id.to_string());
        Ok(())
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.target_group = None;
    }
}

/// Replaces the selected conflict pair in `section` with `merged`.
///
/// On error nothing changes: the returned error means `state` and `selection`
/// are still valid as they were.
pub fn resolve(
    state: &ReviewState,
    section: SectionId,
    selection: &mut MergeSelection,
    merged: Record,
    ids: &dyn IdGenerator,
) -> Result<ReviewState, ResolveError> {
    if !selection.is_ready() {
        return Err(ResolveError::SelectionSize(selection.selected.len()));
    }

    let items = state
        .get(&[section.key(), ITEMS_KEY])
        .and_then(Node::as_list)
        .ok_or(ResolveError::UnknownSection(section))?;

    let mut groups = BTreeSet::new();
    for id in &selection.selected {
        let item = items
            .iter()
            .find(|item| item_id(item) == Some(id.as_str()))
            .ok_or_else(|| ResolveError::ItemNotFound(id.clone()))?;
        let group = item
            .get(GROUP_KEY)
            .and_then(Node::as_str)
            .ok_or(ResolveError::NotAGroup)?;
        groups.insert(group);
    }
    let group = match (groups.len(), groups.first()) {
        (1, Some(group)) => group.to_string(),
        _ => return Err(ResolveError::NotAGroup),
    };
    if selection.target_group().is_some_and(|target| target != group) {
        return Err(ResolveError::NotAGroup);
    }

    let mut merged = merged;
    merged.id = merged
        .id
        .filter(|id| !id.trim().is_empty())
        .or_else(|| Some(ids.next_id()));
    merged.status = Some(Provenance::New);
    merged.merge_group_id = None;

    let mut next_items = Vec::with_capacity(items.len() - 1);
    next_items.push(wrap_record(&merged, ids));
    next_items.extend(
        items
            .iter()
            .filter(|item| {
                !item_id(item).is_some_and(|id| selection.selected.iter().any(|s| s == id))
            })
            .cloned(),
    );

    let next = state.set(&[section.key(), ITEMS_KEY], Node::list(next_items))?;
    info!("Resolved conflict group {group} in {section}");
    selection.clear();
    Ok(next)
}

fn item_id(item: &Node) -> Option<&str> {
    item.get(ID_KEY).and_then(Node::as_str)
}

/// A pending conflict: the stored version and the incoming one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictPair {
    pub group_id: String,
    pub current: Record,
    pub incoming: Record,
}

/// Lists the unresolved two-record groups of a section, in display order.
pub fn conflict_groups(state: &ReviewState, section: SectionId) -> Vec<ConflictPair> {
    let (order, mut members) = grouped_records(state, section);
    order
        .into_iter()
        .filter_map(|group_id| {
            let mut pair = members.remove(&group_id)?;
            if pair.len() != 2 {
                return None;
            }
            if pair[0].status == Some(Provenance::New) && pair[1].status != Some(Provenance::New) {
                pair.swap(0, 1);
            }
            let incoming = pair.pop()?;
            let current = pair.pop()?;
            Some(ConflictPair {
                group_id,
                current,
                incoming,
            })
        })
        .collect()
}

/// Records whose `merge_group_id` has no partner, e.g. earlier duplicates of
/// an incoming key. They cannot be resolved; they can only be kept or hidden.
pub fn orphaned_records(state: &ReviewState, section: SectionId) -> Vec<Record> {
    let (order, mut members) = grouped_records(state, section);
    order
        .into_iter()
        .filter_map(|group_id| {
            let mut records = members.remove(&group_id)?;
            (records.len() == 1).then(|| records.pop()).flatten()
        })
        .collect()
}

/// Grouped records of a section, keyed by group id, plus first-seen order.
fn grouped_records(
    state: &ReviewState,
    section: SectionId,
) -> (Vec<String>, BTreeMap<String, Vec<Record>>) {
    let mut order: Vec<String> = Vec::new();
    let mut members: BTreeMap<String, Vec<Record>> = BTreeMap::new();
    let Some(items) = state
        .get(&[section.key(), ITEMS_KEY])
        .and_then(Node::as_list)
    else {
        return (order, members);
    };

    for item in items {
        let Some(record) = unwrap_record(item) else {
            continue;
        };
        let Some(group) = record.merge_group_id.clone() else {
            continue;
        };
        if !members.contains_key(&group) {
            order.push(group.clone());
        }
        members.entry(group).or_default().push(record);
    }
    (order, members)
}

/// Which version of a field goes into a hand-merged record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "pick", content = "value", rename_all = "camelCase")]
pub enum FieldChoice {
    Current,
    Incoming,
    Custom(Value),
}

/// Builds a merged record field by field. Fields without a choice take the
/// incoming value. The result has no id; `resolve` assigns one.
pub fn pick_fields(
    current: &Record,
    incoming: &Record,
    choices: &BTreeMap<String, FieldChoice>,
) -> Record {
    let names: BTreeSet<&String> = current
        .fields
        .keys()
        .chain(incoming.fields.keys())
        .chain(choices.keys())
        .collect();

    let mut merged = Record::default();
    for name in names {
        let value = match choices.get(name).unwrap_or(&FieldChoice::Incoming) {
            FieldChoice::Current => current.fields.get(name).cloned(),
            FieldChoice::Incoming => incoming.fields.get(name).cloned(),
            FieldChoice::Custom(value) => Some(value.clone()),
        };
        if let Some(value) = value {
            merged.fields.insert(name.clone(), value);
        }
    }
    merged
}
