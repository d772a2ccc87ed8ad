//! Section Merger: reconciles a stored document against a freshly parsed draft.
//!
//! Stored records always come first and are never dropped. Incoming records
//! either fold into a stored record (same content), sit next to it as a
//! conflict pair sharing a `merge_group_id`, or get appended as `NEW`.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tracing::{debug, warn};

use crate::models::portfolio::{
    PersonalInfo, PortfolioDocument, Provenance, Record, SectionContent, SectionId, SectionRef,
};
use crate::reconcile::ids::IdGenerator;
use crate::reconcile::schema::{match_key, normalize, SectionSchema};

/// Merges two record lists keyed by `key_of`.
///
/// When several incoming records share one stored key, each forms its own
/// group against the stored record and the last one wins the stored record's
/// `merge_group_id`. Earlier groups are left with a single member.
pub fn merge_records<F>(
    existing: &[Record],
    incoming: &[Record],
    key_of: F,
    ids: &dyn IdGenerator,
) -> Vec<Record>
where
    F: Fn(&Record) -> String,
{
    let mut result = existing.to_vec();
    let by_key: HashMap<String, usize> = existing
        .iter()
        .enumerate()
        .map(|(idx, record)| (key_of(record), idx))
        .collect();
    let mut matched_keys = HashSet::new();

    for record in incoming {
        let key = key_of(record);
        let Some(&idx) = by_key.get(&key) else {
            result.push(tag_new(record, None));
            continue;
        };

        if !matched_keys.insert(key.clone()) {
            warn!("Multiple incoming records match stored key '{key}'; last one claims the group");
        }

        if result[idx].same_content(record) {
            continue;
        }

        let group = ids.next_id();
        result[idx].merge_group_id = Some(group.clone());
        result.push(tag_new(record, Some(group)));
    }

    result
}

fn tag_new(record: &Record, group: Option<String>) -> Record {
    let mut record = record.clone();
    record.status = Some(Provenance::New);
    record.merge_group_id = group;
    record
}

/// Order-preserving union. Stored strings stay as they are; incoming strings
/// are trimmed and appended when not already present.
pub fn merge_strings(existing: &[String], incoming: &[String]) -> Vec<String> {
    let mut result = existing.to_vec();
    let mut seen: HashSet<String> = existing.iter().map(|s| s.trim().to_string()).collect();
    for item in incoming {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        if seen.insert(item.to_string()) {
            result.push(item.to_string());
        }
    }
    result
}

/// Unions the `items_field` lists of groups whose `name_field` matches
/// case-insensitively. Unknown names are appended as `NEW`.
pub fn merge_grouped(
    existing: &[Record],
    incoming: &[Record],
    name_field: &str,
    items_field: &str,
) -> Vec<Record> {
    let mut result = existing.to_vec();
    let mut by_name: HashMap<String, usize> = existing
        .iter()
        .enumerate()
        .map(|(idx, record)| (normalize(record.fields.get(name_field)), idx))
        .collect();

    for record in incoming {
        let name = normalize(record.fields.get(name_field));
        let items = record.string_list(items_field);
        match by_name.get(&name) {
            Some(&idx) => {
                let current = result[idx].string_list(items_field);
                let merged = merge_strings(&current, &items);
                if merged.len() != current.len() {
                    result[idx]
                        .fields
                        .insert(items_field.to_string(), Value::from(merged));
                }
            }
            None => {
                let mut group = tag_new(record, None);
                group.fields.insert(
                    items_field.to_string(),
                    Value::from(merge_strings(&[], &items)),
                );
                by_name.insert(name, result.len());
                result.push(group);
            }
        }
    }

    result
}

/// Merges one section of `incoming` into the same section of `existing`
/// according to the section's schema.
pub fn merge_section(
    id: SectionId,
    existing: &PortfolioDocument,
    incoming: &PortfolioDocument,
    ids: &dyn IdGenerator,
) -> SectionContent {
    match id.schema() {
        SectionSchema::ScalarList => {
            SectionContent::Strings(merge_strings(strings(existing, id), strings(incoming, id)))
        }
        SectionSchema::RecordList { match_fields } => SectionContent::Records(merge_records(
            records(existing, id),
            records(incoming, id),
            |r| match_key(r, match_fields),
            ids,
        )),
        SectionSchema::Grouped {
            name_field,
            items_field,
        } => SectionContent::Records(merge_grouped(
            records(existing, id),
            records(incoming, id),
            name_field,
            items_field,
        )),
    }
}

fn strings(doc: &PortfolioDocument, id: SectionId) -> &[String] {
    match doc.section(id) {
        SectionRef::Strings(s) => s,
        SectionRef::Records(_) => &[],
    }
}

fn records(doc: &PortfolioDocument, id: SectionId) -> &[Record] {
    match doc.section(id) {
        SectionRef::Records(r) => r,
        SectionRef::Strings(_) => &[],
    }
}

/// Merges a parsed draft into the stored document.
///
/// Provenance and grouping are relative to this merge, so stale `status` and
/// `merge_group_id` tags on stored records are cleared first. Display settings and theme stay with the stored
/// document; sections that gained content but are missing from
/// `section_order` are appended to it.
pub fn merge_documents(
    existing: &PortfolioDocument,
    incoming: &PortfolioDocument,
    ids: &dyn IdGenerator,
) -> PortfolioDocument {
    let mut merged = existing.clone();
    merged.for_each_record_mut(|_, record| {
        record.status = None;
        record.merge_group_id = None;
    });

    for field in PersonalInfo::ALL {
        let Some(value) = incoming.personal_info.get(field) else {
            continue;
        };
        if value.trim().is_empty() {
            continue;
        }
        if let Some(slot) = merged.personal_info.slot_mut(field) {
            *slot = Some(value.clone());
        }
    }

    for (provider, url) in &incoming.social_profiles {
        if !url.trim().is_empty() {
            merged.social_profiles.insert(provider.clone(), url.clone());
        }
    }

    let mut conflicts = 0usize;
    for id in SectionId::ALL {
        let content = merge_section(id, &merged, incoming, ids);
        if let SectionContent::Records(records) = &content {
            conflicts += records
                .iter()
                .filter(|r| r.merge_group_id.is_some() && r.status == Some(Provenance::New))
                .count();
        }
        if !content.is_empty() && !merged.section_order.iter().any(|s| s == id.key()) {
            merged.section_order.push(id.key().to_string());
        }
        merged.set_section(id, content);
    }

    debug!("Merged draft into stored document: {conflicts} conflict group(s) pending review");
    merged
}
