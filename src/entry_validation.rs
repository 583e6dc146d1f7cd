use crate::entry::{NewEntry, ScheduleEntry};
use crate::relation::check_conflicts;
use crate::{Category, EntryId, Interval, ItemId};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

pub const TAG_SEPARATOR: &str = ";";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryValidationError {
    message: String,
}

impl EntryValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for EntryValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for EntryValidationError {}

/// Collects every problem with submitted form data instead of stopping at
/// the first one.
pub fn validate_new_entry(entry: &NewEntry) -> Result<(), EntryValidationError> {
    let mut warnings = Vec::new();
    if entry.name.trim().is_empty() {
        warnings.push("you must enter a name".to_string());
    }
    if let Err(err) = entry.interval() {
        warnings.push(err.to_string());
    }
    warnings.extend(tag_warnings(&entry.tags));
    if warnings.is_empty() {
        Ok(())
    } else {
        Err(EntryValidationError::new(warnings.join("; ")))
    }
}

/// Tags are stored `;`-separated in CSV exports, so the separator is not
/// allowed inside a tag.
pub fn validate_tags<S: AsRef<str>>(tags: &[S]) -> Result<(), EntryValidationError> {
    let warnings = tag_warnings(tags);
    if warnings.is_empty() {
        Ok(())
    } else {
        Err(EntryValidationError::new(warnings.join("; ")))
    }
}

fn tag_warnings<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    let mut warnings = Vec::new();
    if tags.iter().any(|tag| tag.as_ref().trim().is_empty()) {
        warnings.push("tags must not be blank".to_string());
    }
    for tag in tags.iter().map(AsRef::as_ref) {
        if tag.contains(TAG_SEPARATOR) {
            warnings.push(format!("tag '{tag}' must not contain '{TAG_SEPARATOR}'"));
        }
    }
    warnings
}

pub fn validate_entry(entry: &ScheduleEntry) -> Result<(), EntryValidationError> {
    if entry.item.name.trim().is_empty() {
        return Err(EntryValidationError::new(format!(
            "entry {} has an empty item name",
            entry.active_id
        )));
    }

    entry.interval().map_err(|err| {
        EntryValidationError::new(format!("entry {} has invalid times: {err}", entry.active_id))
    })?;

    let completable = entry.category().is_completable();
    match (completable, entry.completed) {
        (true, None) => {
            return Err(EntryValidationError::new(format!(
                "task entry {} is missing its completion flag",
                entry.active_id
            )));
        }
        (false, Some(_)) => {
            return Err(EntryValidationError::new(format!(
                "{} entry {} cannot carry a completion flag",
                entry.category(),
                entry.active_id
            )));
        }
        _ => {}
    }

    Ok(())
}

pub fn validate_entry_collection(entries: &[ScheduleEntry]) -> Result<(), EntryValidationError> {
    let mut seen_ids = HashSet::with_capacity(entries.len());
    let mut items = BTreeMap::new();
    let mut item_keys: BTreeMap<(Category, &str), ItemId> = BTreeMap::new();
    let mut by_date: BTreeMap<NaiveDate, Vec<(EntryId, Interval)>> = BTreeMap::new();

    for entry in entries {
        if !seen_ids.insert(entry.active_id) {
            return Err(EntryValidationError::new(format!(
                "duplicate entry id {}",
                entry.active_id
            )));
        }
        validate_entry(entry)?;

        if let Some(previous) = items.insert(entry.item.id, &entry.item) {
            if previous != &entry.item {
                return Err(EntryValidationError::new(format!(
                    "item id {} refers to both '{}' and '{}'",
                    entry.item.id, previous.name, entry.item.name
                )));
            }
        }
        let key = (entry.category(), entry.item.name.as_str());
        if let Some(other_id) = item_keys.insert(key, entry.item.id) {
            if other_id != entry.item.id {
                return Err(EntryValidationError::new(format!(
                    "{} '{}' is stored under both item {} and item {}",
                    entry.category(),
                    entry.item.name,
                    other_id,
                    entry.item.id
                )));
            }
        }

        let interval = entry.interval().map_err(|err| EntryValidationError::new(err.to_string()))?;
        let planned = by_date.entry(entry.date).or_default();
        check_conflicts(&interval, planned.iter().map(|(id, iv)| (*id, iv))).map_err(|err| {
            EntryValidationError::new(format!(
                "entry {} on {}: {err}",
                entry.active_id, entry.date
            ))
        })?;
        planned.push((entry.active_id, interval));
    }
    Ok(())
}
