use crate::entry::{EntryId, EntryUpdate, Item, ItemId, NewEntry, ScheduleEntry};
use crate::entry_validation::{self, EntryValidationError};
use crate::interval::{Category, Interval, IntervalError};
use crate::nesting::DayPlan;
use crate::rating::DailyRating;
use crate::relation::{TimeOverlapError, check_conflicts};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum PlannerError {
    Validation(EntryValidationError),
    Interval(IntervalError),
    TimeOverlap(TimeOverlapError),
    EntryNotFound(EntryId),
    ItemNotFound(ItemId),
    NotATask { id: EntryId, category: Category },
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannerError::Validation(err) => write!(f, "invalid entry: {err}"),
            PlannerError::Interval(err) => write!(f, "invalid times: {err}"),
            PlannerError::TimeOverlap(err) => write!(f, "time overlap: {err}"),
            PlannerError::EntryNotFound(id) => write!(f, "entry {id} not found"),
            PlannerError::ItemNotFound(id) => write!(f, "item {id} not found"),
            PlannerError::NotATask { id, category } => {
                write!(f, "entry {id} is a {category}; only tasks can be completed")
            }
        }
    }
}

impl std::error::Error for PlannerError {}

impl From<EntryValidationError> for PlannerError {
    fn from(value: EntryValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<IntervalError> for PlannerError {
    fn from(value: IntervalError) -> Self {
        Self::Interval(value)
    }
}

impl From<TimeOverlapError> for PlannerError {
    fn from(value: TimeOverlapError) -> Self {
        Self::TimeOverlap(value)
    }
}

/// An item together with how often it has been scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub item: Item,
    pub count: usize,
}

#[derive(Debug, Clone)]
pub struct Planner {
    items: BTreeMap<ItemId, Item>,
    tags: BTreeMap<ItemId, BTreeSet<String>>,
    entries: BTreeMap<EntryId, ScheduleEntry>,
    ratings: BTreeMap<NaiveDate, DailyRating>,
    next_entry_id: EntryId,
    next_item_id: ItemId,
}

impl Planner {
    pub fn new() -> Self {
        Self {
            items: BTreeMap::new(),
            tags: BTreeMap::new(),
            entries: BTreeMap::new(),
            ratings: BTreeMap::new(),
            next_entry_id: 1,
            next_item_id: 1,
        }
    }

    /// Rebuilds a planner from stored rows, re-checking them on the way in.
    pub fn restore(
        items: Vec<Item>,
        tags: Vec<(ItemId, String)>,
        entries: Vec<ScheduleEntry>,
        ratings: Vec<(NaiveDate, DailyRating)>,
    ) -> Result<Self, PlannerError> {
        entry_validation::validate_entry_collection(&entries)?;

        let mut planner = Self::new();
        for item in items {
            planner.register_item(item)?;
        }
        for entry in &entries {
            planner.register_item(entry.item.clone())?;
        }
        for (item_id, tag) in tags {
            if !planner.items.contains_key(&item_id) {
                return Err(PlannerError::ItemNotFound(item_id));
            }
            planner.add_tags(item_id, [tag]);
        }
        for entry in entries {
            planner.next_entry_id = planner.next_entry_id.max(entry.active_id + 1);
            planner.entries.insert(entry.active_id, entry);
        }
        planner.ratings.extend(ratings);
        Ok(planner)
    }

    fn register_item(&mut self, item: Item) -> Result<(), PlannerError> {
        if let Some(existing) = self.items.get(&item.id) {
            if existing != &item {
                return Err(EntryValidationError::new(format!(
                    "item id {} refers to both '{}' and '{}'",
                    item.id, existing.name, item.name
                ))
                .into());
            }
            return Ok(());
        }
        if let Some(existing) = self.find_item(item.category, &item.name) {
            return Err(EntryValidationError::new(format!(
                "{} '{}' is stored under both item {} and item {}",
                item.category, item.name, existing.id, item.id
            ))
            .into());
        }
        self.next_item_id = self.next_item_id.max(item.id + 1);
        self.items.insert(item.id, item);
        Ok(())
    }

    /// Finds the item for a (category, name) pair, creating it on first use.
    fn item_for(&mut self, category: Category, name: &str) -> Item {
        if let Some(item) = self.find_item(category, name) {
            return item.clone();
        }
        let item = Item::new(self.next_item_id, category, name);
        self.next_item_id += 1;
        self.items.insert(item.id, item.clone());
        item
    }

    fn add_tags<I, S>(&mut self, item_id: ItemId, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = self.tags.entry(item_id).or_default();
        for tag in tags {
            let tag = tag.as_ref().trim().to_lowercase();
            if !tag.is_empty() {
                set.insert(tag);
            }
        }
        if set.is_empty() {
            self.tags.remove(&item_id);
        }
    }

    /// Rejects `interval` if it clashes with another entry of the same
    /// category on `date`. `exclude` skips the entry being edited.
    pub fn check_conflicts(
        &self,
        date: NaiveDate,
        interval: &Interval,
        exclude: Option<EntryId>,
    ) -> Result<(), TimeOverlapError> {
        let planned: Vec<(EntryId, Interval)> = self
            .entries
            .values()
            .filter(|entry| entry.date == date && Some(entry.active_id) != exclude)
            .filter_map(|entry| entry.interval().ok().map(|iv| (entry.active_id, iv)))
            .collect();
        check_conflicts(interval, planned.iter().map(|(id, iv)| (*id, iv)))
    }

    pub fn create_entry(&mut self, new_entry: NewEntry) -> Result<EntryId, PlannerError> {
        entry_validation::validate_new_entry(&new_entry)?;
        let interval = new_entry.interval()?;
        if let Err(err) = self.check_conflicts(new_entry.date, &interval, None) {
            debug!(date = %new_entry.date, %err, "rejected new entry");
            return Err(err.into());
        }

        let name = new_entry.name.trim();
        let item = self.item_for(new_entry.category, name);
        self.add_tags(item.id, &new_entry.tags);

        let active_id = self.next_entry_id;
        self.next_entry_id += 1;
        let completed = new_entry.category.is_completable().then_some(false);
        let entry = ScheduleEntry {
            active_id,
            item,
            description: new_entry.description,
            date: new_entry.date,
            start: new_entry.start,
            duration_minutes: new_entry.duration_minutes,
            completed,
        };
        info!(active_id, category = %entry.category(), name = entry.name(), date = %entry.date, "entry created");
        self.entries.insert(active_id, entry);
        Ok(active_id)
    }

    pub fn update_entry(&mut self, id: EntryId, update: EntryUpdate) -> Result<(), PlannerError> {
        let current = self.entries.get(&id).ok_or(PlannerError::EntryNotFound(id))?;
        let touches_times = update.touches_times();
        entry_validation::validate_tags(&update.tags)?;
        let mut updated = current.clone();
        if let Some(start) = update.start {
            updated.start = start;
        }
        if let Some(duration) = update.duration_minutes {
            updated.duration_minutes = duration;
        }
        if let Some(description) = update.description {
            updated.description = description;
        }
        if let Some(completed) = update.completed {
            if !updated.category().is_completable() {
                return Err(PlannerError::NotATask {
                    id,
                    category: updated.category(),
                });
            }
            updated.completed = Some(completed);
        }

        let interval = updated.interval()?;
        if touches_times {
            if let Err(err) = self.check_conflicts(updated.date, &interval, Some(id)) {
                debug!(active_id = id, %err, "rejected entry update");
                return Err(err.into());
            }
        }

        let item_id = updated.item.id;
        self.add_tags(item_id, &update.tags);
        debug!(active_id = id, "entry updated");
        self.entries.insert(id, updated);
        Ok(())
    }

    pub fn delete_entry(&mut self, id: EntryId) -> Result<ScheduleEntry, PlannerError> {
        let entry = self.entries.remove(&id).ok_or(PlannerError::EntryNotFound(id))?;
        info!(active_id = id, "entry deleted");
        Ok(entry)
    }

    pub fn set_completed(&mut self, id: EntryId, completed: bool) -> Result<(), PlannerError> {
        let entry = self.entries.get_mut(&id).ok_or(PlannerError::EntryNotFound(id))?;
        if !entry.category().is_completable() {
            return Err(PlannerError::NotATask {
                id,
                category: entry.category(),
            });
        }
        entry.completed = Some(completed);
        Ok(())
    }

    pub fn entry(&self, id: EntryId) -> Option<&ScheduleEntry> {
        self.entries.get(&id)
    }

    pub fn entries(&self) -> impl Iterator<Item = &ScheduleEntry> {
        self.entries.values()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Entries planned for `date`, earliest first.
    pub fn entries_on(&self, date: NaiveDate) -> Vec<&ScheduleEntry> {
        let mut entries: Vec<&ScheduleEntry> =
            self.entries.values().filter(|entry| entry.date == date).collect();
        entries.sort_by_key(|entry| (entry.start, entry.active_id));
        entries
    }

    /// History view. Either bound may be left open; both are inclusive.
    pub fn entries_between(
        &self,
        oldest: Option<NaiveDate>,
        newest: Option<NaiveDate>,
    ) -> Vec<&ScheduleEntry> {
        let mut entries: Vec<&ScheduleEntry> = self
            .entries
            .values()
            .filter(|entry| in_range(entry.date, oldest, newest))
            .collect();
        entries.sort_by_key(|entry| (entry.start_datetime(), entry.active_id));
        entries
    }

    pub fn day_plan(&self, date: NaiveDate) -> DayPlan {
        DayPlan::build(self.entries_on(date).into_iter().cloned())
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn find_item(&self, category: Category, name: &str) -> Option<&Item> {
        let name = name.trim();
        self.items.values().find(|item| item.matches(category, name))
    }

    pub fn item_exists(&self, category: Category, name: &str) -> bool {
        self.find_item(category, name).is_some()
    }

    pub fn item_tags(&self, item_id: ItemId) -> Vec<String> {
        self.tags
            .get(&item_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Adds tags to an item; existing tags are kept.
    pub fn tag_item<I, S>(&mut self, item_id: ItemId, tags: I) -> Result<(), PlannerError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if !self.items.contains_key(&item_id) {
            return Err(PlannerError::ItemNotFound(item_id));
        }
        let tags: Vec<S> = tags.into_iter().collect();
        entry_validation::validate_tags(&tags)?;
        self.add_tags(item_id, tags);
        Ok(())
    }

    pub fn items_with_tag(&self, tag: &str) -> Vec<&Item> {
        let tag = tag.trim().to_lowercase();
        self.tags
            .iter()
            .filter(|(_, set)| set.contains(&tag))
            .filter_map(|(item_id, _)| self.items.get(item_id))
            .collect()
    }

    pub fn tag_pairs(&self) -> Vec<(ItemId, String)> {
        self.tags
            .iter()
            .flat_map(|(item_id, set)| set.iter().map(move |tag| (*item_id, tag.clone())))
            .collect()
    }

    /// Items that have been scheduled at least once, most used first.
    pub fn templates(&self) -> Vec<Template> {
        let mut counts: BTreeMap<ItemId, usize> = BTreeMap::new();
        for entry in self.entries.values() {
            *counts.entry(entry.item.id).or_default() += 1;
        }
        let mut templates: Vec<Template> = counts
            .into_iter()
            .filter_map(|(item_id, count)| {
                self.items.get(&item_id).map(|item| Template {
                    item: item.clone(),
                    count,
                })
            })
            .collect();
        templates.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.item.name.cmp(&b.item.name))
                .then_with(|| a.item.category.cmp(&b.item.category))
        });
        templates
    }

    /// Stores the rating for `date`, returning the one it replaced.
    pub fn set_rating(&mut self, date: NaiveDate, rating: DailyRating) -> Option<DailyRating> {
        let previous = self.ratings.insert(date, rating);
        debug!(%date, rating = rating.value(), replaced = previous.is_some(), "rating saved");
        previous
    }

    pub fn clear_rating(&mut self, date: NaiveDate) -> Option<DailyRating> {
        self.ratings.remove(&date)
    }

    pub fn rating_on(&self, date: NaiveDate) -> Option<DailyRating> {
        self.ratings.get(&date).copied()
    }

    pub fn ratings_between(
        &self,
        oldest: Option<NaiveDate>,
        newest: Option<NaiveDate>,
    ) -> Vec<(NaiveDate, DailyRating)> {
        self.ratings
            .iter()
            .filter(|(date, _)| in_range(**date, oldest, newest))
            .map(|(date, rating)| (*date, *rating))
            .collect()
    }

    pub fn average_rating(&self) -> Option<f64> {
        if self.ratings.is_empty() {
            return None;
        }
        let total: u32 = self.ratings.values().map(|r| r.value() as u32).sum();
        Some(total as f64 / self.ratings.len() as f64)
    }
}

impl Default for Planner {
    fn default() -> Self {
        Self::new()
    }
}

fn in_range(date: NaiveDate, oldest: Option<NaiveDate>, newest: Option<NaiveDate>) -> bool {
    oldest.is_none_or(|oldest| date >= oldest) && newest.is_none_or(|newest| date <= newest)
}
