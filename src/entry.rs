use crate::interval::{Category, Interval, IntervalError};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

pub type EntryId = i64;
pub type ItemId = i64;

/// A reusable plan template, unique per (category, name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub category: Category,
    pub name: String,
}

impl Item {
    pub fn new(id: ItemId, category: Category, name: impl Into<String>) -> Self {
        Self {
            id,
            category,
            name: name.into(),
        }
    }

    pub fn matches(&self, category: Category, name: &str) -> bool {
        self.category == category && self.name == name
    }
}

/// One concrete scheduling of an item on a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub active_id: EntryId,
    pub item: Item,
    #[serde(default)]
    pub description: String,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub duration_minutes: i64,
    /// `Some` for tasks only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl ScheduleEntry {
    pub fn category(&self) -> Category {
        self.item.category
    }

    pub fn name(&self) -> &str {
        &self.item.name
    }

    pub fn interval(&self) -> Result<Interval, IntervalError> {
        Interval::from_duration(self.item.category, self.start, self.duration_minutes)
    }

    pub fn start_datetime(&self) -> NaiveDateTime {
        self.date.and_time(self.start)
    }

    pub fn is_completed(&self) -> bool {
        self.completed.unwrap_or(false)
    }
}

/// Form data for a new entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEntry {
    pub category: Category,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
    pub date: NaiveDate,
    pub start: NaiveTime,
    #[serde(default)]
    pub duration_minutes: i64,
}

impl NewEntry {
    pub fn new(
        category: Category,
        name: impl Into<String>,
        date: NaiveDate,
        start: NaiveTime,
        duration_minutes: i64,
    ) -> Self {
        Self {
            category,
            name: name.into(),
            tags: Vec::new(),
            description: String::new(),
            date,
            start,
            duration_minutes,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn interval(&self) -> Result<Interval, IntervalError> {
        Interval::from_duration(self.category, self.start, self.duration_minutes)
    }
}

/// Changes applied by an edit. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryUpdate {
    pub start: Option<NaiveTime>,
    pub duration_minutes: Option<i64>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl EntryUpdate {
    pub fn times(start: NaiveTime, duration_minutes: i64) -> Self {
        Self {
            start: Some(start),
            duration_minutes: Some(duration_minutes),
            ..Self::default()
        }
    }

    pub fn description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }

    pub fn touches_times(&self) -> bool {
        self.start.is_some() || self.duration_minutes.is_some()
    }
}
