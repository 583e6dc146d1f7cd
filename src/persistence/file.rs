use super::{
    PersistenceError, PersistenceResult, format_date, format_start, parse_date, parse_start,
};
use crate::entry_validation::TAG_SEPARATOR;
use crate::{Category, DailyRating, Item, ItemId, Planner, ScheduleEntry};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::path::Path;

#[derive(Serialize, Deserialize)]
struct TagRecord {
    item_id: ItemId,
    tag: String,
}

#[derive(Serialize, Deserialize)]
struct RatingRecord {
    date: NaiveDate,
    rating: DailyRating,
}

#[derive(Serialize, Deserialize)]
struct PlannerSnapshot {
    #[serde(default)]
    items: Vec<Item>,
    #[serde(default)]
    tags: Vec<TagRecord>,
    entries: Vec<ScheduleEntry>,
    #[serde(default)]
    ratings: Vec<RatingRecord>,
}

impl PlannerSnapshot {
    fn from_planner(planner: &Planner) -> PersistenceResult<Self> {
        let entries: Vec<ScheduleEntry> = planner.entries().cloned().collect();
        super::validate_entries(&entries)?;
        Ok(Self {
            items: planner.items().cloned().collect(),
            tags: planner
                .tag_pairs()
                .into_iter()
                .map(|(item_id, tag)| TagRecord { item_id, tag })
                .collect(),
            entries,
            ratings: planner
                .ratings_between(None, None)
                .into_iter()
                .map(|(date, rating)| RatingRecord { date, rating })
                .collect(),
        })
    }

    fn into_planner(self) -> PersistenceResult<Planner> {
        super::validate_entries(&self.entries)?;
        let planner = Planner::restore(
            self.items,
            self.tags.into_iter().map(|t| (t.item_id, t.tag)).collect(),
            self.entries,
            self.ratings.into_iter().map(|r| (r.date, r.rating)).collect(),
        )?;
        Ok(planner)
    }
}

pub fn save_planner_to_json<P: AsRef<Path>>(planner: &Planner, path: P) -> PersistenceResult<()> {
    let path = path.as_ref();
    let snapshot = PlannerSnapshot::from_planner(planner)?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    tracing::info!(path = %path.display(), entries = snapshot.entries.len(), "planner saved as json");
    Ok(())
}

pub fn load_planner_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Planner> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let snapshot: PlannerSnapshot = serde_json::from_reader(file)?;
    let planner = snapshot.into_planner()?;
    tracing::info!(path = %path.display(), entries = planner.entry_count(), "planner loaded from json");
    Ok(planner)
}

const RATINGS_ROW: &str = "__ratings__";

#[derive(Default, Serialize, Deserialize)]
struct EntryCsvRecord {
    active_id: i64,
    item_id: i64,
    item_type: String,
    item_name: String,
    tags: String,
    description: String,
    start: String,
    duration: i64,
    completed: String,
    #[serde(default)]
    ratings_json: String,
}

impl EntryCsvRecord {
    fn from_entry(entry: &ScheduleEntry, tags: &[String]) -> Self {
        Self {
            active_id: entry.active_id,
            item_id: entry.item.id,
            item_type: entry.category().as_str().to_string(),
            item_name: entry.item.name.clone(),
            tags: tags.join(TAG_SEPARATOR),
            description: entry.description.clone(),
            start: format_start(entry.start_datetime()),
            duration: entry.duration_minutes,
            completed: entry.completed.map(|c| c.to_string()).unwrap_or_default(),
            ratings_json: String::new(),
        }
    }

    fn ratings_row(planner: &Planner) -> PersistenceResult<Self> {
        let ratings: BTreeMap<String, u8> = planner
            .ratings_between(None, None)
            .into_iter()
            .map(|(date, rating)| (format_date(date), rating.value()))
            .collect();
        Ok(Self {
            item_name: RATINGS_ROW.to_string(),
            ratings_json: serde_json::to_string(&ratings)?,
            ..Self::default()
        })
    }

    fn is_ratings_row(&self) -> bool {
        !self.ratings_json.trim().is_empty()
    }

    fn parse_ratings(&self) -> PersistenceResult<Vec<(NaiveDate, DailyRating)>> {
        let raw: BTreeMap<String, i64> = serde_json::from_str(&self.ratings_json)
            .map_err(|err| PersistenceError::InvalidData(format!("invalid ratings json: {err}")))?;
        raw.into_iter()
            .map(|(date, value)| {
                let rating = DailyRating::new(value)
                    .map_err(|err| PersistenceError::InvalidData(format!("{date}: {err}")))?;
                Ok((parse_date(&date)?, rating))
            })
            .collect()
    }

    fn tags(&self) -> Vec<String> {
        self.tags
            .split(TAG_SEPARATOR)
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(ToOwned::to_owned)
            .collect()
    }

    fn into_entry(self) -> PersistenceResult<ScheduleEntry> {
        let category = Category::from_str(&self.item_type).ok_or_else(|| {
            PersistenceError::InvalidData(format!("invalid item_type '{}'", self.item_type))
        })?;
        let start = parse_start(&self.start)?;
        let completed = match self.completed.trim().to_ascii_lowercase().as_str() {
            "" => None,
            "true" => Some(true),
            "false" => Some(false),
            other => {
                return Err(PersistenceError::InvalidData(format!(
                    "invalid completed flag '{other}'"
                )));
            }
        };
        Ok(ScheduleEntry {
            active_id: self.active_id,
            item: Item::new(self.item_id, category, self.item_name),
            description: self.description,
            date: start.date(),
            start: start.time(),
            duration_minutes: self.duration,
            completed,
        })
    }
}

pub fn save_entries_to_csv<P: AsRef<Path>>(planner: &Planner, path: P) -> PersistenceResult<()> {
    super::validate_planner(planner)?;
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    writer.serialize(EntryCsvRecord::ratings_row(planner)?)?;
    for entry in planner.entries_between(None, None) {
        let tags = planner.item_tags(entry.item.id);
        writer.serialize(EntryCsvRecord::from_entry(entry, &tags))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_entries_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Planner> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut entries = Vec::new();
    let mut tags = BTreeSet::new();
    let mut ratings: Option<Vec<(NaiveDate, DailyRating)>> = None;
    for record in reader.deserialize::<EntryCsvRecord>() {
        let record = record?;
        if record.is_ratings_row() {
            if ratings.is_some() {
                return Err(PersistenceError::InvalidData(
                    "CSV file contained multiple ratings rows".into(),
                ));
            }
            ratings = Some(record.parse_ratings()?);
            continue;
        }
        for tag in record.tags() {
            tags.insert((record.item_id, tag));
        }
        entries.push(record.into_entry()?);
    }

    super::validate_entries(&entries)?;
    let planner = Planner::restore(
        Vec::new(),
        tags.into_iter().collect(),
        entries,
        ratings.unwrap_or_default(),
    )?;
    Ok(planner)
}
