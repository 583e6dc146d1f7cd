use super::{PersistenceError, PersistenceResult, PlannerStore, format_date, format_start};
use crate::{Category, DailyRating, Item, ItemId, Planner, ScheduleEntry};
use chrono::NaiveDate;
use rusqlite::{Connection, Transaction, params};
use std::sync::Mutex;

pub struct SqlitePlannerStore {
    connection: Mutex<Connection>,
}

impl SqlitePlannerStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS items (
                item_id INTEGER PRIMARY KEY,
                item_type INTEGER NOT NULL,
                item_name TEXT NOT NULL,
                UNIQUE (item_type, item_name)
            );
            CREATE TABLE IF NOT EXISTS tags (
                tag_id INTEGER PRIMARY KEY,
                tag_name TEXT NOT NULL UNIQUE
            );
            CREATE TABLE IF NOT EXISTS tag_map (
                item_id INTEGER NOT NULL,
                tag_id INTEGER NOT NULL,
                PRIMARY KEY (item_id, tag_id),
                FOREIGN KEY (item_id) REFERENCES items (item_id),
                FOREIGN KEY (tag_id) REFERENCES tags (tag_id)
            );
            CREATE TABLE IF NOT EXISTS schedule (
                active_id INTEGER PRIMARY KEY,
                item_id INTEGER NOT NULL,
                start TEXT NOT NULL,
                duration INTEGER NOT NULL,
                description TEXT,
                completed BOOLEAN,
                FOREIGN KEY (item_id) REFERENCES items (item_id)
            );
            CREATE TABLE IF NOT EXISTS ratings (
                date TEXT PRIMARY KEY,
                rating INTEGER
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn clear(&self, tx: &Transaction) -> PersistenceResult<()> {
        tx.execute_batch(
            "DELETE FROM tag_map; DELETE FROM schedule; DELETE FROM tags; DELETE FROM items; DELETE FROM ratings;",
        )?;
        Ok(())
    }

    fn save_items(&self, tx: &Transaction, planner: &Planner) -> PersistenceResult<()> {
        let mut stmt =
            tx.prepare("INSERT INTO items (item_id, item_type, item_name) VALUES (?1, ?2, ?3)")?;
        for item in planner.items() {
            stmt.execute(params![item.id, item.category.code(), item.name])?;
        }
        Ok(())
    }

    fn save_tags(&self, tx: &Transaction, planner: &Planner) -> PersistenceResult<()> {
        let mut insert_tag = tx.prepare("INSERT OR IGNORE INTO tags (tag_name) VALUES (?1)")?;
        let mut find_tag = tx.prepare("SELECT tag_id FROM tags WHERE tag_name = ?1")?;
        let mut insert_map = tx.prepare("INSERT INTO tag_map (item_id, tag_id) VALUES (?1, ?2)")?;
        for (item_id, tag) in planner.tag_pairs() {
            insert_tag.execute(params![tag])?;
            let tag_id: i64 = find_tag.query_row(params![tag], |row| row.get(0))?;
            insert_map.execute(params![item_id, tag_id])?;
        }
        Ok(())
    }

    fn save_entries(&self, tx: &Transaction, planner: &Planner) -> PersistenceResult<()> {
        let mut stmt = tx.prepare(
            "INSERT INTO schedule (active_id, item_id, start, duration, description, completed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for entry in planner.entries() {
            stmt.execute(params![
                entry.active_id,
                entry.item.id,
                format_start(entry.start_datetime()),
                entry.duration_minutes,
                entry.description,
                entry.completed,
            ])?;
        }
        Ok(())
    }

    fn save_ratings(&self, tx: &Transaction, planner: &Planner) -> PersistenceResult<()> {
        let mut stmt = tx.prepare("INSERT INTO ratings (date, rating) VALUES (?1, ?2)")?;
        for (date, rating) in planner.ratings_between(None, None) {
            stmt.execute(params![format_date(date), rating.value()])?;
        }
        Ok(())
    }

    fn load_items(conn: &Connection) -> PersistenceResult<Vec<Item>> {
        let mut stmt =
            conn.prepare("SELECT item_id, item_type, item_name FROM items ORDER BY item_id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;
        let mut items = Vec::new();
        for row in rows {
            let (id, code, name) = row?;
            items.push(Item::new(id, category_from_code(code)?, name));
        }
        Ok(items)
    }

    fn load_tags(conn: &Connection) -> PersistenceResult<Vec<(ItemId, String)>> {
        let mut stmt = conn.prepare(
            "SELECT tag_map.item_id, tags.tag_name FROM tag_map
             INNER JOIN tags ON tags.tag_id = tag_map.tag_id
             ORDER BY tag_map.item_id, tags.tag_name",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?;
        let mut tags = Vec::new();
        for row in rows {
            tags.push(row?);
        }
        Ok(tags)
    }

    fn load_entries(conn: &Connection) -> PersistenceResult<Vec<ScheduleEntry>> {
        let mut stmt = conn.prepare(
            "SELECT active_id, items.item_id, items.item_type, items.item_name,
                    description, start, duration, completed
             FROM schedule
             JOIN items ON items.item_id = schedule.item_id
             ORDER BY start, active_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, i64>(6)?,
                row.get::<_, Option<bool>>(7)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (active_id, item_id, code, name, description, start, duration, completed) = row?;
            let start = super::parse_start(&start)?;
            entries.push(ScheduleEntry {
                active_id,
                item: Item::new(item_id, category_from_code(code)?, name),
                description: description.unwrap_or_default(),
                date: start.date(),
                start: start.time(),
                duration_minutes: duration,
                completed,
            });
        }
        Ok(entries)
    }

    fn load_ratings(conn: &Connection) -> PersistenceResult<Vec<(NaiveDate, DailyRating)>> {
        let mut stmt = conn.prepare("SELECT date, rating FROM ratings ORDER BY date ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<i64>>(1)?))
        })?;
        let mut ratings = Vec::new();
        for row in rows {
            let (date, value) = row?;
            let Some(value) = value else {
                continue;
            };
            let rating = DailyRating::new(value)
                .map_err(|err| PersistenceError::InvalidData(format!("{date}: {err}")))?;
            ratings.push((super::parse_date(&date)?, rating));
        }
        Ok(ratings)
    }
}

fn category_from_code(code: i64) -> PersistenceResult<Category> {
    Category::from_code(code)
        .ok_or_else(|| PersistenceError::InvalidData(format!("unknown item_type {code}")))
}

impl PlannerStore for SqlitePlannerStore {
    fn save_planner(&self, planner: &Planner) -> PersistenceResult<()> {
        super::validate_planner(planner)?;
        let mut conn = self.connection.lock().expect("sqlite mutex poisoned");
        let tx = conn.transaction()?;
        self.clear(&tx)?;
        self.save_items(&tx, planner)?;
        self.save_tags(&tx, planner)?;
        self.save_entries(&tx, planner)?;
        self.save_ratings(&tx, planner)?;
        tx.commit()?;
        tracing::info!(entries = planner.entry_count(), "planner saved to sqlite");
        Ok(())
    }

    fn load_planner(&self) -> PersistenceResult<Option<Planner>> {
        let conn = self.connection.lock().expect("sqlite mutex poisoned");

        let items = Self::load_items(&conn)?;
        let ratings = Self::load_ratings(&conn)?;
        if items.is_empty() && ratings.is_empty() {
            return Ok(None);
        }
        let tags = Self::load_tags(&conn)?;
        let entries = Self::load_entries(&conn)?;
        super::validate_entries(&entries)?;

        let planner = Planner::restore(items, tags, entries, ratings)?;
        tracing::info!(entries = planner.entry_count(), "planner loaded from sqlite");
        Ok(Some(planner))
    }
}
