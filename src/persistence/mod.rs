use crate::entry_validation;
use crate::planner::PlannerError;
use crate::{Planner, ScheduleEntry};
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Error as SerdeJsonError;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum PersistenceError {
    Serialization(SerdeJsonError),
    Io(io::Error),
    #[cfg(feature = "sqlite")]
    Sqlite(rusqlite::Error),
    Csv(csv::Error),
    Planner(PlannerError),
    InvalidData(String),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::Serialization(err) => write!(f, "serialization error: {err}"),
            PersistenceError::Io(err) => write!(f, "io error: {err}"),
            #[cfg(feature = "sqlite")]
            PersistenceError::Sqlite(err) => write!(f, "sqlite error: {err}"),
            PersistenceError::Csv(err) => write!(f, "csv error: {err}"),
            PersistenceError::Planner(err) => write!(f, "stored planner rejected: {err}"),
            PersistenceError::InvalidData(msg) => write!(f, "invalid data: {msg}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<SerdeJsonError> for PersistenceError {
    fn from(value: SerdeJsonError) -> Self {
        Self::Serialization(value)
    }
}

impl From<io::Error> for PersistenceError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for PersistenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<csv::Error> for PersistenceError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<PlannerError> for PersistenceError {
    fn from(value: PlannerError) -> Self {
        Self::Planner(value)
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

pub trait PlannerStore {
    fn save_planner(&self, planner: &Planner) -> PersistenceResult<()>;
    fn load_planner(&self) -> PersistenceResult<Option<Planner>>;
}

pub fn validate_entries(entries: &[ScheduleEntry]) -> PersistenceResult<()> {
    entry_validation::validate_entry_collection(entries)
        .map_err(|err| PersistenceError::InvalidData(err.to_string()))
}

pub fn validate_planner(planner: &Planner) -> PersistenceResult<()> {
    let entries: Vec<ScheduleEntry> = planner.entries().cloned().collect();
    validate_entries(&entries)
}

const START_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const START_FORMAT_MINUTES: &str = "%Y-%m-%dT%H:%M";
const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn format_start(start: NaiveDateTime) -> String {
    start.format(START_FORMAT).to_string()
}

/// Accepts starts written with or without seconds.
pub(crate) fn parse_start(input: &str) -> PersistenceResult<NaiveDateTime> {
    let input = input.trim();
    NaiveDateTime::parse_from_str(input, START_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(input, START_FORMAT_MINUTES))
        .map_err(|e| PersistenceError::InvalidData(format!("invalid start '{input}': {e}")))
}

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn parse_date(input: &str) -> PersistenceResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
        .map_err(|e| PersistenceError::InvalidData(format!("invalid date '{input}': {e}")))
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    load_entries_from_csv, load_planner_from_json, save_entries_to_csv, save_planner_to_json,
};
