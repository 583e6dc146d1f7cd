pub mod config;
pub mod entry;
pub mod entry_validation;
pub mod interval;
pub mod nesting;
pub mod persistence;
pub mod planner;
pub mod rating;
pub mod relation;

pub use config::{ConfigError, PlannerConfig};
pub use entry::{EntryId, EntryUpdate, Item, ItemId, NewEntry, ScheduleEntry};
pub use interval::{Category, Interval, IntervalError};
pub use nesting::{ChildList, DayPlan, NestedChild, NestingError, NestingPreconditionError};
pub use persistence::{
    PersistenceError, PersistenceResult, PlannerStore, load_entries_from_csv,
    load_planner_from_json, save_entries_to_csv, save_planner_to_json,
};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqlitePlannerStore;
pub use planner::{Planner, PlannerError, Template};
pub use rating::{DailyRating, RatingError};
pub use relation::{Relation, TimeOverlapError, can_nest, check_conflicts, classify, conflicts};
