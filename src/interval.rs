use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Kind of schedule item. The numeric codes are the ones stored in the
/// `items.item_type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Task,
    Timeframe,
    Reminder,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Task, Category::Timeframe, Category::Reminder];

    pub fn code(self) -> i64 {
        match self {
            Category::Task => 0,
            Category::Timeframe => 1,
            Category::Reminder => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Category::Task),
            1 => Some(Category::Timeframe),
            2 => Some(Category::Reminder),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Task => "task",
            Category::Timeframe => "timeframe",
            Category::Reminder => "reminder",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "task" => Some(Category::Task),
            "timeframe" => Some(Category::Timeframe),
            "reminder" => Some(Category::Reminder),
            _ => None,
        }
    }

    /// Only timeframes own an ordered list of nested entries.
    pub fn can_have_children(self) -> bool {
        matches!(self, Category::Timeframe)
    }

    /// Only tasks are placed inside a timeframe.
    pub fn can_be_nested(self) -> bool {
        matches!(self, Category::Task)
    }

    /// Only tasks carry a completion flag.
    pub fn is_completable(self) -> bool {
        matches!(self, Category::Task)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntervalError {
    EndBeforeStart { start: NaiveTime, end: NaiveTime },
    NegativeDuration(i64),
    CrossesMidnight { start: NaiveTime, duration_minutes: i64 },
}

impl fmt::Display for IntervalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntervalError::EndBeforeStart { start, end } => {
                write!(f, "end time {end} is earlier than start time {start}")
            }
            IntervalError::NegativeDuration(minutes) => {
                write!(f, "duration must not be negative (got {minutes} minutes)")
            }
            IntervalError::CrossesMidnight {
                start,
                duration_minutes,
            } => write!(
                f,
                "an item starting at {start} cannot last {duration_minutes} minutes without running past midnight"
            ),
        }
    }
}

impl std::error::Error for IntervalError {}

/// Time span of one schedule entry within its day.
///
/// Compared as a half-open range `[start, end)`. A zero duration gives a
/// point interval where `start == end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    category: Category,
    start: NaiveTime,
    end: NaiveTime,
}

impl Interval {
    pub fn new(category: Category, start: NaiveTime, end: NaiveTime) -> Result<Self, IntervalError> {
        if end < start {
            return Err(IntervalError::EndBeforeStart { start, end });
        }
        Ok(Self {
            category,
            start,
            end,
        })
    }

    /// Builds the interval the way stored rows describe it: a start time plus
    /// a duration in minutes.
    pub fn from_duration(
        category: Category,
        start: NaiveTime,
        duration_minutes: i64,
    ) -> Result<Self, IntervalError> {
        if duration_minutes < 0 {
            return Err(IntervalError::NegativeDuration(duration_minutes));
        }
        if duration_minutes >= MINUTES_PER_DAY {
            return Err(IntervalError::CrossesMidnight {
                start,
                duration_minutes,
            });
        }
        let (end, wrapped_secs) = start.overflowing_add_signed(Duration::minutes(duration_minutes));
        if wrapped_secs != 0 {
            return Err(IntervalError::CrossesMidnight {
                start,
                duration_minutes,
            });
        }
        Self::new(category, start, end)
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    pub fn is_point(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}, {})",
            self.category,
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn from_duration_computes_end() {
        let iv = Interval::from_duration(Category::Task, t(9, 0), 90).unwrap();
        assert_eq!(iv.end(), t(10, 30));
        assert_eq!(iv.duration_minutes(), 90);
        assert!(!iv.is_point());
    }

    #[test]
    fn zero_duration_is_a_point() {
        let iv = Interval::from_duration(Category::Reminder, t(12, 0), 0).unwrap();
        assert!(iv.is_point());
        assert_eq!(iv.start(), iv.end());
    }

    #[test]
    fn rejects_end_before_start() {
        let err = Interval::new(Category::Task, t(10, 0), t(9, 0)).unwrap_err();
        assert_eq!(
            err,
            IntervalError::EndBeforeStart {
                start: t(10, 0),
                end: t(9, 0)
            }
        );
    }

    #[test]
    fn rejects_durations_past_midnight() {
        let err = Interval::from_duration(Category::Timeframe, t(23, 0), 61).unwrap_err();
        assert!(matches!(err, IntervalError::CrossesMidnight { .. }));
        assert!(Interval::from_duration(Category::Timeframe, t(23, 0), 59).is_ok());
    }

    #[test]
    fn category_codes_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_code(category.code()), Some(category));
            assert_eq!(Category::from_str(category.as_str()), Some(category));
        }
        assert_eq!(Category::from_code(7), None);
    }
}
