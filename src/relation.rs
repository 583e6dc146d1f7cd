use crate::interval::{Category, Interval};
use crate::EntryId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How interval `a` sits relative to interval `b`.
///
/// Boundaries are half-open, so intervals that only touch (`a.end == b.start`)
/// are `Disjoint`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Disjoint,
    Identical,
    AContainsB,
    BContainsA,
    /// `a` starts first and its tail overlaps the head of `b`.
    AEndsWithinB,
    /// `b` starts first and its tail overlaps the head of `a`.
    BEndsWithinA,
}

impl Relation {
    /// The relation seen from the other side, i.e. `classify(b, a)`.
    pub fn mirrored(self) -> Self {
        match self {
            Relation::Disjoint => Relation::Disjoint,
            Relation::Identical => Relation::Identical,
            Relation::AContainsB => Relation::BContainsA,
            Relation::BContainsA => Relation::AContainsB,
            Relation::AEndsWithinB => Relation::BEndsWithinA,
            Relation::BEndsWithinA => Relation::AEndsWithinB,
        }
    }

    pub fn overlaps(self) -> bool {
        !matches!(self, Relation::Disjoint)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Relation::Disjoint => "disjoint",
            Relation::Identical => "identical",
            Relation::AContainsB => "a_contains_b",
            Relation::BContainsA => "b_contains_a",
            Relation::AEndsWithinB => "a_ends_within_b",
            Relation::BEndsWithinA => "b_ends_within_a",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn classify(a: &Interval, b: &Interval) -> Relation {
    if a.start() == b.start() && a.end() == b.end() {
        return Relation::Identical;
    }
    if a.start() >= b.end() || a.end() <= b.start() {
        return Relation::Disjoint;
    }
    if a.start() <= b.start() && a.end() >= b.end() {
        return Relation::AContainsB;
    }
    if a.start() >= b.start() && a.end() <= b.end() {
        return Relation::BContainsA;
    }
    // Overlapping with neither side containing the other leaves only the
    // staggered cases, and the earlier start decides which one.
    if a.start() < b.start() {
        Relation::AEndsWithinB
    } else {
        Relation::BEndsWithinA
    }
}

/// Two entries conflict when they share a category and overlap at all.
pub fn conflicts(a: &Interval, b: &Interval) -> bool {
    a.category() == b.category() && classify(a, b).overlaps()
}

pub fn can_nest(parent: &Interval, child: &Interval) -> bool {
    classify(parent, child) == Relation::AContainsB
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeOverlapError {
    pub category: Category,
    pub candidate: Interval,
    pub existing_id: EntryId,
    pub existing: Interval,
    pub relation: Relation,
}

impl fmt::Display for TimeOverlapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} conflicts with planned {} #{} {} ({})",
            self.candidate, self.category, self.existing_id, self.existing, self.relation
        )
    }
}

impl std::error::Error for TimeOverlapError {}

/// Checks a candidate interval against already planned entries and reports
/// the first same-category conflict.
pub fn check_conflicts<'a, I>(candidate: &Interval, existing: I) -> Result<(), TimeOverlapError>
where
    I: IntoIterator<Item = (EntryId, &'a Interval)>,
{
    for (existing_id, interval) in existing {
        if conflicts(candidate, interval) {
            return Err(TimeOverlapError {
                category: candidate.category(),
                candidate: *candidate,
                existing_id,
                existing: *interval,
                relation: classify(candidate, interval),
            });
        }
    }
    Ok(())
}
