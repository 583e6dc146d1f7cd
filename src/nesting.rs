use crate::entry::ScheduleEntry;
use crate::interval::{Category, Interval};
use crate::relation::{Relation, can_nest, classify};
use crate::EntryId;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestingPreconditionError {
    pub parent: Interval,
    pub child: Interval,
    pub relation: Relation,
}

impl fmt::Display for NestingPreconditionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} is not strictly contained in {} ({})",
            self.child, self.parent, self.relation
        )
    }
}

impl std::error::Error for NestingPreconditionError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NestedChild {
    pub id: EntryId,
    pub interval: Interval,
}

/// Children of one parent, kept in ascending start order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildList {
    parent: Interval,
    children: Vec<NestedChild>,
}

impl ChildList {
    pub fn new(parent: Interval) -> Self {
        Self {
            parent,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> &Interval {
        &self.parent
    }

    /// Inserts before the first child that starts strictly later, so children
    /// sharing a start keep their insertion order. Returns the position used.
    pub fn insert(&mut self, id: EntryId, interval: Interval) -> Result<usize, NestingPreconditionError> {
        if !can_nest(&self.parent, &interval) {
            return Err(NestingPreconditionError {
                parent: self.parent,
                child: interval,
                relation: classify(&self.parent, &interval),
            });
        }
        let position = self
            .children
            .iter()
            .position(|child| child.interval.start() > interval.start())
            .unwrap_or(self.children.len());
        self.children.insert(position, NestedChild { id, interval });
        Ok(position)
    }

    pub fn remove(&mut self, id: EntryId) -> Option<NestedChild> {
        let position = self.children.iter().position(|child| child.id == id)?;
        Some(self.children.remove(position))
    }

    pub fn contains(&self, id: EntryId) -> bool {
        self.children.iter().any(|child| child.id == id)
    }

    pub fn ids(&self) -> Vec<EntryId> {
        self.children.iter().map(|child| child.id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NestedChild> {
        self.children.iter()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NestingError {
    UnknownEntry(EntryId),
    SelfNesting(EntryId),
    ParentCannotHaveChildren { parent: EntryId, category: Category },
    ChildCannotBeNested { child: EntryId, category: Category },
    Precondition(NestingPreconditionError),
}

impl fmt::Display for NestingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NestingError::UnknownEntry(id) => write!(f, "entry {id} is not part of this day"),
            NestingError::SelfNesting(id) => write!(f, "entry {id} cannot be nested inside itself"),
            NestingError::ParentCannotHaveChildren { parent, category } => {
                write!(f, "entry {parent} is a {category} and cannot hold nested entries")
            }
            NestingError::ChildCannotBeNested { child, category } => {
                write!(f, "entry {child} is a {category} and cannot be nested")
            }
            NestingError::Precondition(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for NestingError {}

impl From<NestingPreconditionError> for NestingError {
    fn from(value: NestingPreconditionError) -> Self {
        Self::Precondition(value)
    }
}

/// Parent/child layout of a single day's entries.
///
/// Entries live in an arena keyed by ID. Children point at their parent
/// through `parents`; every timeframe owns a `ChildList`.
#[derive(Debug, Clone, Default)]
pub struct DayPlan {
    entries: BTreeMap<EntryId, ScheduleEntry>,
    intervals: HashMap<EntryId, Interval>,
    parents: HashMap<EntryId, EntryId>,
    children: HashMap<EntryId, ChildList>,
}

impl DayPlan {
    /// Places every entry without any nesting. Entries whose stored times do
    /// not form a valid interval are skipped.
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = ScheduleEntry>,
    {
        let mut plan = Self::default();
        for entry in entries {
            let interval = match entry.interval() {
                Ok(interval) => interval,
                Err(err) => {
                    tracing::warn!(entry = entry.active_id, %err, "skipping entry with invalid times");
                    continue;
                }
            };
            if interval.category().can_have_children() {
                plan.children.insert(entry.active_id, ChildList::new(interval));
            }
            plan.intervals.insert(entry.active_id, interval);
            plan.entries.insert(entry.active_id, entry);
        }
        plan
    }

    /// Builds the display tree for a day: each task, in start order, goes
    /// into the first timeframe (in start order) that strictly contains it.
    pub fn build<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = ScheduleEntry>,
    {
        let mut plan = Self::new(entries);
        let ordered = plan.ids_by_start();
        let frames: Vec<EntryId> = ordered
            .iter()
            .copied()
            .filter(|id| plan.children.contains_key(id))
            .collect();

        for id in ordered {
            let interval = plan.intervals[&id];
            if !interval.category().can_be_nested() {
                continue;
            }
            let parent = frames
                .iter()
                .copied()
                .find(|frame| can_nest(&plan.intervals[frame], &interval));
            if let Some(parent) = parent {
                match plan.attach(parent, id) {
                    Ok(position) => {
                        tracing::debug!(parent, child = id, position, "nested entry");
                    }
                    Err(err) => {
                        tracing::warn!(parent, child = id, %err, "unable to nest entry");
                    }
                }
            }
        }
        plan
    }

    /// Attaches `child` to `parent`, detaching it from any previous parent
    /// first. On error the layout is left untouched.
    pub fn attach(&mut self, parent: EntryId, child: EntryId) -> Result<usize, NestingError> {
        if parent == child {
            return Err(NestingError::SelfNesting(child));
        }
        let child_interval = *self
            .intervals
            .get(&child)
            .ok_or(NestingError::UnknownEntry(child))?;
        let parent_interval = *self
            .intervals
            .get(&parent)
            .ok_or(NestingError::UnknownEntry(parent))?;
        if !parent_interval.category().can_have_children() {
            return Err(NestingError::ParentCannotHaveChildren {
                parent,
                category: parent_interval.category(),
            });
        }
        if !child_interval.category().can_be_nested() {
            return Err(NestingError::ChildCannotBeNested {
                child,
                category: child_interval.category(),
            });
        }
        if !can_nest(&parent_interval, &child_interval) {
            return Err(NestingError::Precondition(NestingPreconditionError {
                parent: parent_interval,
                child: child_interval,
                relation: classify(&parent_interval, &child_interval),
            }));
        }

        self.detach(child);
        let list = self
            .children
            .get_mut(&parent)
            .ok_or(NestingError::UnknownEntry(parent))?;
        let position = list.insert(child, child_interval)?;
        self.parents.insert(child, parent);
        Ok(position)
    }

    /// Removes `child` from its parent's list. Returns the former parent.
    pub fn detach(&mut self, child: EntryId) -> Option<EntryId> {
        let parent = self.parents.remove(&child)?;
        if let Some(list) = self.children.get_mut(&parent) {
            list.remove(child);
        }
        Some(parent)
    }

    /// Drops an entry from the layout. Its children become roots.
    pub fn remove(&mut self, id: EntryId) -> Option<ScheduleEntry> {
        let entry = self.entries.remove(&id)?;
        self.detach(id);
        if let Some(list) = self.children.remove(&id) {
            for child in list.iter() {
                self.parents.remove(&child.id);
            }
        }
        self.intervals.remove(&id);
        Some(entry)
    }

    pub fn entry(&self, id: EntryId) -> Option<&ScheduleEntry> {
        self.entries.get(&id)
    }

    pub fn parent_of(&self, child: EntryId) -> Option<EntryId> {
        self.parents.get(&child).copied()
    }

    pub fn children_of(&self, parent: EntryId) -> Option<&ChildList> {
        self.children.get(&parent)
    }

    /// Entries that are not nested, ordered by start (ties by ID).
    pub fn roots(&self) -> Vec<EntryId> {
        self.ids_by_start()
            .into_iter()
            .filter(|id| !self.parents.contains_key(id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Walks the tree depth-first in display order, yielding each entry with
    /// its nesting depth.
    pub fn walk(&self) -> Vec<(usize, &ScheduleEntry)> {
        let mut out = Vec::with_capacity(self.entries.len());
        for root in self.roots() {
            self.walk_from(root, 0, &mut out);
        }
        out
    }

    fn walk_from<'a>(&'a self, id: EntryId, depth: usize, out: &mut Vec<(usize, &'a ScheduleEntry)>) {
        let Some(entry) = self.entries.get(&id) else {
            return;
        };
        out.push((depth, entry));
        if let Some(list) = self.children.get(&id) {
            for child in list.iter() {
                self.walk_from(child.id, depth + 1, out);
            }
        }
    }

    fn ids_by_start(&self) -> Vec<EntryId> {
        let mut ids: Vec<EntryId> = self.intervals.keys().copied().collect();
        ids.sort_by_key(|id| (self.intervals[id].start(), *id));
        ids
    }
}
