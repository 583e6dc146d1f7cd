use chrono::{NaiveDate, NaiveTime};
use day_builder::{
    Category, DayPlan, EntryId, Item, NestingError, Relation, ScheduleEntry,
};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn entry(id: EntryId, category: Category, name: &str, start: NaiveTime, minutes: i64) -> ScheduleEntry {
    ScheduleEntry {
        active_id: id,
        item: Item::new(id, category, name),
        description: String::new(),
        date: d(2025, 3, 3),
        start,
        duration_minutes: minutes,
        completed: category.is_completable().then_some(false),
    }
}

fn names(plan: &DayPlan) -> Vec<(usize, String)> {
    plan.walk()
        .into_iter()
        .map(|(depth, e)| (depth, e.name().to_string()))
        .collect()
}

#[test]
fn tasks_nest_into_containing_timeframe() {
    let plan = DayPlan::build(vec![
        entry(1, Category::Timeframe, "Morning", t(8, 0), 240),
        entry(2, Category::Task, "Email", t(9, 0), 30),
        entry(3, Category::Task, "Standup", t(8, 30), 15),
        entry(4, Category::Task, "Lunch", t(12, 0), 60),
    ]);

    assert_eq!(plan.parent_of(2), Some(1));
    assert_eq!(plan.parent_of(3), Some(1));
    assert_eq!(plan.parent_of(4), None);
    assert_eq!(plan.children_of(1).unwrap().ids(), vec![3, 2]);
    assert_eq!(
        names(&plan),
        vec![
            (0, "Morning".to_string()),
            (1, "Standup".to_string()),
            (1, "Email".to_string()),
            (0, "Lunch".to_string()),
        ]
    );
}

#[test]
fn first_timeframe_in_start_order_wins() {
    let plan = DayPlan::build(vec![
        entry(1, Category::Timeframe, "Late block", t(9, 0), 120),
        entry(2, Category::Timeframe, "Early block", t(8, 0), 240),
        entry(3, Category::Task, "Review", t(9, 30), 30),
    ]);
    assert_eq!(plan.parent_of(3), Some(2));
}

#[test]
fn reminders_and_identical_tasks_stay_at_root() {
    let plan = DayPlan::build(vec![
        entry(1, Category::Timeframe, "Focus", t(9, 0), 60),
        entry(2, Category::Reminder, "Stretch", t(9, 30), 0),
        entry(3, Category::Task, "Same span", t(9, 0), 60),
        entry(4, Category::Task, "Spills over", t(9, 45), 30),
    ]);
    assert_eq!(plan.parent_of(2), None);
    assert_eq!(plan.parent_of(3), None);
    assert_eq!(plan.parent_of(4), None);
    assert_eq!(plan.roots(), vec![1, 3, 2, 4]);
}

#[test]
fn attach_rejects_children_that_do_not_fit() {
    let mut plan = DayPlan::new(vec![
        entry(1, Category::Timeframe, "Focus", t(9, 0), 60),
        entry(2, Category::Task, "Long task", t(9, 30), 60),
        entry(3, Category::Reminder, "Ping", t(9, 10), 0),
    ]);

    match plan.attach(1, 2) {
        Err(NestingError::Precondition(err)) => {
            assert_eq!(err.relation, Relation::AEndsWithinB);
        }
        other => panic!("expected precondition error, got {other:?}"),
    }
    assert!(matches!(
        plan.attach(1, 3),
        Err(NestingError::ChildCannotBeNested { child: 3, .. })
    ));
    assert!(matches!(
        plan.attach(2, 1),
        Err(NestingError::ParentCannotHaveChildren { parent: 2, .. })
    ));
    assert!(matches!(plan.attach(1, 1), Err(NestingError::SelfNesting(1))));
    assert!(matches!(plan.attach(1, 99), Err(NestingError::UnknownEntry(99))));
    assert_eq!(plan.parent_of(2), None);
}

#[test]
fn attach_keeps_children_ordered_and_moves_between_parents() {
    let mut plan = DayPlan::new(vec![
        entry(1, Category::Timeframe, "Day", t(8, 0), 600),
        entry(2, Category::Timeframe, "Afternoon", t(13, 0), 240),
        entry(3, Category::Task, "C", t(14, 0), 30),
        entry(4, Category::Task, "A", t(13, 15), 30),
        entry(5, Category::Task, "B", t(14, 0), 15),
    ]);

    assert_eq!(plan.attach(1, 3).unwrap(), 0);
    assert_eq!(plan.attach(1, 4).unwrap(), 0);
    // Equal starts keep insertion order.
    assert_eq!(plan.attach(1, 5).unwrap(), 2);
    assert_eq!(plan.children_of(1).unwrap().ids(), vec![4, 3, 5]);

    assert_eq!(plan.attach(2, 3).unwrap(), 0);
    assert_eq!(plan.parent_of(3), Some(2));
    assert_eq!(plan.children_of(1).unwrap().ids(), vec![4, 5]);
}

#[test]
fn removing_a_timeframe_releases_its_children() {
    let mut plan = DayPlan::build(vec![
        entry(1, Category::Timeframe, "Morning", t(8, 0), 120),
        entry(2, Category::Task, "Email", t(8, 30), 30),
    ]);
    assert_eq!(plan.parent_of(2), Some(1));

    let removed = plan.remove(1).unwrap();
    assert_eq!(removed.name(), "Morning");
    assert_eq!(plan.parent_of(2), None);
    assert_eq!(plan.roots(), vec![2]);
    assert_eq!(plan.len(), 1);
}

#[test]
fn entries_with_invalid_times_are_skipped() {
    let plan = DayPlan::build(vec![
        entry(1, Category::Task, "Night shift", t(23, 0), 120),
        entry(2, Category::Task, "Breakfast", t(7, 0), 30),
    ]);
    assert_eq!(plan.len(), 1);
    assert!(plan.entry(1).is_none());
}
