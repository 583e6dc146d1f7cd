use chrono::{NaiveDate, NaiveTime};
use day_builder::{
    Category, DailyRating, EntryUpdate, Item, NewEntry, Planner, PlannerError, Relation,
};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn add(planner: &mut Planner, category: Category, name: &str, start: NaiveTime, minutes: i64) -> i64 {
    planner
        .create_entry(NewEntry::new(category, name, d(2025, 3, 3), start, minutes))
        .expect("create entry")
}

#[test]
fn overlapping_entry_of_same_category_is_rejected() {
    let mut planner = Planner::new();
    let first = add(&mut planner, Category::Task, "Write report", t(9, 0), 60);

    let err = planner
        .create_entry(NewEntry::new(Category::Task, "Call", d(2025, 3, 3), t(9, 30), 30))
        .unwrap_err();
    match err {
        PlannerError::TimeOverlap(overlap) => {
            assert_eq!(overlap.existing_id, first);
            assert_eq!(overlap.relation, Relation::BContainsA);
        }
        other => panic!("expected overlap, got {other:?}"),
    }
    assert_eq!(planner.entry_count(), 1);
}

#[test]
fn other_days_and_categories_do_not_clash() {
    let mut planner = Planner::new();
    add(&mut planner, Category::Task, "Write report", t(9, 0), 60);
    add(&mut planner, Category::Timeframe, "Deep work", t(9, 0), 60);
    add(&mut planner, Category::Task, "Next task", t(10, 0), 30);
    planner
        .create_entry(NewEntry::new(Category::Task, "Write report", d(2025, 3, 4), t(9, 0), 60))
        .expect("different day");
    assert_eq!(planner.entry_count(), 4);
}

#[test]
fn invalid_form_data_reports_every_problem() {
    let mut planner = Planner::new();
    let err = planner
        .create_entry(NewEntry::new(Category::Task, "  ", d(2025, 3, 3), t(23, 30), 60))
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("name"), "{message}");
    assert!(message.contains("midnight"), "{message}");
}

#[test]
fn completion_is_tracked_for_tasks_only() {
    let mut planner = Planner::new();
    let task = add(&mut planner, Category::Task, "Laundry", t(8, 0), 30);
    let reminder = add(&mut planner, Category::Reminder, "Pills", t(8, 0), 0);

    assert_eq!(planner.entry(task).unwrap().completed, Some(false));
    assert_eq!(planner.entry(reminder).unwrap().completed, None);

    planner.set_completed(task, true).unwrap();
    assert!(planner.entry(task).unwrap().is_completed());
    assert!(matches!(
        planner.set_completed(reminder, true),
        Err(PlannerError::NotATask { category: Category::Reminder, .. })
    ));
}

#[test]
fn update_rechecks_conflicts_but_ignores_itself() {
    let mut planner = Planner::new();
    let a = add(&mut planner, Category::Task, "A", t(9, 0), 60);
    add(&mut planner, Category::Task, "B", t(11, 0), 60);

    planner
        .update_entry(a, EntryUpdate::times(t(9, 30), 60))
        .expect("shifting within free time");
    assert!(matches!(
        planner.update_entry(a, EntryUpdate::times(t(10, 30), 60)),
        Err(PlannerError::TimeOverlap(_))
    ));
    assert_eq!(planner.entry(a).unwrap().start, t(9, 30));

    planner
        .update_entry(a, EntryUpdate::description("draft first"))
        .unwrap();
    assert_eq!(planner.entry(a).unwrap().description, "draft first");
    assert!(matches!(
        planner.update_entry(42, EntryUpdate::default()),
        Err(PlannerError::EntryNotFound(42))
    ));
}

#[test]
fn items_are_reused_and_counted_as_templates() {
    let mut planner = Planner::new();
    let monday = planner
        .create_entry(
            NewEntry::new(Category::Task, "Gym", d(2025, 3, 3), t(7, 0), 60).with_tags(["Health", " fitness "]),
        )
        .unwrap();
    planner
        .create_entry(NewEntry::new(Category::Task, "Gym", d(2025, 3, 5), t(7, 0), 60))
        .unwrap();
    planner
        .create_entry(NewEntry::new(Category::Reminder, "Gym", d(2025, 3, 5), t(6, 45), 0))
        .unwrap();

    let item_id = planner.entry(monday).unwrap().item.id;
    assert_eq!(planner.item_tags(item_id), vec!["fitness", "health"]);
    assert!(planner.item_exists(Category::Task, "Gym"));
    assert!(!planner.item_exists(Category::Timeframe, "Gym"));
    assert_eq!(planner.items_with_tag("HEALTH").len(), 1);

    let templates = planner.templates();
    assert_eq!(templates.len(), 2);
    assert_eq!(templates[0].item.category, Category::Task);
    assert_eq!(templates[0].count, 2);
    assert_eq!(templates[1].count, 1);
}

#[test]
fn day_plan_nests_tasks_for_the_requested_date() {
    let mut planner = Planner::new();
    let frame = add(&mut planner, Category::Timeframe, "Morning", t(8, 0), 240);
    let task = add(&mut planner, Category::Task, "Emails", t(9, 0), 30);
    planner
        .create_entry(NewEntry::new(Category::Task, "Tomorrow", d(2025, 3, 4), t(9, 0), 30))
        .unwrap();

    let plan = planner.day_plan(d(2025, 3, 3));
    assert_eq!(plan.len(), 2);
    assert_eq!(plan.parent_of(task), Some(frame));
}

#[test]
fn history_and_ratings_respect_bounds() {
    let mut planner = Planner::new();
    for day in 1..=5 {
        planner
            .create_entry(NewEntry::new(Category::Task, "Walk", d(2025, 3, day), t(18, 0), 30))
            .unwrap();
        planner.set_rating(d(2025, 3, day), DailyRating::new(day as i64).unwrap());
    }

    assert_eq!(planner.entries_between(Some(d(2025, 3, 2)), Some(d(2025, 3, 4))).len(), 3);
    assert_eq!(planner.entries_between(None, Some(d(2025, 3, 2))).len(), 2);
    assert_eq!(planner.entries_between(Some(d(2025, 3, 5)), None).len(), 1);

    assert_eq!(planner.ratings_between(Some(d(2025, 3, 4)), None).len(), 2);
    assert_eq!(planner.average_rating(), Some(3.0));

    let replaced = planner.set_rating(d(2025, 3, 1), DailyRating::new(5).unwrap());
    assert_eq!(replaced.map(DailyRating::value), Some(1));
    assert_eq!(planner.rating_on(d(2025, 3, 1)).unwrap().label(), "Amazing");
    assert!(DailyRating::new(6).is_err());
}

#[test]
fn deleted_entries_free_their_slot() {
    let mut planner = Planner::new();
    let a = add(&mut planner, Category::Task, "A", t(9, 0), 60);
    let removed = planner.delete_entry(a).unwrap();
    assert_eq!(removed.name(), "A");
    add(&mut planner, Category::Task, "B", t(9, 0), 60);
    assert!(matches!(planner.delete_entry(a), Err(PlannerError::EntryNotFound(_))));
}

#[test]
fn completion_update_on_non_task_leaves_entry_untouched() {
    let mut planner = Planner::new();
    let reminder = add(&mut planner, Category::Reminder, "Call mum", t(17, 0), 0);
    let frame = add(&mut planner, Category::Timeframe, "Evening", t(18, 0), 120);
    let before = planner.entry(reminder).cloned();

    let update = EntryUpdate {
        completed: Some(true),
        description: Some("changed".into()),
        ..EntryUpdate::default()
    };
    assert!(matches!(
        planner.update_entry(reminder, update.clone()),
        Err(PlannerError::NotATask { category: Category::Reminder, .. })
    ));
    assert!(matches!(
        planner.update_entry(frame, update),
        Err(PlannerError::NotATask { category: Category::Timeframe, .. })
    ));
    assert_eq!(planner.entry(reminder).cloned(), before);
    assert_eq!(planner.entry(frame).unwrap().description, "");
}

#[test]
fn update_running_past_midnight_is_rejected() {
    let mut planner = Planner::new();
    let id = add(&mut planner, Category::Task, "Read", t(21, 0), 60);
    let before = planner.entry(id).cloned();

    assert!(matches!(
        planner.update_entry(id, EntryUpdate::times(t(23, 30), 45)),
        Err(PlannerError::Interval(_))
    ));
    assert!(matches!(
        planner.update_entry(id, EntryUpdate { duration_minutes: Some(-10), ..EntryUpdate::default() }),
        Err(PlannerError::Interval(_))
    ));
    assert_eq!(planner.entry(id).cloned(), before);
}

#[test]
fn restore_rejects_duplicate_items() {
    let err = Planner::restore(
        vec![Item::new(1, Category::Task, "Gym"), Item::new(2, Category::Task, "Gym")],
        Vec::new(),
        Vec::new(),
        Vec::new(),
    )
    .unwrap_err();
    assert!(matches!(err, PlannerError::Validation(_)), "{err}");
    assert!(err.to_string().contains("Gym"), "{err}");

    let planner = Planner::restore(
        vec![Item::new(1, Category::Task, "Gym"), Item::new(2, Category::Reminder, "Gym")],
        Vec::new(),
        Vec::new(),
        Vec::new(),
    )
    .expect("same name in another category is a different item");
    assert_eq!(planner.items().count(), 2);
}

#[test]
fn tags_may_not_contain_the_export_separator() {
    let mut planner = Planner::new();
    let err = planner
        .create_entry(NewEntry::new(Category::Task, "Gym", d(2025, 3, 3), t(7, 0), 60).with_tags(["a;b"]))
        .unwrap_err();
    assert!(matches!(err, PlannerError::Validation(_)));
    assert_eq!(planner.entry_count(), 0);

    let id = add(&mut planner, Category::Task, "Gym", t(7, 0), 60);
    let item_id = planner.entry(id).unwrap().item.id;
    assert!(matches!(
        planner.tag_item(item_id, ["legs;arms"]),
        Err(PlannerError::Validation(_))
    ));
    let update = EntryUpdate {
        tags: vec!["x;y".into()],
        ..EntryUpdate::default()
    };
    assert!(matches!(planner.update_entry(id, update), Err(PlannerError::Validation(_))));
    assert!(planner.item_tags(item_id).is_empty());

    planner.tag_item(item_id, [" Legs ", "arms"]).unwrap();
    assert_eq!(planner.item_tags(item_id), vec!["arms", "legs"]);
    assert!(matches!(planner.tag_item(99, ["x"]), Err(PlannerError::ItemNotFound(99))));
}

#[test]
fn clearing_a_rating_returns_it() {
    let mut planner = Planner::new();
    planner.set_rating(d(2025, 3, 3), DailyRating::new(3).unwrap());
    assert_eq!(planner.clear_rating(d(2025, 3, 3)).map(DailyRating::value), Some(3));
    assert_eq!(planner.rating_on(d(2025, 3, 3)), None);
    assert_eq!(planner.clear_rating(d(2025, 3, 3)), None);
    assert_eq!(planner.average_rating(), None);
}
