use std::io::{self, Write};
use std::path::Path;

use chrono::{Local, NaiveDate, NaiveTime};
use day_builder::{
    Category, DailyRating, EntryId, EntryUpdate, NewEntry, Planner, PlannerConfig, PlannerStore,
    ScheduleEntry, SqlitePlannerStore, load_entries_from_csv, load_planner_from_json,
    save_entries_to_csv, save_planner_to_json,
};

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  date <YYYY-MM-DD>                  Switch the day being planned\n  show                               Show the plan for the current day\n  add <task|timeframe|reminder> <HH:MM> [minutes] <name...> [-- description...]\n                                     Plan a new entry\n  edit <id> <HH:MM> <minutes>        Move or resize an entry\n  desc <id> <text...>                Set an entry's description\n  done <id> <true|false>             Mark a task done or not done\n  delete <id>                        Remove an entry\n  tag <id> <tags...>                 Tag the item behind an entry\n  rate <1-5>                         Rate the current day\n  unrate                             Clear the current day's rating\n  ratings                            List all ratings\n  templates                          List reusable items by use\n  save <json|csv|db> <path>          Save the planner\n  load <json|csv|db> <path>          Replace the planner from a file\n  quit|exit                          Exit"
    );
}

fn format_entry(entry: &ScheduleEntry) -> String {
    let end = entry
        .interval()
        .map(|interval| interval.end().format("%H:%M").to_string())
        .unwrap_or_else(|_| "??:??".to_string());
    let mut line = format!(
        "[{}] {}-{} {} {}",
        entry.active_id,
        entry.start.format("%H:%M"),
        end,
        entry.category(),
        entry.name()
    );
    match entry.completed {
        Some(true) => line.push_str(" [x]"),
        Some(false) => line.push_str(" [ ]"),
        None => {}
    }
    if !entry.description.is_empty() {
        line.push_str(" - ");
        line.push_str(&entry.description);
    }
    line
}

fn render_day(planner: &Planner, date: NaiveDate) -> String {
    let mut out = format!("Plan for {date}\n");
    let plan = planner.day_plan(date);
    if plan.is_empty() {
        out.push_str("  (nothing planned)\n");
    }
    for (depth, entry) in plan.walk() {
        out.push_str(&"  ".repeat(depth + 1));
        out.push_str(&format_entry(entry));
        out.push('\n');
    }
    match planner.rating_on(date) {
        Some(rating) => out.push_str(&format!(
            "Rating: {} ({}) {}\n",
            rating.label(),
            rating.value(),
            rating.color()
        )),
        None => out.push_str(&format!(
            "Rating: {} {}\n",
            DailyRating::UNRATED_LABEL,
            DailyRating::UNRATED_COLOR
        )),
    }
    out
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M").ok()
}

fn parse_id(s: Option<&str>) -> Option<EntryId> {
    s.and_then(|s| s.parse().ok())
}

fn save(planner: &Planner, format: &str, path: &str) -> Result<(), String> {
    match format {
        "json" => save_planner_to_json(planner, path).map_err(|e| e.to_string()),
        "csv" => save_entries_to_csv(planner, path).map_err(|e| e.to_string()),
        "db" => SqlitePlannerStore::new(path)
            .and_then(|store| store.save_planner(planner))
            .map_err(|e| e.to_string()),
        other => Err(format!("Unknown format '{other}' (json|csv|db)")),
    }
}

fn load(format: &str, path: &str) -> Result<Planner, String> {
    match format {
        "json" => load_planner_from_json(path).map_err(|e| e.to_string()),
        "csv" => load_entries_from_csv(path).map_err(|e| e.to_string()),
        "db" => SqlitePlannerStore::new(path)
            .and_then(|store| store.load_planner())
            .map_err(|e| e.to_string())?
            .ok_or_else(|| format!("No planner stored in {path}")),
        other => Err(format!("Unknown format '{other}' (json|csv|db)")),
    }
}

fn main() {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let config = match PlannerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {e}");
            PlannerConfig::default()
        }
    };

    let mut planner = Planner::new();
    if let Some(db) = &config.database_path {
        if Path::new(db).exists() {
            match load("db", &db.to_string_lossy()) {
                Ok(loaded) => planner = loaded,
                Err(e) => println!("Could not load {}: {}", db.display(), e),
            }
        }
    }

    let mut date = Local::now().date_naive();
    println!("Day Builder (CLI) - type 'help' for commands\n");
    print!("{}", render_day(&planner, date));

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "show" => print!("{}", render_day(&planner, date)),
            "date" => match parts.next().map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d")) {
                Some(Ok(d)) => {
                    date = d;
                    print!("{}", render_day(&planner, date));
                }
                Some(Err(_)) => println!("Invalid date (YYYY-MM-DD)"),
                None => println!("Current date: {date}"),
            },
            "add" => {
                let category = match parts.next().and_then(Category::from_str) {
                    Some(c) => c,
                    None => {
                        println!("Usage: add <task|timeframe|reminder> <HH:MM> [minutes] <name...> [-- description...]");
                        continue;
                    }
                };
                let start = match parts.next().and_then(parse_time) {
                    Some(t) => t,
                    None => {
                        println!("Invalid time (HH:MM)");
                        continue;
                    }
                };
                let mut rest: Vec<&str> = parts.collect();
                let duration = match rest.first().and_then(|s| s.parse::<i64>().ok()) {
                    Some(minutes) => {
                        rest.remove(0);
                        minutes
                    }
                    None if category == Category::Reminder => 0,
                    None => config.default_duration_minutes,
                };
                let (name, description) = match rest.iter().position(|s| *s == "--") {
                    Some(split) => (rest[..split].join(" "), rest[split + 1..].join(" ")),
                    None => (rest.join(" "), String::new()),
                };
                let new_entry =
                    NewEntry::new(category, name, date, start, duration).with_description(description);
                match planner.create_entry(new_entry) {
                    Ok(id) => println!("Added {category} {id}."),
                    Err(e) => println!("Error: {e}"),
                }
            }
            "edit" => {
                let id = parse_id(parts.next());
                let start = parts.next().and_then(parse_time);
                let minutes = parts.next().and_then(|s| s.parse::<i64>().ok());
                match (id, start, minutes) {
                    (Some(id), Some(start), Some(minutes)) => {
                        match planner.update_entry(id, EntryUpdate::times(start, minutes)) {
                            Ok(()) => println!("Entry {id} updated."),
                            Err(e) => println!("Error: {e}"),
                        }
                    }
                    _ => println!("Usage: edit <id> <HH:MM> <minutes>"),
                }
            }
            "desc" => {
                let id = parse_id(parts.next());
                let text = parts.collect::<Vec<_>>().join(" ");
                match id {
                    Some(id) => match planner.update_entry(id, EntryUpdate::description(text)) {
                        Ok(()) => println!("Description set for entry {id}."),
                        Err(e) => println!("Error: {e}"),
                    },
                    None => println!("Usage: desc <id> <text...>"),
                }
            }
            "done" => {
                let id = parse_id(parts.next());
                let flag = match parts.next().map(str::to_ascii_lowercase).as_deref() {
                    Some("true") | None => Some(true),
                    Some("false") => Some(false),
                    Some(_) => None,
                };
                match (id, flag) {
                    (Some(id), Some(flag)) => match planner.set_completed(id, flag) {
                        Ok(()) if flag => println!("Entry {id} marked done."),
                        Ok(()) => println!("Entry {id} marked not done."),
                        Err(e) => println!("Error: {e}"),
                    },
                    _ => println!("Usage: done <id> <true|false>"),
                }
            }
            "delete" => match parse_id(parts.next()) {
                Some(id) => match planner.delete_entry(id) {
                    Ok(_) => println!("Deleted entry {id}."),
                    Err(e) => println!("Error: {e}"),
                },
                None => println!("Usage: delete <id>"),
            },
            "rate" => {
                let value = parts.next().and_then(|s| s.parse::<i64>().ok());
                match value.map(DailyRating::new) {
                    Some(Ok(rating)) => {
                        planner.set_rating(date, rating);
                        println!("Rated {date}: {}.", rating.label());
                    }
                    Some(Err(e)) => println!("Error: {e}"),
                    None => println!("Usage: rate <1-5>"),
                }
            }
            "unrate" => match planner.clear_rating(date) {
                Some(previous) => println!("Cleared rating {} for {date}.", previous.label()),
                None => println!("{date} has no rating."),
            },
            "tag" => {
                let id = parse_id(parts.next());
                let tags: Vec<&str> = parts.collect();
                let item_id = id.and_then(|id| planner.entry(id)).map(|entry| entry.item.id);
                match (id, item_id) {
                    (Some(_), Some(item_id)) if !tags.is_empty() => {
                        match planner.tag_item(item_id, tags) {
                            Ok(()) => println!("Tags: {}", planner.item_tags(item_id).join(", ")),
                            Err(e) => println!("Error: {e}"),
                        }
                    }
                    (Some(id), None) => println!("Error: entry {id} not found"),
                    _ => println!("Usage: tag <id> <tags...>"),
                }
            }
            "ratings" => {
                let ratings = planner.ratings_between(None, None);
                if ratings.is_empty() {
                    println!("No ratings yet.");
                    continue;
                }
                for (day, rating) in ratings {
                    println!("{day} {} {} {}", rating.value(), rating.label(), rating.color());
                }
                if let Some(avg) = planner.average_rating() {
                    println!("Average: {avg:.2}");
                }
            }
            "templates" => {
                let templates = planner.templates();
                if templates.is_empty() {
                    println!("No templates yet.");
                }
                for template in templates {
                    println!(
                        "{}x {} {}",
                        template.count, template.item.category, template.item.name
                    );
                }
            }
            "save" | "load" => {
                let format = parts.next();
                let path = parts.next();
                let (Some(format), Some(path)) = (format, path) else {
                    println!("Usage: {cmd} <json|csv|db> <path>");
                    continue;
                };
                if cmd == "save" {
                    match save(&planner, format, path) {
                        Ok(()) => println!("Planner saved to {path}."),
                        Err(e) => println!("Save error: {e}"),
                    }
                } else {
                    match load(format, path) {
                        Ok(loaded) => {
                            planner = loaded;
                            println!("Planner loaded from {path}.");
                        }
                        Err(e) => println!("Load error: {e}"),
                    }
                }
            }
            _ => println!("Unknown command. Type 'help'."),
        }
    }

    if let Some(db) = &config.database_path {
        match save(&planner, "db", &db.to_string_lossy()) {
            Ok(()) => println!("Planner saved to {}.", db.display()),
            Err(e) => println!("Save error: {e}"),
        }
    }
}
