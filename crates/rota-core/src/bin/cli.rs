use chrono::{Local, NaiveDate};
use polars::prelude::{AnyValue, DataFrame};
use rota::{
    AssignmentBook, DynStore, MAX_UPCOMING, Roster, RotaConfig, ScheduleRule, TaskAssignment,
    describe, load_book_from_csv, load_book_from_json, next_occurrence, open_store, rule_warnings,
    save_book_to_csv, save_book_to_json, upcoming,
};
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

const DEFAULT_PREVIEW_COUNT: usize = 5;

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let cell = |av: AnyValue| match av {
        AnyValue::Null => String::new(),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        other => other.to_string(),
    };

    let mut rows: Vec<Vec<String>> = Vec::with_capacity(df.height());
    for row_idx in 0..df.height() {
        let row = columns
            .iter()
            .map(|col| col.get(row_idx).map(cell).unwrap_or_default())
            .collect();
        rows.push(row);
    }

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.len()).collect();
    for row in &rows {
        for (ci, value) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(value.len());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let render_row = |values: &[String]| {
        let mut line = String::from("|");
        for (ci, value) in values.iter().enumerate() {
            line.push(' ');
            line.push_str(value);
            line.push_str(&" ".repeat(widths[ci].saturating_sub(value.len())));
            line.push_str(" |");
        }
        line
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&col_names));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in &rows {
        out.push_str(&render_row(row));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn render_book(book: &AssignmentBook) -> String {
    match book.to_dataframe() {
        Ok(df) => render_df_as_text_table(&df),
        Err(e) => format!("Unable to render assignments: {e}"),
    }
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  show                               Show all assignments\n  assign <staff> <task> <rule>       Assign a task to a staff member\n  rule    <id> <rule>                Change an assignment's schedule\n  run     <id> [YYYY-MM-DD]          Record a run (defaults to today)\n  trigger <id> <YYYY-MM-DD>          Set the next due date explicitly\n  remove  <id>                       Remove an assignment\n  due     [YYYY-MM-DD]               List assignments due on or before a date\n  describe <id>                      Describe an assignment's schedule\n  preview <rule> <YYYY-MM-DD> [n]    Show the next n dates of a rule\n  kinds                              List rule formats\n  save <csv|json> <path>             Export assignments\n  load <csv|json> <path>             Import assignments (replaces current)\n  quit|exit                          Exit"
    );
}

fn print_rule_formats() {
    println!("Rule formats:");
    println!("  {:<28} {}", "manual", "Only when triggered");
    println!("  {:<28} {}", "daily", "Every day");
    println!("  {:<28} {}", "weekly:<n>:<weekday>", "Every n weeks on a weekday");
    println!("  {:<28} {}", "monthly:<n>:<day>", "On a day of every n months");
    println!("  {:<28} {}", "every:<n>", "Every n days");
    println!(
        "  {:<28} {}",
        "nth:<first..last>:<weekday>", "Nth weekday of each month"
    );
}

fn print_assignment(assignment: &TaskAssignment) {
    let next_due = assignment
        .next_due_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "#{} {} -> {}: {} (next due {})",
        assignment.id,
        assignment.staff_id,
        assignment.task_name,
        assignment.describe_schedule(),
        next_due
    );
}

fn print_rule_warnings(rule: &ScheduleRule) {
    for warning in rule_warnings(rule) {
        println!("Warning: {warning}");
    }
}

fn parse_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d").ok()
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn main() -> anyhow::Result<()> {
    let config = RotaConfig::from_env()?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let store: DynStore = open_store(&config)?;
    let mut roster = Roster::open(store)?;

    println!("Kitchen Rota (CLI) - type 'help' for commands\n");
    println!("{}", render_book(roster.book()));

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
            "kinds" => print_rule_formats(),
            "quit" | "exit" => break,
            "show" => println!("{}", render_book(roster.book())),
            "assign" => {
                let (Some(staff), Some(task), Some(rule_s)) = (parts.next(), parts.next(), parts.next())
                else {
                    println!("Usage: assign <staff> <task> <rule>");
                    continue;
                };
                let rule: ScheduleRule = match rule_s.parse() {
                    Ok(rule) => rule,
                    Err(e) => {
                        println!("Invalid rule: {e}");
                        continue;
                    }
                };
                print_rule_warnings(&rule);
                match roster.assign(staff, task, rule, today()) {
                    Ok(assignment) => {
                        println!("Assigned task {}.", assignment.id);
                        print_assignment(&assignment);
                    }
                    Err(e) => println!("Error: {e}"),
                }
            }
            "rule" => {
                let (Some(id_s), Some(rule_s)) = (parts.next(), parts.next()) else {
                    println!("Usage: rule <id> <rule>");
                    continue;
                };
                let Ok(id) = id_s.parse::<u32>() else {
                    println!("Invalid id");
                    continue;
                };
                let rule: ScheduleRule = match rule_s.parse() {
                    Ok(rule) => rule,
                    Err(e) => {
                        println!("Invalid rule: {e}");
                        continue;
                    }
                };
                print_rule_warnings(&rule);
                match roster.update_rule(id, rule, today()) {
                    Ok(assignment) => {
                        println!("Rule updated.");
                        print_assignment(&assignment);
                    }
                    Err(e) => println!("Error: {e}"),
                }
            }
            "run" => {
                let Some(Ok(id)) = parts.next().map(str::parse::<u32>) else {
                    println!("Usage: run <id> [YYYY-MM-DD]");
                    continue;
                };
                let run_date = match parts.next() {
                    Some(date_s) => match parse_date(date_s) {
                        Some(date) => date,
                        None => {
                            println!("Invalid date (YYYY-MM-DD)");
                            continue;
                        }
                    },
                    None => today(),
                };
                match roster.record_run(id, run_date) {
                    Ok(assignment) => {
                        println!("Recorded run of task {id} on {run_date}.");
                        print_assignment(&assignment);
                    }
                    Err(e) => println!("Error: {e}"),
                }
            }
            "trigger" => {
                let (Some(id_s), Some(date_s)) = (parts.next(), parts.next()) else {
                    println!("Usage: trigger <id> <YYYY-MM-DD>");
                    continue;
                };
                let (Ok(id), Some(due_date)) = (id_s.parse::<u32>(), parse_date(date_s)) else {
                    println!("Invalid id or date (YYYY-MM-DD)");
                    continue;
                };
                match roster.trigger(id, due_date) {
                    Ok(assignment) => print_assignment(&assignment),
                    Err(e) => println!("Error: {e}"),
                }
            }
            "remove" => {
                let Some(Ok(id)) = parts.next().map(str::parse::<u32>) else {
                    println!("Usage: remove <id>");
                    continue;
                };
                match roster.remove(id) {
                    Ok(true) => println!("Removed assignment {id}."),
                    Ok(false) => println!("Assignment {id} not found."),
                    Err(e) => println!("Error removing assignment: {e}"),
                }
            }
            "due" => {
                let as_of = match parts.next() {
                    Some(date_s) => match parse_date(date_s) {
                        Some(date) => date,
                        None => {
                            println!("Invalid date (YYYY-MM-DD)");
                            continue;
                        }
                    },
                    None => today(),
                };
                println!("Due ({})", roster.due_summary(as_of).to_cli_summary());
                for assignment in roster.get_due_assignments(as_of) {
                    print_assignment(assignment);
                }
            }
            "describe" => {
                let Some(Ok(id)) = parts.next().map(str::parse::<u32>) else {
                    println!("Usage: describe <id>");
                    continue;
                };
                match roster.find(id) {
                    Some(assignment) => println!("{}", assignment.describe_schedule()),
                    None => println!("Assignment {id} not found."),
                }
            }
            "preview" => {
                let (Some(rule_s), Some(date_s)) = (parts.next(), parts.next()) else {
                    println!("Usage: preview <rule> <YYYY-MM-DD> [count]");
                    continue;
                };
                let rule: ScheduleRule = match rule_s.parse() {
                    Ok(rule) => rule,
                    Err(e) => {
                        println!("Invalid rule: {e}");
                        continue;
                    }
                };
                let Some(from) = parse_date(date_s) else {
                    println!("Invalid date (YYYY-MM-DD)");
                    continue;
                };
                let count = match parts.next().map(str::parse::<usize>) {
                    None => DEFAULT_PREVIEW_COUNT,
                    Some(Ok(n)) if n <= MAX_UPCOMING => n,
                    Some(_) => {
                        println!("Count must be a number from 0 to {MAX_UPCOMING}");
                        continue;
                    }
                };
                println!("{}", describe(&rule));
                print_rule_warnings(&rule);
                if next_occurrence(&rule, from).is_none() {
                    println!("No automatic dates.");
                }
                for date in upcoming(&rule, from, count) {
                    println!("  {} ({})", date, date.format("%A"));
                }
            }
            "save" => {
                let (Some(fmt), Some(path)) = (parts.next(), parts.next()) else {
                    println!("Usage: save <csv|json> <path>");
                    continue;
                };
                let result = match fmt {
                    "csv" => save_book_to_csv(roster.book(), path),
                    "json" => save_book_to_json(roster.book(), path),
                    _ => {
                        println!("Unknown format '{fmt}' (use csv or json)");
                        continue;
                    }
                };
                match result {
                    Ok(()) => println!("Assignments saved to {path}."),
                    Err(e) => println!("Save error: {e}"),
                }
            }
            "load" => {
                let (Some(fmt), Some(path)) = (parts.next(), parts.next()) else {
                    println!("Usage: load <csv|json> <path>");
                    continue;
                };
                let loaded = match fmt {
                    "csv" => load_book_from_csv(path),
                    "json" => load_book_from_json(path),
                    _ => {
                        println!("Unknown format '{fmt}' (use csv or json)");
                        continue;
                    }
                };
                match loaded {
                    Ok(book) => match roster.replace_book(book) {
                        Ok(()) => {
                            println!("Assignments loaded from {path}.");
                            println!("{}", render_book(roster.book()));
                        }
                        Err(e) => println!("Load error: {e}"),
                    },
                    Err(e) => println!("Load error: {e}"),
                }
            }
            _ => println!("Unknown command '{cmd}'. Type 'help' for commands."),
        }
    }
    Ok(())
}
