use super::{PersistenceError, PersistenceResult};
use crate::{
    AssignmentBook, TaskAssignment,
    recurrence::{Occurrence, RecurrenceKind, ScheduleRule, parse_weekday, weekday_name},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

#[derive(Serialize, Deserialize)]
struct BookSnapshot {
    #[serde(default)]
    assignments: Vec<TaskAssignment>,
}

pub fn save_book_to_json<P: AsRef<Path>>(book: &AssignmentBook, path: P) -> PersistenceResult<()> {
    let snapshot = BookSnapshot {
        assignments: book.to_vec(),
    };
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    Ok(())
}

pub fn load_book_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<AssignmentBook> {
    let file = File::open(path)?;
    let snapshot: BookSnapshot = serde_json::from_reader(file)?;
    Ok(AssignmentBook::from_assignments(snapshot.assignments)?)
}

/// One CSV row. Rule fields a kind does not use are still written so that
/// switching kinds back and forth keeps earlier choices.
#[derive(Default, Serialize, Deserialize)]
struct AssignmentCsvRecord {
    id: u32,
    staff_id: String,
    task_name: String,
    schedule_kind: String,
    #[serde(default)]
    interval: String,
    #[serde(default)]
    weekday: String,
    #[serde(default)]
    day_of_month: String,
    #[serde(default)]
    occurrence: String,
    #[serde(default)]
    last_run_date: String,
    #[serde(default)]
    next_due_date: String,
    #[serde(default)]
    notes: String,
}

impl From<&TaskAssignment> for AssignmentCsvRecord {
    fn from(assignment: &TaskAssignment) -> Self {
        let rule = &assignment.rule;
        Self {
            id: assignment.id,
            staff_id: assignment.staff_id.clone(),
            task_name: assignment.task_name.clone(),
            schedule_kind: rule.kind.as_str().to_string(),
            interval: rule.interval.to_string(),
            weekday: weekday_name(rule.weekday).to_string(),
            day_of_month: rule.day_of_month.to_string(),
            occurrence: rule.occurrence.as_str().to_string(),
            last_run_date: format_date(assignment.last_run_date),
            next_due_date: format_date(assignment.next_due_date),
            notes: assignment.notes.clone().unwrap_or_default(),
        }
    }
}

impl AssignmentCsvRecord {
    fn into_assignment(self) -> PersistenceResult<TaskAssignment> {
        let defaults = ScheduleRule::default();
        let kind = if self.schedule_kind.trim().is_empty() {
            defaults.kind
        } else {
            self.schedule_kind
                .parse::<RecurrenceKind>()
                .map_err(|err| invalid_row(self.id, err))?
        };
        let interval = parse_u32(&self.interval)
            .map_err(|msg| invalid_row(self.id, msg))?
            .unwrap_or(defaults.interval);
        let day_of_month = parse_u32(&self.day_of_month)
            .map_err(|msg| invalid_row(self.id, msg))?
            .unwrap_or(defaults.day_of_month);
        let weekday = if self.weekday.trim().is_empty() {
            defaults.weekday
        } else {
            parse_weekday(&self.weekday).map_err(|err| invalid_row(self.id, err))?
        };
        let occurrence = if self.occurrence.trim().is_empty() {
            defaults.occurrence
        } else {
            self.occurrence
                .parse::<Occurrence>()
                .map_err(|err| invalid_row(self.id, err))?
        };

        Ok(TaskAssignment {
            id: self.id,
            staff_id: self.staff_id,
            task_name: self.task_name,
            rule: ScheduleRule {
                kind,
                interval,
                weekday,
                day_of_month,
                occurrence,
            },
            last_run_date: parse_date(&self.last_run_date)?,
            next_due_date: parse_date(&self.next_due_date)?,
            notes: parse_string_option(self.notes),
        })
    }
}

pub fn save_book_to_csv<P: AsRef<Path>>(book: &AssignmentBook, path: P) -> PersistenceResult<()> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    if book.is_empty() {
        // serialize() only emits headers alongside the first record
        writer.write_record(CSV_HEADERS)?;
    }
    for assignment in book.assignments() {
        writer.serialize(AssignmentCsvRecord::from(assignment))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_book_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<AssignmentBook> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut assignments = Vec::new();
    for record in reader.deserialize::<AssignmentCsvRecord>() {
        assignments.push(record?.into_assignment()?);
    }
    Ok(AssignmentBook::from_assignments(assignments)?)
}

const CSV_HEADERS: [&str; 11] = [
    "id",
    "staff_id",
    "task_name",
    "schedule_kind",
    "interval",
    "weekday",
    "day_of_month",
    "occurrence",
    "last_run_date",
    "next_due_date",
    "notes",
];

fn invalid_row(id: u32, err: impl std::fmt::Display) -> PersistenceError {
    PersistenceError::InvalidData(format!("assignment {id}: {err}"))
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn parse_date(input: &str) -> PersistenceResult<Option<NaiveDate>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map(Some)
        .map_err(|e| PersistenceError::InvalidData(format!("invalid date '{input}': {e}")))
}

fn parse_u32(input: &str) -> Result<Option<u32>, String> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    input
        .trim()
        .parse::<u32>()
        .map(Some)
        .map_err(|e| format!("invalid integer '{input}': {e}"))
}

fn parse_string_option(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
