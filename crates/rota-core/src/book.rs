use crate::assignment::TaskAssignment;
use crate::assignment_validation::{self, AssignmentValidationError};
use crate::recurrence::{RecurrenceKind, ScheduleRule, rule_warnings};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookError {
    #[error("assignment {0} not found")]
    NotFound(u32),
    #[error("assignment {0} already exists")]
    Duplicate(u32),
    #[error("assignment ids exhausted")]
    IdsExhausted,
    #[error(transparent)]
    Invalid(#[from] AssignmentValidationError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueSummary {
    pub as_of: NaiveDate,
    pub total: usize,
    pub due: usize,
    pub overdue: usize,
    pub due_today: usize,
    pub manual: usize,
    pub next_due: Option<NaiveDate>,
}

impl DueSummary {
    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("as_of={}", self.as_of));
        parts.push(format!("assignments={}", self.total));
        parts.push(format!("due={}", self.due));
        if self.overdue > 0 {
            parts.push(format!("overdue={}", self.overdue));
        }
        if self.due_today > 0 {
            parts.push(format!("today={}", self.due_today));
        }
        if self.manual > 0 {
            parts.push(format!("manual={}", self.manual));
        }
        if let Some(date) = self.next_due {
            parts.push(format!("next={date}"));
        }
        parts.join(", ")
    }
}

/// All task assignments of one kitchen, keyed by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignmentBook {
    assignments: BTreeMap<u32, TaskAssignment>,
}

impl AssignmentBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a book from stored rows, rejecting duplicates and blank fields.
    pub fn from_assignments(assignments: Vec<TaskAssignment>) -> Result<Self, BookError> {
        assignment_validation::validate_assignment_collection(&assignments)?;
        Ok(Self {
            assignments: assignments.into_iter().map(|a| (a.id, a)).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// One past the largest id in use, `None` once `u32::MAX` is taken.
    pub fn next_id(&self) -> Option<u32> {
        match self.assignments.keys().next_back() {
            Some(id) => id.checked_add(1),
            None => Some(1),
        }
    }

    pub fn assignments(&self) -> impl Iterator<Item = &TaskAssignment> {
        self.assignments.values()
    }

    pub fn to_vec(&self) -> Vec<TaskAssignment> {
        self.assignments.values().cloned().collect()
    }

    pub fn find(&self, id: u32) -> Option<&TaskAssignment> {
        self.assignments.get(&id)
    }

    pub fn for_staff(&self, staff_id: &str) -> Vec<&TaskAssignment> {
        self.assignments
            .values()
            .filter(|a| a.staff_id == staff_id)
            .collect()
    }

    /// Creates an assignment under the next free id and returns that id.
    pub fn assign(
        &mut self,
        staff_id: impl Into<String>,
        task_name: impl Into<String>,
        rule: ScheduleRule,
        today: NaiveDate,
    ) -> Result<u32, BookError> {
        let id = self.next_id().ok_or(BookError::IdsExhausted)?;
        let assignment = TaskAssignment::new(id, staff_id, task_name, rule, today);
        for warning in rule_warnings(&rule) {
            tracing::warn!(id, %warning, "assignment rule was clamped");
        }
        self.insert(assignment)?;
        Ok(id)
    }

    pub fn insert(&mut self, assignment: TaskAssignment) -> Result<(), BookError> {
        if self.assignments.contains_key(&assignment.id) {
            return Err(BookError::Duplicate(assignment.id));
        }
        self.upsert(assignment)
    }

    pub fn upsert(&mut self, assignment: TaskAssignment) -> Result<(), BookError> {
        assignment_validation::validate_assignment(&assignment)?;
        self.assignments.insert(assignment.id, assignment);
        Ok(())
    }

    pub fn remove(&mut self, id: u32) -> bool {
        self.assignments.remove(&id).is_some()
    }

    /// Assignments whose next due date is on or before `as_of`, earliest first.
    pub fn get_due_assignments(&self, as_of: NaiveDate) -> Vec<&TaskAssignment> {
        let mut due: Vec<&TaskAssignment> = self
            .assignments
            .values()
            .filter(|a| a.is_due(as_of))
            .collect();
        due.sort_by_key(|a| (a.next_due_date, a.id));
        due
    }

    pub fn record_run(&mut self, id: u32, run_date: NaiveDate) -> Result<&TaskAssignment, BookError> {
        let assignment = self.assignments.get_mut(&id).ok_or(BookError::NotFound(id))?;
        assignment.record_run(run_date);
        tracing::debug!(
            id,
            %run_date,
            next_due = ?assignment.next_due_date,
            "recomputed next due date after run"
        );
        Ok(&*assignment)
    }

    pub fn update_rule(
        &mut self,
        id: u32,
        rule: ScheduleRule,
        today: NaiveDate,
    ) -> Result<&TaskAssignment, BookError> {
        let assignment = self.assignments.get_mut(&id).ok_or(BookError::NotFound(id))?;
        assignment.set_rule(rule, today);
        tracing::debug!(
            id,
            rule = %rule.to_token(),
            next_due = ?assignment.next_due_date,
            "recomputed next due date after rule edit"
        );
        Ok(&*assignment)
    }

    pub fn trigger(&mut self, id: u32, due_date: NaiveDate) -> Result<&TaskAssignment, BookError> {
        let current = self.assignments.get(&id).ok_or(BookError::NotFound(id))?;
        let mut updated = current.clone();
        updated.trigger(due_date);
        assignment_validation::validate_assignment(&updated)?;
        self.assignments.insert(id, updated);
        self.assignments.get(&id).ok_or(BookError::NotFound(id))
    }

    pub fn due_summary(&self, as_of: NaiveDate) -> DueSummary {
        let mut summary = DueSummary {
            as_of,
            total: self.assignments.len(),
            due: 0,
            overdue: 0,
            due_today: 0,
            manual: 0,
            next_due: None,
        };
        for assignment in self.assignments.values() {
            if assignment.rule.kind == RecurrenceKind::Manual {
                summary.manual += 1;
            }
            let Some(due) = assignment.next_due_date else {
                continue;
            };
            if assignment.is_overdue(as_of) {
                summary.overdue += 1;
                summary.due += 1;
            } else if due == as_of {
                summary.due_today += 1;
                summary.due += 1;
            } else if summary.next_due.is_none_or(|next| due < next) {
                summary.next_due = Some(due);
            }
        }
        summary
    }

    /// Tabular view of the book for display.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let rows: Vec<&TaskAssignment> = self.assignments.values().collect();
        let ids: Vec<u32> = rows.iter().map(|a| a.id).collect();
        let staff: Vec<&str> = rows.iter().map(|a| a.staff_id.as_str()).collect();
        let tasks: Vec<&str> = rows.iter().map(|a| a.task_name.as_str()).collect();
        let schedules: Vec<String> = rows.iter().map(|a| a.describe_schedule()).collect();
        let last_run: Vec<Option<String>> = rows
            .iter()
            .map(|a| a.last_run_date.map(|d| d.to_string()))
            .collect();
        let next_due: Vec<Option<String>> = rows
            .iter()
            .map(|a| a.next_due_date.map(|d| d.to_string()))
            .collect();

        let columns = vec![
            Series::new(PlSmallStr::from_static("id"), ids).into_column(),
            Series::new(PlSmallStr::from_static("staff_id"), staff).into_column(),
            Series::new(PlSmallStr::from_static("task_name"), tasks).into_column(),
            Series::new(PlSmallStr::from_static("schedule"), schedules).into_column(),
            Series::new(PlSmallStr::from_static("last_run_date"), last_run).into_column(),
            Series::new(PlSmallStr::from_static("next_due_date"), next_due).into_column(),
        ];
        DataFrame::new(columns)
    }
}
