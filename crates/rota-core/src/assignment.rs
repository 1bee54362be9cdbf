use crate::recurrence::{ScheduleRule, describe, next_occurrence};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A rota task bound to a staff member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskAssignment {
    pub id: u32,
    pub staff_id: String,
    pub task_name: String,
    pub rule: ScheduleRule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TaskAssignment {
    /// Builds an assignment whose first due date is the rule's next
    /// occurrence after `today`. Manual rules start without a due date.
    pub fn new(
        id: u32,
        staff_id: impl Into<String>,
        task_name: impl Into<String>,
        rule: ScheduleRule,
        today: NaiveDate,
    ) -> Self {
        Self {
            id,
            staff_id: staff_id.into(),
            task_name: task_name.into(),
            rule,
            last_run_date: None,
            next_due_date: next_occurrence(&rule, today),
            notes: None,
        }
    }

    pub fn record_run(&mut self, run_date: NaiveDate) {
        self.last_run_date = Some(run_date);
        self.next_due_date = next_occurrence(&self.rule, run_date);
    }

    /// Swaps the rule and recomputes the due date from the last run, or from
    /// `today` if the task never ran.
    pub fn set_rule(&mut self, rule: ScheduleRule, today: NaiveDate) {
        self.rule = rule;
        let reference = self.last_run_date.unwrap_or(today);
        self.next_due_date = next_occurrence(&self.rule, reference);
    }

    /// Explicit re-trigger; the only way a manual task becomes due.
    pub fn trigger(&mut self, due_date: NaiveDate) {
        self.next_due_date = Some(due_date);
    }

    pub fn is_due(&self, as_of: NaiveDate) -> bool {
        self.next_due_date.is_some_and(|due| due <= as_of)
    }

    pub fn is_overdue(&self, as_of: NaiveDate) -> bool {
        self.next_due_date.is_some_and(|due| due < as_of)
    }

    pub fn describe_schedule(&self) -> String {
        describe(&self.rule)
    }
}
