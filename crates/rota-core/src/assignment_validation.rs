use crate::assignment::TaskAssignment;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssignmentValidationError {
    #[error("assignment {id} requires a non-empty {field}")]
    EmptyField { id: u32, field: &'static str },
    #[error("duplicate assignment id {0}")]
    DuplicateId(u32),
    #[error("assignment {id} last ran on {last_run} but is due on {next_due}")]
    DueBeforeLastRun {
        id: u32,
        last_run: chrono::NaiveDate,
        next_due: chrono::NaiveDate,
    },
}

pub fn validate_assignment(assignment: &TaskAssignment) -> Result<(), AssignmentValidationError> {
    if assignment.staff_id.trim().is_empty() {
        return Err(AssignmentValidationError::EmptyField {
            id: assignment.id,
            field: "staff_id",
        });
    }
    if assignment.task_name.trim().is_empty() {
        return Err(AssignmentValidationError::EmptyField {
            id: assignment.id,
            field: "task_name",
        });
    }
    if let (Some(last_run), Some(next_due)) = (assignment.last_run_date, assignment.next_due_date) {
        // manual re-triggers may land on the run day itself, never before it
        if next_due < last_run {
            return Err(AssignmentValidationError::DueBeforeLastRun {
                id: assignment.id,
                last_run,
                next_due,
            });
        }
    }
    Ok(())
}

pub fn validate_assignment_collection(
    assignments: &[TaskAssignment],
) -> Result<(), AssignmentValidationError> {
    let mut seen_ids = HashSet::with_capacity(assignments.len());
    for assignment in assignments {
        if !seen_ids.insert(assignment.id) {
            return Err(AssignmentValidationError::DuplicateId(assignment.id));
        }
        validate_assignment(assignment)?;
    }
    Ok(())
}
