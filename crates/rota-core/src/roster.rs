use crate::assignment::TaskAssignment;
use crate::book::{AssignmentBook, BookError, DueSummary};
use crate::persistence::{AssignmentStore, PersistenceError};
use crate::recurrence::ScheduleRule;
use chrono::NaiveDate;

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error(transparent)]
    Book(#[from] BookError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

pub type RosterResult<T> = Result<T, RosterError>;

/// An `AssignmentBook` bound to the store it is written back to.
///
/// Mutations run against a copy of the book; the copy replaces the live book
/// only after the store accepted it.
pub struct Roster<S> {
    book: AssignmentBook,
    store: S,
}

impl<S: AssignmentStore> Roster<S> {
    /// Loads the stored book, or starts empty when the store has none.
    pub fn open(store: S) -> RosterResult<Self> {
        let book = store.load_book()?.unwrap_or_default();
        Ok(Self { book, store })
    }

    pub fn with_book(book: AssignmentBook, store: S) -> Self {
        Self { book, store }
    }

    pub fn book(&self) -> &AssignmentBook {
        &self.book
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn find(&self, id: u32) -> Option<&TaskAssignment> {
        self.book.find(id)
    }

    pub fn get_due_assignments(&self, as_of: NaiveDate) -> Vec<&TaskAssignment> {
        self.book.get_due_assignments(as_of)
    }

    pub fn due_summary(&self, as_of: NaiveDate) -> DueSummary {
        self.book.due_summary(as_of)
    }

    pub fn assign(
        &mut self,
        staff_id: impl Into<String>,
        task_name: impl Into<String>,
        rule: ScheduleRule,
        today: NaiveDate,
    ) -> RosterResult<TaskAssignment> {
        let (staff_id, task_name) = (staff_id.into(), task_name.into());
        let id = self.commit(|book| book.assign(staff_id, task_name, rule, today))?;
        self.assignment(id)
    }

    pub fn record_run(&mut self, id: u32, run_date: NaiveDate) -> RosterResult<TaskAssignment> {
        self.commit(|book| book.record_run(id, run_date).map(|_| ()))?;
        tracing::info!(id, %run_date, "recorded task run");
        self.assignment(id)
    }

    pub fn update_rule(
        &mut self,
        id: u32,
        rule: ScheduleRule,
        today: NaiveDate,
    ) -> RosterResult<TaskAssignment> {
        self.commit(|book| book.update_rule(id, rule, today).map(|_| ()))?;
        self.assignment(id)
    }

    pub fn trigger(&mut self, id: u32, due_date: NaiveDate) -> RosterResult<TaskAssignment> {
        self.commit(|book| book.trigger(id, due_date).map(|_| ()))?;
        self.assignment(id)
    }

    pub fn remove(&mut self, id: u32) -> RosterResult<bool> {
        if self.book.find(id).is_none() {
            return Ok(false);
        }
        self.commit(|book| {
            book.remove(id);
            Ok(())
        })?;
        Ok(true)
    }

    /// Swaps in a whole book, e.g. after an import, and persists it.
    pub fn replace_book(&mut self, book: AssignmentBook) -> RosterResult<()> {
        self.store.save_book(&book)?;
        self.book = book;
        Ok(())
    }

    fn commit<T>(
        &mut self,
        mutation: impl FnOnce(&mut AssignmentBook) -> Result<T, BookError>,
    ) -> RosterResult<T> {
        let mut draft = self.book.clone();
        let value = mutation(&mut draft)?;
        self.store.save_book(&draft)?;
        self.book = draft;
        Ok(value)
    }

    fn assignment(&self, id: u32) -> RosterResult<TaskAssignment> {
        self.book
            .find(id)
            .cloned()
            .ok_or(RosterError::Book(BookError::NotFound(id)))
    }
}
