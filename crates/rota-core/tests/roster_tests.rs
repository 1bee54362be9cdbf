use chrono::{NaiveDate, Weekday};
use rota::{
    AssignmentBook, AssignmentStore, BookError, CsvAssignmentStore, MemoryAssignmentStore,
    PersistenceError, Roster, RosterError, ScheduleRule,
};
use std::path::PathBuf;
use tempfile::tempdir;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn record_run_persists_recomputed_due_date() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("rota.csv");

    let mut roster = Roster::open(CsvAssignmentStore::new(&path)).unwrap();
    let created = roster
        .assign("amara", "Deep clean fryer", ScheduleRule::weekly(2, Weekday::Fri), d(2024, 1, 1))
        .unwrap();
    assert_eq!(created.next_due_date, Some(d(2024, 1, 5)));

    let due: Vec<u32> = roster
        .get_due_assignments(d(2024, 1, 5))
        .iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(due, vec![created.id]);

    roster.record_run(created.id, d(2024, 1, 5)).unwrap();

    let reopened = Roster::open(CsvAssignmentStore::new(&path)).unwrap();
    let stored = reopened.find(created.id).unwrap();
    assert_eq!(stored.last_run_date, Some(d(2024, 1, 5)));
    assert_eq!(stored.next_due_date, Some(d(2024, 1, 19)));
    assert!(reopened.get_due_assignments(d(2024, 1, 18)).is_empty());
}

#[test]
fn unknown_ids_are_reported_without_writing() {
    let mut roster = Roster::open(MemoryAssignmentStore::new()).unwrap();
    let err = roster.record_run(3, d(2024, 1, 1)).unwrap_err();
    assert!(matches!(err, RosterError::Book(BookError::NotFound(3))));
    assert!(roster.store().load_book().unwrap().is_none());
    assert!(!roster.remove(3).unwrap());
}

/// Store whose writes always fail.
struct ReadOnlyStore;

impl AssignmentStore for ReadOnlyStore {
    fn save_book(&self, _book: &AssignmentBook) -> Result<(), PersistenceError> {
        Err(PersistenceError::InvalidData("read only".into()))
    }

    fn load_book(&self) -> Result<Option<AssignmentBook>, PersistenceError> {
        Ok(None)
    }
}

#[test]
fn failed_writes_leave_the_book_untouched() {
    let mut book = AssignmentBook::new();
    book.assign("kim", "Bins", ScheduleRule::daily(), d(2024, 1, 1))
        .unwrap();
    let mut roster = Roster::with_book(book.clone(), ReadOnlyStore);

    assert!(matches!(
        roster.record_run(1, d(2024, 1, 2)),
        Err(RosterError::Persistence(_))
    ));
    assert!(roster.assign("kim", "Mop", ScheduleRule::daily(), d(2024, 1, 1)).is_err());
    assert_eq!(roster.book(), &book);
}

#[test]
fn update_rule_and_trigger_are_persisted() {
    let store = MemoryAssignmentStore::new();
    let mut roster = Roster::open(store).unwrap();
    let manual = roster
        .assign("lee", "Descale ovens", ScheduleRule::manual(), d(2024, 3, 1))
        .unwrap();
    assert_eq!(manual.next_due_date, None);

    roster.trigger(manual.id, d(2024, 3, 4)).unwrap();
    let updated = roster
        .update_rule(manual.id, ScheduleRule::monthly(1, 31), d(2024, 3, 5))
        .unwrap();
    assert_eq!(updated.next_due_date, Some(d(2024, 4, 30)));

    let saved = roster.store().load_book().unwrap().unwrap();
    assert_eq!(saved.find(manual.id), Some(&updated));
}

#[test]
fn open_reads_existing_file() {
    let dir = tempdir().unwrap();
    let path: PathBuf = dir.path().join("rota.csv");
    let mut book = AssignmentBook::new();
    book.assign("ana", "Walk-in check", ScheduleRule::every_n_days(3), d(2024, 5, 1))
        .unwrap();
    CsvAssignmentStore::new(&path).save_book(&book).unwrap();

    let roster = Roster::open(CsvAssignmentStore::new(&path)).unwrap();
    assert_eq!(roster.book(), &book);
    assert_eq!(roster.due_summary(d(2024, 5, 4)).due_today, 1);
}
