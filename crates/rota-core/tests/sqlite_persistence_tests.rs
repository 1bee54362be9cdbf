#![cfg(feature = "sqlite")]

use chrono::{NaiveDate, Weekday};
use rota::{AssignmentBook, AssignmentStore, ScheduleRule, SqliteAssignmentStore};
use tempfile::NamedTempFile;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn sqlite_store_round_trip_book() {
    let file = NamedTempFile::new().unwrap();
    let store = SqliteAssignmentStore::new(file.path()).unwrap();
    assert!(store.load_book().unwrap().is_none());

    let mut book = AssignmentBook::new();
    book.assign("amara", "Fryer", ScheduleRule::weekly(1, Weekday::Sun), d(2024, 6, 3))
        .unwrap();
    book.assign("jonas", "Stock count", ScheduleRule::monthly(2, 30), d(2024, 6, 3))
        .unwrap();
    book.record_run(2, d(2024, 12, 30)).unwrap();

    store.save_book(&book).expect("save book");
    let loaded = store
        .load_book()
        .expect("load book")
        .expect("book exists");

    assert_eq!(loaded, book);
    assert_eq!(loaded.find(2).unwrap().next_due_date, Some(d(2025, 2, 28)));
}

#[test]
fn sqlite_store_distinguishes_empty_from_missing() {
    let file = NamedTempFile::new().unwrap();
    let store = SqliteAssignmentStore::new(file.path()).unwrap();
    store.save_book(&AssignmentBook::new()).unwrap();
    let loaded = store.load_book().unwrap();
    assert_eq!(loaded, Some(AssignmentBook::new()));

    // a second save replaces rather than appends
    let mut book = AssignmentBook::new();
    book.assign("kim", "Bins", ScheduleRule::daily(), d(2024, 1, 1))
        .unwrap();
    store.save_book(&book).unwrap();
    store.save_book(&book).unwrap();
    assert_eq!(store.load_book().unwrap().unwrap().len(), 1);
}
