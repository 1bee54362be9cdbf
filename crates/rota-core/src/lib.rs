pub mod assignment;
pub(crate) mod assignment_validation;
pub mod book;
pub mod config;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod persistence;
pub mod recurrence;
pub mod roster;

pub use assignment::TaskAssignment;
pub use assignment_validation::AssignmentValidationError;
pub use book::{AssignmentBook, BookError, DueSummary};
pub use config::{ConfigError, RotaConfig, StorageKind, open_store};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteAssignmentStore;
pub use persistence::{
    AssignmentStore, CsvAssignmentStore, DynStore, JsonAssignmentStore, MemoryAssignmentStore,
    PersistenceError, load_book_from_csv, load_book_from_json, save_book_to_csv,
    save_book_to_json,
};
pub use recurrence::{
    MAX_UPCOMING, Occurrence, RecurrenceKind, RuleParseError, RuleWarning, ScheduleRule,
    describe, next_occurrence, occurrences_between, ordinal, rule_warnings, upcoming,
};
pub use roster::{Roster, RosterError};
