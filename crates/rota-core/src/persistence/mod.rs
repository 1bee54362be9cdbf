use crate::assignment_validation::AssignmentValidationError;
use crate::book::{AssignmentBook, BookError};
use serde_json::Error as SerdeJsonError;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] SerdeJsonError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("sqlite error: {0}")]
    Sqlite(String),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("invalid assignments: {0}")]
    Validation(#[from] AssignmentValidationError),
}

impl From<BookError> for PersistenceError {
    fn from(value: BookError) -> Self {
        match value {
            BookError::Invalid(err) => Self::Validation(err),
            other => Self::InvalidData(other.to_string()),
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for PersistenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value.to_string())
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Where an `AssignmentBook` lives between sessions. Last write wins.
pub trait AssignmentStore {
    fn save_book(&self, book: &AssignmentBook) -> PersistenceResult<()>;
    /// `Ok(None)` when nothing has been stored yet.
    fn load_book(&self) -> PersistenceResult<Option<AssignmentBook>>;
}

impl<S: AssignmentStore + ?Sized> AssignmentStore for Box<S> {
    fn save_book(&self, book: &AssignmentBook) -> PersistenceResult<()> {
        (**self).save_book(book)
    }

    fn load_book(&self) -> PersistenceResult<Option<AssignmentBook>> {
        (**self).load_book()
    }
}

pub type DynStore = Box<dyn AssignmentStore + Send + Sync>;

#[derive(Debug, Clone)]
pub struct CsvAssignmentStore {
    path: PathBuf,
}

impl CsvAssignmentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AssignmentStore for CsvAssignmentStore {
    fn save_book(&self, book: &AssignmentBook) -> PersistenceResult<()> {
        save_book_to_csv(book, &self.path)?;
        tracing::info!(path = %self.path.display(), rows = book.len(), "saved assignments csv");
        Ok(())
    }

    fn load_book(&self) -> PersistenceResult<Option<AssignmentBook>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let book = load_book_from_csv(&self.path)?;
        tracing::info!(path = %self.path.display(), rows = book.len(), "loaded assignments csv");
        Ok(Some(book))
    }
}

#[derive(Debug, Clone)]
pub struct JsonAssignmentStore {
    path: PathBuf,
}

impl JsonAssignmentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl AssignmentStore for JsonAssignmentStore {
    fn save_book(&self, book: &AssignmentBook) -> PersistenceResult<()> {
        save_book_to_json(book, &self.path)?;
        tracing::info!(path = %self.path.display(), rows = book.len(), "saved assignments json");
        Ok(())
    }

    fn load_book(&self) -> PersistenceResult<Option<AssignmentBook>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let book = load_book_from_json(&self.path)?;
        tracing::info!(path = %self.path.display(), rows = book.len(), "loaded assignments json");
        Ok(Some(book))
    }
}

/// Keeps the last saved book in memory; used when no file is configured.
#[derive(Debug, Default)]
pub struct MemoryAssignmentStore {
    saved: Mutex<Option<AssignmentBook>>,
}

impl MemoryAssignmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AssignmentStore for MemoryAssignmentStore {
    fn save_book(&self, book: &AssignmentBook) -> PersistenceResult<()> {
        let mut saved = self.saved.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *saved = Some(book.clone());
        Ok(())
    }

    fn load_book(&self) -> PersistenceResult<Option<AssignmentBook>> {
        let saved = self.saved.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(saved.clone())
    }
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{load_book_from_csv, load_book_from_json, save_book_to_csv, save_book_to_json};
