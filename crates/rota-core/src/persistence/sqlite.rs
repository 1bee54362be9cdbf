use super::{AssignmentStore, PersistenceResult};
use crate::{AssignmentBook, TaskAssignment};
use rusqlite::{Connection, params};
use std::sync::Mutex;

pub struct SqliteAssignmentStore {
    connection: Mutex<Connection>,
}

impl SqliteAssignmentStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS rota_state (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                saved_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS assignments (
                id INTEGER PRIMARY KEY,
                staff_id TEXT NOT NULL,
                next_due_date TEXT,
                assignment_json TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn save_assignments(
        &self,
        tx: &rusqlite::Transaction,
        book: &AssignmentBook,
    ) -> PersistenceResult<()> {
        tx.execute("DELETE FROM assignments", [])?;
        let mut stmt = tx.prepare(
            "INSERT INTO assignments (id, staff_id, next_due_date, assignment_json)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for assignment in book.assignments() {
            let json = serde_json::to_string(assignment)?;
            stmt.execute(params![
                assignment.id,
                assignment.staff_id,
                assignment.next_due_date.map(|d| d.to_string()),
                json
            ])?;
        }
        Ok(())
    }
}

impl AssignmentStore for SqliteAssignmentStore {
    fn save_book(&self, book: &AssignmentBook) -> PersistenceResult<()> {
        let mut conn = self
            .connection
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let tx = conn.transaction()?;
        // marks that a book was saved, even an empty one
        tx.execute(
            "INSERT INTO rota_state (id, saved_at) VALUES (1, datetime('now'))
             ON CONFLICT(id) DO UPDATE SET saved_at = excluded.saved_at",
            [],
        )?;
        self.save_assignments(&tx, book)?;
        tx.commit()?;
        tracing::info!(rows = book.len(), "saved assignments to sqlite");
        Ok(())
    }

    fn load_book(&self) -> PersistenceResult<Option<AssignmentBook>> {
        let conn = self
            .connection
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let saved: i64 = conn.query_row("SELECT COUNT(*) FROM rota_state", [], |row| row.get(0))?;
        if saved == 0 {
            return Ok(None);
        }

        let mut stmt = conn.prepare("SELECT assignment_json FROM assignments ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut assignments = Vec::new();
        for json in rows {
            let assignment: TaskAssignment = serde_json::from_str(&json?)?;
            assignments.push(assignment);
        }

        let book = AssignmentBook::from_assignments(assignments)?;
        tracing::info!(rows = book.len(), "loaded assignments from sqlite");
        Ok(Some(book))
    }
}
