//! SQLite-backed [`QueryExecutor`].

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params_from_iter, Connection};

use crate::error::StorageError;
use crate::executor::{ExecuteResult, QueryExecutor, Row, Statement, CREATE_TABLE};

/// Runs statements on a single SQLite connection.
///
/// rusqlite is blocking, so every statement hops onto the blocking pool.
/// The connection mutex serializes statements; SQLite would do so anyway.
#[derive(Clone)]
pub struct SqliteExecutor {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteExecutor {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        Self::bootstrap(conn, path.display().to_string())
    }

    /// Open an in-memory database, mostly for tests.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Self::bootstrap(conn, ":memory:".into())
    }

    fn bootstrap(conn: Connection, location: String) -> Result<Self, StorageError> {
        conn.execute(CREATE_TABLE, [])?;
        tracing::info!(location = %location, "session table ready");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

#[async_trait]
impl QueryExecutor for SqliteExecutor {
    async fn execute(&self, statement: Statement) -> Result<ExecuteResult, StorageError> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || run(&conn.lock(), &statement))
            .await
            .map_err(|e| StorageError::Task(e.to_string()))?
    }
}

fn run(conn: &Connection, statement: &Statement) -> Result<ExecuteResult, StorageError> {
    let params = params_from_iter(statement.params());

    if statement.is_query() {
        let mut stmt = conn.prepare_cached(statement.sql())?;
        let rows = stmt
            .query_map(params, |row| Ok(Row { data: row.get(0)? }))?
            .collect::<Result<Vec<_>, _>>()?;
        let row_count = Some(rows.len() as u64);
        return Ok(ExecuteResult { rows, row_count });
    }

    let affected = conn.execute(statement.sql(), params)?;
    Ok(ExecuteResult {
        rows: Vec::new(),
        row_count: Some(affected as u64),
    })
}
