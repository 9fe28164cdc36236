//! In-memory [`QueryExecutor`] with injectable failures.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::StorageError;
use crate::executor::{ExecuteResult, QueryExecutor, Row, Statement};

/// Ephemeral backend keyed by `(session_id, id)`.
///
/// Two failure switches exist for exercising error paths: a global one
/// that fails every statement, and a per-id one that fails mutations of
/// specific (normalized) ids.
#[derive(Default)]
pub struct MemoryExecutor {
    rows: Mutex<BTreeMap<(String, String), String>>,
    failing: AtomicBool,
    failing_ids: Mutex<HashSet<String>>,
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent statement fail (or stop failing).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make upserts and deletes of this normalized id fail.
    pub fn fail_writes_for(&self, id: impl Into<String>) {
        self.failing_ids.lock().insert(id.into());
    }

    /// Store raw text bypassing the codec (e.g. to plant a corrupt record).
    pub fn insert_raw(&self, session_id: &str, id: &str, data: &str) {
        self.rows
            .lock()
            .insert((session_id.to_owned(), id.to_owned()), data.to_owned());
    }

    /// Raw text of a stored row.
    pub fn raw(&self, session_id: &str, id: &str) -> Option<String> {
        self.rows
            .lock()
            .get(&(session_id.to_owned(), id.to_owned()))
            .cloned()
    }

    /// Stored ids of one session, in order.
    pub fn ids(&self, session_id: &str) -> Vec<String> {
        self.rows
            .lock()
            .keys()
            .filter(|(s, _)| s == session_id)
            .map(|(_, id)| id.clone())
            .collect()
    }

    /// Total number of rows across all sessions.
    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.lock().is_empty()
    }

    fn check_failure(&self, statement: &Statement) -> Result<(), StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("injected failure".into()));
        }
        let id = match statement {
            Statement::Upsert { id, .. } | Statement::Delete { id, .. } => id,
            _ => return Ok(()),
        };
        if self.failing_ids.lock().contains(id) {
            return Err(StorageError::Backend(format!("injected failure for {id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl QueryExecutor for MemoryExecutor {
    async fn execute(&self, statement: Statement) -> Result<ExecuteResult, StorageError> {
        self.check_failure(&statement)?;

        let mut rows = self.rows.lock();
        let result = match statement {
            Statement::Upsert {
                session_id,
                id,
                data,
            } => {
                rows.insert((session_id, id), data);
                ExecuteResult {
                    rows: Vec::new(),
                    row_count: Some(1),
                }
            }
            Statement::Select { session_id, id } => {
                let found: Vec<Row> = rows
                    .get(&(session_id, id))
                    .map(|data| Row { data: data.clone() })
                    .into_iter()
                    .collect();
                ExecuteResult {
                    row_count: Some(found.len() as u64),
                    rows: found,
                }
            }
            Statement::Delete { session_id, id } => {
                let removed = rows.remove(&(session_id, id)).is_some();
                ExecuteResult {
                    rows: Vec::new(),
                    row_count: Some(u64::from(removed)),
                }
            }
            Statement::DeleteSession { session_id } => {
                let before = rows.len();
                rows.retain(|(s, _), _| *s != session_id);
                ExecuteResult {
                    rows: Vec::new(),
                    row_count: Some((before - rows.len()) as u64),
                }
            }
        };
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delete_session_leaves_other_sessions() {
        let exec = MemoryExecutor::new();
        exec.insert_raw("s1", "a", "1");
        exec.insert_raw("s1", "b", "2");
        exec.insert_raw("s2", "a", "3");

        let result = exec
            .execute(Statement::DeleteSession {
                session_id: "s1".into(),
            })
            .await
            .unwrap();

        assert_eq!(result.row_count, Some(2));
        assert!(exec.ids("s1").is_empty());
        assert_eq!(exec.ids("s2"), vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn per_id_failure_spares_reads() {
        let exec = MemoryExecutor::new();
        exec.insert_raw("s1", "a", "1");
        exec.fail_writes_for("a");

        let read = exec
            .execute(Statement::Select {
                session_id: "s1".into(),
                id: "a".into(),
            })
            .await;
        assert!(read.is_ok());

        let write = exec
            .execute(Statement::Upsert {
                session_id: "s1".into(),
                id: "a".into(),
                data: "2".into(),
            })
            .await;
        assert!(matches!(write, Err(StorageError::Backend(_))));
    }
}
