//! Session record store.
//!
//! Maps `(session_id, record id)` to codec-encoded values.  Writes are
//! upserts, so repeating one is harmless.  Reads never fail: anything that
//! prevents a record from being returned becomes `None` and, when the
//! caller asks for it, a report to the [`ErrorReporter`].

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::{decode, encode};
use crate::error::StoreError;
use crate::executor::{QueryExecutor, Statement};
use crate::normalize::normalize_id;
use crate::reporter::{ErrorReporter, ReadFailure, TracingReporter};

/// Record id under which a session's credentials are stored.
pub const CREDS_ID: &str = "creds";

/// Durable key-value table namespaced by session id.
#[derive(Clone)]
pub struct SessionStore {
    executor: Arc<dyn QueryExecutor>,
    reporter: Arc<dyn ErrorReporter>,
}

impl SessionStore {
    /// Store reporting absorbed failures through [`TracingReporter`].
    pub fn new(executor: Arc<dyn QueryExecutor>) -> Self {
        Self {
            executor,
            reporter: Arc::new(TracingReporter),
        }
    }

    /// Replace the reporter that receives absorbed read failures.
    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// The reporter absorbed failures are sent to.
    pub fn reporter(&self) -> &Arc<dyn ErrorReporter> {
        &self.reporter
    }

    /// Encode `value` and upsert it under `(session_id, id)`.
    pub async fn write<T>(&self, session_id: &str, id: &str, value: &T) -> Result<(), StoreError>
    where
        T: Serialize + ?Sized,
    {
        let data = encode(value)?;
        self.executor
            .execute(Statement::Upsert {
                session_id: session_id.to_owned(),
                id: normalize_id(id),
                data,
            })
            .await?;
        Ok(())
    }

    /// Read and decode the record at `(session_id, id)`.
    ///
    /// Returns `None` when the row is missing, the backend fails, or the
    /// payload does not decode.  Failures (not misses) are reported when
    /// `observe` is set.
    pub async fn read<T: DeserializeOwned>(
        &self,
        session_id: &str,
        id: &str,
        observe: bool,
    ) -> Option<T> {
        let statement = Statement::Select {
            session_id: session_id.to_owned(),
            id: normalize_id(id),
        };

        let result = match self.executor.execute(statement).await {
            Ok(result) => result,
            Err(e) => {
                self.absorb(session_id, id, e.to_string(), observe);
                return None;
            }
        };

        let Some(row) = result.rows.into_iter().next() else {
            tracing::debug!(session_id = %session_id, record_id = %id, "session record not found");
            return None;
        };

        match decode(&row.data) {
            Ok(value) => Some(value),
            Err(e) => {
                self.absorb(session_id, id, e.to_string(), observe);
                None
            }
        }
    }

    /// Delete one record, or every record of the session when `id` is `None`.
    ///
    /// Deleting a record that does not exist is not an error.
    pub async fn delete(&self, session_id: &str, id: Option<&str>) -> Result<(), StoreError> {
        let statement = match id {
            Some(id) => Statement::Delete {
                session_id: session_id.to_owned(),
                id: normalize_id(id),
            },
            None => Statement::DeleteSession {
                session_id: session_id.to_owned(),
            },
        };

        let result = self.executor.execute(statement).await?;
        if id.is_none() {
            tracing::info!(
                session_id = %session_id,
                removed = result.row_count.unwrap_or(0),
                "session records purged"
            );
        }
        Ok(())
    }

    fn absorb(&self, session_id: &str, id: &str, reason: String, observe: bool) {
        if !observe {
            return;
        }
        self.reporter.report(&ReadFailure {
            session_id: session_id.to_owned(),
            record_id: id.to_owned(),
            reason,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryExecutor;
    use crate::reporter::RecordingReporter;
    use serde_json::{json, Value};

    fn store() -> (SessionStore, Arc<MemoryExecutor>, Arc<RecordingReporter>) {
        let exec = Arc::new(MemoryExecutor::new());
        let reporter = Arc::new(RecordingReporter::new());
        let store = SessionStore::new(exec.clone()).with_reporter(reporter.clone());
        (store, exec, reporter)
    }

    #[tokio::test]
    async fn write_then_read_returns_value() {
        let (store, _, _) = store();
        let value = json!({ "token": "abc" });
        store.write("s1", CREDS_ID, &value).await.unwrap();
        assert_eq!(store.read::<Value>("s1", CREDS_ID, true).await, Some(value));
    }

    #[tokio::test]
    async fn ids_are_normalized_on_disk() {
        let (store, exec, _) = store();
        store.write("s1", "session-1:2/x", &json!(1)).await.unwrap();
        assert_eq!(exec.ids("s1"), vec!["session-1-2__x".to_string()]);
        assert_eq!(store.read::<Value>("s1", "session-1:2/x", true).await, Some(json!(1)));
    }

    #[tokio::test]
    async fn miss_is_absent_and_not_reported() {
        let (store, _, reporter) = store();
        assert_eq!(store.read::<Value>("s1", "nope", true).await, None);
        assert!(reporter.is_empty());
    }

    #[tokio::test]
    async fn corrupt_row_is_absent_and_reported() {
        let (store, exec, reporter) = store();
        exec.insert_raw("s1", "creds", "{broken");

        assert_eq!(store.read::<Value>("s1", "creds", true).await, None);
        let failures = reporter.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].record_id, "creds");
    }

    #[tokio::test]
    async fn backend_failure_on_read_is_absorbed() {
        let (store, exec, reporter) = store();
        store.write("s1", "creds", &json!({})).await.unwrap();
        exec.set_failing(true);

        assert_eq!(store.read::<Value>("s1", "creds", false).await, None);
        assert!(reporter.is_empty(), "unobserved reads must not report");

        assert_eq!(store.read::<Value>("s1", "creds", true).await, None);
        assert_eq!(reporter.len(), 1);
    }

    #[tokio::test]
    async fn backend_failure_on_write_propagates() {
        let (store, exec, _) = store();
        exec.set_failing(true);
        let err = store.write("s1", "creds", &json!({})).await.unwrap_err();
        assert!(matches!(err, StoreError::Storage(_)));
        assert!(store.delete("s1", None).await.is_err());
    }

    #[tokio::test]
    async fn deleting_missing_row_is_noop() {
        let (store, _, _) = store();
        store.delete("s1", Some("ghost")).await.unwrap();
    }
}
