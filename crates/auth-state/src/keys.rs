//! Batched access to rotating key material.
//!
//! Each key lives in its own record (`{category}-{id}`).  Reads and writes
//! of a batch are issued together and awaited together; elements of a
//! batch are independent, so one failing write never stops the others.

use std::collections::{BTreeMap, HashMap};

use futures_util::future::join_all;
use serde_json::Value;

use kh_domain::trace::TraceEvent;
use kh_store::{ReadFailure, SessionStore, StoreError};

use crate::category::KeyCategory;
use crate::value::KeyValue;

/// Keys to persist, by category and id.  `None` deletes the key.
pub type KeyBatch = BTreeMap<KeyCategory, BTreeMap<String, Option<KeyValue>>>;

/// Some operations of a [`KeyStore::set`] batch failed.
///
/// Every operation in the batch ran to completion; `failed` lists the
/// record ids whose write or delete did not succeed.
#[derive(thiserror::Error, Debug)]
#[error("{} of {attempted} key operations failed", .failed.len())]
pub struct KeySetError {
    pub attempted: usize,
    pub failed: Vec<(String, StoreError)>,
}

enum Applied {
    Written,
    Deleted,
}

/// Key-access capability scoped to one session.
#[derive(Clone)]
pub struct KeyStore {
    store: SessionStore,
    session_id: String,
    observe_errors: bool,
}

impl KeyStore {
    pub(crate) fn new(store: SessionStore, session_id: String, observe_errors: bool) -> Self {
        Self {
            store,
            session_id,
            observe_errors,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Fetch keys of one category.  Ids with no stored value are omitted.
    pub async fn get<S: AsRef<str>>(
        &self,
        category: KeyCategory,
        ids: &[S],
    ) -> HashMap<String, KeyValue> {
        let reads = ids.iter().map(|id| {
            let id = id.as_ref();
            async move {
                let value = self.read_one(category, id).await?;
                Some((id.to_owned(), value))
            }
        });

        join_all(reads).await.into_iter().flatten().collect()
    }

    async fn read_one(&self, category: KeyCategory, id: &str) -> Option<KeyValue> {
        let record_id = category.record_id(id);
        let raw: Value = self
            .store
            .read(&self.session_id, &record_id, self.observe_errors)
            .await?;
        if raw.is_null() {
            return None;
        }

        match category.reconstruct(raw) {
            Ok(value) => Some(value),
            Err(e) => {
                if self.observe_errors {
                    self.store.reporter().report(&ReadFailure {
                        session_id: self.session_id.clone(),
                        record_id,
                        reason: e.to_string(),
                    });
                }
                None
            }
        }
    }

    /// Write present values and delete absent ones, all concurrently.
    ///
    /// Returns once every operation has completed.
    pub async fn set(&self, batch: KeyBatch) -> Result<(), KeySetError> {
        let ops: Vec<(String, Option<KeyValue>)> = batch
            .into_iter()
            .flat_map(|(category, entries)| {
                entries
                    .into_iter()
                    .map(move |(id, value)| (category.record_id(&id), value))
            })
            .collect();
        let attempted = ops.len();

        let results = join_all(ops.into_iter().map(|(record_id, value)| async move {
            let result = match value.filter(|v| !v.is_absent()) {
                Some(v) => self
                    .store
                    .write(&self.session_id, &record_id, &v)
                    .await
                    .map(|()| Applied::Written),
                None => self
                    .store
                    .delete(&self.session_id, Some(&record_id))
                    .await
                    .map(|()| Applied::Deleted),
            };
            (record_id, result)
        }))
        .await;

        let (mut written, mut deleted) = (0, 0);
        let mut failed = Vec::new();
        for (record_id, result) in results {
            match result {
                Ok(Applied::Written) => written += 1,
                Ok(Applied::Deleted) => deleted += 1,
                Err(e) => {
                    tracing::warn!(
                        session_id = %self.session_id,
                        record_id = %record_id,
                        error = %e,
                        "key operation failed"
                    );
                    failed.push((record_id, e));
                }
            }
        }

        TraceEvent::KeyBatchApplied {
            session_id: self.session_id.clone(),
            written,
            deleted,
            failed: failed.len(),
        }
        .emit();

        if failed.is_empty() {
            Ok(())
        } else {
            Err(KeySetError { attempted, failed })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use kh_store::{MemoryExecutor, RecordingReporter};
    use serde_json::json;

    fn keys() -> (KeyStore, Arc<MemoryExecutor>, Arc<RecordingReporter>) {
        let exec = Arc::new(MemoryExecutor::new());
        let reporter = Arc::new(RecordingReporter::new());
        let store = SessionStore::new(exec.clone()).with_reporter(reporter.clone());
        (KeyStore::new(store, "s1".into(), true), exec, reporter)
    }

    fn batch(category: KeyCategory, entries: Vec<(&str, Option<KeyValue>)>) -> KeyBatch {
        let mut batch = KeyBatch::new();
        batch.insert(
            category,
            entries
                .into_iter()
                .map(|(id, v)| (id.to_owned(), v))
                .collect(),
        );
        batch
    }

    #[tokio::test]
    async fn set_writes_and_deletes() {
        let (keys, _, _) = keys();
        keys.set(batch(KeyCategory::PreKey, vec![("2", Some(json!("old").into()))]))
            .await
            .unwrap();

        keys.set(batch(
            KeyCategory::PreKey,
            vec![("1", Some(json!({ "k": 1 }).into())), ("2", None)],
        ))
        .await
        .unwrap();

        let got = keys.get(KeyCategory::PreKey, &["1", "2"]).await;
        assert_eq!(got.len(), 1);
        assert_eq!(got["1"], KeyValue::Raw(json!({ "k": 1 })));
    }

    #[tokio::test]
    async fn null_value_deletes() {
        let (keys, exec, _) = keys();
        keys.set(batch(KeyCategory::Session, vec![("a", Some(json!(1).into()))]))
            .await
            .unwrap();
        keys.set(batch(KeyCategory::Session, vec![("a", Some(Value::Null.into()))]))
            .await
            .unwrap();
        assert!(exec.ids("s1").is_empty());
    }

    #[tokio::test]
    async fn ids_with_separators_are_found_again() {
        let (keys, exec, _) = keys();
        keys.set(batch(
            KeyCategory::Session,
            vec![("5511999.0:2", Some(json!("s").into()))],
        ))
        .await
        .unwrap();
        assert_eq!(exec.ids("s1"), vec!["session-5511999.0-2".to_string()]);
        let got = keys.get(KeyCategory::Session, &["5511999.0:2"]).await;
        assert!(got.contains_key("5511999.0:2"));
    }

    #[tokio::test]
    async fn partial_failure_reports_failed_ids_and_keeps_the_rest() {
        let (keys, exec, _) = keys();
        exec.fail_writes_for("pre-key-2");

        let err = keys
            .set(batch(
                KeyCategory::PreKey,
                vec![
                    ("1", Some(json!(1).into())),
                    ("2", Some(json!(2).into())),
                    ("3", Some(json!(3).into())),
                ],
            ))
            .await
            .unwrap_err();

        assert_eq!(err.attempted, 3);
        assert_eq!(err.failed.len(), 1);
        assert_eq!(err.failed[0].0, "pre-key-2");
        assert_eq!(exec.ids("s1"), vec!["pre-key-1".to_string(), "pre-key-3".to_string()]);
    }

    #[tokio::test]
    async fn app_state_sync_key_is_reconstructed() {
        let (keys, exec, _) = keys();
        exec.insert_raw(
            "s1",
            "app-state-sync-key-AAAA",
            r#"{"keyData":{"type":"Buffer","data":[1,2]},"timestamp":"12","junk":1}"#,
        );

        let got = keys.get(KeyCategory::AppStateSyncKey, &["AAAA"]).await;
        let key = got["AAAA"].as_app_state_sync_key().unwrap();
        assert_eq!(key.key_data.as_deref(), Some(&[1u8, 2][..]));
        assert_eq!(key.timestamp, Some(12));
    }

    #[tokio::test]
    async fn unreconstructable_value_is_absent_and_reported() {
        let (keys, exec, reporter) = keys();
        exec.insert_raw("s1", "app-state-sync-key-BBBB", r#"{"timestamp":"never"}"#);

        let got = keys.get(KeyCategory::AppStateSyncKey, &["BBBB"]).await;
        assert!(got.is_empty());
        assert_eq!(reporter.failures()[0].record_id, "app-state-sync-key-BBBB");
    }
}
