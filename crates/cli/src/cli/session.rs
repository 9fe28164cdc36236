//! Maintenance commands over stored sessions.

use kh_auth_state::SessionStateProvider;
use kh_domain::Credentials;
use kh_store::{SessionStore, CREDS_ID};

/// Print a session's credentials as JSON, or a note when there are none.
pub async fn creds(store: &SessionStore, session_id: &str) -> anyhow::Result<()> {
    match stored_creds(store, session_id).await {
        Some(creds) => println!("{}", serde_json::to_string_pretty(creds.as_value())?),
        None => println!("no credentials for session {session_id:?}"),
    }
    Ok(())
}

async fn stored_creds(store: &SessionStore, session_id: &str) -> Option<Credentials> {
    store.read(session_id, CREDS_ID, true).await
}

/// Delete every record of a session.
pub async fn purge(store: SessionStore, session_id: &str) -> anyhow::Result<()> {
    let session = SessionStateProvider::new(store).session(session_id, true).await;
    session.delete().await?;
    println!("purged session {session_id:?}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use kh_store::SqliteExecutor;
    use serde_json::json;

    fn store(dir: &tempfile::TempDir) -> SessionStore {
        let exec = SqliteExecutor::open(&dir.path().join("keyhold.db"), Duration::from_secs(1)).unwrap();
        SessionStore::new(Arc::new(exec))
    }

    #[tokio::test]
    async fn purge_removes_stored_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store
            .write("s1", CREDS_ID, &Credentials::new(json!({ "token": "abc" })))
            .await
            .unwrap();
        store.write("s1", "pre-key-1", &json!(1)).await.unwrap();
        assert!(stored_creds(&store, "s1").await.is_some());

        purge(store.clone(), "s1").await.unwrap();
        assert!(stored_creds(&store, "s1").await.is_none());
        assert!(store.read::<serde_json::Value>("s1", "pre-key-1", true).await.is_none());
    }

    #[tokio::test]
    async fn creds_of_unknown_session_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        creds(&store(&dir), "nobody").await.unwrap();
    }
}
