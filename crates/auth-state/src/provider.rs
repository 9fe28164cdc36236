//! Builds the per-session authentication state the transport consumes.

use std::sync::Arc;

use parking_lot::RwLock;

use kh_domain::trace::TraceEvent;
use kh_domain::Credentials;
use kh_store::{SessionStore, StoreError, CREDS_ID};

use crate::keys::KeyStore;

/// Produces credentials for a session that has none stored yet.
pub type CredentialsInit = Arc<dyn Fn() -> Credentials + Send + Sync>;

/// In-memory credentials shared between the transport and the session.
///
/// The transport replaces the snapshot when it reports an update; the
/// session persists whatever the snapshot holds at `save_creds` time.
#[derive(Clone, Debug)]
pub struct SharedCredentials(Arc<RwLock<Credentials>>);

impl SharedCredentials {
    pub fn new(creds: Credentials) -> Self {
        Self(Arc::new(RwLock::new(creds)))
    }

    pub fn snapshot(&self) -> Credentials {
        self.0.read().clone()
    }

    pub fn replace(&self, creds: Credentials) {
        *self.0.write() = creds;
    }
}

/// Credentials plus key access: what the transport authenticates with.
#[derive(Clone)]
pub struct SessionState {
    pub creds: SharedCredentials,
    pub keys: KeyStore,
}

/// One session's state together with its persistence operations.
#[derive(Clone)]
pub struct AuthSession {
    session_id: String,
    state: SessionState,
    store: SessionStore,
    creds_restored: bool,
}

impl AuthSession {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Whether the credentials came from the store rather than being
    /// freshly initialized.
    pub fn creds_restored(&self) -> bool {
        self.creds_restored
    }

    /// Persist the current in-memory credentials.
    pub async fn save_creds(&self) -> Result<(), StoreError> {
        let creds = self.state.creds.snapshot();
        self.store.write(&self.session_id, CREDS_ID, &creds).await?;
        TraceEvent::CredsSaved {
            session_id: self.session_id.clone(),
        }
        .emit();
        Ok(())
    }

    /// Remove every persisted record of this session.
    pub async fn delete(&self) -> Result<(), StoreError> {
        self.store.delete(&self.session_id, None).await?;
        TraceEvent::SessionPurged {
            session_id: self.session_id.clone(),
        }
        .emit();
        Ok(())
    }
}

/// Hands out [`AuthSession`]s backed by one [`SessionStore`].
#[derive(Clone)]
pub struct SessionStateProvider {
    store: SessionStore,
    init: CredentialsInit,
}

impl SessionStateProvider {
    pub fn new(store: SessionStore) -> Self {
        Self {
            store,
            init: Arc::new(Credentials::initial),
        }
    }

    /// Override how credentials are fabricated for a new session.
    pub fn with_initializer<F>(mut self, init: F) -> Self
    where
        F: Fn() -> Credentials + Send + Sync + 'static,
    {
        self.init = Arc::new(init);
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Restore the session's credentials, or initialize fresh ones when
    /// none can be read, and bind a key store to it.
    ///
    /// A stored value that is not a JSON object (such as `null`) counts as
    /// no credentials.
    ///
    /// Storage failures never surface here; they only decide whether the
    /// credentials are restored or fabricated.
    pub async fn session(&self, session_id: &str, observe_errors: bool) -> AuthSession {
        let stored: Option<Credentials> = self
            .store
            .read::<Credentials>(session_id, CREDS_ID, observe_errors)
            .await
            .filter(|creds| creds.as_value().is_object());
        let creds_restored = stored.is_some();
        let creds = stored.unwrap_or_else(|| (self.init)());

        tracing::debug!(session_id = %session_id, creds_restored, "session state built");

        AuthSession {
            session_id: session_id.to_owned(),
            state: SessionState {
                creds: SharedCredentials::new(creds),
                keys: KeyStore::new(self.store.clone(), session_id.to_owned(), observe_errors),
            },
            store: self.store.clone(),
            creds_restored,
        }
    }
}
