//! Authentication state for one protocol session, backed by
//! [`kh_store::SessionStore`].
//!
//! [`SessionStateProvider::session`] restores (or default-initializes) the
//! credentials and hands out a [`KeyStore`] that reads and writes rotating
//! key material in concurrent batches.  The result is the [`AuthSession`]
//! the transport consumes.

pub mod category;
pub mod keys;
pub mod provider;
pub mod value;

pub use category::{KeyCategory, UnknownCategory};
pub use keys::{KeyBatch, KeySetError, KeyStore};
pub use provider::{
    AuthSession, CredentialsInit, SessionState, SessionStateProvider, SharedCredentials,
};
pub use value::{AppStateSyncKeyData, AppStateSyncKeyFingerprint, KeyValue};
