//! Durable per-session record storage.
//!
//! Every record lives in one `session(session_id, id, data)` table.  Record
//! ids are normalized before they reach the table, values are serialized by
//! the [`codec`], and the table itself is reached through a
//! [`QueryExecutor`] so the same store runs on SQLite or in memory.
//!
//! Reads favour availability: a record that is missing, unreadable, or
//! undecodable comes back as `None` and the failure goes to the injected
//! [`ErrorReporter`].  Writes and deletes always surface their errors.

pub mod codec;
pub mod error;
pub mod executor;
pub mod memory;
pub mod normalize;
pub mod reporter;
pub mod sqlite;
pub mod store;

pub use codec::{decode, encode, Buffer};
pub use error::{CodecError, StorageError, StoreError};
pub use executor::{ExecuteResult, QueryExecutor, Row, Statement};
pub use memory::MemoryExecutor;
pub use normalize::normalize_id;
pub use reporter::{ErrorReporter, ReadFailure, RecordingReporter, TracingReporter};
pub use sqlite::SqliteExecutor;
pub use store::{SessionStore, CREDS_ID};
