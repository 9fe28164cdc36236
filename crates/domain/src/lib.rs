//! Shared types for the Keyhold crates: errors, configuration, structured
//! trace events, and the protocol-facing identity and credential values.

pub mod config;
pub mod credentials;
pub mod error;
pub mod identity;
pub mod trace;

pub use credentials::Credentials;
pub use error::{Error, Result};
pub use identity::{BrowserName, ClientIdentity, Level};
pub use trace::TraceEvent;
