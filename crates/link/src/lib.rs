//! `kh-link` keeps one protocol session connected across transport
//! restarts.
//!
//! A [`Linker`] owns the live transport of a single session.  It builds
//! the session's authentication state from the store, hands it to the
//! [`TransportFactory`], and from then on listens to the transport:
//!
//! ```text
//!   start(options)
//!      │
//!      ▼
//!   Bootstrapping ──► provider.session(id) ──► factory.connect(state)
//!      ▲                                              │
//!      │                                              ▼
//!   Restarting ◄──── restart_required ─────────── Connected
//!   (old handle                                   creds_updated ──► save_creds()
//!    tombstoned)                                  send / exit / logout forwarded
//! ```
//!
//! # Rules
//!
//! - Exactly one live transport per linker; a restart tombstones the old
//!   handle before the next bootstrap begins.
//! - A restart signal always runs the internal restart.  A caller hook,
//!   when configured, runs in addition to it.
//! - Failures of forwarded operations are logged once and returned; they
//!   never cause a restart.

pub mod builder;
pub mod handle;
pub mod linker;
pub mod reconnect;
pub mod transport;
pub mod types;

// ── Re-exports for ergonomic imports ─────────────────────────────────

pub use builder::LinkerBuilder;
pub use handle::TransportHandle;
pub use linker::{Linker, RestartHook, StartOptions};
pub use reconnect::ReconnectBackoff;
pub use transport::{
    Connection, MessageContent, Transport, TransportEvent, TransportFactory, TransportParams,
};
pub use types::{LinkError, TransportError};
