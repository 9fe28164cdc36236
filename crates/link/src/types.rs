//! Error types of the link layer.

/// Failure reported by a transport implementation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("connect: {0}")]
    Connect(String),
    #[error("closed")]
    Closed,
    #[error("{0}")]
    Other(String),
}

/// Errors surfaced by [`Linker`](crate::Linker) operations.
#[derive(thiserror::Error, Debug)]
pub enum LinkError {
    /// An operation was issued before `start` produced a transport.
    #[error("session not initialized: call start() first")]
    SessionNotInitialized,
    #[error("already started")]
    AlreadyStarted,
    /// The handle belongs to a transport that a restart has retired.
    #[error("transport generation {generation} was retired by a restart")]
    StaleHandle { generation: u64 },
    #[error("bootstrap: {0}")]
    Bootstrap(#[source] TransportError),
    #[error("{operation}: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: TransportError,
    },
    #[error("config: {0}")]
    Config(String),
}
