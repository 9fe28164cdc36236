//! The seam between the linker and the protocol implementation.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use kh_auth_state::SessionState;
use kh_domain::{ClientIdentity, Credentials, Level};

use crate::types::TransportError;

/// Outbound message body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "snake_case")]
pub enum MessageContent {
    Text(String),
    Structured(serde_json::Value),
}

/// Lifecycle notifications a transport pushes to its linker.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// The transport holds new credentials; they replace the stored ones.
    CredsUpdated(Credentials),
    /// The connection must be torn down and built again.
    RestartRequired,
}

/// A live protocol connection.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn send_message(
        &self,
        target: &str,
        content: MessageContent,
    ) -> Result<(), TransportError>;

    /// Close the connection, keeping the session's credentials.
    async fn exit(&self) -> Result<(), TransportError>;

    /// Close the connection and deregister the device.
    async fn logout(&self) -> Result<(), TransportError>;

    fn is_connected(&self) -> bool;
}

/// What a transport is constructed from.
pub struct TransportParams {
    pub auth_state: SessionState,
    pub log_level: Level,
    pub client_identity: ClientIdentity,
}

/// A freshly constructed transport and its event stream.
pub struct Connection {
    pub transport: Arc<dyn Transport>,
    pub events: mpsc::Receiver<TransportEvent>,
}

/// Builds transports.  Called once per bootstrap.
#[async_trait]
pub trait TransportFactory: Send + Sync + 'static {
    async fn connect(&self, params: TransportParams) -> Result<Connection, TransportError>;
}
