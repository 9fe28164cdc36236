//! Generation-stamped access to one transport instance.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use uuid::Uuid;

use crate::transport::{MessageContent, Transport};
use crate::types::LinkError;

/// A reference to the transport of one bootstrap generation.
///
/// Clones share a liveness flag.  Once a restart retires the generation,
/// every clone refuses operations with [`LinkError::StaleHandle`].
#[derive(Clone)]
pub struct TransportHandle {
    generation: u64,
    connection_id: Uuid,
    transport: Arc<dyn Transport>,
    live: Arc<AtomicBool>,
}

impl TransportHandle {
    pub(crate) fn new(generation: u64, transport: Arc<dyn Transport>) -> Self {
        Self {
            generation,
            connection_id: Uuid::new_v4(),
            transport,
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn connection_id(&self) -> Uuid {
        self.connection_id
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// The underlying transport, if this generation is still current.
    pub fn transport(&self) -> Result<&Arc<dyn Transport>, LinkError> {
        if self.is_live() {
            Ok(&self.transport)
        } else {
            Err(LinkError::StaleHandle {
                generation: self.generation,
            })
        }
    }

    pub fn is_connected(&self) -> bool {
        self.is_live() && self.transport.is_connected()
    }

    pub async fn send_message(&self, target: &str, content: MessageContent) -> Result<(), LinkError> {
        self.transport()?
            .send_message(target, content)
            .await
            .map_err(|source| LinkError::Transport {
                operation: "send_message",
                source,
            })
    }

    pub async fn exit(&self) -> Result<(), LinkError> {
        self.transport()?
            .exit()
            .await
            .map_err(|source| LinkError::Transport {
                operation: "exit",
                source,
            })
    }

    pub async fn logout(&self) -> Result<(), LinkError> {
        self.transport()?
            .logout()
            .await
            .map_err(|source| LinkError::Transport {
                operation: "logout",
                source,
            })
    }

    pub(crate) fn retire(&self) {
        self.live.store(false, Ordering::Release);
    }
}

impl fmt::Debug for TransportHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportHandle")
            .field("generation", &self.generation)
            .field("connection_id", &self.connection_id)
            .field("live", &self.is_live())
            .finish()
    }
}
