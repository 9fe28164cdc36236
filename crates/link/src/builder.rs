//! Builder pattern for constructing a [`Linker`].

use std::sync::Arc;

use kh_auth_state::SessionStateProvider;
use kh_domain::config::LinkConfig;
use kh_domain::{BrowserName, ClientIdentity};

use crate::linker::Linker;
use crate::reconnect::ReconnectBackoff;
use crate::transport::TransportFactory;
use crate::types::LinkError;

/// Fluent builder for [`Linker`].
///
/// # Example
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use kh_link::{LinkerBuilder, TransportFactory};
/// # use kh_auth_state::SessionStateProvider;
/// # fn demo(provider: SessionStateProvider, factory: Arc<dyn TransportFactory>) {
/// let linker = LinkerBuilder::new()
///     .session_id("support-line")
///     .provider(provider)
///     .factory(factory)
///     .build()
///     .unwrap();
/// # }
/// ```
pub struct LinkerBuilder {
    session_id: Option<String>,
    browser: BrowserName,
    identity: Option<ClientIdentity>,
    provider: Option<SessionStateProvider>,
    factory: Option<Arc<dyn TransportFactory>>,
    reconnect_backoff: ReconnectBackoff,
}

impl LinkerBuilder {
    pub fn new() -> Self {
        Self {
            session_id: None,
            browser: BrowserName::default(),
            identity: None,
            provider: None,
            factory: None,
            reconnect_backoff: ReconnectBackoff::default(),
        }
    }

    /// Browser and retry policy from the `[link]` config section.
    pub fn link_config(mut self, cfg: &LinkConfig) -> Self {
        self.browser = cfg.browser;
        self.reconnect_backoff = ReconnectBackoff::from(&cfg.reconnect);
        self
    }

    // ── Required ─────────────────────────────────────────────────────

    pub fn session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    pub fn provider(mut self, provider: SessionStateProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn factory(mut self, factory: Arc<dyn TransportFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    // ── Identity ─────────────────────────────────────────────────────

    /// Browser advertised in the host-derived client identity.
    pub fn browser(mut self, browser: BrowserName) -> Self {
        self.browser = browser;
        self
    }

    /// Advertise an explicit identity instead of deriving one from the host.
    pub fn client_identity(mut self, identity: ClientIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    // ── Behavior ─────────────────────────────────────────────────────

    /// Override the retry policy for failed restart bootstraps.
    pub fn reconnect_backoff(mut self, backoff: ReconnectBackoff) -> Self {
        self.reconnect_backoff = backoff;
        self
    }

    pub fn build(self) -> Result<Linker, LinkError> {
        let session_id = self
            .session_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| LinkError::Config("session_id is required".into()))?;
        let provider = self
            .provider
            .ok_or_else(|| LinkError::Config("a session state provider is required".into()))?;
        let factory = self
            .factory
            .ok_or_else(|| LinkError::Config("a transport factory is required".into()))?;
        let identity = self
            .identity
            .unwrap_or_else(|| ClientIdentity::appropriate(self.browser));

        Ok(Linker::new(
            session_id,
            identity,
            provider,
            factory,
            self.reconnect_backoff,
        ))
    }
}

impl Default for LinkerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
