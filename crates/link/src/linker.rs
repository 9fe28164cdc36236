//! The reconnect orchestrator.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use kh_auth_state::{AuthSession, SessionStateProvider};
use kh_domain::config::LinkConfig;
use kh_domain::{ClientIdentity, Credentials, Level, TraceEvent};

use crate::handle::TransportHandle;
use crate::reconnect::ReconnectBackoff;
use crate::transport::{
    MessageContent, Transport, TransportEvent, TransportFactory, TransportParams,
};
use crate::types::{LinkError, TransportError};

/// Caller hook run on every restart signal, before the internal restart.
pub type RestartHook = Arc<dyn Fn() + Send + Sync>;

/// Per-start settings, reused unchanged by every restart cycle.
#[derive(Clone)]
pub struct StartOptions {
    pub log_level: Level,
    pub observe_errors: bool,
    pub on_restart_required: Option<RestartHook>,
}

impl Default for StartOptions {
    fn default() -> Self {
        Self {
            log_level: Level::default(),
            observe_errors: true,
            on_restart_required: None,
        }
    }
}

impl StartOptions {
    pub fn from_config(cfg: &LinkConfig) -> Self {
        Self {
            log_level: cfg.log_level,
            observe_errors: cfg.observe_errors,
            on_restart_required: None,
        }
    }

    pub fn on_restart_required<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_restart_required = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for StartOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StartOptions")
            .field("log_level", &self.log_level)
            .field("observe_errors", &self.observe_errors)
            .field("on_restart_required", &self.on_restart_required.is_some())
            .finish()
    }
}

/// Keeps one session's transport alive across restart signals.
///
/// Create via [`LinkerBuilder`](crate::LinkerBuilder).
pub struct Linker {
    inner: Arc<Inner>,
}

struct Inner {
    session_id: String,
    identity: ClientIdentity,
    provider: SessionStateProvider,
    factory: Arc<dyn TransportFactory>,
    backoff: ReconnectBackoff,
    current: RwLock<Option<TransportHandle>>,
    started: AtomicBool,
    shutdown: CancellationToken,
}

impl Linker {
    pub fn builder() -> crate::builder::LinkerBuilder {
        crate::builder::LinkerBuilder::new()
    }

    pub(crate) fn new(
        session_id: String,
        identity: ClientIdentity,
        provider: SessionStateProvider,
        factory: Arc<dyn TransportFactory>,
        backoff: ReconnectBackoff,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                session_id,
                identity,
                provider,
                factory,
                backoff,
                current: RwLock::new(None),
                started: AtomicBool::new(false),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.inner.session_id
    }

    pub fn client_identity(&self) -> &ClientIdentity {
        &self.inner.identity
    }

    /// Bootstrap the first transport and begin supervising it.
    ///
    /// Returns once the first transport exists; its bootstrap error, if
    /// any, is returned here.  Later restart cycles run in the background.
    pub async fn start(&self, options: StartOptions) -> Result<(), LinkError> {
        if self.inner.started.swap(true, Ordering::AcqRel) {
            return Err(LinkError::AlreadyStarted);
        }

        let supervisor = Supervisor {
            inner: self.inner.clone(),
            options,
        };
        let live = match supervisor.bootstrap(1).await {
            Ok(live) => live,
            Err(e) => {
                self.inner.started.store(false, Ordering::Release);
                tracing::error!(session_id = %self.inner.session_id, error = %e, "initial bootstrap failed");
                return Err(LinkError::Bootstrap(e));
            }
        };

        tokio::spawn(supervisor.run(live));
        Ok(())
    }

    /// The handle of the current generation.  It may already be retired if
    /// a restart is in progress.
    pub fn handle(&self) -> Result<TransportHandle, LinkError> {
        self.inner
            .current
            .read()
            .clone()
            .ok_or(LinkError::SessionNotInitialized)
    }

    /// The live transport, for operations the linker does not forward.
    pub fn transport(&self) -> Result<Arc<dyn Transport>, LinkError> {
        let handle = self.handle()?;
        handle.transport().cloned()
    }

    /// Generation of the current transport; the first bootstrap is `1`.
    pub fn generation(&self) -> Option<u64> {
        self.inner.current.read().as_ref().map(TransportHandle::generation)
    }

    pub fn is_connected(&self) -> bool {
        self.handle().map(|h| h.is_connected()).unwrap_or(false)
    }

    pub async fn send_message(&self, target: &str, content: MessageContent) -> Result<(), LinkError> {
        let handle = self.handle()?;
        let result = handle.send_message(target, content).await;
        self.observe("send_message", result)
    }

    pub async fn exit(&self) -> Result<(), LinkError> {
        let handle = self.handle()?;
        let result = handle.exit().await;
        self.observe("exit", result)
    }

    pub async fn logout(&self) -> Result<(), LinkError> {
        let handle = self.handle()?;
        let result = handle.logout().await;
        self.observe("logout", result)
    }

    /// Stop supervising and retire the current transport.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
        if let Some(handle) = self.inner.current.read().as_ref() {
            handle.retire();
        }
    }

    fn observe(&self, operation: &'static str, result: Result<(), LinkError>) -> Result<(), LinkError> {
        if let Err(e) = &result {
            tracing::error!(session_id = %self.inner.session_id, operation, error = %e, "transport operation failed");
            TraceEvent::TransportOpFailed {
                session_id: self.inner.session_id.clone(),
                operation: operation.to_owned(),
                error: e.to_string(),
            }
            .emit();
        }
        result
    }
}

impl Drop for Linker {
    fn drop(&mut self) {
        self.inner.shutdown.cancel();
    }
}

// ── Supervisor ───────────────────────────────────────────────────────

/// The state of one bootstrap generation.
struct Live {
    handle: TransportHandle,
    session: AuthSession,
    events: mpsc::Receiver<TransportEvent>,
}

struct Supervisor {
    inner: Arc<Inner>,
    options: StartOptions,
}

impl Supervisor {
    /// Read the session back from the store and build a transport on it.
    async fn bootstrap(&self, generation: u64) -> Result<Live, TransportError> {
        let session = self
            .inner
            .provider
            .session(&self.inner.session_id, self.options.observe_errors)
            .await;

        tracing::debug!(
            session_id = %self.inner.session_id,
            generation,
            client = ?self.inner.identity.as_triple(),
            creds_restored = session.creds_restored(),
            "bootstrapping transport"
        );

        let connection = self
            .inner
            .factory
            .connect(TransportParams {
                auth_state: session.state().clone(),
                log_level: self.options.log_level,
                client_identity: self.inner.identity.clone(),
            })
            .await?;

        let handle = TransportHandle::new(generation, connection.transport);
        *self.inner.current.write() = Some(handle.clone());
        if self.inner.shutdown.is_cancelled() {
            handle.retire();
        }

        TraceEvent::SessionBootstrapped {
            session_id: self.inner.session_id.clone(),
            connection_id: handle.connection_id().to_string(),
            generation,
            creds_restored: session.creds_restored(),
        }
        .emit();

        Ok(Live {
            handle,
            session,
            events: connection.events,
        })
    }

    async fn run(self, mut live: Live) {
        let session_id = self.inner.session_id.clone();

        loop {
            let event = tokio::select! {
                biased;
                _ = self.inner.shutdown.cancelled() => {
                    live.handle.retire();
                    tracing::info!(session_id = %session_id, "link shut down");
                    return;
                }
                ev = live.events.recv() => ev,
            };

            match event {
                Some(TransportEvent::CredsUpdated(creds)) => {
                    self.persist_creds(&live.session, creds).await;
                }
                Some(TransportEvent::RestartRequired) => {
                    if let Some(hook) = &self.options.on_restart_required {
                        hook();
                    }
                    live.handle.retire();

                    let generation = live.handle.generation() + 1;
                    TraceEvent::RestartCycle {
                        session_id: session_id.clone(),
                        generation,
                        at: Utc::now(),
                    }
                    .emit();

                    match self.rebootstrap(generation).await {
                        Some(next) => live = next,
                        None => return,
                    }
                }
                None => {
                    tracing::warn!(
                        session_id = %session_id,
                        generation = live.handle.generation(),
                        "transport event stream ended"
                    );
                    return;
                }
            }
        }
    }

    async fn persist_creds(&self, session: &AuthSession, creds: Credentials) {
        session.state().creds.replace(creds);
        if let Err(e) = session.save_creds().await {
            tracing::error!(
                session_id = %self.inner.session_id,
                error = %e,
                "failed to persist updated credentials"
            );
        }
    }

    /// Bootstrap `generation`, retrying per the backoff policy.  `None`
    /// means the policy was exhausted or the linker shut down.
    async fn rebootstrap(&self, generation: u64) -> Option<Live> {
        let session_id = &self.inner.session_id;
        let mut failures: u32 = 0;

        loop {
            let attempt = tokio::select! {
                biased;
                _ = self.inner.shutdown.cancelled() => return None,
                r = self.bootstrap(generation) => r,
            };

            let err = match attempt {
                Ok(live) => return Some(live),
                Err(e) => e,
            };
            failures += 1;
            tracing::warn!(
                session_id = %session_id,
                generation,
                attempt = failures,
                error = %err,
                "restart bootstrap failed"
            );

            if self.inner.backoff.should_give_up(failures) {
                tracing::error!(
                    session_id = %session_id,
                    attempts = failures,
                    "restart attempts exhausted, link is idle"
                );
                return None;
            }

            let delay = self.inner.backoff.delay_for_attempt(failures - 1);
            tracing::debug!(
                session_id = %session_id,
                delay_ms = delay.as_millis() as u64,
                "retrying bootstrap"
            );
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.inner.shutdown.cancelled() => return None,
            }
        }
    }
}
