// ── Session controller ──
//
// Owns the console's authentication state. The state is one enum, so a
// principal without authentication (or the reverse) cannot be expressed.
// Transitions are broadcast through a `watch` channel.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::model::Principal;
use crate::remote::RemoteApi;

/// Authentication state of the running console.
#[derive(Debug, Clone, PartialEq)]
pub enum Session {
    /// Start-up probe still in flight. Visited once, at start.
    Resolving,
    Authenticated(Arc<Principal>),
    Anonymous,
}

impl Session {
    pub fn principal(&self) -> Option<&Arc<Principal>> {
        match self {
            Self::Authenticated(p) => Some(p),
            Self::Resolving | Self::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn is_resolving(&self) -> bool {
        matches!(self, Self::Resolving)
    }
}

/// Owner of the [`Session`]. Cheaply cloneable; clones share state.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    api: Arc<dyn RemoteApi>,
    state: watch::Sender<Session>,
    bootstrapped: AtomicBool,
}

impl SessionController {
    pub fn new(api: Arc<dyn RemoteApi>) -> Self {
        let (state, _) = watch::channel(Session::Resolving);
        Self {
            inner: Arc::new(SessionInner {
                api,
                state,
                bootstrapped: AtomicBool::new(false),
            }),
        }
    }

    pub fn current(&self) -> Session {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.state.subscribe()
    }

    /// Probe the server for an existing session and leave `Resolving`.
    ///
    /// Any probe failure resolves to [`Session::Anonymous`] without
    /// surfacing an error. Only the first call probes; later calls return
    /// the current state. If `login` already ran while the probe was in
    /// flight, the probe result is discarded.
    pub async fn bootstrap(&self) -> Session {
        if self.inner.bootstrapped.swap(true, Ordering::SeqCst) {
            debug!("session already bootstrapped");
            return self.current();
        }

        // Spawned so the probe still resolves the session if the caller
        // stops waiting.
        let inner = Arc::clone(&self.inner);
        let probe = tokio::spawn(async move {
            let resolved = match inner.api.probe_session().await {
                Ok(Some(principal)) => {
                    info!(id = %principal.id, "existing session found");
                    Session::Authenticated(Arc::new(principal))
                }
                Ok(None) => {
                    debug!("no existing session");
                    Session::Anonymous
                }
                Err(e) => {
                    debug!(error = %e, "session probe failed, continuing anonymously");
                    Session::Anonymous
                }
            };
            inner.state.send_if_modified(|state| {
                if state.is_resolving() {
                    *state = resolved;
                    true
                } else {
                    false
                }
            });
        });

        if let Err(e) = probe.await {
            warn!(error = %e, "session probe task aborted");
            self.inner.state.send_if_modified(|state| {
                if state.is_resolving() {
                    *state = Session::Anonymous;
                    true
                } else {
                    false
                }
            });
        }
        self.current()
    }

    /// Wait until the start-up probe has resolved.
    pub async fn resolved(&self) -> Session {
        let mut rx = self.subscribe();
        match rx.wait_for(|s| !s.is_resolving()).await {
            Ok(session) => session.clone(),
            // Sender lives in `self`, so this only happens mid-teardown.
            Err(_) => self.current(),
        }
    }

    /// Record a principal obtained by a completed login exchange.
    pub fn login(&self, principal: Principal) {
        info!(id = %principal.id, "session authenticated");
        self.inner
            .state
            .send_replace(Session::Authenticated(Arc::new(principal)));
    }

    /// End the session. The server call is best effort; the local state
    /// becomes [`Session::Anonymous`] whatever it returns.
    pub async fn logout(&self) {
        if let Err(e) = self.inner.api.end_session().await {
            warn!(error = %e, "remote logout failed, clearing local session anyway");
        }
        self.inner.state.send_replace(Session::Anonymous);
        info!("session ended");
    }
}
