// ── Route guard ──
//
// Gates every protected view on the session. While the start-up probe is
// in flight the guard only ever answers "placeholder", so no view flashes
// an authorized or unauthorized rendering before the session is known.

use std::fmt;
use std::str::FromStr;

use strum::EnumIter;
use thiserror::Error;
use tokio::sync::watch;

use crate::session::{Session, SessionController};

/// Views of the admin console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Route {
    Login,
    Dashboard,
    AddDoctor,
    AddAdmin,
    Doctors,
    Messages,
}

impl Route {
    /// Where an unauthorized request is sent.
    pub const LOGIN_ENTRY: Self = Self::Login;
    /// Where a login lands, whatever was asked for before it.
    pub const HOME: Self = Self::Dashboard;

    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Dashboard => "/",
            Self::AddDoctor => "/doctor/addnew",
            Self::AddAdmin => "/admin/addnew",
            Self::Doctors => "/doctors",
            Self::Messages => "/messages",
        }
    }

    pub fn is_protected(self) -> bool {
        !matches!(self, Self::Login)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no view at path {0}")]
pub struct UnknownRoute(pub String);

impl FromStr for Route {
    type Err = UnknownRoute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let path = if trimmed.len() > 1 {
            trimmed.trim_end_matches('/')
        } else {
            trimmed
        };
        <Self as strum::IntoEnumIterator>::iter()
            .find(|r| r.path() == path)
            .ok_or_else(|| UnknownRoute(s.to_owned()))
    }
}

/// The guard's view of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Pending,
    Authorized,
    Unauthorized,
}

impl From<&Session> for GuardState {
    fn from(session: &Session) -> Self {
        match session {
            Session::Resolving => Self::Pending,
            Session::Authenticated(_) => Self::Authorized,
            Session::Anonymous => Self::Unauthorized,
        }
    }
}

/// What the front end should do with a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session not known yet: show a neutral placeholder, don't navigate.
    Placeholder,
    Render(Route),
    /// Navigate here instead. The requested route is not remembered.
    Redirect(Route),
}

/// Pure decision table shared by [`RouteGuard::check`] and tests.
pub fn decide(state: GuardState, requested: Route) -> GuardDecision {
    match (state, requested.is_protected()) {
        (GuardState::Pending, _) => GuardDecision::Placeholder,
        (GuardState::Authorized, true) | (GuardState::Unauthorized, false) => {
            GuardDecision::Render(requested)
        }
        (GuardState::Unauthorized, true) => GuardDecision::Redirect(Route::LOGIN_ENTRY),
        (GuardState::Authorized, false) => GuardDecision::Redirect(Route::HOME),
    }
}

/// Read-only observer of the session that answers navigation requests.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    session: watch::Receiver<Session>,
}

impl RouteGuard {
    pub fn new(session: &SessionController) -> Self {
        Self {
            session: session.subscribe(),
        }
    }

    pub fn state(&self) -> GuardState {
        GuardState::from(&*self.session.borrow())
    }

    pub fn check(&self, requested: Route) -> GuardDecision {
        decide(self.state(), requested)
    }

    /// Like [`check`](Self::check), but waits out the pending state first.
    pub async fn settle(&mut self, requested: Route) -> GuardDecision {
        let settled = self
            .session
            .wait_for(|s| !s.is_resolving())
            .await
            .map(|session| GuardState::from(&*session))
            .ok();
        decide(settled.unwrap_or_else(|| self.state()), requested)
    }

    /// Wait for the next session transition and return the new state.
    pub async fn changed(&mut self) -> Option<GuardState> {
        self.session.changed().await.ok()?;
        Some(GuardState::from(&*self.session.borrow_and_update()))
    }
}
