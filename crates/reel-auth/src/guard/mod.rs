//! Gate for protected routes based on session state

use crate::session::AuthSession;

/// What a protected route should do for the current session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Session state is still loading; show a fallback
    Pending,
    /// Render the protected content
    Render,
    /// Send the user elsewhere
    Redirect(String),
}

/// Route guard reading `is_loading` and `is_authenticated`.
///
/// Anonymous users are let through unless a redirect target is configured.
#[derive(Debug, Clone, Default)]
pub struct RouteGuard {
    redirect_to: Option<String>,
}

impl RouteGuard {
    /// Guard that only waits for loading to finish
    pub fn permissive() -> Self {
        Self::default()
    }

    /// Guard that redirects anonymous users to `path`
    pub fn redirect_to(path: impl Into<String>) -> Self {
        Self {
            redirect_to: Some(path.into()),
        }
    }

    pub fn evaluate(&self, session: &dyn AuthSession) -> GuardOutcome {
        if session.is_loading() {
            return GuardOutcome::Pending;
        }
        match &self.redirect_to {
            Some(path) if !session.is_authenticated() => GuardOutcome::Redirect(path.clone()),
            _ => GuardOutcome::Render,
        }
    }
}
