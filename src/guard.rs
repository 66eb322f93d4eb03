// src/guard.rs
//! Gate in front of every admin view: no token or a token the backend
//! rejects sends the user back to the login route.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::core::error::ApiError;
use crate::session::{Credentials, SessionToken};

pub const LOGIN_ROUTE: &str = "/admin/login";
pub const VALIDATING_PLACEHOLDER: &str = "Validating session...";

#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate(&self, token: &SessionToken) -> Result<(), ApiError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Pending,
    Authorized,
    Unauthorized,
}

/// What the guarded view should show for the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardRoute {
    Placeholder,
    RedirectToLogin,
    Protected,
}

impl GuardRoute {
    pub fn message(&self) -> Option<&'static str> {
        match self {
            GuardRoute::Placeholder => Some(VALIDATING_PLACEHOLDER),
            GuardRoute::RedirectToLogin => Some(LOGIN_ROUTE),
            GuardRoute::Protected => None,
        }
    }
}

pub struct SessionGuard<V> {
    validator: V,
    state: GuardState,
}

impl<V: TokenValidator> SessionGuard<V> {
    pub fn new(validator: V) -> Self {
        Self {
            validator,
            state: GuardState::Pending,
        }
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    /// Validate once. Later calls return the settled state without touching
    /// the network.
    pub async fn check(&mut self, credentials: &Credentials) -> GuardState {
        if self.state != GuardState::Pending {
            return self.state;
        }

        self.state = match credentials.token() {
            None => {
                info!("No session token; redirecting to {}", LOGIN_ROUTE);
                GuardState::Unauthorized
            }
            Some(token) => match self.validator.validate(token).await {
                Ok(()) => GuardState::Authorized,
                Err(e) if e.is_unauthorized() => {
                    warn!("Session token rejected by the backend");
                    GuardState::Unauthorized
                }
                Err(e) => {
                    warn!("Token validation failed: {}", e);
                    GuardState::Unauthorized
                }
            },
        };

        self.state
    }

    pub fn route(&self) -> GuardRoute {
        match self.state {
            GuardState::Pending => GuardRoute::Placeholder,
            GuardState::Authorized => GuardRoute::Protected,
            GuardState::Unauthorized => GuardRoute::RedirectToLogin,
        }
    }
}
