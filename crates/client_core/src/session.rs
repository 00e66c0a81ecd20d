use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shared::{domain::User, protocol::LoginRequest};
use tracing::{debug, info, warn};

use crate::{api::RemoteApi, error::AuthError, token_store::TokenStore};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
    user: Option<User>,
}

impl Session {
    pub fn authenticated(token: impl Into<String>, user: User) -> Self {
        Self {
            token: Some(token.into()),
            user: Some(user),
        }
    }

    fn verifying(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            user: None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn auth_state(&self) -> AuthState {
        match (&self.token, &self.user) {
            (Some(_), Some(_)) => AuthState::Authenticated,
            (Some(_), None) => AuthState::Verifying,
            (None, _) => AuthState::Unauthenticated,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Verifying,
    Authenticated,
}

/// Owns the bearer token and the signed-in user.
pub struct SessionController {
    api: Arc<dyn RemoteApi>,
    store: Arc<dyn TokenStore>,
    session: Mutex<Session>,
}

impl SessionController {
    pub fn new(api: Arc<dyn RemoteApi>, store: Arc<dyn TokenStore>) -> Self {
        Self {
            api,
            store,
            session: Mutex::new(Session::default()),
        }
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> Session {
        self.session().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.session().token.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.session().user.clone()
    }

    pub fn auth_state(&self) -> AuthState {
        self.session().auth_state()
    }

    pub fn stored_token(&self) -> Option<String> {
        match self.store.load() {
            Ok(token) => token,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "failed to read stored token; treating as absent");
                None
            }
        }
    }

    pub fn has_stored_token(&self) -> bool {
        self.stored_token().is_some()
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response = self
            .api
            .login(&request)
            .await
            .map_err(AuthError::from_login_failure)?;

        if let Err(err) = self.store.save(&response.access_token) {
            warn!(error = %format!("{err:#}"), "failed to persist session token");
        }
        let session = Session::authenticated(response.access_token, response.user);
        *self.session() = session.clone();
        info!(username, "signed in");
        Ok(session)
    }

    /// Confirms a stored token with the server. Any failure signs the client out.
    pub async fn probe(&self) -> Result<Session, AuthError> {
        let Some(token) = self.stored_token() else {
            debug!("no stored token; skipping session probe");
            return Err(AuthError::NoToken);
        };

        *self.session() = Session::verifying(token.clone());

        match self.api.me(&token).await {
            Ok(response) => {
                let session = Session::authenticated(token, response.user);
                *self.session() = session.clone();
                if let Some(user) = session.user() {
                    info!(username = %user.username, "stored session verified");
                }
                Ok(session)
            }
            Err(failure) => {
                warn!(%failure, "stored session rejected; signing out");
                self.logout();
                Err(AuthError::InvalidSession)
            }
        }
    }

    pub fn logout(&self) {
        if let Err(err) = self.store.clear() {
            warn!(error = %format!("{err:#}"), "failed to clear stored token");
        }
        *self.session() = Session::default();
        debug!("session cleared");
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
