//! Failure taxonomy for the client. Every variant collapses to exactly one
//! user-facing message; nothing structured reaches the view layer.

use thiserror::Error;

use crate::validation::ValidationError;

pub const MSG_INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const MSG_LOGIN_FAILED: &str = "Login failed";
pub const MSG_LOGIN_UNREACHABLE: &str = "Unable to connect to login service";
pub const MSG_CREATE_FAILED: &str = "Failed to add car";
pub const MSG_CREATE_UNREACHABLE: &str = "Unable to add car";

/// Outcome of a remote call that did not produce a usable 2xx body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiFailure {
    #[error("server responded with HTTP {status}")]
    Status { status: u16, detail: Option<String> },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("malformed response body: {0}")]
    Decode(String),
}

impl ApiFailure {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiFailure::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when no HTTP response could be used at all.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiFailure::Transport(_) | ApiFailure::Decode(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("login service returned HTTP {status}")]
    LoginUnavailable { status: u16 },
    #[error("login service unreachable: {0}")]
    NetworkUnavailable(String),
    #[error("no stored session token")]
    NoToken,
    #[error("stored session is no longer valid")]
    InvalidSession,
}

impl AuthError {
    pub fn from_login_failure(failure: ApiFailure) -> Self {
        match failure {
            ApiFailure::Status { status: 401, .. } => AuthError::InvalidCredentials,
            ApiFailure::Status { status, .. } => AuthError::LoginUnavailable { status },
            ApiFailure::Transport(reason) | ApiFailure::Decode(reason) => {
                AuthError::NetworkUnavailable(reason)
            }
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => MSG_INVALID_CREDENTIALS,
            AuthError::LoginUnavailable { .. } => MSG_LOGIN_FAILED,
            AuthError::NetworkUnavailable(_) => MSG_LOGIN_UNREACHABLE,
            AuthError::NoToken | AuthError::InvalidSession => "Session expired; please sign in",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CarError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("car service rejected the new car")]
    CreateFailed { status: Option<u16> },
    #[error("car service unreachable: {0}")]
    CreateUnavailable(String),
}

impl CarError {
    pub fn from_create_failure(failure: ApiFailure) -> Self {
        match failure {
            ApiFailure::Status { status, .. } => CarError::CreateFailed {
                status: Some(status),
            },
            ApiFailure::Transport(reason) | ApiFailure::Decode(reason) => {
                CarError::CreateUnavailable(reason)
            }
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            CarError::Validation(err) => err.to_string(),
            CarError::CreateFailed { .. } => MSG_CREATE_FAILED.to_string(),
            CarError::CreateUnavailable(_) => MSG_CREATE_UNREACHABLE.to_string(),
        }
    }
}
