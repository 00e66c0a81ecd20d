//! Session lifecycle, view state and the add-car pipeline for the car client.

pub mod api;
pub mod error;
pub mod events;
pub mod render;
pub mod session;
pub mod token_store;
pub mod validation;
pub mod view_state;

pub use api::{HttpApi, RemoteApi};
pub use error::{ApiFailure, AuthError, CarError};
pub use events::{Page, ViewEvent};
pub use render::Frame;
pub use session::{AuthState, Session, SessionController};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use validation::{CarField, CarForm, ValidationError};
pub use view_state::{Credentials, ViewState, ViewStateMachine};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
