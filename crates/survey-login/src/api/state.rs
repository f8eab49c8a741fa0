//! Application state shared across handlers.

use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::AuthState;
use crate::store::CredentialStore;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// Token issuing and validation.
    pub auth: AuthState,
    /// Identity records.
    pub store: Arc<dyn CredentialStore>,
}

impl AppState {
    /// Create new application state.
    pub fn new(auth: AuthState, store: Arc<dyn CredentialStore>) -> Self {
        Self { auth, store }
    }
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}
