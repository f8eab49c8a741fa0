//! HTTP API module.
//!
//! Credential exchange plus the token-scoped profile, unit and questionnaire
//! endpoints.

mod error;
mod handlers;
mod routes;
mod state;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use routes::create_router;
pub use state::AppState;
