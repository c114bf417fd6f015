//! Placeholder greeting route

use axum::extract::State;

use crate::api::middleware::{ApiError, AppState};

/// Fixed body returned by `GET /`
pub const GREETING: &str = "Welcome to hello Hi!";

/// ID of the user looked up on every greeting
const GREETED_USER_ID: i64 = 1;

/// GET / - Log user 1 and greet.
///
/// A missing user is logged and still greeted.
pub async fn hello(State(state): State<AppState>) -> Result<&'static str, ApiError> {
    match state.store.users().get_by_id(GREETED_USER_ID).await? {
        Some(user) => tracing::info!("Greeting user {:?}", user),
        None => tracing::info!("No user with id {}", GREETED_USER_ID),
    }
    Ok(GREETING)
}
