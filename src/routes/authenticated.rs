use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Defines the routes accessible to any user who has successfully passed the
/// authentication layer.
///
/// Access Control Strategy:
/// Every handler in this module relies on the `require_auth` middleware being
/// present on the router layer above this module. This guarantees that all
/// handlers receive a validated `AuthUser` containing the user's id and role;
/// anonymous requests are rejected with 401 before a handler runs.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        // Retrieves the currently authenticated user's profile.
        .route("/me", get(handlers::get_me))
}
