use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Defines the routes exclusively accessible to the administrator: post
/// creation, editing, and deletion.
///
/// Access Control:
/// This entire router is wrapped in the `require_admin` middleware, which runs
/// its checks in order (is there a principal at all, and is that principal an
/// administrator) and answers 403 to everyone else, anonymous callers
/// included, before any handler (and therefore any persistence mutation) can
/// execute.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /new-post: the empty post form payload.
        // POST /new-post: creates the post; duplicate titles are reported as
        // a 409 with the re-rendered form.
        .route(
            "/new-post",
            get(handlers::new_post_form).post(handlers::create_post),
        )
        // GET /edit/{id}: the form payload pre-filled from the stored post.
        // POST /edit/{id}: rewrites the editable fields.
        .route(
            "/edit/{id}",
            get(handlers::edit_post_form).post(handlers::edit_post),
        )
        // GET /delete/{id}: the confirmation payload; reading never mutates.
        // POST /delete/{id}: deletes the post and, explicitly, its comments.
        .route(
            "/delete/{id}",
            get(handlers::delete_post_confirm).post(handlers::delete_post),
        )
}
