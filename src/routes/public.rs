use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any client
/// (anonymous or logged-in): the post listings, the identity flow, and the
/// static pages.
///
/// The comment route lives here as well even though commenting requires a
/// session: its handler resolves the principal *optionally* so an anonymous
/// submission is answered with a redirect to the login form (carrying a flash
/// message) instead of a blanket 401 from the middleware layer.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load balancer checks.
        // Returns "ok" immediately to verify the service is running and responsive.
        .route("/health", get(|| async { "ok" }))
        // GET /
        // Lists every post for the index view.
        .route("/", get(handlers::get_all_posts))
        // GET /register: the empty registration form payload.
        // POST /register: creates the account; the first account ever created
        // becomes the administrator (decided at the persistence layer).
        .route(
            "/register",
            get(handlers::register_form).post(handlers::register),
        )
        // GET /login?error=...: the login form, surfacing any flashed message.
        // POST /login?next=...: authenticates; the `next` destination is
        // validated by the redirect validator before any redirect is issued.
        .route("/login", get(handlers::login_form).post(handlers::login))
        // GET /logout
        // Clears the session cookie and returns to the index.
        .route("/logout", get(handlers::logout))
        // GET /post/{id}: a single post with its comments (404 when absent).
        // POST /post/{id}: adds a comment; content is sanitized before it is
        // ever persisted, and anonymous callers are redirected to /login.
        .route(
            "/post/{id}",
            get(handlers::show_post).post(handlers::add_comment),
        )
        // GET /about, GET /contact
        // Static page payloads for the view layer.
        .route("/about", get(handlers::about))
        .route("/contact", get(handlers::contact))
}
