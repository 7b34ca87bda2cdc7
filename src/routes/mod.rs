/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated modules,
/// enforcing a Defense-in-Depth strategy. This structure ensures that
/// access control is applied explicitly at the module level (via Axum layers),
/// preventing accidental exposure of protected endpoints.
///
/// The three modules map directly to the defined access roles.

/// Routes accessible to all users (anonymous included): browsing, the
/// registration/login/logout flow, and the comment route whose login gate is
/// resolved in-handler so anonymous callers get the login redirect.
pub mod public;

/// Routes protected by the `require_auth` middleware.
/// Requires a validated user session.
pub mod authenticated;

/// Routes restricted exclusively to the administrator role.
/// The `require_admin` middleware runs its ordered checks before any handler.
pub mod admin;
