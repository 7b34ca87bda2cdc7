use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use url::Url;
use utoipa::ToSchema;

/// Role granted to the first registered account. Decided at account creation
/// by the persistence layer, never inferred from a row id.
pub const ADMIN_ROLE: &str = "admin";
/// Role granted to every subsequent account.
pub const USER_ROLE: &str = "user";

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// The user's canonical identity record from the `users` table, including the
/// credential material resolved during login.
///
/// Deliberately implements neither `Serialize` nor `ToSchema`: the password
/// hash must never cross the response boundary, so the row type cannot be
/// placed in a payload at all. Handlers expose [`UserProfile`] instead.
#[derive(Debug, Clone, FromRow, Default)]
pub struct User {
    pub id: i64,
    // The user's login identifier. Unique at the persistence boundary.
    pub email: String,
    pub name: String,
    // Argon2id PHC string produced by the credential store.
    pub password_hash: String,
    // The RBAC field: 'admin' or 'user'.
    pub role: String,
}

/// NewUser
///
/// Insertion payload handed to the repository during registration. The role is
/// not part of it; the insert itself decides admin-or-user atomically.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

/// Post
///
/// A blog post record from the `blog_posts` table. The primary data structure
/// for the core business logic.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow, Default)]
pub struct Post {
    pub id: i64,
    // FK to users.id (the admin who wrote it).
    pub author_id: i64,
    pub title: String,
    pub subtitle: String,
    /// Display date captured at creation time (e.g. "August 07, 2026").
    /// A formatted string rather than a timestamp; it is never sorted on.
    pub date: String,
    pub body: String,
    pub img_url: String,
    // Loaded via a JOIN with `users` in the repository queries.
    #[sqlx(default)]
    pub author_name: Option<String>,
}

/// Comment
///
/// A comment record from the `comments` table, augmented with the author's
/// display name (a join operation). The text field holds sanitized HTML only:
/// the sanitizer runs before the row is ever written.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow, Default)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub text: String,
    // Loaded via a JOIN in the repository query.
    #[sqlx(default)]
    pub author_name: Option<String>,
}

// --- Request Payloads (Input Schemas) ---

/// FieldError
///
/// A single field-level validation message, rendered by the view layer next to
/// the offending form input.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

fn require(field: &'static str, value: &str, errors: &mut Vec<FieldError>) {
    if value.trim().is_empty() {
        errors.push(FieldError {
            field: field.to_string(),
            message: "This field is required.".to_string(),
        });
    }
}

/// RegisterRequest
///
/// Form payload for the registration endpoint (POST /register).
/// The raw password only ever flows into the credential store's hash function.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    /// Field-presence validation; returns one error per missing field.
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        require("name", &self.name, &mut errors);
        require("email", &self.email, &mut errors);
        require("password", &self.password, &mut errors);
        errors
    }
}

/// LoginRequest
///
/// Form payload for the login endpoint (POST /login).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        require("email", &self.email, &mut errors);
        require("password", &self.password, &mut errors);
        errors
    }
}

/// LoginQuery
///
/// Accepted query parameters on the login route: `next` is the caller-requested
/// post-login destination (checked by the redirect validator before use), and
/// `error` carries a user-facing message from a prior redirect (the flash
/// channel used by registration failures and the comment login gate).
#[derive(Debug, Clone, Deserialize, Default, utoipa::IntoParams)]
pub struct LoginQuery {
    pub next: Option<String>,
    pub error: Option<String>,
}

/// CommentRequest
///
/// Form payload for adding a comment to a post (POST /post/{id}). The body is
/// rich-text HTML from the client-side editor and is fully untrusted until it
/// has passed through the content sanitizer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct CommentRequest {
    pub comment: String,
}

/// PostForm
///
/// Form payload shared by post creation (POST /new-post) and editing
/// (POST /edit/{id}), mirroring the single form the view layer renders under
/// both headlines.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct PostForm {
    pub title: String,
    pub subtitle: String,
    pub body: String,
    pub img_url: String,
}

impl PostForm {
    /// Field-presence validation plus a URL shape check on the cover image.
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        require("title", &self.title, &mut errors);
        require("subtitle", &self.subtitle, &mut errors);
        require("body", &self.body, &mut errors);
        require("img_url", &self.img_url, &mut errors);
        if !self.img_url.trim().is_empty() && Url::parse(&self.img_url).is_err() {
            errors.push(FieldError {
                field: "img_url".to_string(),
                message: "Invalid URL.".to_string(),
            });
        }
        errors
    }
}

// --- View Payloads (Output Schemas) ---

/// PostPage
///
/// The single-post view: the post together with its comments, in insertion
/// order. Handed to the view layer ready to render; comment text is already
/// sanitized and is not re-escaped.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct PostPage {
    pub post: Post,
    pub comments: Vec<Comment>,
}

/// LoginPage
///
/// The login form payload. `error` carries the policy message for a failed
/// attempt ("User does not exist" / "Wrong password") or a flashed message
/// arriving via the `error` query parameter.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct LoginPage {
    pub error: Option<String>,
}

/// RegisterPage
///
/// The registration form payload, with field-level validation errors when the
/// submission was rejected.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct RegisterPage {
    pub errors: Vec<FieldError>,
}

/// PostFormPage
///
/// The create/edit post form payload. `headline` distinguishes the two uses
/// ("New Post" / "Edit Post"); `form` carries the current field values so the
/// edit view opens pre-filled.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct PostFormPage {
    pub headline: String,
    pub form: PostForm,
    pub errors: Vec<FieldError>,
}

/// DeleteConfirmation
///
/// Payload for the deletion confirmation step (GET /delete/{id}). The actual
/// mutation requires a separate POST; a GET never deletes anything.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct DeleteConfirmation {
    pub post: Post,
}

/// PageView
///
/// Payload for the static pages (about, contact): the view layer picks the
/// template by name.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct PageView {
    pub page: String,
}

/// UserProfile
///
/// Output schema for the authenticated user's own profile (GET /me). The only
/// shape in which user data leaves the service; it has no password field to
/// leak.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: String,
}
