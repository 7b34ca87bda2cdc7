use crate::{
    AppState,
    auth::{self, AuthUser, OptionalAuthUser},
    credentials,
    models::{
        CommentRequest, DeleteConfirmation, FieldError, LoginPage, LoginQuery, LoginRequest,
        NewUser, PageView, Post, PostForm, PostFormPage, PostPage, RegisterPage, RegisterRequest,
        UserProfile,
    },
    redirect::is_safe_redirect,
    repository::RepoError,
    sanitize::sanitize_html,
};
use axum::{
    Json,
    extract::{Form, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{CookieJar, Host};
use chrono::Utc;

// Headlines the view layer renders above the shared post form.
const NEW_POST_HEADLINE: &str = "New Post";
const EDIT_POST_HEADLINE: &str = "Edit Post";

// Flash messages delivered through the login route's `error` query parameter.
const LOGIN_TO_COMMENT: &str = "/login?error=You+need+to+login+to+make+a+comment";
const EMAIL_EXISTS: &str = "/login?error=Email+already+exists";

// --- Public Handlers ---

/// get_all_posts
///
/// [Public Route] Lists every post, author names included, for the index view.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "All posts", body = [Post]))
)]
pub async fn get_all_posts(State(state): State<AppState>) -> Json<Vec<Post>> {
    let posts = state.repo.get_posts().await;
    Json(posts)
}

/// register_form
///
/// [Public Route] The empty registration form payload.
#[utoipa::path(
    get,
    path = "/register",
    responses((status = 200, description = "Registration form", body = RegisterPage))
)]
pub async fn register_form() -> Json<RegisterPage> {
    Json(RegisterPage::default())
}

/// register
///
/// [Public Route] Creates a new account.
///
/// *Flow*: validate fields → hash the password via the credential store →
/// insert the user (the persistence layer makes the first account the
/// administrator). A duplicate email is reported through the login form's
/// flash channel and creates no session; registration never auto-logs-in.
/// Any other persistence failure is a 500, never a silent redirect.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 303, description = "Registered, continue to login"),
        (status = 422, description = "Validation errors", body = RegisterPage)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Form(payload): Form<RegisterRequest>,
) -> Response {
    let errors = payload.validate();
    if !errors.is_empty() {
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(RegisterPage { errors })).into_response();
    }

    let password_hash = match credentials::hash_password(&payload.password, &state.config.hash_cost)
    {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("password hashing failed: {:?}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let new_user = NewUser {
        email: payload.email,
        name: payload.name,
        password_hash,
    };

    match state.repo.create_user(new_user).await {
        Ok(_) => Redirect::to("/login").into_response(),
        Err(RepoError::Duplicate(_)) => Redirect::to(EMAIL_EXISTS).into_response(),
        Err(e) => {
            tracing::error!("register error: {:?}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// login_form
///
/// [Public Route] The login form payload. A message arriving in the `error`
/// query parameter (from a registration conflict or the comment login gate) is
/// surfaced for the view layer to display.
#[utoipa::path(
    get,
    path = "/login",
    params(LoginQuery),
    responses((status = 200, description = "Login form", body = LoginPage))
)]
pub async fn login_form(Query(query): Query<LoginQuery>) -> Json<LoginPage> {
    Json(LoginPage { error: query.error })
}

/// login
///
/// [Public Route] Authenticates a user and establishes the session.
///
/// *Flow*: look up by email. An unknown email reports "User does not exist",
/// a failed verification "Wrong password" (two distinct messages, a deliberate
/// policy choice). On success a signed session token is issued into the
/// session cookie, and the caller-supplied `next` destination is checked by
/// the redirect validator: absent falls back to the index, unsafe aborts with
/// 400 before any cookie is set.
#[utoipa::path(
    post,
    path = "/login",
    params(LoginQuery),
    request_body = LoginRequest,
    responses(
        (status = 303, description = "Logged in"),
        (status = 400, description = "Unsafe redirect target"),
        (status = 401, description = "Bad credentials", body = LoginPage)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Host(host): Host,
    Query(query): Query<LoginQuery>,
    jar: CookieJar,
    Form(payload): Form<LoginRequest>,
) -> Response {
    if !payload.validate().is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(LoginPage {
                error: Some("Email and password are required".to_string()),
            }),
        )
            .into_response();
    }

    let Some(user) = state.repo.get_user_by_email(&payload.email).await else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(LoginPage {
                error: Some("User does not exist".to_string()),
            }),
        )
            .into_response();
    };

    if !credentials::verify_password(&payload.password, &user.password_hash) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(LoginPage {
                error: Some("Wrong password".to_string()),
            }),
        )
            .into_response();
    }

    // An empty `next` counts as absent, matching the form posting an empty field.
    let destination = match query.next.as_deref().filter(|next| !next.trim().is_empty()) {
        None => "/".to_string(),
        Some(next) if is_safe_redirect(next, &host) => next.to_string(),
        Some(next) => {
            tracing::warn!("rejected unsafe login redirect target: {}", next);
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let token = match auth::issue_session_token(user.id, &state.config) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!("failed to sign session token: {:?}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    (
        jar.add(auth::session_cookie(token)),
        Redirect::to(&destination),
    )
        .into_response()
}

/// logout
///
/// [Public Route] Clears the session cookie and returns to the index. With the
/// token gone the next request resolves to the anonymous principal.
#[utoipa::path(
    get,
    path = "/logout",
    responses((status = 303, description = "Logged out"))
)]
pub async fn logout(jar: CookieJar) -> (CookieJar, Redirect) {
    (jar.remove(auth::removal_cookie()), Redirect::to("/"))
}

/// show_post
///
/// [Public Route] A single post with its comments. A nonexistent id is an
/// explicit 404, never a silently empty page.
#[utoipa::path(
    get,
    path = "/post/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post with comments", body = PostPage),
        (status = 404, description = "No such post")
    )
)]
pub async fn show_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<Json<PostPage>, StatusCode> {
    match state.repo.get_post(post_id).await {
        Some(post) => {
            let comments = state.repo.get_comments(post_id).await;
            Ok(Json(PostPage { post, comments }))
        }
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// add_comment
///
/// [Public Route, in-handler gate] Adds a comment to a post.
///
/// The principal is resolved optionally so an anonymous caller is answered
/// with a redirect to the login form carrying a flash message rather than a
/// bare 401. The submitted body passes through the content sanitizer
/// *before* persistence; if sanitization strips it to nothing, no row is
/// written and the caller is simply bounced back to the post.
#[utoipa::path(
    post,
    path = "/post/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    request_body = CommentRequest,
    responses(
        (status = 303, description = "Comment handled"),
        (status = 404, description = "No such post")
    )
)]
pub async fn add_comment(
    OptionalAuthUser(principal): OptionalAuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Form(payload): Form<CommentRequest>,
) -> Response {
    let Some(user) = principal else {
        return Redirect::to(LOGIN_TO_COMMENT).into_response();
    };

    if state.repo.get_post(post_id).await.is_none() {
        return StatusCode::NOT_FOUND.into_response();
    }

    let text = sanitize_html(&payload.comment);
    if text.trim().is_empty() {
        // Nothing survived sanitization: treat as "no comment".
        return Redirect::to(&format!("/post/{post_id}")).into_response();
    }

    match state.repo.add_comment(post_id, user.id, text).await {
        Ok(_) => Redirect::to(&format!("/post/{post_id}")).into_response(),
        Err(e) => {
            tracing::error!("add_comment error: {:?}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// about
///
/// [Public Route] Static page payload.
#[utoipa::path(
    get,
    path = "/about",
    responses((status = 200, description = "About page", body = PageView))
)]
pub async fn about() -> Json<PageView> {
    Json(PageView {
        page: "about".to_string(),
    })
}

/// contact
///
/// [Public Route] Static page payload.
#[utoipa::path(
    get,
    path = "/contact",
    responses((status = 200, description = "Contact page", body = PageView))
)]
pub async fn contact() -> Json<PageView> {
    Json(PageView {
        page: "contact".to_string(),
    })
}

// --- Authenticated Handlers ---

/// get_me
///
/// [Authenticated Route] The authenticated user's own profile.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Profile", body = UserProfile))
)]
pub async fn get_me(
    AuthUser {
        id,
        email,
        name,
        role,
    }: AuthUser,
) -> Json<UserProfile> {
    Json(UserProfile {
        id,
        email,
        name,
        role,
    })
}

// --- Admin Handlers ---
// The admin gate middleware runs before every handler below; by the time one
// executes, the principal is an authenticated administrator.

/// new_post_form
///
/// [Admin Route] The empty post form payload.
#[utoipa::path(
    get,
    path = "/new-post",
    responses((status = 200, description = "Post form", body = PostFormPage))
)]
pub async fn new_post_form() -> Json<PostFormPage> {
    Json(PostFormPage {
        headline: NEW_POST_HEADLINE.to_string(),
        form: PostForm::default(),
        errors: vec![],
    })
}

/// create_post
///
/// [Admin Route] Creates a post authored by the requesting administrator. The
/// display date is captured here, once, as a formatted string. A duplicate
/// title is surfaced as a field error on the re-rendered form, 409.
#[utoipa::path(
    post,
    path = "/new-post",
    request_body = PostForm,
    responses(
        (status = 303, description = "Created"),
        (status = 409, description = "Title already exists", body = PostFormPage),
        (status = 422, description = "Validation errors", body = PostFormPage)
    )
)]
pub async fn create_post(
    AuthUser { id: author_id, .. }: AuthUser,
    State(state): State<AppState>,
    Form(form): Form<PostForm>,
) -> Response {
    let errors = form.validate();
    if !errors.is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(PostFormPage {
                headline: NEW_POST_HEADLINE.to_string(),
                form,
                errors,
            }),
        )
            .into_response();
    }

    let date = Utc::now().format("%B %d, %Y").to_string();

    match state.repo.create_post(form.clone(), author_id, date).await {
        Ok(_) => Redirect::to("/").into_response(),
        Err(RepoError::Duplicate(field)) => (
            StatusCode::CONFLICT,
            Json(PostFormPage {
                headline: NEW_POST_HEADLINE.to_string(),
                form,
                errors: vec![FieldError {
                    field: field.to_string(),
                    message: "Title already exists".to_string(),
                }],
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("create_post error: {:?}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// edit_post_form
///
/// [Admin Route] The post form payload pre-filled from the existing post.
#[utoipa::path(
    get,
    path = "/edit/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Pre-filled form", body = PostFormPage),
        (status = 404, description = "No such post")
    )
)]
pub async fn edit_post_form(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<Json<PostFormPage>, StatusCode> {
    match state.repo.get_post(post_id).await {
        Some(post) => Ok(Json(PostFormPage {
            headline: EDIT_POST_HEADLINE.to_string(),
            form: PostForm {
                title: post.title,
                subtitle: post.subtitle,
                body: post.body,
                img_url: post.img_url,
            },
            errors: vec![],
        })),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// edit_post
///
/// [Admin Route] Rewrites the editable fields of a post; author and creation
/// date are immutable. 404 for an id that matches nothing, 409 when the new
/// title collides with another post.
#[utoipa::path(
    post,
    path = "/edit/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    request_body = PostForm,
    responses(
        (status = 303, description = "Updated"),
        (status = 404, description = "No such post"),
        (status = 409, description = "Title already exists", body = PostFormPage),
        (status = 422, description = "Validation errors", body = PostFormPage)
    )
)]
pub async fn edit_post(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Form(form): Form<PostForm>,
) -> Response {
    let errors = form.validate();
    if !errors.is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(PostFormPage {
                headline: EDIT_POST_HEADLINE.to_string(),
                form,
                errors,
            }),
        )
            .into_response();
    }

    match state.repo.update_post(post_id, form.clone()).await {
        Ok(Some(post)) => Redirect::to(&format!("/post/{}", post.id)).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(RepoError::Duplicate(field)) => (
            StatusCode::CONFLICT,
            Json(PostFormPage {
                headline: EDIT_POST_HEADLINE.to_string(),
                form,
                errors: vec![FieldError {
                    field: field.to_string(),
                    message: "Title already exists".to_string(),
                }],
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("edit_post error: {:?}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// delete_post_confirm
///
/// [Admin Route] The confirmation payload for a pending deletion. Reading it
/// mutates nothing; the delete itself only happens on the POST below.
#[utoipa::path(
    get,
    path = "/delete/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Confirmation payload", body = DeleteConfirmation),
        (status = 404, description = "No such post")
    )
)]
pub async fn delete_post_confirm(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<Json<DeleteConfirmation>, StatusCode> {
    match state.repo.get_post(post_id).await {
        Some(post) => Ok(Json(DeleteConfirmation { post })),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// delete_post
///
/// [Admin Route] Deletes a post and its comments. 404 when the id matched
/// nothing.
#[utoipa::path(
    post,
    path = "/delete/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 303, description = "Deleted"),
        (status = 404, description = "No such post")
    )
)]
pub async fn delete_post(State(state): State<AppState>, Path(post_id): Path<i64>) -> Response {
    match state.repo.delete_post(post_id).await {
        Ok(true) => Redirect::to("/").into_response(),
        Ok(false) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            tracing::error!("delete_post error: {:?}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
