use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use inkpost::{
    AppConfig, AppState, create_router,
    auth::Claims,
    models::{Comment, NewUser, Post, PostForm, User},
    repository::{RepoError, Repository, RepositoryState},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::SystemTime,
};
use tower::ServiceExt;

// --- Mock Repository ---

// Router-level tests drive the full middleware stack (request ids, the auth
// extractor, the admin gate) against this mock, with no database involved.
#[derive(Default)]
struct MockRepo {
    user_to_return: Option<User>,
    post_to_return: Option<Post>,
    posts_to_return: Vec<Post>,
    create_post_calls: AtomicUsize,
    created_comments: Mutex<Vec<String>>,
}

#[async_trait]
impl Repository for MockRepo {
    async fn get_user(&self, _id: i64) -> Option<User> {
        self.user_to_return.clone()
    }
    async fn get_user_by_email(&self, _email: &str) -> Option<User> {
        self.user_to_return.clone()
    }
    async fn create_user(&self, _new: NewUser) -> Result<User, RepoError> {
        Ok(User::default())
    }
    async fn get_posts(&self) -> Vec<Post> {
        self.posts_to_return.clone()
    }
    async fn get_post(&self, _id: i64) -> Option<Post> {
        self.post_to_return.clone()
    }
    async fn create_post(
        &self,
        _form: PostForm,
        _author_id: i64,
        _date: String,
    ) -> Result<Post, RepoError> {
        self.create_post_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Post::default())
    }
    async fn update_post(&self, _id: i64, _form: PostForm) -> Result<Option<Post>, RepoError> {
        Ok(None)
    }
    async fn delete_post(&self, _id: i64) -> Result<bool, RepoError> {
        Ok(true)
    }
    async fn add_comment(
        &self,
        post_id: i64,
        author_id: i64,
        text: String,
    ) -> Result<Comment, RepoError> {
        self.created_comments.lock().unwrap().push(text.clone());
        Ok(Comment {
            id: 1,
            post_id,
            author_id,
            text,
            author_name: None,
        })
    }
    async fn get_comments(&self, _post_id: i64) -> Vec<Comment> {
        vec![]
    }
}

// --- Helpers ---

fn user_with_role(id: i64, role: &str) -> User {
    User {
        id,
        email: format!("user{id}@example.com"),
        name: "Someone".to_string(),
        password_hash: "$argon2id$stub".to_string(),
        role: role.to_string(),
    }
}

fn sample_post(id: i64) -> Post {
    Post {
        id,
        author_id: 1,
        title: "A Post".to_string(),
        subtitle: "Sub".to_string(),
        date: "August 07, 2026".to_string(),
        body: "Body".to_string(),
        img_url: "https://example.com/c.jpg".to_string(),
        author_name: Some("Admin".to_string()),
    }
}

// Signs a token with the AppConfig::default() test secret used by the router.
fn session_token(user_id: i64) -> String {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;
    let claims = Claims {
        sub: user_id,
        iat: now,
        exp: now + 3600,
    };
    let secret = AppConfig::default().session_secret;
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

fn spawn_app(repo: MockRepo) -> (axum::Router, Arc<MockRepo>) {
    let control = Arc::new(repo);
    let mut config = AppConfig::default();
    // Production mode keeps the x-user-id dev bypass out of these tests.
    config.env = inkpost::config::Env::Production;
    let state = AppState {
        repo: control.clone() as RepositoryState,
        config,
    };
    (create_router(state), control)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn get_with_session(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::COOKIE, format!("session={token}"))
        .body(Body::empty())
        .unwrap()
}

fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::HOST, "myapp.example")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_form_with_session(uri: &str, body: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::HOST, "myapp.example")
        .header(header::COOKIE, format!("session={token}"))
        .body(Body::from(body.to_string()))
        .unwrap()
}

const VALID_POST_FORM: &str =
    "title=T&subtitle=S&body=B&img_url=https%3A%2F%2Fexample.com%2Fimg.jpg";

// --- Tests ---

#[tokio::test]
async fn test_health_check() {
    let (app, _) = spawn_app(MockRepo::default());
    let response = app.oneshot(get("/health")).await.unwrap();
    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_index_lists_posts() {
    let (app, _) = spawn_app(MockRepo {
        posts_to_return: vec![sample_post(1), sample_post(2)],
        ..MockRepo::default()
    });

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let posts: Vec<Post> = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(posts.len(), 2);
}

#[tokio::test]
async fn test_missing_post_is_404() {
    let (app, _) = spawn_app(MockRepo::default());
    let response = app.oneshot(get("/post/999")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// --- The admin gate, end to end ---

#[tokio::test]
async fn test_anonymous_new_post_is_forbidden_and_creates_nothing() {
    let (app, control) = spawn_app(MockRepo::default());

    let response = app
        .oneshot(post_form("/new-post", VALID_POST_FORM))
        .await
        .unwrap();

    // Anonymous callers are denied outright with 403; the handler (and with it
    // the persistence write) never ran.
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(control.create_post_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_non_admin_is_forbidden_on_every_admin_route() {
    let token = session_token(2);
    let repo = MockRepo {
        user_to_return: Some(user_with_role(2, "user")),
        post_to_return: Some(sample_post(1)),
        ..MockRepo::default()
    };
    let (app, control) = spawn_app(repo);

    for request in [
        get_with_session("/new-post", &token),
        post_form_with_session("/new-post", VALID_POST_FORM, &token),
        get_with_session("/edit/1", &token),
        post_form_with_session("/edit/1", VALID_POST_FORM, &token),
        get_with_session("/delete/1", &token),
        post_form_with_session("/delete/1", "", &token),
    ] {
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
    assert_eq!(control.create_post_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_admin_passes_the_gate() {
    let token = session_token(1);
    let repo = MockRepo {
        user_to_return: Some(user_with_role(1, "admin")),
        ..MockRepo::default()
    };
    let (app, control) = spawn_app(repo);

    let response = app
        .clone()
        .oneshot(get_with_session("/new-post", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(post_form_with_session("/new-post", VALID_POST_FORM, &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(control.create_post_calls.load(Ordering::SeqCst), 1);
}

// --- Authenticated routes ---

#[tokio::test]
async fn test_me_requires_authentication() {
    let (app, _) = spawn_app(MockRepo::default());
    let response = app.oneshot(get("/me")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_returns_profile_for_session() {
    let token = session_token(2);
    let (app, _) = spawn_app(MockRepo {
        user_to_return: Some(user_with_role(2, "user")),
        ..MockRepo::default()
    });

    let response = app.oneshot(get_with_session("/me", &token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// --- The login flow through the full stack ---

#[tokio::test]
async fn test_login_flow_issues_cookie() {
    let hash = inkpost::credentials::hash_password(
        "right-password",
        &inkpost::credentials::HashingCost {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        },
    )
    .unwrap();
    let (app, _) = spawn_app(MockRepo {
        user_to_return: Some(User {
            password_hash: hash,
            ..user_with_role(2, "user")
        }),
        ..MockRepo::default()
    });

    let response = app
        .oneshot(post_form(
            "/login",
            "email=user2%40example.com&password=right-password",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .expect("login must set the session cookie");
    assert!(cookie.starts_with("session="));
}

#[tokio::test]
async fn test_login_rejects_cross_host_next_through_router() {
    let hash = inkpost::credentials::hash_password(
        "right-password",
        &inkpost::credentials::HashingCost {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        },
    )
    .unwrap();
    let (app, _) = spawn_app(MockRepo {
        user_to_return: Some(User {
            password_hash: hash,
            ..user_with_role(2, "user")
        }),
        ..MockRepo::default()
    });

    let response = app
        .oneshot(post_form(
            "/login?next=https%3A%2F%2Fevil.example%2Fphish",
            "email=user2%40example.com&password=right-password",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

// --- Comment flow through the router ---

#[tokio::test]
async fn test_anonymous_comment_is_redirected_to_login() {
    let (app, control) = spawn_app(MockRepo {
        post_to_return: Some(sample_post(3)),
        ..MockRepo::default()
    });

    let response = app
        .oneshot(post_form("/post/3", "comment=hello"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    assert!(location.starts_with("/login?error="));
    assert!(control.created_comments.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_authenticated_comment_is_sanitized_and_stored() {
    let token = session_token(2);
    let (app, control) = spawn_app(MockRepo {
        user_to_return: Some(user_with_role(2, "user")),
        post_to_return: Some(sample_post(3)),
        ..MockRepo::default()
    });

    let response = app
        .oneshot(post_form_with_session(
            "/post/3",
            "comment=%3Cscript%3Ealert(1)%3C%2Fscript%3Ehello",
            &token,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let recorded = control.created_comments.lock().unwrap();
    assert_eq!(recorded.as_slice(), ["hello"]);
}
