use crate::models::{Comment, NewUser, Post, PostForm, User};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;

/// RepoError
///
/// The persistence failure taxonomy the handlers dispatch on. Unique-constraint
/// violations are the one class that must stay distinguishable from generic
/// database failures: they become user-facing "already exists" conditions
/// rather than server errors.
#[derive(Debug, Error)]
pub enum RepoError {
    /// A unique constraint rejected the write; the payload names the field.
    #[error("duplicate value for {0}")]
    Duplicate(&'static str),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Maps a write failure, classifying unique violations under the given field.
fn classify_unique(field: &'static str, err: sqlx::Error) -> RepoError {
    match &err {
        sqlx::Error::Database(db)
            if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation) =>
        {
            RepoError::Duplicate(field)
        }
        _ => RepoError::Database(err),
    }
}

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations. This is the core
/// of the Repository Abstraction pattern, allowing the handlers to interact with
/// the data layer without knowing the specific implementation (Postgres, Mock, etc.).
///
/// **Send + Sync + async_trait** are required to make the trait object (`Arc<dyn Repository>`)
/// safely shareable and usable across Axum's asynchronous task boundaries.
///
/// Reads return `Option`/`Vec`; absence is an explicit value every handler must
/// match on, never an assumed-present row. Writes return `Result` so constraint
/// violations stay observable.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users / Auth ---
    async fn get_user(&self, id: i64) -> Option<User>;
    async fn get_user_by_email(&self, email: &str) -> Option<User>;
    // The insert decides the role: the first row becomes the administrator.
    async fn create_user(&self, new: NewUser) -> Result<User, RepoError>;

    // --- Posts ---
    async fn get_posts(&self) -> Vec<Post>;
    async fn get_post(&self, id: i64) -> Option<Post>;
    async fn create_post(
        &self,
        form: PostForm,
        author_id: i64,
        date: String,
    ) -> Result<Post, RepoError>;
    // Returns Ok(None) when no such post exists.
    async fn update_post(&self, id: i64, form: PostForm) -> Result<Option<Post>, RepoError>;
    // Deletes the post and its comments in one transaction; true if a post row went away.
    async fn delete_post(&self, id: i64) -> Result<bool, RepoError>;

    // --- Comments ---
    // `text` is sanitized by the caller before it reaches this boundary.
    async fn add_comment(
        &self,
        post_id: i64,
        author_id: i64,
        text: String,
    ) -> Result<Comment, RepoError>;
    async fn get_comments(&self, post_id: i64) -> Vec<Comment>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by the PostgreSQL database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    /// get_user
    ///
    /// Retrieves the full identity record (including the password hash and role)
    /// needed by authentication and authorization.
    async fn get_user(&self, id: i64) -> Option<User> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, name, password_hash, role FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_user error: {:?}", e);
            None
        })
    }

    /// get_user_by_email
    ///
    /// Login-time lookup. Email is unique, so this resolves at most one row.
    async fn get_user_by_email(&self, email: &str) -> Option<User> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, name, password_hash, role FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_user_by_email error: {:?}", e);
            None
        })
    }

    /// create_user
    ///
    /// Inserts a registration. Role assignment happens inside the statement so
    /// it is atomic with the insert: the first account in the table becomes the
    /// administrator, every later one a regular user. A duplicate email surfaces
    /// as `RepoError::Duplicate("email")` via the unique constraint.
    async fn create_user(&self, new: NewUser) -> Result<User, RepoError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, password_hash, role)
            VALUES (
                $1, $2, $3,
                CASE WHEN (SELECT COUNT(*) FROM users) = 0 THEN 'admin' ELSE 'user' END
            )
            RETURNING id, email, name, password_hash, role
            "#,
        )
        .bind(&new.email)
        .bind(&new.name)
        .bind(&new.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify_unique("email", e))
    }

    /// get_posts
    ///
    /// Retrieves every post with its author's display name, in insertion order.
    async fn get_posts(&self) -> Vec<Post> {
        match sqlx::query_as::<_, Post>(
            r#"
            SELECT p.id, p.author_id, p.title, p.subtitle, p.date, p.body, p.img_url,
                   u.name AS author_name
            FROM blog_posts p
            JOIN users u ON p.author_id = u.id
            ORDER BY p.id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        {
            Ok(posts) => posts,
            Err(e) => {
                tracing::error!("get_posts error: {:?}", e);
                vec![]
            }
        }
    }

    /// get_post
    ///
    /// Single-post retrieval by id, author name included.
    async fn get_post(&self, id: i64) -> Option<Post> {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT p.id, p.author_id, p.title, p.subtitle, p.date, p.body, p.img_url,
                   u.name AS author_name
            FROM blog_posts p
            JOIN users u ON p.author_id = u.id
            WHERE p.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_post error: {:?}", e);
            None
        })
    }

    /// create_post
    ///
    /// Inserts a new post and immediately joins with `users` to return the
    /// enriched row including the author's display name. A duplicate title
    /// surfaces as `RepoError::Duplicate("title")`.
    async fn create_post(
        &self,
        form: PostForm,
        author_id: i64,
        date: String,
    ) -> Result<Post, RepoError> {
        // CTE performs the insert and the join in one round trip.
        sqlx::query_as::<_, Post>(
            r#"
            WITH inserted AS (
                INSERT INTO blog_posts (author_id, title, subtitle, date, body, img_url)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id, author_id, title, subtitle, date, body, img_url
            )
            SELECT i.id, i.author_id, i.title, i.subtitle, i.date, i.body, i.img_url,
                   u.name AS author_name
            FROM inserted i JOIN users u ON i.author_id = u.id
            "#,
        )
        .bind(author_id)
        .bind(&form.title)
        .bind(&form.subtitle)
        .bind(&date)
        .bind(&form.body)
        .bind(&form.img_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| classify_unique("title", e))
    }

    /// update_post
    ///
    /// Rewrites the editable fields of an existing post. The creation date and
    /// author are immutable. `Ok(None)` when the id matched nothing.
    async fn update_post(&self, id: i64, form: PostForm) -> Result<Option<Post>, RepoError> {
        sqlx::query_as::<_, Post>(
            r#"
            WITH updated AS (
                UPDATE blog_posts
                SET title = $2, subtitle = $3, body = $4, img_url = $5
                WHERE id = $1
                RETURNING id, author_id, title, subtitle, date, body, img_url
            )
            SELECT up.id, up.author_id, up.title, up.subtitle, up.date, up.body, up.img_url,
                   u.name AS author_name
            FROM updated up JOIN users u ON up.author_id = u.id
            "#,
        )
        .bind(id)
        .bind(&form.title)
        .bind(&form.subtitle)
        .bind(&form.body)
        .bind(&form.img_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| classify_unique("title", e))
    }

    /// delete_post
    ///
    /// Removes a post together with its comments. The cascade is requested
    /// explicitly inside one transaction rather than delegated to the schema,
    /// so a partial delete can never leave orphaned comment rows visible.
    async fn delete_post(&self, id: i64) -> Result<bool, RepoError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM comments WHERE post_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM blog_posts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    /// add_comment
    ///
    /// Inserts a new comment and immediately joins with `users` to return the
    /// enriched `Comment` model, including the author's display name.
    async fn add_comment(
        &self,
        post_id: i64,
        author_id: i64,
        text: String,
    ) -> Result<Comment, RepoError> {
        sqlx::query_as::<_, Comment>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (post_id, author_id, text)
                VALUES ($1, $2, $3)
                RETURNING id, post_id, author_id, text
            )
            SELECT i.id, i.post_id, i.author_id, i.text, u.name AS author_name
            FROM inserted i JOIN users u ON i.author_id = u.id
            "#,
        )
        .bind(post_id)
        .bind(author_id)
        .bind(&text)
        .fetch_one(&self.pool)
        .await
        .map_err(RepoError::from)
    }

    /// get_comments
    ///
    /// Retrieves all comments for a post in insertion order, each carrying its
    /// author's display name for the view layer.
    async fn get_comments(&self, post_id: i64) -> Vec<Comment> {
        sqlx::query_as::<_, Comment>(
            r#"
            SELECT c.id, c.post_id, c.author_id, c.text, u.name AS author_name
            FROM comments c
            JOIN users u ON c.author_id = u.id
            WHERE c.post_id = $1
            ORDER BY c.id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_default()
    }
}
