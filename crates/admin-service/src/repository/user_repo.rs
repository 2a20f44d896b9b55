//! 用户与文章仓储（PostgreSQL）

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::{PostRepositoryTrait, UserRepositoryTrait};
use crate::error::{AdminError, Result};
use crate::models::{NewPost, NewUser, Post, PostFilter, User, UserChanges};

const USER_COLUMNS: &str = "id, email, name, created_at, updated_at";
const POST_COLUMNS: &str = "id, title, content, published, author_id, created_at, updated_at";

/// 用户仓储
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// 唯一约束冲突转换为业务错误，其余保持数据库错误
pub(crate) fn map_unique_violation(err: sqlx::Error, conflict: AdminError) -> AdminError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => conflict,
        _ => AdminError::Database(err),
    }
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    async fn list_users(&self, offset: i64, limit: i64) -> Result<(Vec<User>, i64)> {
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY id DESC LIMIT $1 OFFSET $2",
            USER_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((users, total.0))
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create_user(&self, user: &NewUser) -> Result<User> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, name) VALUES ($1, $2) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&user.email)
        .bind(&user.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, AdminError::EmailTaken(user.email.clone())))
    }

    async fn update_user(&self, id: i64, changes: &UserChanges) -> Result<Option<User>> {
        let email_conflict = AdminError::EmailTaken(changes.email.clone().unwrap_or_default());

        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                name = COALESCE($3, name),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(&changes.email)
        .bind(&changes.name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, email_conflict))
    }
}

/// 文章仓储
pub struct PostRepository {
    pool: PgPool,
}

impl PostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepositoryTrait for PostRepository {
    async fn list_posts(
        &self,
        filter: &PostFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Post>, i64)> {
        let total: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM posts
            WHERE ($1::bigint IS NULL OR author_id = $1)
              AND ($2::boolean IS NULL OR published = $2)
            "#,
        )
        .bind(filter.author_id)
        .bind(filter.published)
        .fetch_one(&self.pool)
        .await?;

        let posts = sqlx::query_as::<_, Post>(&format!(
            r#"
            SELECT {}
            FROM posts
            WHERE ($1::bigint IS NULL OR author_id = $1)
              AND ($2::boolean IS NULL OR published = $2)
            ORDER BY id DESC
            LIMIT $3 OFFSET $4
            "#,
            POST_COLUMNS
        ))
        .bind(filter.author_id)
        .bind(filter.published)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((posts, total.0))
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "SELECT {} FROM posts WHERE id = $1",
            POST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn create_post(&self, post: &NewPost) -> Result<Post> {
        let created = sqlx::query_as::<_, Post>(&format!(
            r#"
            INSERT INTO posts (title, content, published, author_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            POST_COLUMNS
        ))
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.published)
        .bind(post.author_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }
}
