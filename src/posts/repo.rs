use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{NewPost, Post};

#[async_trait]
pub trait PostRepo: Send + Sync {
    /// Newest first.
    async fn list(&self) -> anyhow::Result<Vec<Post>>;
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Post>>;
    /// Bumps the view counter and returns the updated post.
    async fn record_view(&self, id: Uuid) -> anyhow::Result<Option<Post>>;
    async fn create(&self, post: NewPost) -> anyhow::Result<Post>;
    async fn update(&self, id: Uuid, title: &str, content: &str) -> anyhow::Result<Option<Post>>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}

const POST_COLUMNS: &str =
    "id, title, author, content, category, thumbnail, webgl_path, views, created_at";

pub struct PgPostRepo {
    db: PgPool,
}

impl PgPostRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PostRepo for PgPostRepo {
    async fn list(&self) -> anyhow::Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC"
        ))
        .fetch_all(&self.db)
        .await
        .context("list posts")?;
        Ok(rows)
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Post>> {
        let row = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("get post")?;
        Ok(row)
    }

    async fn record_view(&self, id: Uuid) -> anyhow::Result<Option<Post>> {
        let row = sqlx::query_as::<_, Post>(&format!(
            "UPDATE posts SET views = views + 1 WHERE id = $1 RETURNING {POST_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("record post view")?;
        Ok(row)
    }

    async fn create(&self, post: NewPost) -> anyhow::Result<Post> {
        let row = sqlx::query_as::<_, Post>(&format!(
            r#"
            INSERT INTO posts (id, title, author, content, category, thumbnail, webgl_path)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&post.title)
        .bind(&post.author)
        .bind(&post.content)
        .bind(post.category.as_str())
        .bind(&post.thumbnail)
        .bind(&post.webgl_path)
        .fetch_one(&self.db)
        .await
        .context("insert post")?;
        Ok(row)
    }

    async fn update(&self, id: Uuid, title: &str, content: &str) -> anyhow::Result<Option<Post>> {
        let row = sqlx::query_as::<_, Post>(&format!(
            "UPDATE posts SET title = $2, content = $3 WHERE id = $1 RETURNING {POST_COLUMNS}"
        ))
        .bind(id)
        .bind(title)
        .bind(content)
        .fetch_optional(&self.db)
        .await
        .context("update post")?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete post")?;
        Ok(res.rows_affected() > 0)
    }
}
