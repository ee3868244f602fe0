use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Comment, NewComment};

#[async_trait]
pub trait CommentRepo: Send + Sync {
    /// Oldest first.
    async fn list_for_post(&self, post_id: Uuid) -> anyhow::Result<Vec<Comment>>;
    async fn count_for_post(&self, post_id: Uuid) -> anyhow::Result<i64>;
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Comment>>;
    async fn create(&self, comment: NewComment) -> anyhow::Result<Comment>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
    /// Returns how many comments were removed.
    async fn delete_for_post(&self, post_id: Uuid) -> anyhow::Result<u64>;
}

const COMMENT_COLUMNS: &str = "id, post_id, author, content, created_at";

pub struct PgCommentRepo {
    db: PgPool,
}

impl PgCommentRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CommentRepo for PgCommentRepo {
    async fn list_for_post(&self, post_id: Uuid) -> anyhow::Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE post_id = $1 ORDER BY created_at ASC"
        ))
        .bind(post_id)
        .fetch_all(&self.db)
        .await
        .context("list comments")?;
        Ok(rows)
    }

    async fn count_for_post(&self, post_id: Uuid) -> anyhow::Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM comments WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(&self.db)
            .await
            .context("count comments")?;
        Ok(count)
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Comment>> {
        let row = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("get comment")?;
        Ok(row)
    }

    async fn create(&self, comment: NewComment) -> anyhow::Result<Comment> {
        let row = sqlx::query_as::<_, Comment>(&format!(
            r#"
            INSERT INTO comments (id, post_id, author, content)
            VALUES ($1, $2, $3, $4)
            RETURNING {COMMENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(comment.post_id)
        .bind(&comment.author)
        .bind(&comment.content)
        .fetch_one(&self.db)
        .await
        .context("insert comment")?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete comment")?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_for_post(&self, post_id: Uuid) -> anyhow::Result<u64> {
        let res = sqlx::query("DELETE FROM comments WHERE post_id = $1")
            .bind(post_id)
            .execute(&self.db)
            .await
            .context("delete comments for post")?;
        Ok(res.rows_affected())
    }
}
