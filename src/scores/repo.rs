use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{NewScore, Score};

#[async_trait]
pub trait ScoreRepo: Send + Sync {
    async fn insert(&self, score: NewScore) -> anyhow::Result<Score>;
    /// Highest first; ties go to the earlier entry.
    async fn top_for_game(&self, game_name: &str, limit: i64) -> anyhow::Result<Vec<Score>>;
    /// Newest first.
    async fn for_user(&self, username: &str) -> anyhow::Result<Vec<Score>>;
}

const SCORE_COLUMNS: &str = "id, game_name, score, username, created_at";

pub struct PgScoreRepo {
    db: PgPool,
}

impl PgScoreRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ScoreRepo for PgScoreRepo {
    async fn insert(&self, score: NewScore) -> anyhow::Result<Score> {
        let row = sqlx::query_as::<_, Score>(&format!(
            r#"
            INSERT INTO scores (id, game_name, score, username)
            VALUES ($1, $2, $3, $4)
            RETURNING {SCORE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&score.game_name)
        .bind(score.score)
        .bind(&score.username)
        .fetch_one(&self.db)
        .await
        .context("insert score")?;
        Ok(row)
    }

    async fn top_for_game(&self, game_name: &str, limit: i64) -> anyhow::Result<Vec<Score>> {
        let rows = sqlx::query_as::<_, Score>(&format!(
            r#"
            SELECT {SCORE_COLUMNS} FROM scores
            WHERE game_name = $1
            ORDER BY score DESC, created_at ASC
            LIMIT $2
            "#
        ))
        .bind(game_name)
        .bind(limit)
        .fetch_all(&self.db)
        .await
        .context("leaderboard")?;
        Ok(rows)
    }

    async fn for_user(&self, username: &str) -> anyhow::Result<Vec<Score>> {
        let rows = sqlx::query_as::<_, Score>(&format!(
            "SELECT {SCORE_COLUMNS} FROM scores WHERE username = $1 ORDER BY created_at DESC"
        ))
        .bind(username)
        .fetch_all(&self.db)
        .await
        .context("user scores")?;
        Ok(rows)
    }
}
