use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::Score;

pub const DEFAULT_LEADERBOARD_LIMIT: i64 = 10;
pub const MAX_LEADERBOARD_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct SaveScoreRequest {
    pub game_name: String,
    pub score: i64,
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveScoreResponse {
    pub message: String,
    pub score_id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<i64>,
}

impl LeaderboardQuery {
    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
            .clamp(1, MAX_LEADERBOARD_LIMIT)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub id: Uuid,
    pub game_name: String,
    pub score: i64,
    pub username: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}

impl From<Score> for ScoreResponse {
    fn from(s: Score) -> Self {
        Self {
            id: s.id,
            game_name: s.game_name,
            score: s.score,
            username: s.username,
            date: s.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_and_clamps() {
        assert_eq!(LeaderboardQuery::default().effective_limit(), 10);
        assert_eq!(LeaderboardQuery { limit: Some(5) }.effective_limit(), 5);
        assert_eq!(LeaderboardQuery { limit: Some(0) }.effective_limit(), 1);
        assert_eq!(LeaderboardQuery { limit: Some(-3) }.effective_limit(), 1);
        assert_eq!(LeaderboardQuery { limit: Some(5000) }.effective_limit(), 100);
    }
}
