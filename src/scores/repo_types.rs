use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::guard::Owned;

#[derive(Debug, Clone, FromRow)]
pub struct Score {
    pub id: Uuid,
    pub game_name: String,
    pub score: i64,
    pub username: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewScore {
    pub game_name: String,
    pub score: i64,
    pub username: String,
}

impl Owned for NewScore {
    fn owner(&self) -> &str {
        &self.username
    }
}
