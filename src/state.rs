use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::{
    auth::{
        jwt::JwtKeys,
        repo::{PgUserRepo, UserRepo},
    },
    comments::repo::{CommentRepo, PgCommentRepo},
    config::AppConfig,
    mail::{DisabledMailer, Mailer, SmtpMailer},
    memory::{MemoryCommentRepo, MemoryPostRepo, MemoryScoreRepo, MemoryUserRepo},
    posts::repo::{PgPostRepo, PostRepo},
    scores::repo::{PgScoreRepo, ScoreRepo},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub keys: JwtKeys,
    pub users: Arc<dyn UserRepo>,
    pub posts: Arc<dyn PostRepo>,
    pub comments: Arc<dyn CommentRepo>,
    pub scores: Arc<dyn ScoreRepo>,
    pub mailer: Arc<dyn Mailer>,
}

/// The four stores, always from the same backend.
pub struct Repos {
    pub users: Arc<dyn UserRepo>,
    pub posts: Arc<dyn PostRepo>,
    pub comments: Arc<dyn CommentRepo>,
    pub scores: Arc<dyn ScoreRepo>,
}

impl Repos {
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(MemoryUserRepo::default()),
            posts: Arc::new(MemoryPostRepo::default()),
            comments: Arc::new(MemoryCommentRepo::default()),
            scores: Arc::new(MemoryScoreRepo::default()),
        }
    }

    async fn postgres(database_url: &str) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        sqlx::migrate!("./migrations").run(&db).await?;
        info!("connected to postgres, migrations applied");

        Ok(Self {
            users: Arc::new(PgUserRepo::new(db.clone())),
            posts: Arc::new(PgPostRepo::new(db.clone())),
            comments: Arc::new(PgCommentRepo::new(db.clone())),
            scores: Arc::new(PgScoreRepo::new(db)),
        })
    }
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let repos = match config.database_url.as_deref() {
            Some(url) => Repos::postgres(url).await?,
            None => {
                warn!("DATABASE_URL not set; using the in-memory store, data is lost on restart");
                Repos::in_memory()
            }
        };

        let mailer: Arc<dyn Mailer> = match &config.smtp {
            Some(smtp) => Arc::new(SmtpMailer::new(smtp)?),
            None => {
                warn!("SMTP not configured; password reset emails will fail");
                Arc::new(DisabledMailer)
            }
        };

        if config.admin.password.is_none() {
            warn!("ADMIN_PASSWORD not set; admin login is disabled");
        }

        Ok(Self::from_parts(config, repos, mailer))
    }

    pub fn from_parts(config: Arc<AppConfig>, repos: Repos, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            keys: JwtKeys::from_config(&config.jwt),
            config,
            users: repos.users,
            posts: repos.posts,
            comments: repos.comments,
            scores: repos.scores,
            mailer,
        }
    }

    /// In-memory state with a known admin password (`admin-pass`).
    #[cfg(test)]
    pub fn fake(mailer: Arc<dyn Mailer>) -> Self {
        use crate::config::{AdminConfig, JwtConfig};

        let config = Arc::new(AppConfig {
            database_url: None,
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test".into(),
                audience: "test".into(),
                ttl_minutes: 5,
            },
            admin: AdminConfig {
                userid: "admin".into(),
                password: Some("admin-pass".into()),
                email: "admin@system.local".into(),
            },
            smtp: None,
        });

        Self::from_parts(config, Repos::in_memory(), mailer)
    }
}
