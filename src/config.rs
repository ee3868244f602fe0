use anyhow::Context;
use serde::Deserialize;

/// One week.
pub const MAX_TOKEN_TTL_MINUTES: i64 = 7 * 24 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Reserved super-user that authenticates without a stored account.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    pub userid: String,
    /// `None` disables the bypass entirely.
    pub password: Option<String>,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub admin: AdminConfig,
    pub smtp: Option<SmtpConfig>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt = JwtConfig {
            secret: var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: var("JWT_ISSUER").unwrap_or_else(|| "gameboard".into()),
            audience: var("JWT_AUDIENCE").unwrap_or_else(|| "gameboard-users".into()),
            ttl_minutes: var("JWT_TTL_MINUTES")
                .map(|v| v.trim().parse::<i64>())
                .transpose()
                .context("JWT_TTL_MINUTES must be a whole number of minutes")?
                .unwrap_or(30),
        };
        if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&jwt.ttl_minutes) {
            anyhow::bail!("JWT_TTL_MINUTES must be between 1 and {MAX_TOKEN_TTL_MINUTES}");
        }

        let admin = AdminConfig {
            userid: var("ADMIN_USERID").unwrap_or_else(|| "admin".into()),
            password: var("ADMIN_PASSWORD"),
            email: var("ADMIN_EMAIL").unwrap_or_else(|| "admin@system.local".into()),
        };

        let smtp = match (var("SMTP_HOST"), var("SMTP_USERNAME"), var("SMTP_PASSWORD")) {
            (Some(host), Some(username), Some(password)) => Some(SmtpConfig {
                port: var("SMTP_PORT")
                    .map(|v| v.parse::<u16>())
                    .transpose()
                    .context("SMTP_PORT must be a port number")?
                    .unwrap_or(587),
                from: var("SMTP_FROM").unwrap_or_else(|| username.clone()),
                host,
                username,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            database_url: var("DATABASE_URL"),
            jwt,
            admin,
            smtp,
        })
    }
}
