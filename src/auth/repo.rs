use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::auth::repo_types::{NewUser, StoreError, User, DEFAULT_PROFILE_IMAGE};

/// Credential store contract.
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_userid(&self, userid: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_email_and_birthdate(
        &self,
        email: &str,
        birthdate: &str,
    ) -> anyhow::Result<Option<User>>;
    /// Exact match on all three fields.
    async fn find_for_recovery(
        &self,
        userid: &str,
        email: &str,
        birthdate: &str,
    ) -> anyhow::Result<Option<User>>;
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;
    /// Returns false when no such user exists.
    async fn update_password(
        &self,
        userid: &str,
        password_hash: &str,
        is_temporary: bool,
    ) -> anyhow::Result<bool>;
    /// Returns false when no such user exists.
    async fn update_profile_image(&self, userid: &str, profile_image: &str) -> anyhow::Result<bool>;
}

const USER_COLUMNS: &str =
    "userid, email, password_hash, gender, birthdate, profile_image, is_temporary_password, created_at";

pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_userid(&self, userid: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE userid = $1"
        ))
        .bind(userid)
        .fetch_optional(&self.db)
        .await
        .context("find user by userid")?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_by_email_and_birthdate(
        &self,
        email: &str,
        birthdate: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND birthdate = $2"
        ))
        .bind(email)
        .bind(birthdate)
        .fetch_optional(&self.db)
        .await
        .context("find user by email and birthdate")?;
        Ok(user)
    }

    async fn find_for_recovery(
        &self,
        userid: &str,
        email: &str,
        birthdate: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE userid = $1 AND email = $2 AND birthdate = $3"
        ))
        .bind(userid)
        .bind(email)
        .bind(birthdate)
        .fetch_optional(&self.db)
        .await
        .context("find user for recovery")?;
        Ok(user)
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let res = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (userid, email, password_hash, gender, birthdate, profile_image)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.userid)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.gender)
        .bind(&user.birthdate)
        .bind(DEFAULT_PROFILE_IMAGE)
        .fetch_one(&self.db)
        .await;

        match res {
            Ok(u) => Ok(u),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                let field = match db_err.constraint() {
                    Some(c) if c.contains("email") => "Email",
                    _ => "UserID",
                };
                Err(StoreError::Duplicate(field))
            }
            Err(e) => Err(StoreError::Backend(anyhow::Error::new(e).context("insert user"))),
        }
    }

    async fn update_password(
        &self,
        userid: &str,
        password_hash: &str,
        is_temporary: bool,
    ) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE users
               SET password_hash = $2, is_temporary_password = $3
             WHERE userid = $1
            "#,
        )
        .bind(userid)
        .bind(password_hash)
        .bind(is_temporary)
        .execute(&self.db)
        .await
        .context("update password")?;
        Ok(res.rows_affected() == 1)
    }

    async fn update_profile_image(&self, userid: &str, profile_image: &str) -> anyhow::Result<bool> {
        let res = sqlx::query("UPDATE users SET profile_image = $2 WHERE userid = $1")
            .bind(userid)
            .bind(profile_image)
            .execute(&self.db)
            .await
            .context("update profile image")?;
        Ok(res.rows_affected() == 1)
    }
}
