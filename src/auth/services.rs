//! Account flows that sit behind the `/auth` routes.
//!
//! Handlers stay thin; everything with ordering rules (login bypass for the
//! reserved admin, the reset-then-notify sequence, change-password) lives
//! here and only talks to the [`UserRepo`] and [`Mailer`] traits.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use subtle::ConstantTimeEq;
use time::format_description::well_known::Rfc3339;
use tracing::{info, warn};

use crate::{
    auth::{
        claims::Identity,
        dto::{Profile, RegisterRequest, TokenResponse},
        jwt::JwtKeys,
        password::{generate_temporary_password, hash_password, verify_password},
        repo::UserRepo,
        repo_types::{NewUser, StoreError, User, DEFAULT_PROFILE_IMAGE},
    },
    config::AdminConfig,
    error::{AppError, AppResult},
    mail::{templates, Mailer},
};

pub const MIN_PASSWORD_LEN: usize = 8;
const MAX_USERID_LEN: usize = 32;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_new_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Constant-time over the common length; only a length mismatch exits early.
fn secrets_match(expected: &str, given: &str) -> bool {
    expected.as_bytes().ct_eq(given.as_bytes()).into()
}

fn store_error(e: StoreError) -> AppError {
    match e {
        StoreError::Duplicate(field) => AppError::Validation(format!("{field} already registered")),
        StoreError::Backend(e) => AppError::Internal(e),
    }
}

pub async fn register(
    users: &dyn UserRepo,
    admin: &AdminConfig,
    req: RegisterRequest,
) -> AppResult<User> {
    let userid = req.userid.trim().to_string();
    let email = normalize_email(&req.email);

    if userid.is_empty() || userid.chars().count() > MAX_USERID_LEN {
        return Err(AppError::Validation(format!(
            "userid must be 1 to {MAX_USERID_LEN} characters"
        )));
    }
    if userid == admin.userid {
        warn!(%userid, "attempt to register reserved userid");
        return Err(AppError::Validation("UserID already registered".into()));
    }
    if !is_valid_email(&email) {
        return Err(AppError::Validation("Invalid email".into()));
    }
    check_new_password(&req.password)?;

    if users.find_by_userid(&userid).await?.is_some() {
        return Err(AppError::Validation("UserID already registered".into()));
    }
    if users.find_by_email(&email).await?.is_some() {
        return Err(AppError::Validation("Email already registered".into()));
    }

    let password_hash = hash_password(&req.password)?;
    let user = users
        .create(NewUser {
            userid,
            email,
            password_hash,
            gender: req.gender.trim().to_string(),
            birthdate: req.birthdate.trim().to_string(),
        })
        .await
        .map_err(store_error)?;

    info!(userid = %user.userid, "user registered");
    Ok(user)
}

pub async fn login(
    users: &dyn UserRepo,
    keys: &JwtKeys,
    admin: &AdminConfig,
    userid: &str,
    password: &str,
) -> AppResult<TokenResponse> {
    // The reserved admin never touches the credential store.
    if userid == admin.userid {
        let matches = admin
            .password
            .as_deref()
            .is_some_and(|p| secrets_match(p, password));
        if !matches {
            warn!(%userid, "admin login rejected");
            return Err(AppError::InvalidCredentials);
        }
        let access_token = keys.issue(&admin.userid, true)?;
        info!(%userid, "admin logged in");
        return Ok(TokenResponse {
            access_token,
            token_type: "bearer".into(),
            userid: admin.userid.clone(),
            is_temporary_password: false,
        });
    }

    let user = match users.find_by_userid(userid).await? {
        Some(u) => u,
        None => {
            warn!(%userid, "login unknown userid");
            return Err(AppError::InvalidCredentials);
        }
    };

    if !verify_password(password, &user.password_hash) {
        warn!(%userid, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let access_token = keys.issue(&user.userid, false)?;
    info!(%userid, temporary = user.is_temporary_password, "user logged in");
    Ok(TokenResponse {
        access_token,
        token_type: "bearer".into(),
        userid: user.userid,
        is_temporary_password: user.is_temporary_password,
    })
}

pub async fn profile(
    users: &dyn UserRepo,
    admin: &AdminConfig,
    identity: &Identity,
) -> AppResult<Profile> {
    if identity.is_admin && identity.userid == admin.userid {
        return Ok(Profile {
            userid: admin.userid.clone(),
            email: admin.email.clone(),
            gender: String::new(),
            birthdate: String::new(),
            created_at: String::new(),
            profile_image: DEFAULT_PROFILE_IMAGE.into(),
            is_admin: true,
        });
    }

    let user = users
        .find_by_userid(&identity.userid)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(Profile {
        created_at: user.created_at.format(&Rfc3339).unwrap_or_default(),
        userid: user.userid,
        email: user.email,
        gender: user.gender,
        birthdate: user.birthdate,
        profile_image: user.profile_image,
        is_admin: false,
    })
}

pub async fn find_userid(users: &dyn UserRepo, email: &str, birthdate: &str) -> AppResult<String> {
    users
        .find_by_email_and_birthdate(&normalize_email(email), birthdate.trim())
        .await?
        .map(|u| u.userid)
        .ok_or_else(|| AppError::NotFound("no account matches the given details".into()))
}

pub async fn change_password(
    users: &dyn UserRepo,
    userid: &str,
    current_password: &str,
    new_password: &str,
) -> AppResult<()> {
    let user = users
        .find_by_userid(userid)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if !verify_password(current_password, &user.password_hash) {
        warn!(%userid, "change password with wrong current password");
        return Err(AppError::IncorrectCurrentPassword);
    }
    check_new_password(new_password)?;

    let password_hash = hash_password(new_password)?;
    if !users.update_password(userid, &password_hash, false).await? {
        return Err(AppError::NotFound("User not found".into()));
    }
    info!(%userid, "password changed");
    Ok(())
}

pub async fn update_profile_image(
    users: &dyn UserRepo,
    userid: &str,
    profile_image: &str,
) -> AppResult<()> {
    let profile_image = profile_image.trim();
    if profile_image.is_empty() {
        return Err(AppError::Validation("profile_image must not be empty".into()));
    }
    if !users.update_profile_image(userid, profile_image).await? {
        return Err(AppError::NotFound("User not found".into()));
    }
    info!(%userid, "profile image updated");
    Ok(())
}

// ---- password reset ----
//
// Requested -> Verified -> EmailPending -> EmailSent | EmailFailed -> Persisted
//
// Each stage consumes the previous one, and only `DeliveredCredential` can
// write to the store, so a credential that never reached the user cannot
// replace the stored hash.

/// Plaintext of a freshly generated credential. Never logged.
pub struct TemporaryPassword(String);

impl TemporaryPassword {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TemporaryPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TemporaryPassword(***)")
    }
}

#[derive(Debug)]
pub struct VerifiedAccount {
    user: User,
}

#[derive(Debug)]
pub struct PendingDelivery {
    user: User,
    credential: TemporaryPassword,
    password_hash: String,
}

#[derive(Debug)]
pub struct DeliveredCredential {
    user: User,
    password_hash: String,
}

pub async fn verify_identity(
    users: &dyn UserRepo,
    userid: &str,
    email: &str,
    birthdate: &str,
) -> AppResult<VerifiedAccount> {
    let user = users
        .find_for_recovery(userid.trim(), &normalize_email(email), birthdate.trim())
        .await?
        .ok_or_else(|| {
            warn!(%userid, "password reset: no matching account");
            AppError::NotFound("no account matches the given details".into())
        })?;
    Ok(VerifiedAccount { user })
}

impl VerifiedAccount {
    /// Hashing happens here so that nothing but the store write can fail
    /// once the mail is out.
    pub fn issue_credential(self) -> AppResult<PendingDelivery> {
        let credential = TemporaryPassword(generate_temporary_password());
        let password_hash = hash_password(credential.expose())?;
        Ok(PendingDelivery {
            user: self.user,
            credential,
            password_hash,
        })
    }
}

impl PendingDelivery {
    pub async fn deliver(self, mailer: &dyn Mailer) -> AppResult<DeliveredCredential> {
        let body = templates::reset_password_email(&self.user.userid, self.credential.expose());
        mailer
            .send(&self.user.email, templates::RESET_PASSWORD_SUBJECT, &body)
            .await
            .map_err(|e| {
                warn!(userid = %self.user.userid, "password reset: email not delivered, keeping old password");
                AppError::EmailDeliveryFailed(e)
            })?;
        Ok(DeliveredCredential {
            user: self.user,
            password_hash: self.password_hash,
        })
    }
}

impl DeliveredCredential {
    pub async fn persist(self, users: &dyn UserRepo) -> AppResult<()> {
        let updated = users
            .update_password(&self.user.userid, &self.password_hash, true)
            .await?;
        if !updated {
            return Err(AppError::NotFound("User not found".into()));
        }
        info!(userid = %self.user.userid, "password reset completed");
        Ok(())
    }
}

pub async fn reset_password(
    users: &dyn UserRepo,
    mailer: &dyn Mailer,
    userid: &str,
    email: &str,
    birthdate: &str,
) -> AppResult<()> {
    verify_identity(users, userid, email, birthdate)
        .await?
        .issue_credential()?
        .deliver(mailer)
        .await?
        .persist(users)
        .await
}
