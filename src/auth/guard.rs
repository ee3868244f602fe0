use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::warn;

use super::{
    claims::Identity,
    jwt::{JwtKeys, TokenError},
};
use crate::error::AppError;

/// Anything with a creator that may be edited or removed.
pub trait Owned {
    fn owner(&self) -> &str;
}

/// Owner-or-admin. The single rule behind every mutation of user content.
pub fn authorize_mutation(resource_owner: &str, caller: &str, caller_is_admin: bool) -> bool {
    caller_is_admin || resource_owner == caller
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, TokenError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(TokenError::Missing)?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(TokenError::Missing)
}

pub fn current_identity(keys: &JwtKeys, headers: &HeaderMap) -> Result<Identity, TokenError> {
    keys.validate(bearer_token(headers)?)
}

/// Admin status defaults closed: any failure reads as "not admin".
pub fn is_admin(keys: &JwtKeys, headers: &HeaderMap) -> bool {
    current_identity(keys, headers)
        .map(|identity| identity.is_admin)
        .unwrap_or(false)
}

/// Authenticated caller, recovered from the bearer token.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub userid: String,
    pub is_admin: bool,
}

impl CurrentUser {
    pub fn can_modify<R: Owned + ?Sized>(&self, resource: &R) -> bool {
        authorize_mutation(resource.owner(), &self.userid, self.is_admin)
    }

    pub fn ensure_can_modify<R: Owned + ?Sized>(
        &self,
        resource: &R,
        action: &str,
    ) -> Result<(), AppError> {
        if self.can_modify(resource) {
            return Ok(());
        }
        warn!(userid = %self.userid, owner = %resource.owner(), action, "mutation denied");
        Err(AppError::Forbidden(format!("you are not allowed to {action}")))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        match current_identity(&keys, &parts.headers) {
            Ok(Identity { userid, is_admin }) => Ok(CurrentUser { userid, is_admin }),
            Err(e) => {
                warn!(error = %e, "rejected bearer token");
                Err(AppError::Unauthenticated(e))
            }
        }
    }
}

/// Whether the caller holds a valid admin token. Never rejects.
#[derive(Debug, Clone, Copy)]
pub struct AdminStatus(pub bool);

#[async_trait]
impl<S> FromRequestParts<S> for AdminStatus
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        Ok(AdminStatus(is_admin(&keys, &parts.headers)))
    }
}
