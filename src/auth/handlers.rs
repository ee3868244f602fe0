use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{
        claims::Identity,
        dto::{
            AdminCheckResponse, ChangePasswordRequest, FindUserIdRequest, FindUserIdResponse,
            LoginRequest, MessageResponse, Profile, RegisterRequest, ResetPasswordRequest,
            TokenResponse, UpdateProfileImageRequest,
        },
        guard::{AdminStatus, CurrentUser},
        services,
    },
    error::AppResult,
    extract::AppJson,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/find-userid", post(find_userid))
        .route("/auth/reset-password", post(reset_password))
        .route("/auth/change-password", post(change_password))
        .route("/auth/update-profile-image", post(update_profile_image))
}

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(get_me))
        .route("/auth/check-admin", get(check_admin))
}

#[instrument(skip(state, payload), fields(userid = %payload.userid))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> AppResult<Json<MessageResponse>> {
    services::register(state.users.as_ref(), &state.config.admin, payload).await?;
    Ok(Json(MessageResponse::new("User registered successfully")))
}

#[instrument(skip(state, payload), fields(userid = %payload.userid))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let res = services::login(
        state.users.as_ref(),
        &state.keys,
        &state.config.admin,
        payload.userid.trim(),
        &payload.password,
    )
    .await?;
    Ok(Json(res))
}

#[instrument(skip(state))]
pub async fn get_me(State(state): State<AppState>, user: CurrentUser) -> AppResult<Json<Profile>> {
    let identity = Identity {
        userid: user.userid,
        is_admin: user.is_admin,
    };
    let profile = services::profile(state.users.as_ref(), &state.config.admin, &identity).await?;
    Ok(Json(profile))
}

pub async fn check_admin(AdminStatus(is_admin): AdminStatus) -> Json<AdminCheckResponse> {
    Json(AdminCheckResponse { is_admin })
}

#[instrument(skip(state, payload))]
pub async fn find_userid(
    State(state): State<AppState>,
    AppJson(payload): AppJson<FindUserIdRequest>,
) -> AppResult<Json<FindUserIdResponse>> {
    let userid =
        services::find_userid(state.users.as_ref(), &payload.email, &payload.birthdate).await?;
    Ok(Json(FindUserIdResponse { userid }))
}

#[instrument(skip(state, payload), fields(userid = %payload.userid))]
pub async fn reset_password(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    services::reset_password(
        state.users.as_ref(),
        state.mailer.as_ref(),
        &payload.userid,
        &payload.email,
        &payload.birthdate,
    )
    .await?;
    Ok(Json(MessageResponse::new(
        "A temporary password has been sent to your email",
    )))
}

#[instrument(skip(state, payload), fields(userid = %user.userid))]
pub async fn change_password(
    State(state): State<AppState>,
    user: CurrentUser,
    AppJson(payload): AppJson<ChangePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    services::change_password(
        state.users.as_ref(),
        &user.userid,
        &payload.current_password,
        &payload.new_password,
    )
    .await?;
    info!("password change acknowledged");
    Ok(Json(MessageResponse::new("Password changed successfully")))
}

#[instrument(skip(state, payload), fields(userid = %user.userid))]
pub async fn update_profile_image(
    State(state): State<AppState>,
    user: CurrentUser,
    AppJson(payload): AppJson<UpdateProfileImageRequest>,
) -> AppResult<Json<MessageResponse>> {
    services::update_profile_image(state.users.as_ref(), &user.userid, &payload.profile_image)
        .await?;
    Ok(Json(MessageResponse::new("Profile image updated successfully")))
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use time::{Duration, OffsetDateTime};
    use tower::ServiceExt;

    use crate::{app::build_app, mail::testing::RecordingMailer, state::AppState};

    pub(crate) async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        let req = match body {
            Some(b) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    pub(crate) fn app_with(mailer: RecordingMailer) -> (Router, Arc<RecordingMailer>) {
        let mailer = Arc::new(mailer);
        (build_app(AppState::fake(mailer.clone())), mailer)
    }

    pub(crate) async fn register_alice(app: &Router) {
        let (status, body) = call(
            app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "userid": "alice",
                "email": "alice@example.com",
                "password": "wonderland",
                "gender": "F",
                "birthdate": "1990-01-01"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    pub(crate) async fn login_as(
        app: &Router,
        userid: &str,
        password: &str,
    ) -> (StatusCode, Value) {
        call(
            app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "userid": userid, "password": password })),
        )
        .await
    }

    #[tokio::test]
    async fn register_login_and_me() {
        let (app, _) = app_with(RecordingMailer::default());
        register_alice(&app).await;

        let (status, body) = login_as(&app, "alice", "wonderland").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token_type"], "bearer");
        assert_eq!(body["is_temporary_password"], false);
        let token = body["access_token"].as_str().unwrap().to_string();

        let (status, me) = call(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["userid"], "alice");
        assert_eq!(me["is_admin"], false);
        assert!(me.get("password_hash").is_none());

        let (status, _) = login_as(&app, "alice", "wrong-password").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn duplicate_registration_is_bad_request() {
        let (app, _) = app_with(RecordingMailer::default());
        register_alice(&app).await;

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "userid": "alice",
                "email": "other@example.com",
                "password": "wonderland",
                "birthdate": "1990-01-01"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("UserID"));
    }

    #[tokio::test]
    async fn me_requires_token() {
        let (app, _) = app_with(RecordingMailer::default());
        let (status, body) = call(&app, Method::GET, "/api/auth/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["detail"].is_string());

        let (status, _) = call(&app, Method::GET, "/api/auth/me", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn expired_and_invalid_tokens_are_told_apart() {
        let state = AppState::fake(Arc::new(RecordingMailer::default()));
        let expired = state
            .keys
            .issue_at("alice", false, OffsetDateTime::now_utc() - Duration::hours(1))
            .unwrap();
        let app = build_app(state);

        let (status, body) = call(&app, Method::GET, "/api/auth/me", Some(&expired), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "token has expired");

        let (status, body) = call(&app, Method::GET, "/api/auth/me", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["detail"], "could not validate credentials");
    }

    #[tokio::test]
    async fn malformed_body_answers_with_detail() {
        let (app, _) = app_with(RecordingMailer::default());
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "userid": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].as_str().unwrap().contains("missing field"));
    }

    #[tokio::test]
    async fn profile_image_update_shows_in_me() {
        let (app, _) = app_with(RecordingMailer::default());
        register_alice(&app).await;
        let (_, body) = login_as(&app, "alice", "wonderland").await;
        let token = body["access_token"].as_str().unwrap().to_string();

        let (_, me) = call(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
        assert_eq!(me["profile_image"], "/images/profile.jpg");

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/auth/update-profile-image",
            None,
            Some(json!({ "profile_image": "/images/alice.png" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/auth/update-profile-image",
            Some(&token),
            Some(json!({ "profile_image": "  " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].is_string());

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/auth/update-profile-image",
            Some(&token),
            Some(json!({ "profile_image": "/images/alice.png" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, me) = call(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
        assert_eq!(me["profile_image"], "/images/alice.png");
    }

    #[tokio::test]
    async fn profile_image_update_for_unknown_account_is_not_found() {
        let state = AppState::fake(Arc::new(RecordingMailer::default()));
        let token = state.keys.issue("ghost", false).unwrap();
        let app = build_app(state);

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/auth/update-profile-image",
            Some(&token),
            Some(json!({ "profile_image": "/images/ghost.png" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn check_admin_fails_closed() {
        let (app, _) = app_with(RecordingMailer::default());

        let (status, body) = call(&app, Method::GET, "/api/auth/check-admin", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["is_admin"], false);

        let (_, body) = call(&app, Method::GET, "/api/auth/check-admin", Some("bad"), None).await;
        assert_eq!(body["is_admin"], false);

        let (status, body) = login_as(&app, "admin", "admin-pass").await;
        assert_eq!(status, StatusCode::OK);
        let token = body["access_token"].as_str().unwrap().to_string();
        let (_, body) = call(&app, Method::GET, "/api/auth/check-admin", Some(&token), None).await;
        assert_eq!(body["is_admin"], true);

        let (_, me) = call(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
        assert_eq!(me["is_admin"], true);
    }

    #[tokio::test]
    async fn find_userid_by_email_and_birthdate() {
        let (app, _) = app_with(RecordingMailer::default());
        register_alice(&app).await;

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/auth/find-userid",
            None,
            Some(json!({ "email": "alice@example.com", "birthdate": "1990-01-01" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["userid"], "alice");

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/auth/find-userid",
            None,
            Some(json!({ "email": "alice@example.com", "birthdate": "1991-01-01" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn reset_password_unknown_account_is_not_found() {
        let (app, mailer) = app_with(RecordingMailer::default());
        register_alice(&app).await;

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/auth/reset-password",
            None,
            Some(json!({ "userid": "alice", "email": "alice@example.com", "birthdate": "2001-01-01" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(mailer.sent().await.is_empty());
    }

    #[tokio::test]
    async fn reset_password_mail_failure_keeps_old_password() {
        let (app, _) = app_with(RecordingMailer::failing());
        register_alice(&app).await;

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/auth/reset-password",
            None,
            Some(json!({ "userid": "alice", "email": "alice@example.com", "birthdate": "1990-01-01" })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["detail"].is_string());

        let (status, _) = login_as(&app, "alice", "wonderland").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn reset_password_response_hides_credential() {
        let (app, mailer) = app_with(RecordingMailer::default());
        register_alice(&app).await;

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/auth/reset-password",
            None,
            Some(json!({ "userid": "alice", "email": "alice@example.com", "birthdate": "1990-01-01" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_object().unwrap().len(), 1);
        assert!(body["message"].is_string());
        assert_eq!(mailer.sent().await.len(), 1);
    }

    #[tokio::test]
    async fn change_password_rejects_wrong_current() {
        let (app, _) = app_with(RecordingMailer::default());
        register_alice(&app).await;
        let (_, body) = login_as(&app, "alice", "wonderland").await;
        let token = body["access_token"].as_str().unwrap().to_string();

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/auth/change-password",
            Some(&token),
            Some(json!({ "current_password": "not-it", "new_password": "looking-glass" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/auth/change-password",
            Some(&token),
            Some(json!({ "current_password": "wonderland", "new_password": "looking-glass" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = login_as(&app, "alice", "looking-glass").await;
        assert_eq!(status, StatusCode::OK);
    }
}
