use axum::{
    extract::State,
    routing::{delete, get},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{CommentResponse, CreateCommentRequest},
    repo_types::NewComment,
};
use crate::{
    auth::{dto::MessageResponse, guard::CurrentUser},
    error::{AppError, AppResult},
    extract::{AppJson, AppPath},
    posts::handlers::load_post,
    state::AppState,
};

pub fn comment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/posts/:id/comments",
            get(list_comments).post(create_comment),
        )
        .route("/comments/:id", delete(delete_comment))
}

#[instrument(skip(state))]
pub async fn list_comments(
    State(state): State<AppState>,
    AppPath(post_id): AppPath<Uuid>,
) -> AppResult<Json<Vec<CommentResponse>>> {
    let comments = state.comments.list_for_post(post_id).await?;
    Ok(Json(comments.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state, payload), fields(userid = %user.userid))]
pub async fn create_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(post_id): AppPath<Uuid>,
    AppJson(payload): AppJson<CreateCommentRequest>,
) -> AppResult<Json<CommentResponse>> {
    load_post(&state, post_id).await?;

    if payload.content.trim().is_empty() {
        return Err(AppError::Validation("content must not be empty".into()));
    }

    let comment = state
        .comments
        .create(NewComment {
            post_id,
            author: user.userid.clone(),
            content: payload.content,
        })
        .await?;

    info!(comment_id = %comment.id, %post_id, "comment created");
    Ok(Json(comment.into()))
}

#[instrument(skip(state), fields(userid = %user.userid))]
pub async fn delete_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    let not_found = || AppError::NotFound("Comment not found".into());

    let comment = state.comments.get(id).await?.ok_or_else(not_found)?;
    user.ensure_can_modify(&comment, "delete this comment")?;

    if !state.comments.delete(id).await? {
        return Err(not_found());
    }

    info!(comment_id = %id, "comment deleted");
    Ok(Json(MessageResponse::new("Comment deleted successfully")))
}
