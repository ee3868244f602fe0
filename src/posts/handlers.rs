use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{CreatePostRequest, PostResponse, UpdatePostRequest},
    repo_types::{NewPost, Post},
};
use crate::{
    auth::{dto::MessageResponse, guard::CurrentUser},
    error::{AppError, AppResult},
    extract::{AppJson, AppPath},
    state::AppState,
};

pub fn post_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/:id",
            get(get_post).put(update_post).delete(delete_post),
        )
}

fn post_not_found() -> AppError {
    AppError::NotFound("Post not found".into())
}

async fn with_comment_count(state: &AppState, post: Post) -> AppResult<PostResponse> {
    let count = state.comments.count_for_post(post.id).await?;
    Ok(PostResponse::new(post, count))
}

/// Loads the post or fails with 404; ownership is checked only after this.
pub(crate) async fn load_post(state: &AppState, id: Uuid) -> AppResult<Post> {
    state.posts.get(id).await?.ok_or_else(post_not_found)
}

#[instrument(skip(state))]
pub async fn list_posts(State(state): State<AppState>) -> AppResult<Json<Vec<PostResponse>>> {
    let posts = state.posts.list().await?;
    let mut items = Vec::with_capacity(posts.len());
    for post in posts {
        items.push(with_comment_count(&state, post).await?);
    }
    Ok(Json(items))
}

#[instrument(skip(state))]
pub async fn get_post(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<PostResponse>> {
    let post = state.posts.record_view(id).await?.ok_or_else(post_not_found)?;
    Ok(Json(with_comment_count(&state, post).await?))
}

#[instrument(skip(state, payload), fields(userid = %user.userid))]
pub async fn create_post(
    State(state): State<AppState>,
    user: CurrentUser,
    AppJson(payload): AppJson<CreatePostRequest>,
) -> AppResult<Json<PostResponse>> {
    let title = payload.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::Validation("title must not be empty".into()));
    }

    let post = state
        .posts
        .create(NewPost {
            title,
            author: user.userid.clone(),
            content: payload.content,
            category: payload.category,
            thumbnail: payload.thumbnail.filter(|s| !s.trim().is_empty()),
            webgl_path: payload.webgl_path.filter(|s| !s.trim().is_empty()),
        })
        .await?;

    info!(post_id = %post.id, "post created");
    Ok(Json(PostResponse::new(post, 0)))
}

#[instrument(skip(state, payload), fields(userid = %user.userid))]
pub async fn update_post(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdatePostRequest>,
) -> AppResult<Json<PostResponse>> {
    let existing = load_post(&state, id).await?;
    user.ensure_can_modify(&existing, "edit this post")?;

    let title = payload.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("title must not be empty".into()));
    }

    let post = state
        .posts
        .update(id, title, &payload.content)
        .await?
        .ok_or_else(post_not_found)?;

    info!(post_id = %id, "post updated");
    Ok(Json(with_comment_count(&state, post).await?))
}

#[instrument(skip(state), fields(userid = %user.userid))]
pub async fn delete_post(
    State(state): State<AppState>,
    user: CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    let existing = load_post(&state, id).await?;
    user.ensure_can_modify(&existing, "delete this post")?;

    // comments first, so a failure here leaves the post in place for a retry
    let removed = state.comments.delete_for_post(id).await?;
    if !state.posts.delete(id).await? {
        return Err(post_not_found());
    }

    info!(post_id = %id, comments_removed = removed, "post deleted");
    Ok(Json(MessageResponse::new("Post deleted successfully")))
}
