use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{LeaderboardQuery, SaveScoreRequest, SaveScoreResponse, ScoreResponse},
    repo_types::NewScore,
};
use crate::{
    auth::guard::CurrentUser,
    error::{AppError, AppResult},
    extract::{AppJson, AppPath, AppQuery},
    state::AppState,
};

pub fn score_routes() -> Router<AppState> {
    Router::new()
        .route("/scores", post(save_score))
        .route("/scores/user/:username", get(user_scores))
        .route("/scores/:game_name", get(leaderboard))
}

#[instrument(skip(state, payload), fields(userid = %user.userid))]
pub async fn save_score(
    State(state): State<AppState>,
    user: CurrentUser,
    AppJson(payload): AppJson<SaveScoreRequest>,
) -> AppResult<Json<SaveScoreResponse>> {
    let game_name = payload.game_name.trim().to_string();
    if game_name.is_empty() {
        return Err(AppError::Validation("game_name must not be empty".into()));
    }

    let entry = NewScore {
        game_name,
        score: payload.score,
        username: payload.username,
    };
    user.ensure_can_modify(&entry, "save scores for another user")?;

    let saved = state.scores.insert(entry).await?;
    info!(score_id = %saved.id, game = %saved.game_name, score = saved.score, "score saved");

    Ok(Json(SaveScoreResponse {
        message: "Score saved successfully".into(),
        score_id: saved.id,
    }))
}

#[instrument(skip(state))]
pub async fn leaderboard(
    State(state): State<AppState>,
    AppPath(game_name): AppPath<String>,
    AppQuery(query): AppQuery<LeaderboardQuery>,
) -> AppResult<Json<Vec<ScoreResponse>>> {
    let rows = state
        .scores
        .top_for_game(&game_name, query.effective_limit())
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state))]
pub async fn user_scores(
    State(state): State<AppState>,
    AppPath(username): AppPath<String>,
) -> AppResult<Json<Vec<ScoreResponse>>> {
    let rows = state.scores.for_user(&username).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}
