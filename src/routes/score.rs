use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{post, put},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::score::{
        AdjustPointsRequest, FinishMatchRequest, FinishSetRequest, ScoreSnapshot,
        StartMatchRequest, TogglePauseRequest,
    },
    error::AppError,
    score::SharedState,
    services::score_service,
};

/// Routes handling score reads and version-gated mutations.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/matches/{id}/score",
            put(get_or_create_score).get(get_score),
        )
        .route("/matches/{id}/score/start", post(start_match))
        .route("/matches/{id}/score/points", post(adjust_points))
        .route("/matches/{id}/score/pause", post(toggle_pause))
        .route("/matches/{id}/score/sets", post(finish_set))
        .route("/matches/{id}/score/finish", post(finish_match))
}

/// Fetch the scoreboard of a match, creating a pristine one on first access.
#[utoipa::path(
    put,
    path = "/matches/{id}/score",
    tag = "score",
    params(("id" = Uuid, Path, description = "Identifier of the match")),
    responses(
        (status = 200, description = "Current or freshly created score", body = ScoreSnapshot),
        (status = 503, description = "Storage unavailable"),
    )
)]
pub async fn get_or_create_score(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ScoreSnapshot>, AppError> {
    let snapshot = score_service::get_or_create_score(&state, id).await?;
    Ok(Json(snapshot))
}

/// Fetch the scoreboard of a match.
#[utoipa::path(
    get,
    path = "/matches/{id}/score",
    tag = "score",
    params(("id" = Uuid, Path, description = "Identifier of the match")),
    responses(
        (status = 200, description = "Current score", body = ScoreSnapshot),
        (status = 404, description = "No score row exists for this match"),
    )
)]
pub async fn get_score(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ScoreSnapshot>, AppError> {
    let snapshot = score_service::get_score(&state, id).await?;
    Ok(Json(snapshot))
}

/// Start a match.
#[utoipa::path(
    post,
    path = "/matches/{id}/score/start",
    tag = "score",
    params(("id" = Uuid, Path, description = "Identifier of the match")),
    request_body = StartMatchRequest,
    responses(
        (status = 200, description = "Match started", body = ScoreSnapshot),
        (status = 409, description = "Stale version or illegal transition"),
    )
)]
pub async fn start_match(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<StartMatchRequest>>,
) -> Result<Json<ScoreSnapshot>, AppError> {
    let snapshot = score_service::start_match(&state, id, payload).await?;
    Ok(Json(snapshot))
}

/// Add or remove one point for a side.
#[utoipa::path(
    post,
    path = "/matches/{id}/score/points",
    tag = "score",
    params(("id" = Uuid, Path, description = "Identifier of the match")),
    request_body = AdjustPointsRequest,
    responses(
        (status = 200, description = "Points adjusted", body = ScoreSnapshot),
        (status = 400, description = "Delta outside the +1/-1 range"),
        (status = 409, description = "Stale version or illegal transition"),
    )
)]
pub async fn adjust_points(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<AdjustPointsRequest>>,
) -> Result<Json<ScoreSnapshot>, AppError> {
    let snapshot = score_service::adjust_points(&state, id, payload).await?;
    Ok(Json(snapshot))
}

/// Pause or resume a match.
#[utoipa::path(
    post,
    path = "/matches/{id}/score/pause",
    tag = "score",
    params(("id" = Uuid, Path, description = "Identifier of the match")),
    request_body = TogglePauseRequest,
    responses(
        (status = 200, description = "Pause state toggled", body = ScoreSnapshot),
        (status = 409, description = "Stale version or illegal transition"),
    )
)]
pub async fn toggle_pause(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<TogglePauseRequest>>,
) -> Result<Json<ScoreSnapshot>, AppError> {
    let snapshot = score_service::toggle_pause(&state, id, payload).await?;
    Ok(Json(snapshot))
}

/// Close the current set in favour of one side.
#[utoipa::path(
    post,
    path = "/matches/{id}/score/sets",
    tag = "score",
    params(("id" = Uuid, Path, description = "Identifier of the match")),
    request_body = FinishSetRequest,
    responses(
        (status = 200, description = "Set closed", body = ScoreSnapshot),
        (status = 409, description = "Stale version or illegal transition"),
    )
)]
pub async fn finish_set(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<FinishSetRequest>>,
) -> Result<Json<ScoreSnapshot>, AppError> {
    let snapshot = score_service::finish_set(&state, id, payload).await?;
    Ok(Json(snapshot))
}

/// Finish a match.
#[utoipa::path(
    post,
    path = "/matches/{id}/score/finish",
    tag = "score",
    params(("id" = Uuid, Path, description = "Identifier of the match")),
    request_body = FinishMatchRequest,
    responses(
        (status = 200, description = "Match finished", body = ScoreSnapshot),
        (status = 409, description = "Stale version or illegal transition"),
    )
)]
pub async fn finish_match(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<FinishMatchRequest>>,
) -> Result<Json<ScoreSnapshot>, AppError> {
    let snapshot = score_service::finish_match(&state, id, payload).await?;
    Ok(Json(snapshot))
}
