use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::Sse,
    routing::get,
};
use futures::Stream;
use tracing::info;
use uuid::Uuid;

use crate::{score::SharedState, services::sse_service};

#[utoipa::path(
    get,
    path = "/matches/{id}/score/stream",
    tag = "sse",
    params(("id" = Uuid, Path, description = "Identifier of the match")),
    responses((status = 200, description = "Match score SSE stream", content_type = "text/event-stream", body = String))
)]
/// Stream realtime score events for one match to a connected viewer.
pub async fn match_stream(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let receiver = sse_service::subscribe_match(&state, id);
    info!(match_id = %id, "new match SSE connection");
    sse_service::to_sse_stream(state, id, receiver)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/matches/{id}/score/stream", get(match_stream))
}
