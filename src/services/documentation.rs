use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Kourt Score Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::score::get_or_create_score,
        crate::routes::score::get_score,
        crate::routes::score::start_match,
        crate::routes::score::adjust_points,
        crate::routes::score::toggle_pause,
        crate::routes::score::finish_set,
        crate::routes::score::finish_match,
        crate::routes::sse::match_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::score::ScoreSnapshot,
            crate::dto::score::SetRecordSummary,
            crate::dto::score::StartMatchRequest,
            crate::dto::score::AdjustPointsRequest,
            crate::dto::score::TogglePauseRequest,
            crate::dto::score::FinishSetRequest,
            crate::dto::score::FinishMatchRequest,
            crate::dto::sse::Handshake,
            crate::dto::sse::ScoreChangedEvent,
            crate::dto::sse::SystemStatus,
            crate::score::engine::Team,
            crate::score::engine::MatchStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "score", description = "Version-gated match score operations"),
        (name = "sse", description = "Per-match server-sent event streams"),
    )
)]
pub struct ApiDoc;
