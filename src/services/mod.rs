/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Outbound match lifecycle notifications.
pub mod match_sync;
/// Server-Sent Events message generation.
pub mod score_events;
/// Version-gated score read and write operations.
pub mod score_service;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Storage reconnection supervisor.
pub mod storage_supervisor;
