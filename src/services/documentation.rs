use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Quiz Rush Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sessions::resume_session,
        crate::routes::sessions::session_snapshot,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::public::ResumeResponse,
            crate::dto::ws::ClientMessage,
            crate::dto::ws::ServerMessage,
            crate::dao::models::SnapshotEntity,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sessions", description = "Session resume and snapshot export"),
        (name = "ws", description = "WebSocket session protocol"),
    )
)]
pub struct ApiDoc;
