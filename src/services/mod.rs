/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Session event handlers bridging the transport and the room machine.
pub mod room_service;
/// Snapshot persistence, resume reconstruction, and snapshot queries.
pub mod snapshot_service;
/// WebSocket connection and message handling service.
pub mod websocket_service;
/// Outbound WebSocket event delivery helpers.
pub mod ws_events;
