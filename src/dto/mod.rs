//! Wire payloads exchanged over the WebSocket protocol and the HTTP surface.

pub mod game;
pub mod health;
pub mod public;
pub mod validation;
pub mod ws;
