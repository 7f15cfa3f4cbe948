//! SSE HTTP handler for the web layer.
//!
//! This module contains only the Axum handler for the meme stream.
//! The session state machine and connection registry live in the `sse` crate.

pub mod handler;
