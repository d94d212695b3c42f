//! HTTP API server for the browser front end
//!
//! This module provides a REST API for sessions, notes and reports:
//! - GET /ice-config - RTCConfiguration for the browser
//! - POST /sessions - Start a video session
//! - POST /sessions/:id/frames - Submit a frame for emotion sampling
//! - POST /sessions/:id/reconnect - Record a transport reconnect
//! - POST /sessions/:id/end - End a session
//! - DELETE /sessions/:id - End and remove a session
//! - GET /sessions/:id/status - Query session statistics
//! - GET /sessions/:id/summary - Emotion distribution so far
//! - POST /notes - Upload a note for analysis
//! - POST /reports - Generate the PDF report
//! - POST /reports/send - Email the report
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::{AppState, Workspace, DEFAULT_MAX_ENDED_SESSIONS};
