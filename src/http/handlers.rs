use super::state::AppState;
use crate::emotion::{EmotionLabel, EmotionSummary};
use crate::error::{DeliveryError, SessionError};
use crate::notes::{analyze_note_now, NoteAnalysis};
use crate::report::ReportInput;
use crate::session::{SessionConfig, SessionStats, VideoSession};
use crate::video::{describe_transport_error, PixelFormat, VideoFrame};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct StartSessionRequest {
    /// Optional session ID (if not provided, generate UUID)
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub session_id: String,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct FrameRequest {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Base64-encoded frame payload
    pub data: String,
    pub timestamp_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct FrameResponse {
    pub session_id: String,
    /// Label to overlay on the frame (last known)
    pub label: EmotionLabel,
    pub display: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReconnectRequest {
    /// Transport error that triggered the reconnect, if any
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReconnectResponse {
    pub session_id: String,
    pub attempt: u32,
    pub max_attempts: u32,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub session_id: String,
    pub summary: EmotionSummary,
    pub last_label: EmotionLabel,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateReportRequest {
    /// Session whose emotion summary goes into the report
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub file_name: String,
    pub url: String,
    pub size_bytes: usize,
    pub generated_at: DateTime<Utc>,
    pub note_analysis: Option<NoteAnalysis>,
    pub emotion_summary: Option<EmotionSummary>,
}

#[derive(Debug, Deserialize)]
pub struct SendReportRequest {
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

fn session_not_found(session_id: &str) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        format!("Session {} not found", session_id),
    )
}

async fn find_session(state: &AppState, session_id: &str) -> Option<Arc<VideoSession>> {
    let sessions = state.sessions.read().await;
    sessions.get(session_id).cloned()
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /ice-config
/// RTCConfiguration for the browser's peer connection
pub async fn get_ice_config(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.ice.as_ref().clone()))
}

/// POST /sessions
/// Start a new video session
pub async fn start_session(
    State(state): State<AppState>,
    req: Option<Json<StartSessionRequest>>,
) -> impl IntoResponse {
    let req = req.map(|Json(req)| req).unwrap_or_default();

    // Generate or use provided session ID
    let session_id = req
        .session_id
        .unwrap_or_else(|| format!("session-{}", uuid::Uuid::new_v4()));

    info!("Starting video session: {}", session_id);

    let mut sessions = state.sessions.write().await;

    // An ended session with the same id may be replaced; a live one may not
    if let Some(existing) = sessions.get(&session_id) {
        if !existing.is_ended() {
            return error_response(
                StatusCode::CONFLICT,
                format!("Session {} is already active", session_id),
            );
        }
    }

    let config = SessionConfig {
        session_id: session_id.clone(),
        ..state.session_template.clone()
    };

    let session = Arc::new(VideoSession::start(config, Arc::clone(&state.classifier)));
    sessions.insert(session_id.clone(), session);
    drop(sessions);

    state.evict_ended_sessions().await;

    (
        StatusCode::OK,
        Json(StartSessionResponse {
            session_id: session_id.clone(),
            status: "active".to_string(),
            message: format!("Emotion sampling started for session {}", session_id),
        }),
    )
        .into_response()
}

/// POST /sessions/:session_id/frames
/// Submit one video frame for sampling
pub async fn submit_frame(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(req): Json<FrameRequest>,
) -> impl IntoResponse {
    let Some(session) = find_session(&state, &session_id).await else {
        return session_not_found(&session_id);
    };

    let data = match base64::engine::general_purpose::STANDARD.decode(req.data.as_bytes()) {
        Ok(data) => data,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Frame data is not valid base64: {}", e),
            )
        }
    };

    let frame = VideoFrame::new(
        data,
        req.width,
        req.height,
        req.format,
        req.timestamp_ms.unwrap_or_default(),
    );

    match session.submit_frame(frame) {
        Ok(()) => {
            let label = session.last_label();
            (
                StatusCode::ACCEPTED,
                Json(FrameResponse {
                    session_id,
                    label,
                    display: format!("Emotion: {}", label),
                }),
            )
                .into_response()
        }
        Err(e) => error_response(StatusCode::GONE, e.to_string()),
    }
}

/// POST /sessions/:session_id/reconnect
/// Record a transport reconnect attempt
pub async fn reconnect_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    req: Option<Json<ReconnectRequest>>,
) -> impl IntoResponse {
    let req = req.map(|Json(req)| req).unwrap_or_default();

    let Some(session) = find_session(&state, &session_id).await else {
        return session_not_found(&session_id);
    };

    let message = match req.reason.as_deref() {
        Some(reason) => describe_transport_error(reason),
        None => "Reconnecting".to_string(),
    };

    match session.reconnect().await {
        Ok(attempt) => (
            StatusCode::OK,
            Json(ReconnectResponse {
                session_id,
                attempt,
                max_attempts: session.config().max_reconnect_attempts,
                message,
            }),
        )
            .into_response(),
        Err(e @ SessionError::ReconnectLimit { .. }) => {
            warn!("Session {} rejected reconnect: {}", session_id, e);
            error_response(StatusCode::GONE, e.to_string())
        }
        Err(e) => error_response(StatusCode::GONE, e.to_string()),
    }
}

/// POST /sessions/:session_id/end
/// End a session; its summary stays available
pub async fn end_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    info!("Ending video session: {}", session_id);

    match find_session(&state, &session_id).await {
        Some(session) => {
            let stats: SessionStats = session.end().await;
            state.evict_ended_sessions().await;
            (StatusCode::OK, Json(stats)).into_response()
        }
        None => session_not_found(&session_id),
    }
}

/// DELETE /sessions/:session_id
/// End a session if needed and forget it
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let removed = state.sessions.write().await.remove(&session_id);

    match removed {
        Some(session) => {
            let stats = session.end().await;
            info!("Session removed: {}", session_id);
            (StatusCode::OK, Json(stats)).into_response()
        }
        None => session_not_found(&session_id),
    }
}

/// GET /sessions/:session_id/status
/// Get statistics of a session
pub async fn get_session_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match find_session(&state, &session_id).await {
        Some(session) => (StatusCode::OK, Json(session.stats())).into_response(),
        None => session_not_found(&session_id),
    }
}

/// GET /sessions/:session_id/summary
/// Emotion distribution over the session so far
pub async fn get_session_summary(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match find_session(&state, &session_id).await {
        Some(session) => (
            StatusCode::OK,
            Json(SummaryResponse {
                session_id,
                summary: session.summary(),
                last_label: session.last_label(),
            }),
        )
            .into_response(),
        None => session_not_found(&session_id),
    }
}

/// POST /notes
/// Upload a note (image or PDF) as the raw request body
pub async fn upload_note(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    if body.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Uploaded note is empty");
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let Some(mut analysis) = analyze_note_now(content_type) else {
        return error_response(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            format!("Unsupported note type '{}': upload a PDF or image", content_type),
        );
    };

    if let Some(file_name) = headers.get("x-file-name").and_then(|value| value.to_str().ok()) {
        analysis = analysis.with_file_name(file_name);
    }

    info!(
        "Note uploaded: {} bytes, {:?}",
        body.len(),
        analysis.kind
    );

    state.workspace.write().await.note_analysis = Some(analysis.clone());

    (StatusCode::OK, Json(analysis)).into_response()
}

/// POST /reports
/// Render the report from the last note and, optionally, a session summary
pub async fn generate_report(
    State(state): State<AppState>,
    req: Option<Json<GenerateReportRequest>>,
) -> impl IntoResponse {
    let req = req.map(|Json(req)| req).unwrap_or_default();

    let note_analysis = state.workspace.read().await.note_analysis.clone();
    if note_analysis.is_none() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Please upload your notes before generating the report.",
        );
    }

    let emotion_summary = match req.session_id.as_deref() {
        Some(session_id) => match find_session(&state, session_id).await {
            Some(session) => Some(session.summary()),
            None => return session_not_found(session_id),
        },
        None => None,
    };

    let input = ReportInput {
        note_analysis,
        emotion_summary,
    };

    let renderer = Arc::clone(&state.renderer);
    let render_input = input.clone();
    let rendered = tokio::task::spawn_blocking(move || renderer.render(&render_input)).await;

    let artifact = match rendered {
        Ok(Ok(artifact)) => artifact,
        Ok(Err(e)) => {
            error!("Failed to render report: {}", e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render report: {}", e),
            );
        }
        Err(e) => {
            error!("Report task panicked: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Report rendering failed");
        }
    };

    let response = ReportResponse {
        file_name: artifact.file_name(),
        url: format!("/static/{}", artifact.file_name()),
        size_bytes: artifact.bytes.len(),
        generated_at: artifact.generated_at,
        note_analysis: input.note_analysis,
        emotion_summary: input.emotion_summary,
    };

    state.workspace.write().await.report = Some(artifact);

    info!("Report generated successfully: {}", response.file_name);

    (StatusCode::OK, Json(response)).into_response()
}

/// POST /reports/send
/// Email the last generated report
pub async fn send_report(
    State(state): State<AppState>,
    Json(req): Json<SendReportRequest>,
) -> impl IntoResponse {
    let email = req.email.unwrap_or_default();
    if email.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Please enter your email address.");
    }

    let artifact = match state.workspace.read().await.report.clone() {
        Some(artifact) if artifact.exists() => artifact,
        _ => {
            return error_response(
                StatusCode::CONFLICT,
                "Please generate the report before sending email.",
            )
        }
    };

    let Some(delivery) = state.delivery.clone() else {
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "Email delivery is not configured",
        );
    };

    match delivery.deliver(&email, &artifact).await {
        Ok(receipt) => {
            info!("Report sent to {} via {}", receipt.recipient, delivery.name());
            (StatusCode::OK, Json(receipt)).into_response()
        }
        Err(e @ DeliveryError::InvalidRecipient { .. }) => {
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(e) => {
            error!("Failed to send email: {}", e);
            error_response(
                StatusCode::BAD_GATEWAY,
                format!("Failed to send email: {}", e),
            )
        }
    }
}
