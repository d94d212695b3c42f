use crate::emotion::SamplingPolicy;

/// Configuration for a video session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Unique session identifier (e.g., "session-5f0c...")
    pub session_id: String,

    /// When the classifier is consulted
    /// Default: once every 2 seconds
    pub policy: SamplingPolicy,

    /// Retained emotion samples (None = unbounded)
    pub max_history: Option<usize>,

    /// Frames queued between the transport and the sampling worker
    /// before new frames are dropped
    pub frame_buffer: usize,

    /// Transport reconnects tolerated before the session is ended
    pub max_reconnect_attempts: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("session-{}", uuid::Uuid::new_v4()),
            policy: SamplingPolicy::default(),
            max_history: Some(10_000), // ~5.5 hours at one sample per 2s
            frame_buffer: 32,
            max_reconnect_attempts: 3,
        }
    }
}
