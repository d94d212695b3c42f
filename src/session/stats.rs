use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::emotion::{AggregatorState, EmotionLabel};

/// Statistics about a video session
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub session_id: String,

    /// Aggregator lifecycle state
    pub state: AggregatorState,

    /// When the connection started
    pub started_at: DateTime<Utc>,

    /// Total duration in seconds
    pub duration_secs: f64,

    /// Frames accepted from the transport
    pub frames_received: usize,

    /// Frames discarded because the sampling worker was behind
    pub frames_dropped: usize,

    /// Successful classifications recorded
    pub samples_recorded: u64,

    /// Classifier invocations that failed
    pub classifier_failures: u64,

    /// Samples currently retained for the summary
    pub history_len: usize,

    /// Label shown for the latest frame
    pub last_label: EmotionLabel,

    pub reconnect_attempts: u32,
}
