use crate::delivery::DeliveryChannel;
use crate::emotion::EmotionClassifier;
use crate::notes::NoteAnalysis;
use crate::report::{ReportArtifact, ReportRenderer};
use crate::session::{SessionConfig, VideoSession};
use crate::video::IceConfig;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Ended sessions retained when no limit is configured
pub const DEFAULT_MAX_ENDED_SESSIONS: usize = 32;

/// Latest note analysis and report, shared by the report endpoints
#[derive(Debug, Default)]
pub struct Workspace {
    pub note_analysis: Option<NoteAnalysis>,
    pub report: Option<ReportArtifact>,
}

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Video sessions (session_id → session); ended sessions stay until replaced
    pub sessions: Arc<RwLock<HashMap<String, Arc<VideoSession>>>>,

    /// Classifier shared by every session
    pub classifier: Arc<dyn EmotionClassifier>,

    pub renderer: Arc<dyn ReportRenderer>,

    /// None when SMTP is not configured
    pub delivery: Option<Arc<dyn DeliveryChannel>>,

    /// Served to the browser as its RTCConfiguration
    pub ice: Arc<IceConfig>,

    /// Template for new sessions (the id is replaced per session)
    pub session_template: SessionConfig,

    /// Directory reports are written to, also served under /static
    pub report_dir: PathBuf,

    pub workspace: Arc<RwLock<Workspace>>,

    /// Ended sessions kept for summaries; older ones are evicted
    pub max_ended_sessions: usize,
}

impl AppState {
    pub fn new(
        classifier: Arc<dyn EmotionClassifier>,
        renderer: Arc<dyn ReportRenderer>,
        delivery: Option<Arc<dyn DeliveryChannel>>,
        ice: IceConfig,
        session_template: SessionConfig,
        report_dir: PathBuf,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            classifier,
            renderer,
            delivery,
            ice: Arc::new(ice),
            session_template,
            report_dir,
            workspace: Arc::new(RwLock::new(Workspace::default())),
            max_ended_sessions: DEFAULT_MAX_ENDED_SESSIONS,
        }
    }

    pub fn with_max_ended_sessions(mut self, max: usize) -> Self {
        self.max_ended_sessions = max;
        self
    }

    /// Evict the oldest ended sessions beyond `max_ended_sessions`
    ///
    /// Live sessions are never evicted. Returns the evicted ids.
    pub async fn evict_ended_sessions(&self) -> Vec<String> {
        let mut sessions = self.sessions.write().await;

        let mut ended: Vec<(chrono::DateTime<chrono::Utc>, String)> = sessions
            .values()
            .filter(|session| session.is_ended())
            .map(|session| (session.started_at(), session.id().to_string()))
            .collect();

        if ended.len() <= self.max_ended_sessions {
            return Vec::new();
        }

        ended.sort();
        let excess = ended.len() - self.max_ended_sessions;
        let evicted: Vec<String> = ended.into_iter().take(excess).map(|(_, id)| id).collect();

        for id in &evicted {
            sessions.remove(id);
        }

        info!(
            "Evicted {} ended session(s), {} retained",
            evicted.len(),
            sessions.len()
        );

        evicted
    }
}
