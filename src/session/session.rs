use super::config::SessionConfig;
use super::stats::SessionStats;
use crate::emotion::{AggregatorState, EmotionAggregator, EmotionClassifier, EmotionLabel, EmotionSummary};
use crate::error::SessionError;
use crate::video::VideoFrame;
use chrono::Utc;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// A video session that feeds transport frames through an emotion aggregator
///
/// Frames are queued to a worker task so classification never runs on the
/// caller's path. Ending the session drains queued frames, stops the worker
/// and moves the aggregator to its terminal state; the history stays
/// readable for summaries afterwards.
pub struct VideoSession {
    /// Session configuration
    config: SessionConfig,

    /// Emotion sampler owned by this session
    aggregator: Arc<EmotionAggregator>,

    /// When the session started
    started_at: chrono::DateTime<chrono::Utc>,

    /// Sender side of the frame queue (None once ended)
    frame_tx: parking_lot::Mutex<Option<mpsc::Sender<VideoFrame>>>,

    /// Handle for the sampling task
    worker_handle: Mutex<Option<JoinHandle<()>>>,

    /// Number of frames accepted
    frames_received: AtomicUsize,

    /// Number of frames dropped on a full queue
    frames_dropped: AtomicUsize,

    /// Reconnect attempts reported by the transport
    reconnect_attempts: AtomicU32,
}

impl VideoSession {
    /// Create a session and start its sampling worker
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: SessionConfig, classifier: Arc<dyn EmotionClassifier>) -> Self {
        info!("Starting video session: {}", config.session_id);

        let aggregator = Arc::new(EmotionAggregator::new(
            config.policy,
            config.max_history,
            classifier,
        ));

        let (frame_tx, frame_rx) = mpsc::channel(config.frame_buffer.max(1));
        let worker = tokio::spawn(Self::run_worker(
            config.session_id.clone(),
            Arc::clone(&aggregator),
            frame_rx,
        ));

        Self {
            config,
            aggregator,
            started_at: Utc::now(),
            frame_tx: parking_lot::Mutex::new(Some(frame_tx)),
            worker_handle: Mutex::new(Some(worker)),
            frames_received: AtomicUsize::new(0),
            frames_dropped: AtomicUsize::new(0),
            reconnect_attempts: AtomicU32::new(0),
        }
    }

    async fn run_worker(
        session_id: String,
        aggregator: Arc<EmotionAggregator>,
        mut frame_rx: mpsc::Receiver<VideoFrame>,
    ) {
        info!("Sampling task started for {}", session_id);

        while let Some(frame) = frame_rx.recv().await {
            let now = tokio::time::Instant::now().into_std();

            match aggregator.observe(&frame, now).await {
                Ok(observation) if observation.sampled => {
                    debug!(
                        "Session {} frame at {}ms: {}",
                        session_id, frame.timestamp_ms, observation.label
                    );
                }
                Ok(_) => {}
                Err(SessionError::Ended) => break,
                Err(e) => {
                    error!("Sampling failed for {}: {}", session_id, e);
                    break;
                }
            }
        }

        info!("Sampling task stopped for {}", session_id);
    }

    pub fn id(&self) -> &str {
        &self.config.session_id
    }

    pub fn started_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.started_at
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn aggregator(&self) -> &Arc<EmotionAggregator> {
        &self.aggregator
    }

    pub fn is_ended(&self) -> bool {
        self.aggregator.state() == AggregatorState::Ended || self.frame_tx.lock().is_none()
    }

    /// Queue a frame for sampling without waiting
    ///
    /// A full queue drops the frame (the next one will do just as well);
    /// only an ended session is an error.
    pub fn submit_frame(&self, frame: VideoFrame) -> Result<(), SessionError> {
        let guard = self.frame_tx.lock();
        let tx = guard.as_ref().ok_or(SessionError::Ended)?;

        match tx.try_send(frame) {
            Ok(()) => {
                self.frames_received.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(frame)) => {
                self.frames_received.fetch_add(1, Ordering::SeqCst);
                let dropped = self.frames_dropped.fetch_add(1, Ordering::SeqCst) + 1;
                if dropped % 100 == 1 {
                    warn!(
                        "Session {} sampling queue full, dropped frame at {}ms ({} dropped so far)",
                        self.config.session_id, frame.timestamp_ms, dropped
                    );
                }
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(SessionError::Ended),
        }
    }

    /// Record a transport reconnect attempt
    ///
    /// Returns the attempt number. Past the configured maximum the session
    /// is ended and the attempt rejected.
    pub async fn reconnect(&self) -> Result<u32, SessionError> {
        if self.is_ended() {
            return Err(SessionError::Ended);
        }

        let attempts = self.reconnect_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let max = self.config.max_reconnect_attempts;

        if attempts > max {
            warn!(
                "Session {} exceeded reconnect limit ({} > {}), ending",
                self.config.session_id, attempts, max
            );
            self.end().await;
            return Err(SessionError::ReconnectLimit { attempts, max });
        }

        info!(
            "Session {} reconnect attempt {}/{}",
            self.config.session_id, attempts, max
        );
        Ok(attempts)
    }

    /// End the session
    ///
    /// Idempotent; returns the final stats.
    pub async fn end(&self) -> SessionStats {
        let sender = self.frame_tx.lock().take();

        if sender.is_none() {
            debug!("Session {} already ended", self.config.session_id);
            return self.stats();
        }

        info!("Ending video session: {}", self.config.session_id);

        // Closing the channel lets the worker drain what is queued and exit
        drop(sender);

        {
            let mut handle = self.worker_handle.lock().await;
            if let Some(task) = handle.take() {
                if let Err(e) = task.await {
                    error!("Sampling task panicked: {}", e);
                }
            }
        }

        self.aggregator.end();

        info!("Video session ended: {}", self.config.session_id);

        self.stats()
    }

    /// Emotion distribution over the whole session so far
    pub fn summary(&self) -> EmotionSummary {
        self.aggregator.summarize()
    }

    pub fn last_label(&self) -> EmotionLabel {
        self.aggregator.last_label()
    }

    /// Get current session statistics
    pub fn stats(&self) -> SessionStats {
        let duration = Utc::now().signed_duration_since(self.started_at);
        let snapshot = self.aggregator.snapshot();

        SessionStats {
            session_id: self.config.session_id.clone(),
            state: snapshot.state,
            started_at: self.started_at,
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
            frames_received: self.frames_received.load(Ordering::SeqCst),
            frames_dropped: self.frames_dropped.load(Ordering::SeqCst),
            samples_recorded: snapshot.samples_recorded,
            classifier_failures: snapshot.classifier_failures,
            history_len: snapshot.history_len,
            last_label: snapshot.last_label,
            reconnect_attempts: self.reconnect_attempts.load(Ordering::SeqCst),
        }
    }
}
