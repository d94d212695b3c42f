// Emotion sample aggregator
//
// Decides per incoming frame whether the (expensive, fallible) classifier is
// invoked, records successful results, and reduces them to a summary on
// demand. One aggregator belongs to exactly one video session.
//
// Bookkeeping sits behind a single lock that is never held across the
// classifier call. While a classification is in flight, further frames are
// answered from the cached label exactly like throttled frames.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::num::NonZeroU64;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::classifier::EmotionClassifier;
use super::label::{Emotion, EmotionLabel};
use super::summary::EmotionSummary;
use crate::error::SessionError;
use crate::video::VideoFrame;

/// How often the classifier is consulted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingPolicy {
    /// At most once per interval of wall-clock time
    Interval(Duration),
    /// Every Nth frame
    Stride(NonZeroU64),
    /// Every Nth frame, and only once the interval has also elapsed
    Hybrid {
        stride: NonZeroU64,
        interval: Duration,
    },
}

impl SamplingPolicy {
    pub fn interval(interval: Duration) -> Self {
        SamplingPolicy::Interval(interval)
    }

    pub fn stride(stride: u64) -> Result<Self, SessionError> {
        Ok(SamplingPolicy::Stride(Self::non_zero_stride(stride)?))
    }

    pub fn hybrid(stride: u64, interval: Duration) -> Result<Self, SessionError> {
        Ok(SamplingPolicy::Hybrid {
            stride: Self::non_zero_stride(stride)?,
            interval,
        })
    }

    fn non_zero_stride(stride: u64) -> Result<NonZeroU64, SessionError> {
        NonZeroU64::new(stride).ok_or_else(|| SessionError::InvalidPolicy {
            message: "stride must be at least 1".to_string(),
        })
    }
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        SamplingPolicy::Interval(Duration::from_millis(2000))
    }
}

/// Lifecycle of an aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregatorState {
    /// No frame observed yet
    Uninitialized,
    /// Last frame produced a fresh classification
    Sampling,
    /// Last frame was throttled, or its classification failed
    Idle,
    /// Owning connection closed; terminal
    Ended,
}

/// Answer to a single `observe` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    /// Label to display for this frame
    pub label: EmotionLabel,
    /// Whether the classifier produced this label for this frame
    pub sampled: bool,
}

/// Point-in-time counters for stats reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorSnapshot {
    pub state: AggregatorState,
    pub frame_counter: u64,
    pub last_label: EmotionLabel,
    pub history_len: usize,
    pub samples_recorded: u64,
    pub classifier_failures: u64,
    pub last_sample_at: Option<Instant>,
}

struct AggregatorInner {
    state: AggregatorState,
    last_sample_at: Option<Instant>,
    frame_counter: u64,
    history: VecDeque<Emotion>,
    last_label: EmotionLabel,
    in_flight: bool,
    samples_recorded: u64,
    classifier_failures: u64,
}

impl AggregatorInner {
    fn interval_elapsed(&self, now: Instant, interval: Duration) -> bool {
        match self.last_sample_at {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= interval,
        }
    }

    fn advance_stride(&mut self, stride: NonZeroU64) -> bool {
        self.frame_counter = self.frame_counter.wrapping_add(1);
        self.frame_counter % stride.get() == 0
    }

    fn cached(&mut self) -> Observation {
        self.state = AggregatorState::Idle;
        Observation {
            label: self.last_label,
            sampled: false,
        }
    }
}

/// Clears `in_flight` if an `observe` future is dropped mid-classification
struct InFlightGuard<'a> {
    inner: &'a Mutex<AggregatorInner>,
    armed: bool,
}

impl InFlightGuard<'_> {
    /// Caller clears the flag itself while holding the lock
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            debug!("Classification cancelled, releasing in-flight slot");
            self.inner.lock().in_flight = false;
        }
    }
}

/// Per-session emotion sampler
pub struct EmotionAggregator {
    policy: SamplingPolicy,
    /// Retained history bound (None = unbounded)
    max_history: Option<usize>,
    classifier: Arc<dyn EmotionClassifier>,
    inner: Mutex<AggregatorInner>,
}

impl EmotionAggregator {
    pub fn new(
        policy: SamplingPolicy,
        max_history: Option<usize>,
        classifier: Arc<dyn EmotionClassifier>,
    ) -> Self {
        info!(
            "Emotion aggregator created: {:?}, history limit {:?}, classifier {}",
            policy,
            max_history,
            classifier.name()
        );

        Self {
            policy,
            max_history: max_history.filter(|max| *max > 0),
            classifier,
            inner: Mutex::new(AggregatorInner {
                state: AggregatorState::Uninitialized,
                last_sample_at: None,
                frame_counter: 0,
                history: VecDeque::new(),
                last_label: EmotionLabel::Pending,
                in_flight: false,
                samples_recorded: 0,
                classifier_failures: 0,
            }),
        }
    }

    pub fn policy(&self) -> SamplingPolicy {
        self.policy
    }

    /// Feed one frame
    ///
    /// Returns the label to show for the frame and whether it was freshly
    /// sampled. Classifier failures are absorbed here: the previous label is
    /// returned and nothing is recorded. Only a session that has ended is
    /// reported as an error.
    pub async fn observe(&self, frame: &VideoFrame, now: Instant) -> Result<Observation, SessionError> {
        {
            let mut inner = self.inner.lock();
            if inner.state == AggregatorState::Ended {
                return Err(SessionError::Ended);
            }

            let due = match self.policy {
                SamplingPolicy::Interval(interval) => inner.interval_elapsed(now, interval),
                SamplingPolicy::Stride(stride) => inner.advance_stride(stride),
                SamplingPolicy::Hybrid { stride, interval } => {
                    let stride_due = inner.advance_stride(stride);
                    stride_due && inner.interval_elapsed(now, interval)
                }
            };

            if !due || inner.in_flight {
                return Ok(inner.cached());
            }

            inner.in_flight = true;
        }

        let mut guard = InFlightGuard {
            inner: &self.inner,
            armed: true,
        };
        let outcome = self.classifier.classify(frame).await;

        let mut inner = self.inner.lock();
        guard.disarm();
        inner.in_flight = false;

        if inner.state == AggregatorState::Ended {
            debug!("Discarding classification that finished after session end");
            return Err(SessionError::Ended);
        }

        match outcome {
            Ok(result) => {
                let emotion = result.dominant;
                inner.last_label = EmotionLabel::Detected(emotion);
                inner.history.push_back(emotion);
                if let Some(max) = self.max_history {
                    while inner.history.len() > max {
                        inner.history.pop_front();
                    }
                }
                inner.last_sample_at = Some(now);
                inner.samples_recorded += 1;
                inner.state = AggregatorState::Sampling;

                debug!(
                    "Sampled emotion {} (frame {}, {} in history)",
                    emotion,
                    inner.frame_counter,
                    inner.history.len()
                );

                Ok(Observation {
                    label: inner.last_label,
                    sampled: true,
                })
            }
            Err(e) => {
                inner.classifier_failures += 1;
                warn!(
                    "Classifier {} failed, keeping last label {}: {}",
                    self.classifier.name(),
                    inner.last_label,
                    e
                );
                Ok(inner.cached())
            }
        }
    }

    /// Percentage of each recorded emotion over the retained history
    ///
    /// History is read, not cleared.
    pub fn summarize(&self) -> EmotionSummary {
        let inner = self.inner.lock();
        EmotionSummary::from_history(inner.history.iter())
    }

    /// Retained history, oldest first
    pub fn history(&self) -> Vec<Emotion> {
        self.inner.lock().history.iter().copied().collect()
    }

    pub fn last_label(&self) -> EmotionLabel {
        self.inner.lock().last_label
    }

    pub fn state(&self) -> AggregatorState {
        self.inner.lock().state
    }

    pub fn snapshot(&self) -> AggregatorSnapshot {
        let inner = self.inner.lock();
        AggregatorSnapshot {
            state: inner.state,
            frame_counter: inner.frame_counter,
            last_label: inner.last_label,
            history_len: inner.history.len(),
            samples_recorded: inner.samples_recorded,
            classifier_failures: inner.classifier_failures,
            last_sample_at: inner.last_sample_at,
        }
    }

    /// Move to the terminal state
    ///
    /// Returns false if the aggregator had already ended.
    pub fn end(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.state == AggregatorState::Ended {
            return false;
        }
        inner.state = AggregatorState::Ended;
        info!(
            "Emotion aggregator ended after {} samples ({} failures)",
            inner.samples_recorded, inner.classifier_failures
        );
        true
    }
}
