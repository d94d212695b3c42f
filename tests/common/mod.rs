// Test doubles shared by the integration tests
//
// Each test binary only uses part of this module.
#![allow(dead_code)]

use neuronote::delivery::{DeliveryChannel, DeliveryReceipt};
use neuronote::{
    ClassificationError, ClassificationResult, DeliveryError, Emotion, EmotionClassifier,
    PixelFormat, ReportArtifact, VideoFrame,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Semaphore;

/// Small valid raw frame (2x2 BGR)
pub fn frame(timestamp_ms: u64) -> VideoFrame {
    VideoFrame::new(vec![128u8; 12], 2, 2, PixelFormat::Bgr24, timestamp_ms)
}

/// Classifier that replays a script, then answers with `fallback`
pub struct ScriptedClassifier {
    script: Mutex<VecDeque<Result<ClassificationResult, ClassificationError>>>,
    fallback: Emotion,
    calls: AtomicUsize,
}

impl ScriptedClassifier {
    pub fn always(emotion: Emotion) -> Self {
        Self::new(Vec::new(), emotion)
    }

    pub fn new(
        script: Vec<Result<ClassificationResult, ClassificationError>>,
        fallback: Emotion,
    ) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicUsize::new(0),
        }
    }

    /// Successful results for each label, in order
    pub fn labels(labels: &[Emotion]) -> Self {
        let script = labels.iter().map(|e| Ok(ClassificationResult::new(*e))).collect();
        Self::new(script, Emotion::Neutral)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl EmotionClassifier for ScriptedClassifier {
    async fn classify(&self, _frame: &VideoFrame) -> Result<ClassificationResult, ClassificationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Give other tasks a chance to interleave with the in-flight call
        tokio::task::yield_now().await;

        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(ClassificationResult::new(self.fallback)))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Classifier that blocks every call until the test releases permits
pub struct GatedClassifier {
    gate: Semaphore,
    emotion: Emotion,
    calls: AtomicUsize,
}

impl GatedClassifier {
    pub fn new(emotion: Emotion) -> Self {
        Self {
            gate: Semaphore::new(0),
            emotion,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn release(&self, calls: usize) {
        self.gate.add_permits(calls);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Wait until at least `n` calls have entered the classifier
    pub async fn wait_for_calls(&self, n: usize) {
        while self.calls() < n {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait::async_trait]
impl EmotionClassifier for GatedClassifier {
    async fn classify(&self, _frame: &VideoFrame) -> Result<ClassificationResult, ClassificationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let permit = self.gate.acquire().await.map_err(|e| ClassificationError::Internal {
            message: e.to_string(),
        })?;
        permit.forget();
        Ok(ClassificationResult::new(self.emotion))
    }

    fn name(&self) -> &str {
        "gated"
    }
}

/// Delivery channel that records what it was asked to send
#[derive(Default)]
pub struct RecordingDelivery {
    pub sent: Mutex<Vec<(String, String)>>,
}

#[async_trait::async_trait]
impl DeliveryChannel for RecordingDelivery {
    async fn deliver(
        &self,
        recipient: &str,
        artifact: &ReportArtifact,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let to = neuronote::delivery::parse_recipient(recipient)?;
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), artifact.file_name()));

        Ok(DeliveryReceipt {
            recipient: recipient.to_string(),
            detail: "recorded".to_string(),
        })
    }

    fn name(&self) -> &str {
        "recording"
    }
}
