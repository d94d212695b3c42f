use super::label::ClassificationResult;
use crate::error::ClassificationError;
use crate::video::VideoFrame;

/// Emotion classifier trait
///
/// Implementations:
/// - NATS: request/reply to an external face-analysis worker
/// - Tests: scripted classifiers returning canned results
///
/// Calls may be slow; the aggregator never holds its lock across one.
#[async_trait::async_trait]
pub trait EmotionClassifier: Send + Sync {
    /// Classify the dominant emotion in a single frame
    async fn classify(&self, frame: &VideoFrame) -> Result<ClassificationResult, ClassificationError>;

    /// Get classifier name for logging
    fn name(&self) -> &str;
}
