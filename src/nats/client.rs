use anyhow::{Context, Result};
use async_nats::Client;
use base64::Engine;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info};

use super::messages::{ClassifyRequest, ClassifyResponse};
use crate::emotion::{ClassificationResult, EmotionClassifier};
use crate::error::ClassificationError;
use crate::video::VideoFrame;

/// Emotion classifier reached over NATS request/reply
///
/// Face detection and emotion scoring run in an external worker subscribed
/// to `subject`; this client only ships frames and parses replies.
pub struct NatsClassifier {
    client: Client,
    subject: String,
    timeout: Duration,
    sequence: AtomicU64,
}

impl NatsClassifier {
    /// Connect to NATS server
    pub async fn connect(url: &str, subject: impl Into<String>, timeout: Duration) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        let subject = subject.into();
        info!("Connected to NATS successfully, classifying on {}", subject);

        Ok(Self {
            client,
            subject,
            timeout,
            sequence: AtomicU64::new(0),
        })
    }

    fn build_request(&self, frame: &VideoFrame) -> ClassifyRequest {
        ClassifyRequest {
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst),
            width: frame.width,
            height: frame.height,
            format: frame.format,
            image: base64::engine::general_purpose::STANDARD.encode(&frame.data),
            timestamp: chrono::Utc::now().to_rfc3339(),
            actions: vec!["emotion".to_string()],
        }
    }
}

#[async_trait::async_trait]
impl EmotionClassifier for NatsClassifier {
    async fn classify(&self, frame: &VideoFrame) -> Result<ClassificationResult, ClassificationError> {
        frame.validate()?;

        let request = self.build_request(frame);
        let sequence = request.sequence;
        let payload = serde_json::to_vec(&request).map_err(|e| ClassificationError::Internal {
            message: format!("failed to encode request: {}", e),
        })?;

        let reply = tokio::time::timeout(
            self.timeout,
            self.client.request(self.subject.clone(), payload.into()),
        )
        .await
        .map_err(|_| ClassificationError::Internal {
            message: format!("no reply within {}ms", self.timeout.as_millis()),
        })?
        .map_err(|e| ClassificationError::Internal {
            message: format!("request failed: {}", e),
        })?;

        let response: ClassifyResponse =
            serde_json::from_slice(&reply.payload).map_err(|e| ClassificationError::Internal {
                message: format!("malformed reply: {}", e),
            })?;

        let result = response.into_result()?;
        debug!(
            "Frame {} classified as {} on {}",
            sequence, result.dominant, self.subject
        );

        Ok(result)
    }

    fn name(&self) -> &str {
        "nats"
    }
}
