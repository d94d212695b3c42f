use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::emotion::{ClassificationResult, Emotion};
use crate::error::ClassificationError;
use crate::video::PixelFormat;

/// Frame classification request sent to the emotion worker
#[derive(Debug, Serialize, Deserialize)]
pub struct ClassifyRequest {
    pub sequence: u64,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub image: String,  // Base64-encoded frame payload
    pub timestamp: String,  // RFC3339 timestamp
    /// Always `["emotion"]`; the worker can run other analyses too
    pub actions: Vec<String>,
}

/// Reply from the emotion worker
#[derive(Debug, Serialize, Deserialize)]
pub struct ClassifyResponse {
    #[serde(default)]
    pub dominant_emotion: Option<String>,
    /// Per-label scores as reported by the worker
    #[serde(default)]
    pub emotion: Option<HashMap<String, f32>>,
    #[serde(default)]
    pub face_found: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ClassifyResponse {
    pub fn into_result(self) -> Result<ClassificationResult, ClassificationError> {
        if let Some(error) = self.error {
            if error.to_ascii_lowercase().contains("face") {
                return Err(ClassificationError::NoFace);
            }
            return Err(ClassificationError::Internal { message: error });
        }

        if self.face_found == Some(false) {
            return Err(ClassificationError::NoFace);
        }

        let label = self.dominant_emotion.ok_or_else(|| ClassificationError::Internal {
            message: "reply has no dominant_emotion".to_string(),
        })?;

        let dominant: Emotion = label.parse().map_err(|e| ClassificationError::Internal {
            message: format!("{}", e),
        })?;

        let scores = self.emotion.map(|raw| {
            raw.into_iter()
                .filter_map(|(name, score)| name.parse::<Emotion>().ok().map(|e| (e, score)))
                .collect::<BTreeMap<_, _>>()
        });

        Ok(match scores {
            Some(scores) => ClassificationResult::with_scores(dominant, scores),
            None => ClassificationResult::new(dominant),
        })
    }
}
