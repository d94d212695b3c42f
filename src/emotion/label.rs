use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Emotion vocabulary reported by the classifier
///
/// Variants accept the short DeepFace spellings (`disgust`, `fear`,
/// `surprise`) when parsed or deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Angry,
    #[serde(alias = "disgust")]
    Disgusted,
    #[serde(alias = "fear")]
    Fearful,
    Happy,
    Sad,
    #[serde(alias = "surprise")]
    Surprised,
    Neutral,
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::Angry,
        Emotion::Disgusted,
        Emotion::Fearful,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Surprised,
        Emotion::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Angry => "angry",
            Emotion::Disgusted => "disgusted",
            Emotion::Fearful => "fearful",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Surprised => "surprised",
            Emotion::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a classifier label is outside the vocabulary
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown emotion label: {0}")]
pub struct UnknownEmotion(pub String);

impl FromStr for Emotion {
    type Err = UnknownEmotion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "angry" => Ok(Emotion::Angry),
            "disgust" | "disgusted" => Ok(Emotion::Disgusted),
            "fear" | "fearful" => Ok(Emotion::Fearful),
            "happy" => Ok(Emotion::Happy),
            "sad" => Ok(Emotion::Sad),
            "surprise" | "surprised" => Ok(Emotion::Surprised),
            "neutral" => Ok(Emotion::Neutral),
            _ => Err(UnknownEmotion(s.to_string())),
        }
    }
}

/// Most recent answer a session can give about the viewer's emotion
///
/// `Pending` stands in until the first successful classification so callers
/// always get a printable label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmotionLabel {
    #[default]
    Pending,
    Detected(Emotion),
}

impl EmotionLabel {
    pub fn emotion(&self) -> Option<Emotion> {
        match self {
            EmotionLabel::Pending => None,
            EmotionLabel::Detected(emotion) => Some(*emotion),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, EmotionLabel::Pending)
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmotionLabel::Pending => f.write_str("Detecting..."),
            EmotionLabel::Detected(emotion) => emotion.fmt(f),
        }
    }
}

impl Serialize for EmotionLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            EmotionLabel::Pending => serializer.serialize_str("pending"),
            EmotionLabel::Detected(emotion) => serializer.serialize_str(emotion.as_str()),
        }
    }
}

/// Outcome of one successful classifier invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    /// Highest-scoring label for the frame
    pub dominant: Emotion,

    /// Per-label confidence scores, when the classifier reports them
    pub scores: Option<BTreeMap<Emotion, f32>>,
}

impl ClassificationResult {
    pub fn new(dominant: Emotion) -> Self {
        Self {
            dominant,
            scores: None,
        }
    }

    pub fn with_scores(dominant: Emotion, scores: BTreeMap<Emotion, f32>) -> Self {
        Self {
            dominant,
            scores: Some(scores),
        }
    }
}
