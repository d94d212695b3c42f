//! Emotion sampling
//!
//! This module provides:
//! - The emotion vocabulary and classification results
//! - The `EmotionClassifier` trait consumed by sessions
//! - `EmotionAggregator`, which throttles classifier calls per frame and
//!   keeps the running history
//! - `EmotionSummary`, the percentage distribution reported on demand

mod aggregator;
mod classifier;
mod label;
mod summary;

pub use aggregator::{AggregatorSnapshot, AggregatorState, EmotionAggregator, Observation, SamplingPolicy};
pub use classifier::EmotionClassifier;
pub use label::{ClassificationResult, Emotion, EmotionLabel, UnknownEmotion};
pub use summary::EmotionSummary;
