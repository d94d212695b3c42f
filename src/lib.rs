pub mod config;
pub mod delivery;
pub mod emotion;
pub mod error;
pub mod http;
pub mod nats;
pub mod notes;
pub mod report;
pub mod session;
pub mod video;

pub use config::Config;
pub use delivery::{DeliveryChannel, DeliveryReceipt, SmtpConfig, SmtpDelivery};
pub use emotion::{
    AggregatorState, ClassificationResult, Emotion, EmotionAggregator, EmotionClassifier,
    EmotionLabel, EmotionSummary, Observation, SamplingPolicy,
};
pub use error::{ClassificationError, DeliveryError, ReportError, SessionError};
pub use http::{create_router, AppState};
pub use nats::NatsClassifier;
pub use notes::{analyze_note, NoteAnalysis, NoteKind};
pub use report::{PdfReportRenderer, ReportArtifact, ReportInput, ReportRenderer};
pub use session::{SessionConfig, SessionStats, VideoSession};
pub use video::{IceConfig, PixelFormat, VideoFrame};
