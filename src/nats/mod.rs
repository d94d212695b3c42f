pub mod client;
pub mod messages;

pub use client::NatsClassifier;
pub use messages::{ClassifyRequest, ClassifyResponse};
